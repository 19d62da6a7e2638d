pub mod config;
pub mod gnp;
pub mod gns;
pub mod hep;
pub mod metadata;
pub mod net;
pub mod policy;
pub mod validate;

pub use config::{LogFormat, ServerConfigFile, load_config_file};
pub use gnp::{GlobalNetworkPolicy, GnpRule, GnpSpec, PortSpec, Protocol, RuleAction, RuleEntity};
pub use gns::{GlobalNetworkSet, GnsSpec};
pub use hep::{HostEndpoint, HostEndpointPort, HostEndpointSpec};
pub use metadata::{IpVersion, ResourceKind, ResourceMetadata};
pub use policy::{HostEndpointPolicy, ParsedGnp, ParsedGns, ParsedHep, ParsedRule, PolicyVersions};
pub use validate::{ValidationError, ValidationErrors};
