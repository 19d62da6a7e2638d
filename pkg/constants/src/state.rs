//! State store key layout.

/// Key prefix for host endpoints, keyed by name.
pub const HOST_ENDPOINT_PREFIX: &str = "/registry/hostendpoints/";

/// Key prefix for global network policies, keyed by name.
pub const GLOBAL_NETWORK_POLICY_PREFIX: &str = "/registry/globalnetworkpolicies/";

/// Key prefix for global network sets, keyed by name.
pub const GLOBAL_NETWORK_SET_PREFIX: &str = "/registry/globalnetworksets/";
