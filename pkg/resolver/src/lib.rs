//! Policy resolution: turns the label-based policy catalog into the
//! concrete, ordered rule set a single host endpoint enforces.
//!
//! [`Resolver`] is a pure computation over an in-memory [`Catalog`].
//! [`fetch_policies`] and [`fetch_all_policies`] read that catalog through a
//! [`CatalogReader`] first.

pub mod error;
pub mod reader;
pub mod resolve;

pub use error::ResolveError;
pub use reader::{CatalogReader, fetch_all_policies, fetch_policies, read_catalog};
pub use resolve::{Catalog, Resolution, ResolutionWarning, Resolver};
