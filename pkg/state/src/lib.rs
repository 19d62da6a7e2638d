pub mod client;
pub mod registry;

pub use client::StateStore;
pub use registry::{Registry, RegistryError, StoredResource};
