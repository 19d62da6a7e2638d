pub mod hostendpoints;
pub mod resources;
pub mod selectors;
pub mod system;
