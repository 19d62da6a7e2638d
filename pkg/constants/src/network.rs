//! Network-related constants.

/// Default port for the bfw API server.
pub const DEFAULT_API_PORT: u16 = 9091;

/// Default API server address (HTTP).
pub const DEFAULT_API_ADDR: &str = "http://127.0.0.1:9091";

/// Default join/admin token when neither CLI nor config provides one.
pub const DEFAULT_TOKEN: &str = "demo-token-123";
