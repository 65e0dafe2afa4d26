//! API constants

/// API base path prefix (version-independent)
pub const API_BASE: &str = "/api";

pub const API_VERSION: &str = "v0";

/// Versioned prefix every route is nested under.
pub const API_PREFIX: &str = "/api/v0";
