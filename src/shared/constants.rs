/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// CLIENT CREDENTIAL HEADERS
// =============================================================================

/// Header carrying the client identifier on authenticated query endpoints
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Header carrying the client secret on authenticated query endpoints
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";
