/// Session cookie name used for web client authentication.
/// Shared between all backend handlers that read or write the session cookie.
pub const SESSION_COOKIE_NAME: &str = "innerlog_session";

/// Database session lifetime in days.
pub const SESSION_TTL_DAYS: i64 = 30;

/// Email verification token lifetime in hours.
pub const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;

/// Default page size for entry listings.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Hard cap on entry listing page size.
pub const MAX_PAGE_SIZE: i64 = 100;
