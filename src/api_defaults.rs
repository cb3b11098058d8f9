// Path prefix prepended to every endpoint. Relative, so requests stay on the
// origin that served the front end unless the config sets an absolute URL.
pub const API_BASE_URL: &str = "/api";

// Cached GET responses are served for one minute.
pub const CACHE_TTL_MILLISECONDS: u64 = 60_000;

// Number of retries after the first attempt when the transport fails.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

// Backoff delay for retry n is min(BASE * 2^n, MAX).
pub const BACKOFF_BASE_MILLISECONDS: u64 = 1_000;
pub const BACKOFF_MAX_MILLISECONDS: u64 = 10_000;

// Global timeout for a single transport call, connect to last body byte.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_TYPE_JSON: &str = "application/json";

// Endpoint used to verify the session cookie is still valid.
pub const VERIFY_SESSION_ENDPOINT: &str = "verify-session";

// Message used when an error response carries no `detail` field.
pub const DEFAULT_ERROR_DETAIL: &str = "An error occurred";

// Environment variable that overrides the configured base URL.
pub const BASE_URL_ENV_VAR: &str = "PRICEWATCH_API_BASE_URL";
