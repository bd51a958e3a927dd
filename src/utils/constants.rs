pub const ONE_MB: usize = 1024 * 1024;
// inline base64 images need headroom over the raw file size
pub const DEFAULT_UPLOAD_LIMIT_MB: usize = 20;
// outer guard only; model calls time out first and answer with JSON
pub const SERVER_REQUEST_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const PROCESS_ROUTE: &str = "/api/process";
pub const RAW_PREFIX_CHARS: usize = 300;
