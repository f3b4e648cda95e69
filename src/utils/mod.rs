pub mod constants;
pub mod url_norm;

pub use constants::*;
pub use url_norm::{extract_host, is_allowed_scheme, normalize_url, INTERNAL_SCHEME};
