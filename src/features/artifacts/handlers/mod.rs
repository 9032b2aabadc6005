mod artifact_handler;
mod provider_cache_handler;

pub use artifact_handler::*;
pub use provider_cache_handler::*;
