mod artifact_service;
mod provider_cache_service;

pub use artifact_service::ArtifactService;
pub use provider_cache_service::ProviderCacheService;
