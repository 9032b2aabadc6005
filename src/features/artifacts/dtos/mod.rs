mod artifact_dto;

pub use artifact_dto::{
    ArtifactResponseDto, ArtifactSeedDto, CacheProviderFileDto, CreateArtifactDto,
    ProviderFileEntryDto, SweepResultDto, UpdateArtifactDto,
};
