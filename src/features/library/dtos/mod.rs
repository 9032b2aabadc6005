mod library_dto;

pub use library_dto::{
    BackupResponseDto, CreateBackupDto, CreateLibraryFileDto, LibraryFileResponseDto,
    RestoreResultDto, UpdateLibraryFileDto,
};
