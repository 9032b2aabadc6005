mod library;

pub use library::{BackupType, LibraryBackup, LibraryFile};
