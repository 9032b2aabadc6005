mod artifact;

pub use artifact::{Artifact, ProviderFileEntry, ProviderFileMap};
