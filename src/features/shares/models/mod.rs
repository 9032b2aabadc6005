mod shared_link;

pub use shared_link::{ShareAccessLevel, ShareContentType, SharedLink};
