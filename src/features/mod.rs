pub mod artifacts;
pub mod auth;
pub mod chats;
pub mod library;
pub mod messages;
pub mod shares;
