mod message;

pub use message::{Message, MessageBranch, MessageRole, MessageVersion};
