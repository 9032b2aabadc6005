mod library_handler;

pub use library_handler::*;
