pub mod content;
pub mod participation;
pub mod shared;
