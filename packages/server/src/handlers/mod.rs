mod content;

pub mod activity;
pub mod event;
pub mod media;
pub mod participation;
