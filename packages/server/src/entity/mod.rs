pub mod activity;
pub mod event;
pub mod participant;
