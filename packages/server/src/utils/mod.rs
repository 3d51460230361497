pub mod jwt;
pub mod multipart;
