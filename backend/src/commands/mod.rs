pub mod auth;
pub mod detection;
pub mod pest;
pub mod user;
