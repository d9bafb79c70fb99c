pub mod db;
pub mod image;
pub mod tokens;
pub mod user;
