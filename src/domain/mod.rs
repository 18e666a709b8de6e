pub mod comment;
pub mod image;
pub mod like;
pub mod repository;
pub mod user;
