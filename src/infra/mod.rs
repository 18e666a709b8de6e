pub mod cache;
pub mod db;
pub mod repositories;
pub mod unsplash;
