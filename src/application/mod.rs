//! Application services orchestrating the domain against repository traits.

pub mod admin;
pub mod error;
pub mod feed;
pub mod follows;
pub mod pagination;
pub mod posts;
pub mod repos;
