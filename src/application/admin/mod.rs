//! Administrative services backing the admin JSON surface.

pub mod groups;
pub mod posts;
pub mod users;
