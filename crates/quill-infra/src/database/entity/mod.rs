//! SeaORM entities for the `users` and `blogs` tables.

pub mod post;
pub mod user;
