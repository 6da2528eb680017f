//! Domain entities - the core business objects.

pub mod post;
pub mod user;

pub use post::{Comment, Like, Post, PostStatus};
pub use user::{Role, User};
