//! Application services composing repositories, policy and lifecycle.

mod blogs;
mod users;

pub use blogs::{
    BlogService, CommentThread, DeletedBy, LikeOutcome, ListParams, NewPost, PostChanges,
    PostListing, PostView, UserLookup,
};
pub use users::{ProfileChanges, Registration, Session, UserService};
