//! Domain → wire conversions.

use quill_core::domain::{Comment, Like, Post, User};
use quill_core::pagination::PageMeta;
use quill_core::services::UserLookup;
use quill_shared::dto::{
    AuthorSummary, BlogResponse, CommentResponse, CommenterSummary, LikeResponse, Pagination,
    UserResponse,
};

pub fn user(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role.to_string(),
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub fn pagination(meta: PageMeta) -> Pagination {
    Pagination {
        current_page: meta.current_page,
        total_pages: meta.total_pages,
        total_items: meta.total_items,
        has_next_page: meta.has_next_page,
        has_prev_page: meta.has_prev_page,
    }
}

pub fn comment(comment: &Comment, users: &UserLookup) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        user: users.get(comment.user_id).map(|u| CommenterSummary {
            id: u.id,
            name: u.name.clone(),
        }),
        content: comment.content.clone(),
        created_at: comment.created_at,
    }
}

pub fn comments(comments: &[Comment], users: &UserLookup) -> Vec<CommentResponse> {
    comments.iter().map(|c| comment(c, users)).collect()
}

fn like(like: &Like) -> LikeResponse {
    LikeResponse {
        user: like.user_id,
        created_at: like.created_at,
    }
}

/// A post with its author resolved. List views leave out the comment thread.
pub fn blog(post: &Post, users: &UserLookup, with_comments: bool) -> BlogResponse {
    BlogResponse {
        id: post.id,
        title: post.title.clone(),
        slug: post.slug.clone(),
        content: post.content.clone(),
        excerpt: post.excerpt.clone(),
        author: users.get(post.author_id).map(|u| AuthorSummary {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
        }),
        status: post.status.to_string(),
        tags: post.tags.clone(),
        category: post.category.clone(),
        read_time: post.read_time,
        views: post.views,
        likes: post.likes.iter().map(like).collect(),
        like_count: post.like_count(),
        comments: with_comments.then(|| comments(&post.comments, users)),
        comment_count: post.comment_count(),
        published_at: post.published_at,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}
