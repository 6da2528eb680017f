//! Post status lifecycle and the rules that hang off it.
//!
//! `draft -> published -> archived` on the normal update path. Moderation may
//! set any status directly. The first entry into `published` stamps
//! `published_at`, which is never cleared.

use chrono::{DateTime, Utc};

use crate::domain::{Comment, Post, PostStatus};
use crate::error::DomainError;
use crate::policy::Actor;

/// Which path a status change arrives through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPath {
    /// Author or admin editing the post.
    Standard,
    /// Admin moderation; bypasses the forward-only rule.
    Moderation,
}

/// Whether the normal update path permits `from -> to`.
pub fn can_transition(from: PostStatus, to: PostStatus) -> bool {
    use PostStatus::*;
    from == to || matches!((from, to), (Draft, Published) | (Published, Archived))
}

/// Move `post` to `to`. Returns whether the status changed.
pub fn transition(
    post: &mut Post,
    to: PostStatus,
    path: TransitionPath,
    now: DateTime<Utc>,
) -> Result<bool, DomainError> {
    let from = post.status;
    if from == to {
        return Ok(false);
    }
    if path == TransitionPath::Standard && !can_transition(from, to) {
        return Err(DomainError::InvalidState(format!(
            "Cannot change status from {from} to {to}"
        )));
    }

    post.status = to;
    if to == PostStatus::Published && post.published_at.is_none() {
        post.published_at = Some(now);
    }
    post.updated_at = now;
    Ok(true)
}

/// Whether `actor` may see `post` at all.
pub fn is_visible_to(post: &Post, actor: &Actor) -> bool {
    post.status == PostStatus::Published
        || actor.is_admin()
        || actor.id() == Some(post.author_id)
}

/// Whether a read of `post` counts as a view. Only published posts count,
/// whoever the reader is.
pub fn counts_view(post: &Post) -> bool {
    post.status == PostStatus::Published
}

pub fn ensure_commentable(post: &Post) -> Result<(), DomainError> {
    if post.status != PostStatus::Published {
        return Err(DomainError::InvalidState(
            "Cannot comment on unpublished blog".to_string(),
        ));
    }
    Ok(())
}

/// Append a comment to a published post.
pub fn add_comment(
    post: &mut Post,
    user_id: uuid::Uuid,
    content: String,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    ensure_commentable(post)?;
    post.comments.push(Comment {
        id: uuid::Uuid::new_v4(),
        user_id,
        content,
        created_at: now,
    });
    post.updated_at = now;
    Ok(())
}

/// Like or unlike `post` on behalf of `user_id`. Returns `true` when the post
/// ends up liked by the user.
pub fn toggle_like(post: &mut Post, user_id: uuid::Uuid, now: DateTime<Utc>) -> bool {
    let liked = if post.is_liked_by(user_id) {
        post.likes.retain(|like| like.user_id != user_id);
        false
    } else {
        post.likes.push(crate::domain::Like {
            user_id,
            created_at: now,
        });
        true
    };
    post.updated_at = now;
    liked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, post::DEFAULT_CATEGORY};
    use chrono::Duration;
    use uuid::Uuid;

    fn draft() -> Post {
        Post::new(
            Uuid::new_v4(),
            "Lifecycle test".into(),
            "lorem ipsum ".repeat(10),
            None,
            vec![],
            DEFAULT_CATEGORY.into(),
        )
    }

    #[test]
    fn forward_edges_only_on_standard_path() {
        use PostStatus::*;
        assert!(can_transition(Draft, Published));
        assert!(can_transition(Published, Archived));
        assert!(can_transition(Archived, Archived));
        assert!(!can_transition(Published, Draft));
        assert!(!can_transition(Archived, Published));
        assert!(!can_transition(Archived, Draft));
        assert!(!can_transition(Draft, Archived));
    }

    #[test]
    fn first_publish_stamps_published_at_once() {
        let mut post = draft();
        let t0 = Utc::now();
        assert!(transition(&mut post, PostStatus::Published, TransitionPath::Standard, t0).unwrap());
        assert_eq!(post.published_at, Some(t0));

        let t1 = t0 + Duration::minutes(5);
        transition(&mut post, PostStatus::Archived, TransitionPath::Standard, t1).unwrap();
        let t2 = t1 + Duration::minutes(5);
        transition(&mut post, PostStatus::Published, TransitionPath::Moderation, t2).unwrap();

        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.published_at, Some(t0));
    }

    #[test]
    fn archived_is_terminal_except_for_moderation() {
        let mut post = draft();
        let now = Utc::now();
        transition(&mut post, PostStatus::Published, TransitionPath::Standard, now).unwrap();
        transition(&mut post, PostStatus::Archived, TransitionPath::Standard, now).unwrap();

        let err = transition(&mut post, PostStatus::Draft, TransitionPath::Standard, now);
        assert!(matches!(err, Err(DomainError::InvalidState(_))));
        assert_eq!(post.status, PostStatus::Archived);

        assert!(transition(&mut post, PostStatus::Draft, TransitionPath::Moderation, now).unwrap());
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.published_at.is_some());
    }

    #[test]
    fn same_status_is_a_no_op() {
        let mut post = draft();
        let before = post.updated_at;
        let changed = transition(
            &mut post,
            PostStatus::Draft,
            TransitionPath::Standard,
            before + Duration::seconds(1),
        )
        .unwrap();
        assert!(!changed);
        assert_eq!(post.updated_at, before);
    }

    #[test]
    fn only_published_posts_count_views() {
        let mut post = draft();
        assert!(!counts_view(&post));
        transition(&mut post, PostStatus::Published, TransitionPath::Standard, Utc::now()).unwrap();
        assert!(counts_view(&post));
    }

    #[test]
    fn drafts_are_visible_to_author_and_admin_only() {
        let post = draft();
        assert!(!is_visible_to(&post, &Actor::Anonymous));
        assert!(!is_visible_to(
            &post,
            &Actor::Authenticated {
                id: Uuid::new_v4(),
                role: Role::User
            }
        ));
        assert!(is_visible_to(
            &post,
            &Actor::Authenticated {
                id: post.author_id,
                role: Role::User
            }
        ));
        assert!(is_visible_to(
            &post,
            &Actor::Authenticated {
                id: Uuid::new_v4(),
                role: Role::Admin
            }
        ));
    }

    #[test]
    fn comments_require_published_status() {
        let mut post = draft();
        let user = Uuid::new_v4();
        let err = add_comment(&mut post, user, "hi".into(), Utc::now());
        assert!(matches!(err, Err(DomainError::InvalidState(_))));
        assert!(post.comments.is_empty());

        transition(&mut post, PostStatus::Published, TransitionPath::Standard, Utc::now()).unwrap();
        add_comment(&mut post, user, "first".into(), Utc::now()).unwrap();
        add_comment(&mut post, user, "second".into(), Utc::now()).unwrap();
        let contents: Vec<&str> = post.comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn like_twice_restores_original_state() {
        let mut post = draft();
        let user = Uuid::new_v4();

        assert!(toggle_like(&mut post, user, Utc::now()));
        assert_eq!(post.like_count(), 1);
        assert!(toggle_like(&mut post, Uuid::new_v4(), Utc::now()));
        assert_eq!(post.like_count(), 2);

        assert!(!toggle_like(&mut post, user, Utc::now()));
        assert_eq!(post.like_count(), 1);
        assert!(!post.is_liked_by(user));
    }
}
