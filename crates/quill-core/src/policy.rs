//! Authorization policy.
//!
//! A single pure decision function consulted by every endpoint: given who is
//! acting, on what, and how, it answers allow or deny. Callers apply the
//! consequence.

use uuid::Uuid;

use crate::domain::{PostStatus, Role, User};
use crate::error::DomainError;

/// The identity attempting an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    Authenticated { id: Uuid, role: Role },
}

impl Actor {
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated { id, .. } => Some(*id),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Authenticated { role: Role::Admin, .. })
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor::Authenticated {
            id: user.id,
            role: user.role,
        }
    }
}

impl From<Option<&User>> for Actor {
    fn from(user: Option<&User>) -> Self {
        user.map_or(Actor::Anonymous, Actor::from)
    }
}

/// What an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// An existing post.
    Post { author_id: Uuid, status: PostStatus },
    /// The set of posts (listing, creation).
    Posts,
    /// An existing account.
    User { id: Uuid },
    /// The set of accounts (listing).
    Users,
    /// An account about to be registered with the given role.
    NewUser { role: Role },
    /// The one-time first-admin creation.
    AdminBootstrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    List,
    Create,
    Update,
    Delete,
    Comment,
    Like,
    /// Set a post's status outside the forward-only lifecycle.
    Moderate,
    ChangeRole(Role),
}

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The action needs an identity and none was presented.
    Unauthenticated,
    /// The resource must not be revealed to this actor.
    Hidden,
    Forbidden(&'static str),
    /// The actor may not do this to their own account.
    SelfTarget(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), DomainError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(Denial::Unauthenticated) => Err(DomainError::Unauthenticated(
                "Authentication required".to_string(),
            )),
            Decision::Deny(Denial::Hidden) => Err(DomainError::not_found("Blog")),
            Decision::Deny(Denial::Forbidden(msg)) => Err(DomainError::Forbidden(msg.to_string())),
            Decision::Deny(Denial::SelfTarget(msg)) => {
                Err(DomainError::InvalidState(msg.to_string()))
            }
        }
    }
}

const ACCESS_DENIED: &str = "Access denied";
const ADMIN_REQUIRED: &str = "Admin access required";
const DELETE_SELF: &str = "You cannot delete your own account";
const DEMOTE_SELF: &str = "You cannot change your own role";

/// Decide whether `actor` may perform `action` on `resource`.
pub fn decide(actor: &Actor, resource: &Resource, action: Action) -> Decision {
    match *actor {
        Actor::Anonymous => decide_anonymous(resource, action),
        Actor::Authenticated {
            id,
            role: Role::Admin,
        } => decide_admin(id, resource, action),
        Actor::Authenticated {
            id,
            role: Role::User,
        } => decide_member(id, resource, action),
    }
}

/// Shorthand for `decide(..).into_result()`.
pub fn authorize(actor: &Actor, resource: &Resource, action: Action) -> Result<(), DomainError> {
    decide(actor, resource, action).into_result()
}

fn decide_anonymous(resource: &Resource, action: Action) -> Decision {
    match (resource, action) {
        (
            Resource::Post {
                status: PostStatus::Published,
                ..
            },
            Action::Read,
        ) => Decision::Allow,
        (Resource::Post { .. }, Action::Read) => Decision::Deny(Denial::Hidden),
        (Resource::Posts, Action::List) => Decision::Allow,
        (Resource::NewUser { role: Role::User }, Action::Create) => Decision::Allow,
        (Resource::NewUser { role: Role::Admin }, Action::Create) => Decision::Deny(
            Denial::Forbidden("Admin accounts cannot be self-registered"),
        ),
        (Resource::AdminBootstrap, Action::Create) => Decision::Allow,
        _ => Decision::Deny(Denial::Unauthenticated),
    }
}

fn decide_admin(self_id: Uuid, resource: &Resource, action: Action) -> Decision {
    match (resource, action) {
        (Resource::User { id }, Action::Delete) if *id == self_id => {
            Decision::Deny(Denial::SelfTarget(DELETE_SELF))
        }
        (Resource::User { id }, Action::ChangeRole(Role::User)) if *id == self_id => {
            Decision::Deny(Denial::SelfTarget(DEMOTE_SELF))
        }
        _ => Decision::Allow,
    }
}

fn decide_member(self_id: Uuid, resource: &Resource, action: Action) -> Decision {
    match (resource, action) {
        (
            Resource::Post {
                status: PostStatus::Published,
                ..
            },
            Action::Read,
        ) => Decision::Allow,
        (Resource::Post { author_id, .. }, Action::Read | Action::Update | Action::Delete)
            if *author_id == self_id =>
        {
            Decision::Allow
        }
        (
            Resource::Post {
                status: PostStatus::Published,
                ..
            },
            Action::Like,
        ) => Decision::Allow,
        (Resource::Post { author_id, .. }, Action::Like) if *author_id == self_id => {
            Decision::Allow
        }
        (Resource::Post { .. }, Action::Comment) => Decision::Allow,
        (Resource::Post { .. }, Action::Like) => Decision::Deny(Denial::Forbidden(ACCESS_DENIED)),
        (Resource::Post { .. }, Action::Update) => {
            Decision::Deny(Denial::Forbidden("Not authorized to update this blog"))
        }
        (Resource::Post { .. }, Action::Delete) => {
            Decision::Deny(Denial::Forbidden("Not authorized to delete this blog"))
        }
        (Resource::Post { .. }, Action::Read) => Decision::Deny(Denial::Forbidden(ACCESS_DENIED)),
        (Resource::Posts, Action::List | Action::Create) => Decision::Allow,
        (Resource::User { id }, Action::Delete) if *id == self_id => {
            Decision::Deny(Denial::SelfTarget(DELETE_SELF))
        }
        (Resource::User { id }, Action::Read | Action::Update) if *id == self_id => Decision::Allow,
        (Resource::NewUser { role: Role::User }, Action::Create) => Decision::Allow,
        _ => Decision::Deny(Denial::Forbidden(ADMIN_REQUIRED)),
    }
}
