//! # Quill Core
//!
//! Domain layer of the Quill blogging API: entities, the authorization
//! policy, the post lifecycle and the services built on top of them.
//! Infrastructure is reached only through the traits in [`ports`].

pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod pagination;
pub mod policy;
pub mod ports;
pub mod query;
pub mod services;

pub use error::DomainError;
