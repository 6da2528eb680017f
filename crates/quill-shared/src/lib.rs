//! # Quill Shared
//!
//! Wire types of the Quill API: request bodies, query strings and the
//! response envelope. Everything serializes as camelCase JSON.

pub mod dto;
pub mod response;

pub use response::ApiResponse;
