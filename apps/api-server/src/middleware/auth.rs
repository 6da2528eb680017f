//! Authentication extractors.
//!
//! The bearer token is verified and resolved to the stored user on every
//! request, so role changes and deletions take effect immediately.

use std::future::Future;
use std::pin::Pin;

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use quill_core::domain::User;
use quill_core::policy::Actor;

use crate::middleware::error::AppError;
use crate::state::AppState;

const NO_TOKEN: &str = "Not authorized, no token";
const USER_GONE: &str = "Not authorized, user not found";

/// Authenticated caller. Rejects the request with 401 when absent.
///
/// ```ignore
/// async fn protected_route(CurrentUser(user): CurrentUser) -> impl Responder {
///     format!("Hello, {}!", user.name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        Actor::from(&self.0)
    }
}

/// Caller on optional-auth routes.
///
/// A missing header, or a valid token for a user that no longer exists,
/// yields `None`. A token that is presented but invalid is still a 401.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn actor(&self) -> Actor {
        Actor::from(self.0.as_ref())
    }
}

/// The token from `Authorization: Bearer <token>`, if one was sent.
fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
}

fn app_state(req: &HttpRequest) -> Result<web::Data<AppState>, AppError> {
    req.app_data::<web::Data<AppState>>().cloned().ok_or_else(|| {
        tracing::error!("AppState not found in app data");
        AppError::Internal("Server configuration error".to_string())
    })
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = app_state(req);
        let token = bearer_token(req);

        Box::pin(async move {
            let state = state?;
            let token = token.ok_or_else(|| AppError::Unauthorized(NO_TOKEN.to_string()))?;
            match state.users.authenticate(&token).await? {
                Some(user) => Ok(CurrentUser(user)),
                None => Err(AppError::Unauthorized(USER_GONE.to_string())),
            }
        })
    }
}

impl FromRequest for MaybeUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = app_state(req);
        let token = bearer_token(req);

        Box::pin(async move {
            let state = state?;
            match token {
                Some(token) => Ok(MaybeUser(state.users.authenticate(&token).await?)),
                None => Ok(MaybeUser(None)),
            }
        })
    }
}
