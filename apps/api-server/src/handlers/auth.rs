//! Account handlers: registration, sessions, profile and user admin.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::Role;
use quill_core::pagination::{DEFAULT_LIMIT, PageRequest};
use quill_core::services::{ProfileChanges, Registration, Session};
use quill_shared::ApiResponse;
use quill_shared::dto::{
    AuthResponse, CreateFirstAdminRequest, LoginRequest, PageQuery, RegisterRequest,
    UpdateProfileRequest, UpdateRoleRequest, UserEnvelope, UserListResponse,
};

use super::views;
use crate::middleware::{AppError, AppResult, CurrentUser};
use crate::state::AppState;

fn auth_response(session: Session) -> AuthResponse {
    AuthResponse {
        user: views::user(&session.user),
        token: session.token,
        expires_in: session.expires_in,
    }
}

fn user_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid user ID".to_string()))
}

/// POST /api/auth/create-first-admin
pub async fn create_first_admin(
    state: web::Data<AppState>,
    body: web::Json<CreateFirstAdminRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let session = state
        .users
        .create_first_admin(
            &req.admin_key,
            Registration {
                name: req.name,
                email: req.email,
                password: req.password,
                role: Role::Admin,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        auth_response(session),
        "First admin created successfully",
    )))
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let role = match req.role.as_deref() {
        Some(role) => role.parse::<Role>()?,
        None => Role::User,
    };

    let session = state
        .users
        .register(Registration {
            name: req.name,
            email: req.email,
            password: req.password,
            role,
        })
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        auth_response(session),
        "User registered successfully",
    )))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let session = state.users.login(&req.email, &req.password).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        auth_response(session),
        "Login successful",
    )))
}

/// GET /api/auth/user-details
pub async fn user_details(
    state: web::Data<AppState>,
    CurrentUser(caller): CurrentUser,
) -> AppResult<HttpResponse> {
    let user = state.users.profile(&caller).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(UserEnvelope {
        user: views::user(&user),
    })))
}

/// PUT /api/auth/profile
pub async fn update_profile(
    state: web::Data<AppState>,
    CurrentUser(caller): CurrentUser,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .users
        .update_profile(
            &caller,
            ProfileChanges {
                name: req.name,
                email: req.email,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        UserEnvelope {
            user: views::user(&user),
        },
        "Profile updated successfully",
    )))
}

/// GET /api/auth/users - admin only
pub async fn list_users(
    state: web::Data<AppState>,
    CurrentUser(caller): CurrentUser,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let request = PageRequest::new(
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_LIMIT),
    );
    let page = state.users.list_users(&caller, request).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(UserListResponse {
        users: page.items.iter().map(views::user).collect(),
        pagination: views::pagination(page.meta()),
    })))
}

/// PUT /api/auth/users/{id}/role - admin only
pub async fn change_role(
    state: web::Data<AppState>,
    CurrentUser(caller): CurrentUser,
    path: web::Path<String>,
    body: web::Json<UpdateRoleRequest>,
) -> AppResult<HttpResponse> {
    let target = user_id(&path)?;
    let role: Role = body.role.parse()?;
    let user = state.users.change_role(&caller, target, role).await?;

    let message = match role {
        Role::Admin => "User promoted to admin successfully",
        Role::User => "User demoted from admin successfully",
    };
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        UserEnvelope {
            user: views::user(&user),
        },
        message,
    )))
}

/// DELETE /api/auth/users/{id} - admin only
pub async fn delete_user(
    state: web::Data<AppState>,
    CurrentUser(caller): CurrentUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let target = user_id(&path)?;
    state.users.delete_user(&caller, target).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("User deleted successfully")))
}
