//! Blog handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::PostStatus;
use quill_core::pagination::{DEFAULT_LIMIT, PageRequest};
use quill_core::query::{PostSort, non_blank};
use quill_core::services::{DeletedBy, ListParams, NewPost, PostChanges, PostListing, PostView};
use quill_shared::ApiResponse;
use quill_shared::dto::{
    BlogEnvelope, BlogListQuery, BlogListResponse, CommentRequest, CommentsResponse,
    CreateBlogRequest, LikeToggleResponse, MyBlogsQuery, UpdateBlogRequest, UpdateStatusRequest,
};

use super::views;
use crate::middleware::{AppError, AppResult, CurrentUser, MaybeUser};
use crate::state::AppState;

fn blog_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid blog ID".to_string()))
}

fn page_request(page: Option<u32>, limit: Option<u32>) -> PageRequest {
    PageRequest::new(page.unwrap_or(1), limit.unwrap_or(DEFAULT_LIMIT))
}

fn parse_status(raw: Option<String>) -> AppResult<Option<PostStatus>> {
    Ok(non_blank(raw)
        .map(|s| s.parse::<PostStatus>())
        .transpose()?)
}

fn listing(listing: PostListing) -> BlogListResponse {
    BlogListResponse {
        blogs: listing
            .page
            .items
            .iter()
            .map(|post| views::blog(post, &listing.users, false))
            .collect(),
        pagination: views::pagination(listing.page.meta()),
    }
}

fn envelope(view: &PostView) -> BlogEnvelope {
    BlogEnvelope {
        blog: views::blog(&view.post, &view.users, true),
    }
}

/// GET /api/blogs - optional auth
pub async fn list(
    state: web::Data<AppState>,
    caller: MaybeUser,
    query: web::Query<BlogListQuery>,
) -> AppResult<HttpResponse> {
    let q = query.into_inner();
    let mut sort = PostSort::newest_first();
    if let Some(field) = non_blank(q.sort_by) {
        sort.field = field.parse()?;
    }
    if let Some(order) = non_blank(q.sort_order) {
        sort.order = order.parse()?;
    }

    let params = ListParams {
        page: page_request(q.page, q.limit),
        status: parse_status(q.status)?,
        author: non_blank(q.author),
        search: non_blank(q.search),
        category: non_blank(q.category),
        tag: non_blank(q.tag),
        sort,
    };
    let result = state.blogs.list(&caller.actor(), params).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(listing(result))))
}

/// GET /api/blogs/my-blogs
pub async fn my_blogs(
    state: web::Data<AppState>,
    CurrentUser(caller): CurrentUser,
    query: web::Query<MyBlogsQuery>,
) -> AppResult<HttpResponse> {
    let q = query.into_inner();
    let status = parse_status(q.status)?;
    let result = state
        .blogs
        .my_blogs(&caller, status, page_request(q.page, q.limit))
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(listing(result))))
}

/// GET /api/blogs/public/{slug}
pub async fn get_public(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let view = state.blogs.get_public(&slug).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(envelope(&view))))
}

/// GET /api/blogs/{slug}
pub async fn get_by_slug(
    state: web::Data<AppState>,
    caller: CurrentUser,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let view = state.blogs.get_by_slug(&caller.actor(), &slug).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(envelope(&view))))
}

/// POST /api/blogs
pub async fn create(
    state: web::Data<AppState>,
    CurrentUser(caller): CurrentUser,
    body: web::Json<CreateBlogRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let input = NewPost {
        title: req.title,
        content: req.content,
        status: parse_status(req.status)?,
        tags: req.tags.unwrap_or_default(),
        category: req.category,
        excerpt: req.excerpt,
    };
    let view = state.blogs.create(&caller, input).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        envelope(&view),
        "Blog created successfully",
    )))
}

/// PUT /api/blogs/{id}
pub async fn update(
    state: web::Data<AppState>,
    CurrentUser(caller): CurrentUser,
    path: web::Path<String>,
    body: web::Json<UpdateBlogRequest>,
) -> AppResult<HttpResponse> {
    let id = blog_id(&path)?;
    let req = body.into_inner();
    let changes = PostChanges {
        title: req.title,
        content: req.content,
        status: parse_status(req.status)?,
        tags: req.tags,
        category: req.category,
        excerpt: req.excerpt,
    };
    let view = state.blogs.update(&caller, id, changes).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        envelope(&view),
        "Blog updated successfully",
    )))
}

/// DELETE /api/blogs/{id}
pub async fn delete(
    state: web::Data<AppState>,
    CurrentUser(caller): CurrentUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = blog_id(&path)?;
    let message = match state.blogs.delete(&caller, id).await? {
        DeletedBy::Author => "Blog deleted successfully",
        DeletedBy::Admin => "Blog deleted successfully by admin",
    };
    Ok(HttpResponse::Ok().json(ApiResponse::message(message)))
}

/// PUT /api/blogs/admin/{id}/status - admin only
pub async fn set_status(
    state: web::Data<AppState>,
    CurrentUser(caller): CurrentUser,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> AppResult<HttpResponse> {
    let id = blog_id(&path)?;
    let status: PostStatus = body.status.parse()?;
    let view = state.blogs.set_status(&caller, id, status).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        envelope(&view),
        "Blog status updated successfully",
    )))
}

/// POST /api/blogs/{id}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    CurrentUser(caller): CurrentUser,
    path: web::Path<String>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let id = blog_id(&path)?;
    let thread = state.blogs.add_comment(&caller, id, &body.content).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        CommentsResponse {
            comments: views::comments(&thread.comments, &thread.users),
        },
        "Comment added successfully",
    )))
}

/// POST /api/blogs/{id}/like - toggles
pub async fn toggle_like(
    state: web::Data<AppState>,
    CurrentUser(caller): CurrentUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = blog_id(&path)?;
    let outcome = state.blogs.toggle_like(&caller, id).await?;
    let message = if outcome.liked {
        "Blog liked"
    } else {
        "Blog unliked"
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        LikeToggleResponse {
            liked: outcome.liked,
            like_count: outcome.like_count,
        },
        message,
    )))
}
