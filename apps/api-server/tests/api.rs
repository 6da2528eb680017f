//! End-to-end tests of the HTTP surface against the in-memory store.

use actix_web::http::{StatusCode, header};
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use serde_json::{Value, json};

use api_server::AppState;
use api_server::handlers::configure_routes;
use api_server::middleware::RateLimitMiddleware;
use api_server::observability::RequestIdMiddleware;
use quill_infra::JwtConfig;

const ADMIN_KEY: &str = "bootstrap-key";
const PASSWORD: &str = "hunter22";
const BODY: &str = "This post body is deliberately long enough to clear the fifty character minimum.";

fn state() -> AppState {
    AppState::in_memory(
        JwtConfig {
            secret: "integration-test-secret".to_string(),
            ..JwtConfig::default()
        },
        Some(ADMIN_KEY.to_string()),
    )
}

macro_rules! app {
    ($state:expr) => {{
        let state: AppState = $state;
        test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(state.rate_limiter.clone()))
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await
    }};
}

/// Send a request and decode the JSON body.
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service($app, $req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

/// Register an account and return `(token, id)`.
macro_rules! register {
    ($app:expr, $name:expr, $email:expr) => {{
        let (status, body) = send!(
            $app,
            TestRequest::post().uri("/api/auth/register").set_json(json!({
                "name": $name,
                "email": $email,
                "password": PASSWORD,
            }))
        );
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["data"]["token"].as_str().unwrap().to_string(),
            body["data"]["user"]["id"].as_str().unwrap().to_string(),
        )
    }};
}

/// Bootstrap the first admin and return `(token, id)`.
macro_rules! bootstrap_admin {
    ($app:expr) => {{
        let (status, body) = send!(
            $app,
            TestRequest::post()
                .uri("/api/auth/create-first-admin")
                .set_json(json!({
                    "adminKey": ADMIN_KEY,
                    "name": "Root Admin",
                    "email": "root@example.com",
                    "password": PASSWORD,
                }))
        );
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["data"]["token"].as_str().unwrap().to_string(),
            body["data"]["user"]["id"].as_str().unwrap().to_string(),
        )
    }};
}

/// Create a post as `token` and return its JSON.
macro_rules! create_post {
    ($app:expr, $token:expr, $title:expr, $status:expr) => {{
        let (status, body) = send!(
            $app,
            authed(TestRequest::post().uri("/api/blogs"), $token).set_json(json!({
                "title": $title,
                "content": BODY,
                "status": $status,
                "tags": ["Rust", "web"],
            }))
        );
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["blog"].clone()
    }};
}

fn authed(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
}

#[actix_web::test]
async fn test_draft_is_hidden_then_visible_once_published() {
    let app = app!(state());
    let (alice, _) = register!(&app, "Alice", "alice@example.com");
    let post = create_post!(&app, &alice, "Hidden until ready", "draft");
    let slug = post["slug"].as_str().unwrap();
    let id = post["id"].as_str().unwrap();
    assert!(post["publishedAt"].is_null());

    let (status, body) = send!(&app, TestRequest::get().uri(&format!("/api/blogs/public/{slug}")));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, body) = send!(
        &app,
        authed(TestRequest::put().uri(&format!("/api/blogs/{id}")), &alice)
            .set_json(json!({"status": "published"}))
    );
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Blog updated successfully");
    assert!(body["data"]["blog"]["publishedAt"].is_string());

    let (status, body) = send!(&app, TestRequest::get().uri(&format!("/api/blogs/public/{slug}")));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["blog"]["views"], 1);
    assert_eq!(body["data"]["blog"]["author"]["name"], "Alice");
    assert!(body["data"]["blog"]["publishedAt"].is_string());

    let (_, body) = send!(&app, TestRequest::get().uri(&format!("/api/blogs/public/{slug}")));
    assert_eq!(body["data"]["blog"]["views"], 2);
}

#[actix_web::test]
async fn test_non_author_cannot_update() {
    let app = app!(state());
    let (alice, _) = register!(&app, "Alice", "alice@example.com");
    let (bob, _) = register!(&app, "Bob", "bob@example.com");
    let post = create_post!(&app, &alice, "Alice writes", "published");
    let id = post["id"].as_str().unwrap();

    let (status, body) = send!(
        &app,
        authed(TestRequest::put().uri(&format!("/api/blogs/{id}")), &bob)
            .set_json(json!({"title": "Bob rewrites"}))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized to update this blog");

    let (status, _) = send!(&app, authed(TestRequest::delete().uri(&format!("/api/blogs/{id}")), &bob));
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_admin_cannot_demote_self() {
    let app = app!(state());
    let (admin, admin_id) = bootstrap_admin!(&app);

    let (status, body) = send!(
        &app,
        authed(TestRequest::put().uri(&format!("/api/auth/users/{admin_id}/role")), &admin)
            .set_json(json!({"role": "user"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You cannot change your own role");

    let (status, _) = send!(
        &app,
        authed(TestRequest::delete().uri(&format!("/api/auth/users/{admin_id}")), &admin)
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_like_toggle_is_idempotent_in_pairs() {
    let app = app!(state());
    let (alice, _) = register!(&app, "Alice", "alice@example.com");
    let (bob, _) = register!(&app, "Bob", "bob@example.com");
    let post = create_post!(&app, &alice, "Likeable post", "published");
    let uri = format!("/api/blogs/{}/like", post["id"].as_str().unwrap());

    let (status, body) = send!(&app, authed(TestRequest::post().uri(&uri), &bob));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Blog liked");
    assert_eq!(body["data"], json!({"liked": true, "likeCount": 1}));

    let (_, body) = send!(&app, authed(TestRequest::post().uri(&uri), &bob));
    assert_eq!(body["message"], "Blog unliked");
    assert_eq!(body["data"], json!({"liked": false, "likeCount": 0}));
}

#[actix_web::test]
async fn test_cannot_like_a_draft_you_cannot_read() {
    let app = app!(state());
    let (alice, _) = register!(&app, "Alice", "alice@example.com");
    let (bob, _) = register!(&app, "Bob", "bob@example.com");
    let post = create_post!(&app, &alice, "Private draft", "draft");
    let slug = post["slug"].as_str().unwrap();
    let uri = format!("/api/blogs/{}/like", post["id"].as_str().unwrap());

    let (status, _) = send!(&app, authed(TestRequest::get().uri(&format!("/api/blogs/{slug}")), &bob));
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send!(&app, authed(TestRequest::post().uri(&uri), &bob));
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());

    // The author still may, and Bob's attempt left no like behind.
    let (status, body) = send!(&app, authed(TestRequest::post().uri(&uri), &alice));
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"], json!({"liked": true, "likeCount": 1}));
}

#[actix_web::test]
async fn test_duplicate_registration_conflicts() {
    let app = app!(state());
    register!(&app, "Alice", "alice@example.com");

    let (status, body) = send!(
        &app,
        TestRequest::post().uri("/api/auth/register").set_json(json!({
            "name": "Alice Again",
            "email": "ALICE@example.com",
            "password": PASSWORD,
        }))
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User already exists with this email");
}

#[actix_web::test]
async fn test_registration_validates_input() {
    let app = app!(state());

    let (status, body) = send!(
        &app,
        TestRequest::post().uri("/api/auth/register").set_json(json!({
            "name": "Al",
            "email": "not-an-email",
            "password": PASSWORD,
        }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email must be a valid email");

    let (status, body) = send!(
        &app,
        TestRequest::post().uri("/api/auth/register").set_json(json!({
            "name": "Mallory",
            "email": "mallory@example.com",
            "password": PASSWORD,
            "role": "admin",
        }))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin accounts cannot be self-registered");
}

#[actix_web::test]
async fn test_login_issues_working_token() {
    let app = app!(state());
    register!(&app, "Alice", "alice@example.com");

    let (status, body) = send!(
        &app,
        TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "alice@example.com", "password": "wrong-password"}))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = send!(
        &app,
        TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "nobody@example.com", "password": PASSWORD}))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = send!(
        &app,
        TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "alice@example.com", "password": PASSWORD}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = send!(&app, authed(TestRequest::get().uri("/api/auth/user-details"), &token));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], "alice@example.com");
    assert_eq!(body["data"]["user"]["role"], "user");
    assert!(body["data"]["user"].get("passwordHash").is_none());
}

#[actix_web::test]
async fn test_first_admin_bootstrap_runs_once() {
    let app = app!(state());

    let (status, body) = send!(
        &app,
        TestRequest::post()
            .uri("/api/auth/create-first-admin")
            .set_json(json!({
                "adminKey": "guess",
                "name": "Intruder",
                "email": "intruder@example.com",
                "password": PASSWORD,
            }))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid admin creation key");

    let (admin, _) = bootstrap_admin!(&app);
    let (_, body) = send!(&app, authed(TestRequest::get().uri("/api/auth/user-details"), &admin));
    assert_eq!(body["data"]["user"]["role"], "admin");

    let (status, body) = send!(
        &app,
        TestRequest::post()
            .uri("/api/auth/create-first-admin")
            .set_json(json!({
                "adminKey": ADMIN_KEY,
                "name": "Second Admin",
                "email": "second@example.com",
                "password": PASSWORD,
            }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Admin already exists");
}

#[actix_web::test]
async fn test_bootstrap_disabled_without_key() {
    let app = app!(AppState::in_memory(JwtConfig::default(), None));

    let (status, body) = send!(
        &app,
        TestRequest::post()
            .uri("/api/auth/create-first-admin")
            .set_json(json!({
                "adminKey": "",
                "name": "Root Admin",
                "email": "root@example.com",
                "password": PASSWORD,
            }))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin creation is disabled");
}

#[actix_web::test]
async fn test_comments_require_published_post() {
    let app = app!(state());
    let (alice, _) = register!(&app, "Alice", "alice@example.com");
    let (bob, _) = register!(&app, "Bob", "bob@example.com");
    let draft = create_post!(&app, &alice, "Work in progress", "draft");
    let published = create_post!(&app, &alice, "Open for discussion", "published");

    for token in [&alice, &bob] {
        let (status, body) = send!(
            &app,
            authed(
                TestRequest::post().uri(&format!("/api/blogs/{}/comments", draft["id"].as_str().unwrap())),
                token,
            )
            .set_json(json!({"content": "First!"}))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Cannot comment on unpublished blog");
    }

    let (status, body) = send!(
        &app,
        authed(
            TestRequest::post().uri(&format!("/api/blogs/{}/comments", published["id"].as_str().unwrap())),
            &bob,
        )
        .set_json(json!({"content": "  Great read  "}))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Comment added successfully");
    let comments = body["data"]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["content"], "Great read");
    assert_eq!(comments[0]["user"]["name"], "Bob");
}

#[actix_web::test]
async fn test_unpublished_reads_by_others_do_not_count_views() {
    let app = app!(state());
    let (alice, _) = register!(&app, "Alice", "alice@example.com");
    let (bob, _) = register!(&app, "Bob", "bob@example.com");
    let post = create_post!(&app, &alice, "Private draft", "draft");
    let uri = format!("/api/blogs/{}", post["slug"].as_str().unwrap());

    let (status, body) = send!(&app, authed(TestRequest::get().uri(&uri), &bob));
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied");

    let (status, body) = send!(&app, authed(TestRequest::get().uri(&uri), &alice));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["blog"]["views"], 0);
    assert_eq!(body["data"]["blog"]["comments"], json!([]));
}

#[actix_web::test]
async fn test_listing_filters_and_paginates() {
    let app = app!(state());
    let (admin, _) = bootstrap_admin!(&app);
    let (alice, _) = register!(&app, "Alice Writer", "alice@example.com");
    for title in ["First published", "Second published", "Third published"] {
        create_post!(&app, &alice, title, "published");
    }
    create_post!(&app, &alice, "Unfinished draft", "draft");

    let (status, body) = send!(&app, TestRequest::get().uri("/api/blogs?limit=2"));
    assert_eq!(status, StatusCode::OK);
    let blogs = body["data"]["blogs"].as_array().unwrap();
    assert_eq!(blogs.len(), 2);
    assert!(blogs.iter().all(|b| b["status"] == "published"));
    assert!(blogs.iter().all(|b| b.get("comments").is_none()));
    assert_eq!(
        body["data"]["pagination"],
        json!({
            "currentPage": 1,
            "totalPages": 2,
            "totalItems": 3,
            "hasNextPage": true,
            "hasPrevPage": false,
        })
    );

    let (_, body) = send!(&app, TestRequest::get().uri("/api/blogs?limit=2&page=2"));
    assert_eq!(body["data"]["blogs"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["pagination"]["hasPrevPage"], true);

    // Anonymous callers cannot widen the status filter.
    let (_, body) = send!(&app, TestRequest::get().uri("/api/blogs?status=draft"));
    assert_eq!(body["data"]["pagination"]["totalItems"], 3);

    let (_, body) = send!(&app, authed(TestRequest::get().uri("/api/blogs?status=draft"), &admin));
    assert_eq!(body["data"]["pagination"]["totalItems"], 1);
    assert_eq!(body["data"]["blogs"][0]["title"], "Unfinished draft");

    let (_, body) = send!(&app, TestRequest::get().uri("/api/blogs?author=writer&tag=RUST"));
    assert_eq!(body["data"]["pagination"]["totalItems"], 3);

    let (_, body) = send!(&app, TestRequest::get().uri("/api/blogs?author=nobody"));
    assert_eq!(body["data"]["pagination"]["totalItems"], 0);
    assert_eq!(body["data"]["pagination"]["totalPages"], 0);

    let (_, body) = send!(&app, TestRequest::get().uri("/api/blogs?sortBy=title&sortOrder=asc"));
    assert_eq!(body["data"]["blogs"][0]["title"], "First published");

    let (status, _) = send!(&app, TestRequest::get().uri("/api/blogs?sortBy=likes"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_my_blogs_lists_own_posts_of_any_status() {
    let app = app!(state());
    let (alice, _) = register!(&app, "Alice", "alice@example.com");
    let (bob, _) = register!(&app, "Bob", "bob@example.com");
    create_post!(&app, &alice, "Alice draft", "draft");
    create_post!(&app, &alice, "Alice published", "published");
    create_post!(&app, &bob, "Bob published", "published");

    let (status, body) = send!(&app, authed(TestRequest::get().uri("/api/blogs/my-blogs"), &alice));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["totalItems"], 2);

    let (_, body) = send!(
        &app,
        authed(TestRequest::get().uri("/api/blogs/my-blogs?status=draft"), &alice)
    );
    assert_eq!(body["data"]["pagination"]["totalItems"], 1);
    assert_eq!(body["data"]["blogs"][0]["title"], "Alice draft");
}

#[actix_web::test]
async fn test_admin_moderation_and_deletion() {
    let app = app!(state());
    let (admin, _) = bootstrap_admin!(&app);
    let (alice, _) = register!(&app, "Alice", "alice@example.com");
    let post = create_post!(&app, &alice, "Needs moderation", "published");
    let id = post["id"].as_str().unwrap();

    let (status, _) = send!(
        &app,
        authed(TestRequest::put().uri(&format!("/api/blogs/admin/{id}/status")), &alice)
            .set_json(json!({"status": "archived"}))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send!(
        &app,
        authed(TestRequest::put().uri(&format!("/api/blogs/admin/{id}/status")), &admin)
            .set_json(json!({"status": "draft"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Blog status updated successfully");
    assert_eq!(body["data"]["blog"]["status"], "draft");

    let (status, body) = send!(
        &app,
        authed(TestRequest::put().uri(&format!("/api/blogs/admin/{id}/status")), &admin)
            .set_json(json!({"status": "deleted"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid status. Must be draft, published, or archived");

    let (status, body) = send!(&app, authed(TestRequest::delete().uri(&format!("/api/blogs/{id}")), &admin));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Blog deleted successfully by admin");

    let (status, _) = send!(&app, authed(TestRequest::delete().uri(&format!("/api/blogs/{id}")), &admin));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_role_changes_and_user_deletion() {
    let app = app!(state());
    let (admin, _) = bootstrap_admin!(&app);
    let (alice, alice_id) = register!(&app, "Alice", "alice@example.com");
    let (bob, _) = register!(&app, "Bob", "bob@example.com");
    let alice_post = create_post!(&app, &alice, "Soon orphaned", "published");
    let bob_post = create_post!(&app, &bob, "Bob keeps this", "published");
    send!(
        &app,
        authed(
            TestRequest::post().uri(&format!("/api/blogs/{}/comments", bob_post["id"].as_str().unwrap())),
            &alice,
        )
        .set_json(json!({"content": "Alice was here"}))
    );

    let (status, body) = send!(&app, authed(TestRequest::get().uri("/api/auth/users"), &alice));
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access required");

    let (status, body) = send!(&app, authed(TestRequest::get().uri("/api/auth/users?limit=2"), &admin));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["users"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["pagination"]["totalItems"], 3);

    let (status, body) = send!(
        &app,
        authed(TestRequest::put().uri(&format!("/api/auth/users/{alice_id}/role")), &admin)
            .set_json(json!({"role": "admin"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User promoted to admin successfully");
    assert_eq!(body["data"]["user"]["role"], "admin");

    let (status, body) = send!(
        &app,
        authed(TestRequest::delete().uri(&format!("/api/auth/users/{alice_id}")), &admin)
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, _) = send!(
        &app,
        TestRequest::get().uri(&format!("/api/blogs/public/{}", alice_post["slug"].as_str().unwrap()))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send!(
        &app,
        TestRequest::get().uri(&format!("/api/blogs/public/{}", bob_post["slug"].as_str().unwrap()))
    );
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["blog"]["comments"][0]["user"].is_null());

    let (status, body) = send!(&app, authed(TestRequest::get().uri("/api/auth/user-details"), &alice));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, user not found");

    // A deleted user's token reads as anonymous where auth is optional.
    let (status, _) = send!(&app, authed(TestRequest::get().uri("/api/blogs"), &alice));
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_profile_update() {
    let app = app!(state());
    let (alice, _) = register!(&app, "Alice", "alice@example.com");
    register!(&app, "Bob", "bob@example.com");

    let (status, body) = send!(
        &app,
        authed(TestRequest::put().uri("/api/auth/profile"), &alice).set_json(json!({}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "At least one of name or email is required");

    let (status, body) = send!(
        &app,
        authed(TestRequest::put().uri("/api/auth/profile"), &alice)
            .set_json(json!({"email": "bob@example.com"}))
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email is already taken");

    let (status, body) = send!(
        &app,
        authed(TestRequest::put().uri("/api/auth/profile"), &alice)
            .set_json(json!({"name": "Alice Liddell"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Profile updated successfully");
    assert_eq!(body["data"]["user"]["name"], "Alice Liddell");
}

#[actix_web::test]
async fn test_authentication_failures() {
    let app = app!(state());

    let (status, body) = send!(&app, TestRequest::get().uri("/api/blogs/my-blogs"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, no token");

    // A bad token is rejected even where authentication is optional.
    let (status, body) = send!(&app, authed(TestRequest::get().uri("/api/blogs"), "not.a.jwt"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send!(&app, TestRequest::get().uri("/api/blogs"));
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_envelope_for_bad_input_and_unknown_routes() {
    let app = app!(state());
    let (alice, _) = register!(&app, "Alice", "alice@example.com");

    let (status, body) = send!(&app, TestRequest::get().uri("/api/nope"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "message": "Route not found"}));

    let (status, body) = send!(
        &app,
        authed(TestRequest::post().uri("/api/blogs"), &alice)
            .insert_header(header::ContentType::json())
            .set_payload("{\"title\": ")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = send!(
        &app,
        authed(TestRequest::post().uri("/api/blogs/not-a-uuid/like"), &alice)
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid blog ID");

    let (status, _) = send!(&app, TestRequest::get().uri("/api/blogs?page=abc"));
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send!(
        &app,
        authed(TestRequest::post().uri("/api/blogs"), &alice)
            .set_json(json!({"title": "Short body", "content": "too short"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Content must be at least 50 characters");

    let (status, body) = send!(
        &app,
        authed(TestRequest::post().uri("/api/blogs"), &alice).set_json(json!({
            "title": "Straight to archive",
            "content": BODY,
            "status": "archived",
        }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Status must be draft or published");
}

#[actix_web::test]
async fn test_banner_health_and_request_id() {
    let app = app!(state());

    let (status, body) = send!(&app, TestRequest::get().uri("/"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Blog API Server");
    assert_eq!(body["storage"], "memory");

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/health")
            .insert_header(("X-Request-ID", "trace-me-123"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("trace-me-123")
    );
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");

    let resp = test::call_service(&app, TestRequest::get().uri("/api/health").to_request()).await;
    assert!(resp.headers().contains_key("x-request-id"));
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_rate_limit_rejects_with_retry_after() {
    use std::sync::Arc;
    use std::time::Duration;

    use quill_infra::{InMemoryRateLimiter, RateLimitConfig};

    let limiter = InMemoryRateLimiter::new(RateLimitConfig {
        max_requests: 2,
        window: Duration::from_secs(60),
    })
    .unwrap();
    let app = app!(state().with_rate_limiter(Arc::new(limiter)));

    for _ in 0..2 {
        let resp = test::call_service(&app, TestRequest::get().uri("/api/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = test::call_service(&app, TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key(header::RETRY_AFTER));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_rotating_forwarded_for_does_not_evade_rate_limit() {
    use std::sync::Arc;
    use std::time::Duration;

    use quill_infra::{InMemoryRateLimiter, RateLimitConfig};

    let limiter = InMemoryRateLimiter::new(RateLimitConfig {
        max_requests: 2,
        window: Duration::from_secs(60),
    })
    .unwrap();
    let app = app!(state().with_rate_limiter(Arc::new(limiter)));

    let mut statuses = Vec::new();
    for i in 0..6 {
        let req = TestRequest::get()
            .uri("/api/health")
            .insert_header(("x-forwarded-for", format!("10.0.0.{i}")))
            .to_request();
        statuses.push(test::call_service(&app, req).await.status());
    }

    assert_eq!(&statuses[..2], &[StatusCode::OK, StatusCode::OK]);
    assert!(statuses[2..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_trusted_proxy_keys_on_forwarded_client() {
    use std::sync::Arc;
    use std::time::Duration;

    use quill_infra::{InMemoryRateLimiter, RateLimitConfig};

    let limiter = InMemoryRateLimiter::new(RateLimitConfig {
        max_requests: 1,
        window: Duration::from_secs(60),
    })
    .unwrap();
    let state = state().with_rate_limiter(Arc::new(limiter));
    let app = test::init_service(
        App::new()
            .wrap(RateLimitMiddleware::new(state.rate_limiter.clone()).trust_proxy(true))
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let from = |client: &'static str| {
        TestRequest::get()
            .uri("/api/health")
            .insert_header(("x-forwarded-for", client))
            .to_request()
    };

    assert_eq!(test::call_service(&app, from("10.0.0.1")).await.status(), StatusCode::OK);
    assert_eq!(test::call_service(&app, from("10.0.0.2")).await.status(), StatusCode::OK);
    assert_eq!(
        test::call_service(&app, from("10.0.0.1")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}
