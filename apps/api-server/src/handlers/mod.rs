//! HTTP handlers and route configuration.

mod auth;
mod blogs;
mod health;
mod views;

use actix_web::web;

use crate::middleware::error::{json_error_handler, query_error_handler};

/// Largest accepted JSON body.
pub const JSON_LIMIT: usize = 10 * 1024 * 1024;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT)
            .error_handler(json_error_handler),
    )
    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
    .route("/", web::get().to(health::banner))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/create-first-admin", web::post().to(auth::create_first_admin))
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/user-details", web::get().to(auth::user_details))
                    .route("/profile", web::put().to(auth::update_profile))
                    .route("/users", web::get().to(auth::list_users))
                    .route("/users/{id}/role", web::put().to(auth::change_role))
                    .route("/users/{id}", web::delete().to(auth::delete_user)),
            )
            .service(
                // Literal segments are registered before the `{key}` catch-all.
                web::scope("/blogs")
                    .service(
                        web::resource("")
                            .route(web::get().to(blogs::list))
                            .route(web::post().to(blogs::create)),
                    )
                    .route("/my-blogs", web::get().to(blogs::my_blogs))
                    .route("/public/{slug}", web::get().to(blogs::get_public))
                    .route("/admin/{id}/status", web::put().to(blogs::set_status))
                    .service(
                        web::resource("/{key}")
                            .route(web::get().to(blogs::get_by_slug))
                            .route(web::put().to(blogs::update))
                            .route(web::delete().to(blogs::delete)),
                    )
                    .route("/{id}/comments", web::post().to(blogs::add_comment))
                    .route("/{id}/like", web::post().to(blogs::toggle_like)),
            ),
    )
    .default_service(web::to(health::route_not_found));
}
