//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod health;
mod pages;
mod posts;
mod profile;


use std::sync::Arc;

use actix_web::web;

use blogicum_core::ports::RateLimiter;

use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes. Login submissions go through
/// `login_limiter`.
pub fn configure_routes(
    login_limiter: Arc<dyn RateLimiter>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.route("/", web::get().to(posts::index))
            .route("/health", web::get().to(health::health_check))
            // Posts and comments
            .service(
                web::scope("/posts")
                    .service(
                        web::resource("/create/")
                            .route(web::get().to(posts::create_form))
                            .route(web::post().to(posts::create)),
                    )
                    .route("/{post_id}/", web::get().to(posts::detail))
                    .service(
                        web::resource("/{post_id}/edit/")
                            .route(web::get().to(posts::edit_form))
                            .route(web::post().to(posts::edit)),
                    )
                    .service(
                        web::resource("/{post_id}/delete/")
                            .route(web::get().to(posts::delete_form))
                            .route(web::post().to(posts::delete)),
                    )
                    .service(
                        web::resource("/{post_id}/comment/")
                            .route(web::get().to(comments::comment_form))
                            .route(web::post().to(comments::add_comment)),
                    )
                    .service(
                        web::resource("/{post_id}/edit_comment/{comment_id}/")
                            .route(web::get().to(comments::edit_comment_form))
                            .route(web::post().to(comments::edit_comment)),
                    )
                    .service(
                        web::resource("/{post_id}/delete_comment/{comment_id}/")
                            .route(web::get().to(comments::delete_comment_form))
                            .route(web::post().to(comments::delete_comment)),
                    ),
            )
            .route("/category/{slug}/", web::get().to(posts::category_posts))
            // Profiles
            .route("/profile/{username}/", web::get().to(profile::profile))
            .service(
                web::resource("/profile/{username}/edit/")
                    .route(web::get().to(profile::edit_form))
                    .route(web::post().to(profile::edit)),
            )
            // Auth
            .service(
                web::scope("/auth/login")
                    .wrap(RateLimitMiddleware::new(login_limiter))
                    .service(
                        web::resource("/")
                            .route(web::get().to(auth::login_form))
                            .route(web::post().to(auth::login)),
                    ),
            )
            .service(
                web::resource("/auth/registration/")
                    .route(web::get().to(auth::registration_form))
                    .route(web::post().to(auth::register)),
            )
            .route("/auth/logout/", web::post().to(auth::logout))
            // Static pages
            .route("/pages/about/", web::get().to(pages::about))
            .route("/pages/rules/", web::get().to(pages::rules));
    }
}
