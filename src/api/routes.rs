use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::config::MediaBackend;
use crate::AppState;

/// Slack on top of the image limit for the other multipart fields.
const FORM_OVERHEAD: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_image_size as usize + FORM_OVERHEAD);

    let mut router = Router::new()
        // Auth
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        // Posts
        .route(
            "/app/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route(
            "/app/posts/:post_id",
            get(handlers::get_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post)
                .layer(upload_limit.clone()),
        )
        .route("/app/posts/:post_id/articles", post(handlers::create_article))
        .route(
            "/app/posts/:post_id/articles/order",
            put(handlers::reorder_articles),
        )
        // Articles
        .route(
            "/app/articles/:article_id",
            put(handlers::update_article).delete(handlers::delete_article),
        )
        .route(
            "/app/articles/:article_id/images",
            get(handlers::list_images)
                .post(handlers::create_image)
                .layer(upload_limit.clone()),
        )
        .route(
            "/app/articles/:article_id/images/order",
            put(handlers::reorder_images),
        )
        // Images
        .route(
            "/app/images",
            get(handlers::list_user_images)
                .post(handlers::create_user_image)
                .layer(upload_limit.clone()),
        )
        .route(
            "/app/images/:image_id",
            put(handlers::replace_image)
                .delete(handlers::delete_image)
                .layer(upload_limit),
        )
        // Settings
        .route(
            "/app/settings/user",
            get(handlers::get_user).put(handlers::update_user),
        )
        .route("/app/settings/password", put(handlers::update_password))
        .route(
            "/app/settings/account",
            axum::routing::delete(handlers::delete_account),
        )
        .route("/app/settings/key", post(handlers::rotate_key))
        // Public read API
        .route("/api/cms/images/:image_id", get(handlers::cms_get_image))
        .route("/api/cms/posts/:post_id", get(handlers::cms_get_post))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Assets of the local backend are served by this process
    if matches!(state.config.media.backend, MediaBackend::Local) {
        router = router.route("/media/*asset_id", get(handlers::serve_media));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
