use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    api::AppState,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
};

pub mod articles;
pub mod bookmarks;
pub mod categories;
pub mod news;
pub mod recommendations;
pub mod tags;
pub mod users;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        // Accounts
        .route("/users/signup", post(users::signup))
        .route("/users/login", post(users::login))
        .route("/users/logout", post(users::logout))
        .route("/users/me", get(users::profile).patch(users::update_username))
        .route("/usercategory", put(categories::update_user_categories))
        // Feeds
        .route("/categories", get(categories::list))
        .route("/categories/:name", get(categories::headlines))
        .route("/news/top", get(news::top_headlines))
        .route("/news/search", get(news::search))
        .route("/home", get(news::home))
        .route("/recommendations", get(recommendations::recommend))
        // Articles, bookmarks and tags
        .route(
            "/articles",
            post(articles::create_article).get(articles::get_article_by_url),
        )
        .route("/saves", post(bookmarks::create_bookmark))
        .route("/saves/:id", delete(bookmarks::remove_bookmark))
        .route("/tags", post(tags::create_tags).get(tags::find_tag))
        .route("/tags/:id", delete(tags::delete_tag))
        .route("/articletag", post(tags::create_article_tag))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
