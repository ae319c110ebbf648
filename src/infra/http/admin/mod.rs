//! Administrative JSON surface, served on its own listener.

mod cache;
mod error;
mod groups;
mod health;
mod posts;
mod state;
mod users;

pub use state::AdminState;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::middleware::{log_responses, set_request_context};

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/groups", get(groups::list_groups).post(groups::create_group))
        .route(
            "/groups/{slug}",
            get(groups::get_group)
                .patch(groups::update_group)
                .delete(groups::delete_group),
        )
        .route("/posts", get(posts::list_posts))
        .route("/posts/{id}", axum::routing::delete(posts::delete_post))
        .route("/posts/{id}/group", put(posts::assign_group))
        .route("/users", post(users::register_user))
        .route(
            "/users/{username}",
            get(users::get_user).delete(users::delete_user),
        )
        .route("/cache/invalidate", post(cache::invalidate_cache))
        .route("/_health/db", get(health::admin_health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}
