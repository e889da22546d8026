pub mod health;
pub mod threads;
pub mod workspaces;

use crate::{auth::auth_middleware, state::AppState};
use axum::{middleware, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn create_app(state: AppState) -> Router {
    // Allow CORS for local development (editor served from a different port)
    let cors = CorsLayer::permissive();

    Router::new()
        .merge(health::routes()) // Health routes don't need auth
        .merge(
            workspaces::routes()
                .merge(threads::routes())
                .layer(middleware::from_fn(auth_middleware)),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
