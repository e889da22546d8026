use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

const SERVICE: &str = "folio-api";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
}

#[derive(Debug, Serialize)]
struct Liveness {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Readiness {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    database: &'static str,
    /// Content pieces with an open change stream or mounted panel
    watched_pieces: usize,
}

async fn health_check() -> Json<Liveness> {
    Json(Liveness {
        status: "ok",
        service: SERVICE,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Reports 503 while the database cannot be reached.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let db_ok = sqlx::query("SELECT 1")
        .fetch_one(state.provisioner.pool())
        .await
        .is_ok();

    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(Readiness {
            status: if db_ok { "ready" } else { "not_ready" },
            service: SERVICE,
            version: env!("CARGO_PKG_VERSION"),
            database: if db_ok { "connected" } else { "disconnected" },
            watched_pieces: state.comments.feed().active_pieces(),
        }),
    )
}
