use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::DeploymentImpl;

pub mod categories;
pub mod health;
pub mod tools;

/// The admin API under `/api`
pub fn router(deployment: DeploymentImpl) -> Router {
    let api = Router::new()
        .route("/health", get(health::health_check))
        .merge(categories::router(&deployment))
        .merge(tools::router(&deployment))
        .with_state(deployment);

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
