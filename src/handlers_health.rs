use serde_json::json;
use std::convert::Infallible;
use warp::{reject, Filter, Rejection, Reply};

use crate::db::DbPool;
use crate::pipeline::GalleryPipeline;
use crate::warp_helpers::{with_db, with_pipeline, DatabaseError};

pub async fn health_check() -> Result<impl Reply, Infallible> {
    Ok(warp::reply::json(&json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Readiness body: store status plus whether collection links can be
/// expanded and in which strategy order.
fn readiness_report(pipeline: &GalleryPipeline) -> serde_json::Value {
    let strategies: Vec<&str> = pipeline
        .policy()
        .strategies
        .iter()
        .map(|strategy| strategy.as_str())
        .collect();

    json!({
        "status": "ready",
        "database": "connected",
        "external_collections": pipeline.external_resolution_enabled(),
        "resolution_strategies": strategies,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })
}

pub async fn ready_check(
    db_pool: DbPool,
    pipeline: GalleryPipeline,
) -> Result<impl Reply, Rejection> {
    // acquire() checks if the pool can provide a connection
    match db_pool.acquire().await {
        Ok(_) => Ok(warp::reply::json(&readiness_report(&pipeline))),
        Err(e) => {
            log::error!("Album store connection failed: {}", e);
            Err(reject::custom(DatabaseError {
                message: "Album store connection failed".to_string(),
            }))
        }
    }
}

pub fn build_health_routes(
    db_pool: DbPool,
    pipeline: GalleryPipeline,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health_check);

    let ready = warp::path("ready")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_db(db_pool))
        .and(with_pipeline(pipeline))
        .and_then(ready_check);

    health.or(ready)
}
