/// Travel data and unlock-time endpoints
use crate::{context::AppContext, error::TabiResult};
use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};

/// Build travel data routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/travel-data", get(travel_data))
        .route("/api/unlock-time", get(unlock_time))
}

/// Full itinerary document, exactly as stored
async fn travel_data(State(ctx): State<AppContext>) -> TabiResult<Json<Value>> {
    Ok(Json(ctx.travel_store.read().await?))
}

/// Configured site unlock instant
async fn unlock_time(State(ctx): State<AppContext>) -> Json<Value> {
    Json(json!({
        "unlockTime": ctx.config.service.unlock_time,
    }))
}
