/// API routes and handlers
pub mod landing;
pub mod middleware;
pub mod travel;
pub mod upload;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(travel::routes())
        .merge(upload::routes())
        .merge(landing::routes())
}
