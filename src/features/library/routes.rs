use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::library::handlers;
use crate::features::library::services::LibraryService;

/// Create routes for the library feature
///
/// Note: This feature requires authentication
pub fn routes(service: Arc<LibraryService>) -> Router {
    Router::new()
        .route(
            "/api/library/backups",
            post(handlers::create_backup).get(handlers::list_backups),
        )
        .route(
            "/api/library/backups/{id}",
            axum::routing::delete(handlers::delete_backup),
        )
        .route(
            "/api/library/backups/{id}/restore",
            post(handlers::restore_backup),
        )
        .route(
            "/api/library/files",
            post(handlers::create_file).get(handlers::list_files),
        )
        .route(
            "/api/library/files/{id}",
            get(handlers::get_file)
                .patch(handlers::update_file)
                .delete(handlers::delete_file),
        )
        .with_state(service)
}
