pub mod error;
pub mod models;
pub mod routes;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use routes::books::{create_book, delete_book, get_book, list_books, update_book, Store};
use routes::health::health_check;

pub fn app(store: Store) -> Router {
    Router::new()
        .route("/status", get(health_check))
        .route("/books/", get(list_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}
