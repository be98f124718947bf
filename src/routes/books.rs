use crate::error::ApiError;
use crate::models::book::{Book, BookFields, BookPayload};
use crate::models::storage::BookStore;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use tracing::info;

pub type Store = Arc<dyn BookStore + Send + Sync>;

/// The item routes only match bare positive integers, like the original
/// `[0-9]+` path converter; anything else behaves like an unmatched route
/// (404), not a validation failure. Digits only, so "+5" does not match.
fn parse_book_id(raw: &str) -> Result<i64, ApiError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::NotFound);
    }
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::NotFound),
    }
}

/// Unwraps the JSON body and runs field validation, so nothing touches the
/// store while the payload can still be rejected. Missing keys are not a
/// deserialization failure; they come back from `validate` enumerated
/// alongside blank and over-length fields.
fn validated_fields(
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<BookFields, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    payload.validate().map_err(ApiError::Validation)
}

pub async fn list_books(State(store): State<Store>) -> Result<Json<Vec<Book>>, ApiError> {
    let books = store.list().await?;
    Ok(Json(books))
}

pub async fn create_book(
    State(store): State<Store>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let fields = validated_fields(payload)?;
    let book = store.create(fields).await?;
    info!("Created book {}", book.id);
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn get_book(
    Path(id): Path<String>,
    State(store): State<Store>,
) -> Result<Json<Book>, ApiError> {
    let id = parse_book_id(&id)?;
    let book = store.get(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(book))
}

pub async fn update_book(
    Path(id): Path<String>,
    State(store): State<Store>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Json<Book>, ApiError> {
    let id = parse_book_id(&id)?;
    let fields = validated_fields(payload)?;
    let book = store.update(id, fields).await?.ok_or(ApiError::NotFound)?;
    info!("Updated book {}", book.id);
    Ok(Json(book))
}

pub async fn delete_book(
    Path(id): Path<String>,
    State(store): State<Store>,
) -> Result<StatusCode, ApiError> {
    let id = parse_book_id(&id)?;
    if !store.delete(id).await? {
        return Err(ApiError::NotFound);
    }
    info!("Deleted book {}", id);
    Ok(StatusCode::NO_CONTENT)
}
