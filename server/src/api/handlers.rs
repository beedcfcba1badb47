//! Request handlers for the drink routes.
//!
//! Handlers only run once the route's permission gate has passed. Each one
//! performs a single store mutation at most.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path, State};
use serde::Serialize;

use super::AppState;
use super::error::ApiError;
use crate::auth::ClaimSet;
use crate::drinks::{DrinkPayload, MenuItem, NewDrink, ShortDrink};

#[derive(Debug, Serialize)]
pub struct DrinksResponse<T> {
    success: bool,
    drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    const fn ok(drinks: Vec<T>) -> Json<Self> {
        Json(Self {
            success: true,
            drinks,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    success: bool,
    delete: i64,
}

/// Parse a request body into a drink, or fail with 422.
fn new_drink(body: Result<Json<DrinkPayload>, JsonRejection>) -> Result<NewDrink, ApiError> {
    let Json(payload) = body.map_err(|rejection| {
        tracing::debug!("Rejected drink body: {rejection}");
        ApiError::Unprocessable
    })?;
    payload.into_new_drink().ok_or(ApiError::Unprocessable)
}

/// A non-integer id can never name a drink.
fn drink_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id).map_err(|_| ApiError::NotFound)
}

/// `GET /drinks`: public menu in short form.
pub async fn list_drinks(
    State(state): State<AppState>,
) -> Result<Json<DrinksResponse<ShortDrink>>, ApiError> {
    let drinks = state.store.list().await?;
    Ok(DrinksResponse::ok(drinks.iter().map(MenuItem::short).collect()))
}

/// `GET /drinks-detail`: menu in long form.
pub async fn list_drinks_detail(
    State(state): State<AppState>,
) -> Result<Json<DrinksResponse<MenuItem>>, ApiError> {
    let drinks = state.store.list().await?;
    Ok(DrinksResponse::ok(drinks))
}

/// `POST /drinks`
pub async fn create_drink(
    State(state): State<AppState>,
    Extension(claims): Extension<ClaimSet>,
    body: Result<Json<DrinkPayload>, JsonRejection>,
) -> Result<Json<DrinksResponse<MenuItem>>, ApiError> {
    let drink = new_drink(body)?;
    let created = state.store.insert(drink).await?;

    tracing::info!(
        "Drink {} '{}' created by {}",
        created.id,
        created.title,
        claims.subject
    );

    Ok(DrinksResponse::ok(vec![created]))
}

/// `PATCH /drinks/{id}`
pub async fn update_drink(
    State(state): State<AppState>,
    Extension(claims): Extension<ClaimSet>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<DrinkPayload>, JsonRejection>,
) -> Result<Json<DrinksResponse<MenuItem>>, ApiError> {
    let id = drink_id(path)?;

    // An unknown id is reported before any problem with the body.
    if state.store.get(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let drink = new_drink(body)?;

    let updated = state
        .store
        .update(id, drink)
        .await?
        .ok_or(ApiError::NotFound)?;

    tracing::info!("Drink {} updated by {}", updated.id, claims.subject);

    Ok(DrinksResponse::ok(vec![updated]))
}

/// `DELETE /drinks/{id}`
pub async fn delete_drink(
    State(state): State<AppState>,
    Extension(claims): Extension<ClaimSet>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = drink_id(path)?;

    if !state.store.delete(id).await? {
        return Err(ApiError::NotFound);
    }

    tracing::info!("Drink {} deleted by {}", id, claims.subject);

    Ok(Json(DeleteResponse {
        success: true,
        delete: id,
    }))
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
