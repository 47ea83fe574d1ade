use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use registry::{
    Envelope, SchoolInput,
    models::{Created, RatingRequest},
    rating::{InvalidRating, parse_rating},
    search::matches,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    state::State as AppState,
    utils::{parse_id, validate},
};

type Shared = State<Arc<AppState>>;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    search: Option<String>,
}

pub async fn list_schools(
    State(state): Shared,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut listings = state.store.list().await?;

    if let Some(term) = query.search.as_deref() {
        listings.retain(|listing| matches(&listing.school, term));
    }

    Ok(Json(Envelope::data(listings)))
}

pub async fn create_school(
    State(state): Shared,
    payload: Result<Json<SchoolInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = payload.map_err(malformed)?;
    let clean = validate(&input)?;

    let id = state.store.create(&clean).await?;
    info!("Registered school {id}: {}", clean.name);

    Ok((StatusCode::CREATED, Json(Envelope::data(Created { id }))))
}

pub async fn get_school(
    State(state): Shared,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let school = state.store.get(id).await?.ok_or(AppError::NotFound)?;

    Ok(Json(Envelope::data(school)))
}

pub async fn update_school(
    State(state): Shared,
    Path(id): Path<String>,
    payload: Result<Json<SchoolInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let Json(input) = payload.map_err(malformed)?;
    let clean = validate(&input)?;

    if !state.store.update(id, &clean).await? {
        return Err(AppError::NotFound);
    }

    Ok(Json(Envelope::message("School updated successfully")))
}

pub async fn delete_school(
    State(state): Shared,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    if !state.store.delete(id).await? {
        return Err(AppError::NotFound);
    }
    info!("Deleted school {id}");

    Ok(Json(Envelope::message("School deleted successfully")))
}

pub async fn rate_school(
    State(state): Shared,
    Path(id): Path<String>,
    payload: Result<Json<RatingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    // an absent or unreadable body is just a missing rating
    let rating = match payload {
        Ok(Json(request)) => parse_rating(&request.rating)?,
        Err(rejection) => {
            debug!("Unreadable rating body: {rejection}");
            return Err(InvalidRating.into());
        }
    };

    let summary = state
        .store
        .rate(id, rating)
        .await?
        .ok_or(AppError::NotFound)?;
    debug!(
        "School {id} rated {rating}, now {} over {}",
        summary.avg_rating, summary.rating_count
    );

    Ok((
        StatusCode::CREATED,
        Json(Envelope::data(summary).with_message("Rating submitted")),
    ))
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

pub async fn health_handler(State(state): Shared) -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "version": version })),
        ),
        Err(e) => {
            warn!("Health check failed: {e}");

            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "version": version })),
            )
        }
    }
}

fn malformed(rejection: JsonRejection) -> AppError {
    debug!("Rejected payload: {rejection}");

    AppError::MalformedPayload
}
