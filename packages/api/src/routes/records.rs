//! Record CRUD handlers. Ownership checks live in [`RecordService`].

use axum::extract::{FromRequest, Path, Request, State};
use axum::http::StatusCode;
use axum::Json;
use store::{PublicRecord, Record};

use super::AppState;
use crate::auth::Identity;
use crate::error::ApiError;
use crate::models::MessageResponse;
use crate::records::{parse_record_id, RecordForm, UploadedFile};

async fn store_photo(state: &AppState, photo: Option<UploadedFile>) -> Result<Option<String>, ApiError> {
    match photo {
        Some(file) => Ok(Some(state.uploads.save(&file).await?)),
        None => Ok(None),
    }
}

pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    form: RecordForm,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let (input, photo) = form.into_new()?;
    let photo_ref = store_photo(&state, photo).await?;
    let record = state.records.create(&identity, input, photo_ref).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_owned(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Record>>, ApiError> {
    Ok(Json(state.records.list_owned(&identity).await?))
}

pub async fn list_public(State(state): State<AppState>) -> Result<Json<Vec<PublicRecord>>, ApiError> {
    Ok(Json(state.records.list_public().await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Record>, ApiError> {
    let id = parse_record_id(&id)?;
    Ok(Json(state.records.get(&identity, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    request: Request,
) -> Result<Json<Record>, ApiError> {
    let id = parse_record_id(&id)?;

    // Ownership is settled before the body is read or anything is written to disk.
    state.records.get_for_update(&identity, id).await?;
    let form = RecordForm::from_request(request, &state).await?;
    let (changes, photo) = form.into_changes()?;
    let photo_ref = store_photo(&state, photo).await?;

    Ok(Json(
        state.records.update(&identity, id, changes, photo_ref).await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_record_id(&id)?;
    state.records.delete(&identity, id).await?;
    Ok(Json(MessageResponse::new("Record deleted")))
}
