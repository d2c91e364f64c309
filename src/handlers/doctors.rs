// Doctor listing handlers

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, Multipart, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;

use crate::{
    app::AppState,
    handlers::upload::MultipartForm,
    models::{DoctorListResponse, StatusMessage},
    services::DoctorService,
    utils::app_error::AppResult,
};

#[derive(Debug, Default, Deserialize)]
pub struct DoctorSearchQuery {
    pub query: Option<String>,
}

/// `GET /doctor/{page}?query=`
pub async fn list_doctors(
    State(state): State<AppState>,
    Path(page): Path<String>,
    search: Result<Query<DoctorSearchQuery>, QueryRejection>,
) -> AppResult<Json<DoctorListResponse>> {
    let Query(search) = search?;
    let listing = DoctorService::new(&state)
        .list(&page, search.query.as_deref())
        .await?;
    Ok(Json(listing))
}

pub async fn create_doctor(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<impl IntoResponse> {
    let form = MultipartForm::read(multipart?).await?;
    DoctorService::new(&state)
        .create(&form.fields, form.file)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StatusMessage::success("Doctor added successfully.")),
    ))
}

pub async fn update_doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<StatusMessage>> {
    let form = MultipartForm::read(multipart?).await?;
    DoctorService::new(&state)
        .update(&id, &form.fields, form.file)
        .await?;

    Ok(Json(StatusMessage::success("Doctor updated successfully.")))
}

pub async fn delete_doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<StatusMessage>> {
    DoctorService::new(&state).delete(&id).await?;
    Ok(Json(StatusMessage::success("Doctor deleted successfully.")))
}
