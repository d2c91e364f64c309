// Promotional post handlers

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, rejection::QueryRejection, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::{
    app::AppState,
    handlers::upload::MultipartForm,
    models::{FileTypeQuery, PostIdQuery, PostListResponse, StatusMessage, UpdatePostRequest},
    services::PostService,
    utils::app_error::{AppError, AppResult},
};

pub async fn list_posts(State(state): State<AppState>) -> AppResult<Json<PostListResponse>> {
    let posts = PostService::new(&state).list().await?;
    Ok(Json(PostListResponse {
        posts: posts.into_iter().map(Into::into).collect(),
    }))
}

/// `POST /adminPost?fileType=image|video`
pub async fn upload_post(
    State(state): State<AppState>,
    query: Result<Query<FileTypeQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(query) = query?;
    let form = MultipartForm::read(multipart?).await?;
    PostService::new(&state)
        .upload(query.file_type.as_deref(), &form.fields, form.file)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StatusMessage::success("Post uploaded successfully.")),
    ))
}

/// Parse a patch body. An absent body is an empty patch.
fn parse_patch(body: &Bytes) -> AppResult<UpdatePostRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(UpdatePostRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::validation(format!("Invalid post update: {}", e)))
}

/// `PATCH /adminPost?postId=`
pub async fn update_post(
    State(state): State<AppState>,
    query: Result<Query<PostIdQuery>, QueryRejection>,
    body: Bytes,
) -> AppResult<Json<StatusMessage>> {
    let Query(query) = query?;
    let patch = parse_patch(&body)?;
    PostService::new(&state)
        .update(query.post_id.as_deref(), patch)
        .await?;

    Ok(Json(StatusMessage::success("Post updated successfully.")))
}

/// `DELETE /adminPost?postId=`
pub async fn delete_post(
    State(state): State<AppState>,
    query: Result<Query<PostIdQuery>, QueryRejection>,
) -> AppResult<Json<StatusMessage>> {
    let Query(query) = query?;
    PostService::new(&state)
        .delete(query.post_id.as_deref())
        .await?;

    Ok(Json(StatusMessage::success("Post deleted successfully.")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_body_is_empty_patch() {
        assert!(parse_patch(&Bytes::new()).unwrap().is_empty());
        assert!(parse_patch(&Bytes::from_static(b"  \n")).unwrap().is_empty());
    }

    #[test]
    fn test_patch_fields_parsed() {
        let patch = parse_patch(&Bytes::from_static(
            br#"{"title":"Monsoon camp","hashTags":["rain"],"status":"Hidden"}"#,
        ))
        .unwrap();
        assert_eq!(patch.title.as_deref(), Some("Monsoon camp"));
        assert_eq!(patch.hash_tags, Some(vec!["rain".to_string()]));
    }

    #[test]
    fn test_content_not_patchable() {
        let err = parse_patch(&Bytes::from_static(br#"{"content":{"url":"x"}}"#)).unwrap_err();
        assert!(err.to_string().starts_with("Invalid post update"));
    }
}
