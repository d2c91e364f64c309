// Multipart form parsing shared by the doctor and post upload handlers

use axum::{
    extract::{multipart::MultipartError, Multipart},
    http::StatusCode,
};
use std::collections::HashMap;

use crate::{services::asset_host::UploadedFile, utils::app_error::AppError};

/// Text fields plus at most one file from a multipart body
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

fn multipart_error(error: MultipartError) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::validation("Uploaded file is too large.")
    } else {
        AppError::validation(format!("Invalid multipart body: {}", error.body_text()))
    }
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    if form.file.is_some() {
                        return Err(AppError::validation("Only one file may be uploaded."));
                    }
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(multipart_error)?;
                    form.file = Some(UploadedFile {
                        file_name,
                        content_type,
                        data: data.to_vec(),
                    });
                },
                None => {
                    let value = field.text().await.map_err(multipart_error)?;
                    form.fields.insert(name, value);
                },
            }
        }

        Ok(form)
    }
}
