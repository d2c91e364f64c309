// Doctor listings: validation, uniqueness and portrait lifecycle

use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument, warn};

use crate::{
    app::AppState,
    db::{parse_object_id, DoctorStore},
    models::{Doctor, DoctorChanges, DoctorListResponse, DoctorQuery, NewDoctor},
    services::asset_host::{
        delete_best_effort, AssetHost, AssetUpload, MediaKind, PendingAsset, UploadedFile,
    },
    utils::{
        app_error::{AppError, AppResult},
        validation::{
            is_valid_contact_number, is_valid_image_url, optional_text, parse_age, parse_page,
            required_text, trim_optional_field,
        },
    },
};

const DUPLICATE_DOCTOR: &str = "Doctor with the same name or registration number already exists.";

// =============================================================================
// FIELD VALIDATION
// =============================================================================

/// Validate the multipart fields of a new doctor; every field is required
pub fn validate_new_doctor(fields: &HashMap<String, String>) -> AppResult<NewDoctor> {
    let name = required_text(fields.get("name"), "Invalid or missing name.")?;

    let age = fields
        .get("age")
        .and_then(|age| parse_age(age))
        .ok_or_else(|| {
            AppError::validation("Invalid or missing age. Must be between 25 and 100.")
        })?;

    let specialization = required_text(
        fields.get("specialization"),
        "Invalid or missing specialization.",
    )?;
    let qualification = required_text(
        fields.get("qualification"),
        "Invalid or missing qualification.",
    )?;

    let contact_number = trim_optional_field(fields.get("contactNumber"))
        .filter(|number| is_valid_contact_number(number))
        .ok_or_else(|| {
            AppError::validation("Invalid or missing contact number. Must be a 10-digit number.")
        })?;

    let registration_number = required_text(
        fields.get("registrationNumber"),
        "Invalid or missing registration number.",
    )?;

    Ok(NewDoctor {
        name,
        age,
        specialization,
        qualification,
        contact_number,
        registration_number,
    })
}

/// Validate a partial update. Empty fields count as absent; whitespace-only fields are invalid.
pub fn validate_doctor_changes(fields: &HashMap<String, String>) -> AppResult<DoctorChanges> {
    let name = optional_text(fields.get("name"), "Invalid name.")?;

    let age = match optional_text(fields.get("age"), "Invalid age. Must be between 25 and 100.")? {
        None => None,
        Some(age) => Some(parse_age(&age).ok_or_else(|| {
            AppError::validation("Invalid age. Must be between 25 and 100.")
        })?),
    };

    let specialization = optional_text(fields.get("specialization"), "Invalid specialization.")?;
    let qualification = optional_text(fields.get("qualification"), "Invalid qualification.")?;

    let contact_message = "Invalid contact number. Must be a 10-digit number.";
    let contact_number = optional_text(fields.get("contactNumber"), contact_message)?;
    if let Some(number) = &contact_number {
        if !is_valid_contact_number(number) {
            return Err(AppError::validation(contact_message));
        }
    }

    let registration_number = optional_text(
        fields.get("registrationNumber"),
        "Invalid registration number.",
    )?;

    Ok(DoctorChanges {
        name,
        age,
        specialization,
        qualification,
        contact_number,
        registration_number,
    })
}

// =============================================================================
// SERVICE
// =============================================================================

pub struct DoctorService {
    doctors: Arc<dyn DoctorStore>,
    images: Arc<dyn AssetHost>,
}

impl DoctorService {
    pub fn new(state: &AppState) -> Self {
        Self {
            doctors: state.doctors.clone(),
            images: state.doctor_images.clone(),
        }
    }

    pub async fn list(&self, page: &str, search: Option<&str>) -> AppResult<DoctorListResponse> {
        let query = DoctorQuery {
            page: parse_page(page)?,
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        };

        let (doctors, total) = self.doctors.list_doctors(&query).await?;
        Ok(DoctorListResponse {
            doctors: doctors.into_iter().map(Into::into).collect(),
            total,
        })
    }

    /// Validate, upload the portrait, then insert. The upload is rolled back
    /// when anything after it fails.
    #[instrument(skip_all)]
    pub async fn create(
        &self,
        fields: &HashMap<String, String>,
        image: Option<UploadedFile>,
    ) -> AppResult<Doctor> {
        let new_doctor = validate_new_doctor(fields)?;
        let image = image
            .ok_or_else(|| AppError::validation("Image upload failed. No image provided."))?;
        let upload = AssetUpload::from_file(MediaKind::Image, image)?;

        let stored = self.images.upload(upload).await?;
        let pending = PendingAsset::new(self.images.as_ref(), stored);

        let inserted = self.insert_new(new_doctor, &pending.asset().url).await;
        match inserted {
            Ok(doctor) => {
                pending.commit();
                info!(doctor_id = %doctor.id, "Doctor created");
                Ok(doctor)
            },
            Err(e) => {
                pending.rollback().await;
                Err(e)
            },
        }
    }

    async fn insert_new(&self, new_doctor: NewDoctor, image_url: &str) -> AppResult<Doctor> {
        if !is_valid_image_url(image_url) {
            return Err(AppError::Upstream(format!(
                "Image host returned an unusable URL: {}",
                image_url
            )));
        }

        self.ensure_unique(
            Some(&new_doctor.name),
            Some(&new_doctor.registration_number),
            None,
        )
        .await?;

        let doctor = new_doctor.into_doctor(image_url.to_string());
        self.doctors.insert_doctor(&doctor).await?;
        Ok(doctor)
    }

    async fn ensure_unique(
        &self,
        name: Option<&str>,
        registration_number: Option<&str>,
        exclude: Option<&bson::oid::ObjectId>,
    ) -> AppResult<()> {
        match self
            .doctors
            .find_conflicting_doctor(name, registration_number, exclude)
            .await?
        {
            Some(existing) => {
                warn!(existing_id = %existing.id, "Duplicate doctor rejected");
                Err(AppError::Conflict(DUPLICATE_DOCTOR.to_string()))
            },
            None => Ok(()),
        }
    }

    async fn save(&self, doctor: &Doctor) -> AppResult<()> {
        if self.doctors.replace_doctor(doctor).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Doctor not found.".to_string()))
        }
    }

    #[instrument(skip_all, fields(doctor_id = %id))]
    pub async fn update(
        &self,
        id: &str,
        fields: &HashMap<String, String>,
        image: Option<UploadedFile>,
    ) -> AppResult<Doctor> {
        let id = parse_object_id(id)?;
        let changes = validate_doctor_changes(fields)?;
        let upload = image
            .map(|file| AssetUpload::from_file(MediaKind::Image, file))
            .transpose()?;

        if changes.is_empty() && upload.is_none() {
            return Err(AppError::validation("No changes provided."));
        }

        let mut doctor = self
            .doctors
            .find_doctor(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("Doctor not found.".to_string()))?;

        self.ensure_unique(
            changes.name.as_deref(),
            changes.registration_number.as_deref(),
            Some(&id),
        )
        .await?;

        let Some(upload) = upload else {
            changes.apply(&mut doctor, None);
            self.save(&doctor).await?;
            info!("Doctor updated");
            return Ok(doctor);
        };

        let previous_image = doctor.image_url.clone();
        let stored = self.images.upload(upload).await?;
        let pending = PendingAsset::new(self.images.as_ref(), stored);

        if !is_valid_image_url(&pending.asset().url) {
            pending.rollback().await;
            return Err(AppError::Upstream(
                "Image host returned an unusable URL".to_string(),
            ));
        }

        changes.apply(&mut doctor, Some(pending.asset().url.clone()));
        if let Err(e) = self.save(&doctor).await {
            pending.rollback().await;
            return Err(e);
        }
        pending.commit();

        // The row no longer references the old portrait
        match self.images.asset_ref_for_url(&previous_image) {
            Some(old) => delete_best_effort(self.images.as_ref(), &old).await,
            None => warn!(url = %previous_image, "Cannot locate previous image for deletion"),
        }

        info!("Doctor updated with new image");
        Ok(doctor)
    }

    #[instrument(skip_all, fields(doctor_id = %id))]
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let id = parse_object_id(id)?;

        let doctor = self.doctors.delete_doctor(&id).await?.ok_or_else(|| {
            AppError::MissingRecord("Invalid doctor ID or doctor not found.".to_string())
        })?;

        match self.images.asset_ref_for_url(&doctor.image_url) {
            Some(image) => delete_best_effort(self.images.as_ref(), &image).await,
            None => warn!(url = %doctor.image_url, "Cannot locate doctor image for deletion"),
        }

        info!("Doctor deleted");
        Ok(())
    }
}
