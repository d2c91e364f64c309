// Doctor listing model and request/response shapes

use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Doctor record as stored in the `doctors` collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub age: i32,
    pub specialization: String,
    pub qualification: String,
    pub contact_number: String,
    pub registration_number: String,
    /// Asset host URL of the portrait
    #[serde(rename = "image")]
    pub image_url: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Validated fields for a new doctor, before an image is attached
#[derive(Debug, Clone, PartialEq)]
pub struct NewDoctor {
    pub name: String,
    pub age: i32,
    pub specialization: String,
    pub qualification: String,
    pub contact_number: String,
    pub registration_number: String,
}

impl NewDoctor {
    pub fn into_doctor(self, image_url: String) -> Doctor {
        let now = DateTime::now();
        Doctor {
            id: ObjectId::new(),
            name: self.name,
            age: self.age,
            specialization: self.specialization,
            qualification: self.qualification,
            contact_number: self.contact_number,
            registration_number: self.registration_number,
            image_url,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validated partial update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoctorChanges {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub specialization: Option<String>,
    pub qualification: Option<String>,
    pub contact_number: Option<String>,
    pub registration_number: Option<String>,
}

impl DoctorChanges {
    pub fn is_empty(&self) -> bool {
        *self == DoctorChanges::default()
    }

    /// Apply the changes (and an optional new image) to a stored doctor
    pub fn apply(self, doctor: &mut Doctor, image_url: Option<String>) {
        if let Some(name) = self.name {
            doctor.name = name;
        }
        if let Some(age) = self.age {
            doctor.age = age;
        }
        if let Some(specialization) = self.specialization {
            doctor.specialization = specialization;
        }
        if let Some(qualification) = self.qualification {
            doctor.qualification = qualification;
        }
        if let Some(contact_number) = self.contact_number {
            doctor.contact_number = contact_number;
        }
        if let Some(registration_number) = self.registration_number {
            doctor.registration_number = registration_number;
        }
        if let Some(image_url) = image_url {
            doctor.image_url = image_url;
        }
        doctor.updated_at = DateTime::now();
    }
}

/// Listing filter: 1-based page plus free-text search
#[derive(Debug, Clone)]
pub struct DoctorQuery {
    pub page: u64,
    pub search: Option<String>,
}

pub const DOCTOR_PAGE_SIZE: u64 = 10;

impl DoctorQuery {
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(DOCTOR_PAGE_SIZE)
    }
}

/// Doctor as returned over the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub age: i32,
    pub specialization: String,
    pub qualification: String,
    pub contact_number: String,
    pub registration_number: String,
    pub image: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Doctor> for DoctorResponse {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id.to_hex(),
            name: doctor.name,
            age: doctor.age,
            specialization: doctor.specialization,
            qualification: doctor.qualification,
            contact_number: doctor.contact_number,
            registration_number: doctor.registration_number,
            image: doctor.image_url,
            created_at: doctor.created_at.to_chrono().to_rfc3339(),
            updated_at: doctor.updated_at.to_chrono().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DoctorListResponse {
    pub doctors: Vec<DoctorResponse>,
    pub total: u64,
}
