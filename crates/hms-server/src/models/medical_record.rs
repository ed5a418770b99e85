//! Longitudinal medical records.

use super::encounter::validate_icd10_code;
use crate::store::DocumentMeta;
use hms_common_core::{EncounterId, MedicalRecordId, UserId};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Diagnosis,
    Prescription,
    Note,
    Allergy,
    Immunization,
    Procedure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub dosage: String,
    #[validate(length(min = 1, max = 100))]
    pub frequency: String,
    #[validate(range(min = 1, max = 3650))]
    pub duration_days: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: MedicalRecordId,
    pub patient_id: UserId,
    pub doctor_id: UserId,
    pub encounter_id: Option<EncounterId>,
    pub record_type: RecordType,
    pub title: String,
    pub description: Option<String>,
    pub diagnosis_codes: Vec<String>,
    pub medications: Vec<Medication>,
    #[serde(flatten)]
    pub meta: DocumentMeta,
}

impl_document!(MedicalRecord, "medical_records");

fn validate_codes(codes: &[String]) -> Result<(), ValidationError> {
    codes.iter().try_for_each(|code| validate_icd10_code(code))
}

/// Uppercase and trim ICD-10 codes.
pub fn normalize_codes(codes: Vec<String>) -> Vec<String> {
    codes.into_iter().map(|c| c.trim().to_uppercase()).collect()
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedicalRecordRequest {
    pub patient_id: UserId,
    /// Required for admins; doctors always author as themselves.
    pub doctor_id: Option<UserId>,
    pub encounter_id: Option<EncounterId>,
    pub record_type: RecordType,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_codes"))]
    pub diagnosis_codes: Vec<String>,
    #[serde(default)]
    #[validate(nested)]
    pub medications: Vec<Medication>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedicalRecordRequest {
    pub record_type: Option<RecordType>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_codes"))]
    pub diagnosis_codes: Option<Vec<String>>,
    #[validate(nested)]
    pub medications: Option<Vec<Medication>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecordQuery {
    pub patient_id: Option<UserId>,
    pub record_type: Option<RecordType>,
}
