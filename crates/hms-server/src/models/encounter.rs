//! Clinical encounters.

use crate::store::DocumentMeta;
use chrono::{DateTime, Utc};
use hms_common_core::{AppointmentId, EncounterId, UserId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Shape of an ICD-10 code such as `J45` or `E11.65`.
pub static ICD10_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-TV-Z][0-9][0-9AB](\.[0-9A-TV-Z]{1,4})?$").expect("valid ICD-10 pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterType {
    Outpatient,
    Inpatient,
    Emergency,
    Telehealth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    #[validate(range(min = 25.0, max = 45.0))]
    pub temperature_c: Option<f64>,
    #[validate(range(min = 20, max = 250))]
    pub heart_rate: Option<u32>,
    #[validate(range(min = 4, max = 80))]
    pub respiratory_rate: Option<u32>,
    #[validate(range(min = 50, max = 260))]
    pub systolic: Option<u32>,
    #[validate(range(min = 30, max = 160))]
    pub diastolic: Option<u32>,
    #[validate(range(min = 50.0, max = 100.0))]
    pub oxygen_saturation: Option<f64>,
    #[validate(range(min = 0.2, max = 500.0))]
    pub weight_kg: Option<f64>,
    #[validate(range(min = 20.0, max = 260.0))]
    pub height_cm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub code: String,
    pub description: String,
}

/// Validator hook rejecting strings that are not ICD-10 shaped.
pub fn validate_icd10_code(code: &str) -> Result<(), ValidationError> {
    if ICD10_CODE.is_match(code.trim()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("icd10");
        err.message = Some(Cow::from("must be an ICD-10 code such as J45.909"));
        Err(err)
    }
}

/// Validator hook for a diagnosis list.
pub fn validate_diagnoses(diagnoses: &[Diagnosis]) -> Result<(), ValidationError> {
    for diagnosis in diagnoses {
        validate_icd10_code(&diagnosis.code)?;
        let description = diagnosis.description.trim();
        if description.is_empty() || description.len() > 300 {
            let mut err = ValidationError::new("length");
            err.message = Some(Cow::from("diagnosis description must be 1 to 300 characters"));
            return Err(err);
        }
    }
    Ok(())
}

/// Uppercase and trim each diagnosis code.
pub fn normalize_diagnoses(diagnoses: Vec<Diagnosis>) -> Vec<Diagnosis> {
    diagnoses
        .into_iter()
        .map(|d| Diagnosis {
            code: d.code.trim().to_uppercase(),
            description: d.description.trim().to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub id: EncounterId,
    pub patient_id: UserId,
    pub doctor_id: UserId,
    pub appointment_id: Option<AppointmentId>,
    pub encounter_type: EncounterType,
    pub chief_complaint: String,
    pub vitals: Option<Vitals>,
    pub diagnoses: Vec<Diagnosis>,
    pub notes: Option<String>,
    pub status: EncounterStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub meta: DocumentMeta,
}

impl_document!(Encounter, "encounters");

impl Encounter {
    pub fn is_open(&self) -> bool {
        self.status == EncounterStatus::Open
    }

    pub fn close(&mut self) {
        self.status = EncounterStatus::Closed;
        self.ended_at = Some(Utc::now());
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEncounterRequest {
    pub patient_id: UserId,
    /// Required for admins; doctors always record as themselves.
    pub doctor_id: Option<UserId>,
    pub appointment_id: Option<AppointmentId>,
    pub encounter_type: EncounterType,
    #[validate(length(min = 1, max = 1000))]
    pub chief_complaint: String,
    #[validate(nested)]
    pub vitals: Option<Vitals>,
    #[serde(default)]
    #[validate(custom(function = "validate_diagnoses"))]
    pub diagnoses: Vec<Diagnosis>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEncounterRequest {
    pub encounter_type: Option<EncounterType>,
    #[validate(length(min = 1, max = 1000))]
    pub chief_complaint: Option<String>,
    #[validate(nested)]
    pub vitals: Option<Vitals>,
    #[validate(custom(function = "validate_diagnoses"))]
    pub diagnoses: Option<Vec<Diagnosis>>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterQuery {
    pub status: Option<EncounterStatus>,
    pub patient_id: Option<UserId>,
}
