//! Medical record handlers.

use super::{acting_doctor, delete_scoped, list_page, load_scoped, update_scoped};
use crate::error::{invalid_reference, ApiResult};
use crate::middleware::auth::Auth;
use crate::models::{
    fields, normalize_codes, wire, CreateMedicalRecordRequest, MedicalRecord, MedicalRecordQuery,
    UpdateMedicalRecordRequest,
};
use crate::request::{parse_id, ApiQuery, ListParams, ValidatedJson};
use crate::response::{created, ok, with_message};
use crate::scope::{scope_for, Resource};
use crate::services::{ensure_document, ensure_user};
use crate::state::AppState;
use crate::store::{DocumentMeta, SortOrder};
use axum::{
    extract::{Path, State},
    response::Response,
};
use hms_common_core::{MedicalRecordId, Role};
use tracing::info;

const LABEL: &str = "Medical record";

/// `GET /medical-records`
pub async fn list(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(query): ApiQuery<MedicalRecordQuery>,
) -> ApiResult<Response> {
    let filter = scope_for(Resource::MedicalRecord, &user, params.include_inactive)?
        .eq_opt(fields::PATIENT_ID, query.patient_id)
        .eq_opt(fields::RECORD_TYPE, query.record_type.as_ref().map(wire));
    list_page(&*state.medical_records, &filter, &params, SortOrder::NewestFirst).await
}

/// `POST /medical-records`
pub async fn create(
    State(state): State<AppState>,
    Auth(user): Auth,
    ValidatedJson(req): ValidatedJson<CreateMedicalRecordRequest>,
) -> ApiResult<Response> {
    let doctor_id = acting_doctor(&user, req.doctor_id)?;
    ensure_user(&*state.users, req.patient_id, Role::Patient, "patientId").await?;
    ensure_user(&*state.users, doctor_id, Role::Doctor, "doctorId").await?;

    if let Some(encounter_id) = req.encounter_id {
        let encounter =
            ensure_document(&*state.encounters, encounter_id.as_uuid(), "encounterId").await?;
        if encounter.patient_id != req.patient_id {
            return Err(invalid_reference(
                "encounterId",
                "encounter belongs to a different patient",
            ));
        }
    }

    let record = MedicalRecord {
        id: MedicalRecordId::new(),
        patient_id: req.patient_id,
        doctor_id,
        encounter_id: req.encounter_id,
        record_type: req.record_type,
        title: req.title.trim().to_string(),
        description: req.description,
        diagnosis_codes: normalize_codes(req.diagnosis_codes),
        medications: req.medications,
        meta: DocumentMeta::new(),
    };
    let record = state.medical_records.insert(record).await?;
    info!(
        record_id = %record.id,
        doctor_id = %record.doctor_id,
        patient_id = %record.patient_id,
        "Medical record created"
    );
    Ok(created(record, "Medical record created"))
}

/// `GET /medical-records/:id`
pub async fn get(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: MedicalRecordId = parse_id(&id, "medical record")?;
    let record = load_scoped(
        &*state.medical_records,
        Resource::MedicalRecord,
        &user,
        id.as_uuid(),
        LABEL,
    )
    .await?;
    Ok(ok(record))
}

/// `PUT /medical-records/:id`
pub async fn update(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateMedicalRecordRequest>,
) -> ApiResult<Response> {
    let id: MedicalRecordId = parse_id(&id, "medical record")?;
    let record = update_scoped(
        &*state.medical_records,
        Resource::MedicalRecord,
        &user,
        id.as_uuid(),
        LABEL,
        None,
        |record: &mut MedicalRecord, _: &[MedicalRecord]| {
            if let Some(record_type) = req.record_type {
                record.record_type = record_type;
            }
            if let Some(title) = req.title {
                record.title = title.trim().to_string();
            }
            if req.description.is_some() {
                record.description = req.description;
            }
            if let Some(codes) = req.diagnosis_codes {
                record.diagnosis_codes = normalize_codes(codes);
            }
            if let Some(medications) = req.medications {
                record.medications = medications;
            }
            Ok(())
        },
    )
    .await?;
    Ok(with_message(record, "Medical record updated"))
}

/// `DELETE /medical-records/:id`
pub async fn delete(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: MedicalRecordId = parse_id(&id, "medical record")?;
    delete_scoped(
        &*state.medical_records,
        Resource::MedicalRecord,
        &user,
        id.as_uuid(),
        LABEL,
    )
    .await?;
    Ok(with_message(serde_json::Value::Null, "Medical record deleted"))
}
