//! Clinical encounter handlers.

use super::{acting_doctor, delete_scoped, list_page, load_scoped, update_scoped};
use crate::error::{invalid_reference, ApiError, ApiResult};
use crate::middleware::auth::Auth;
use crate::models::{
    fields, normalize_diagnoses, wire, CreateEncounterRequest, Encounter, EncounterQuery,
    EncounterStatus, UpdateEncounterRequest,
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
use chrono::Utc;
use hms_common_core::{EncounterId, Role};
use tracing::info;

const LABEL: &str = "Encounter";

/// `GET /encounters`
pub async fn list(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(query): ApiQuery<EncounterQuery>,
) -> ApiResult<Response> {
    let filter = scope_for(Resource::Encounter, &user, params.include_inactive)?
        .eq_opt(fields::STATUS, query.status.as_ref().map(wire))
        .eq_opt(fields::PATIENT_ID, query.patient_id);
    list_page(&*state.encounters, &filter, &params, SortOrder::NewestFirst).await
}

/// `POST /encounters`
pub async fn create(
    State(state): State<AppState>,
    Auth(user): Auth,
    ValidatedJson(req): ValidatedJson<CreateEncounterRequest>,
) -> ApiResult<Response> {
    let doctor_id = acting_doctor(&user, req.doctor_id)?;
    ensure_user(&*state.users, req.patient_id, Role::Patient, "patientId").await?;
    ensure_user(&*state.users, doctor_id, Role::Doctor, "doctorId").await?;

    if let Some(appointment_id) = req.appointment_id {
        let appointment =
            ensure_document(&*state.appointments, appointment_id.as_uuid(), "appointmentId").await?;
        if appointment.patient_id != req.patient_id {
            return Err(invalid_reference(
                "appointmentId",
                "appointment belongs to a different patient",
            ));
        }
    }

    let encounter = Encounter {
        id: EncounterId::new(),
        patient_id: req.patient_id,
        doctor_id,
        appointment_id: req.appointment_id,
        encounter_type: req.encounter_type,
        chief_complaint: req.chief_complaint.trim().to_string(),
        vitals: req.vitals,
        diagnoses: normalize_diagnoses(req.diagnoses),
        notes: req.notes,
        status: EncounterStatus::Open,
        started_at: req.started_at.unwrap_or_else(Utc::now),
        ended_at: None,
        meta: DocumentMeta::new(),
    };
    let encounter = state.encounters.insert(encounter).await?;
    info!(
        encounter_id = %encounter.id,
        doctor_id = %encounter.doctor_id,
        patient_id = %encounter.patient_id,
        "Encounter opened"
    );
    Ok(created(encounter, "Encounter created"))
}

/// `GET /encounters/:id`
pub async fn get(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: EncounterId = parse_id(&id, "encounter")?;
    let encounter =
        load_scoped(&*state.encounters, Resource::Encounter, &user, id.as_uuid(), LABEL).await?;
    Ok(ok(encounter))
}

/// `PUT /encounters/:id`: open encounters only.
pub async fn update(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateEncounterRequest>,
) -> ApiResult<Response> {
    let id: EncounterId = parse_id(&id, "encounter")?;
    let encounter = update_scoped(
        &*state.encounters,
        Resource::Encounter,
        &user,
        id.as_uuid(),
        LABEL,
        None,
        |encounter: &mut Encounter, _: &[Encounter]| {
            if !encounter.is_open() {
                return Err(ApiError::EncounterClosed);
            }
            if let Some(encounter_type) = req.encounter_type {
                encounter.encounter_type = encounter_type;
            }
            if let Some(complaint) = req.chief_complaint {
                encounter.chief_complaint = complaint.trim().to_string();
            }
            if req.vitals.is_some() {
                encounter.vitals = req.vitals;
            }
            if let Some(diagnoses) = req.diagnoses {
                encounter.diagnoses = normalize_diagnoses(diagnoses);
            }
            if req.notes.is_some() {
                encounter.notes = req.notes;
            }
            Ok(())
        },
    )
    .await?;
    Ok(with_message(encounter, "Encounter updated"))
}

/// `POST /encounters/:id/close`
pub async fn close(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: EncounterId = parse_id(&id, "encounter")?;
    let encounter = update_scoped(
        &*state.encounters,
        Resource::Encounter,
        &user,
        id.as_uuid(),
        LABEL,
        None,
        |encounter: &mut Encounter, _: &[Encounter]| {
            if !encounter.is_open() {
                return Err(ApiError::EncounterClosed);
            }
            encounter.close();
            Ok(())
        },
    )
    .await?;
    info!(encounter_id = %encounter.id, closed_by = %user.id, "Encounter closed");
    Ok(with_message(encounter, "Encounter closed"))
}

/// `DELETE /encounters/:id`
pub async fn delete(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: EncounterId = parse_id(&id, "encounter")?;
    delete_scoped(&*state.encounters, Resource::Encounter, &user, id.as_uuid(), LABEL).await?;
    Ok(with_message(serde_json::Value::Null, "Encounter deleted"))
}
