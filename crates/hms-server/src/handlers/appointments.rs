//! Appointment handlers.

use super::{delete_scoped, list_page, load_scoped, missing_field, update_scoped};
use crate::error::{invalid_transition, ApiError, ApiResult};
use crate::middleware::auth::Auth;
use crate::models::{
    fields, wire, Appointment, AppointmentQuery, AppointmentStatus, CreateAppointmentRequest,
    RescheduleAppointmentRequest, UpdateAppointmentStatusRequest, DEFAULT_DURATION_MINUTES,
};
use crate::request::{parse_id, ApiQuery, ListParams, ValidatedJson};
use crate::response::{created, ok, with_message};
use crate::scope::{scope_for, Resource};
use crate::services::{book, booked_filter, check_slot, ensure_user};
use crate::state::AppState;
use crate::store::{DocumentMeta, SortOrder};
use axum::{
    extract::{Path, State},
    response::Response,
};
use hms_common_core::{AppointmentId, Role};
use tracing::info;

const LABEL: &str = "Appointment";

/// `GET /appointments`
pub async fn list(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(query): ApiQuery<AppointmentQuery>,
) -> ApiResult<Response> {
    let filter = scope_for(Resource::Appointment, &user, params.include_inactive)?
        .eq_opt(fields::STATUS, query.status.as_ref().map(wire))
        .between(fields::SCHEDULED_AT, query.from, query.to)
        .eq_opt(fields::PATIENT_ID, query.patient_id)
        .eq_opt(fields::DOCTOR_ID, query.doctor_id);
    list_page(&*state.appointments, &filter, &params, SortOrder::NewestFirst).await
}

/// `POST /appointments`: patients always book for themselves.
pub async fn create(
    State(state): State<AppState>,
    Auth(user): Auth,
    ValidatedJson(req): ValidatedJson<CreateAppointmentRequest>,
) -> ApiResult<Response> {
    let patient_id = match user.role {
        Role::Patient => user.id,
        _ => req.patient_id.ok_or_else(|| missing_field("patientId"))?,
    };
    ensure_user(&*state.users, patient_id, Role::Patient, "patientId").await?;
    ensure_user(&*state.users, req.doctor_id, Role::Doctor, "doctorId").await?;

    let duration = req.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    let appointment = Appointment {
        id: AppointmentId::new(),
        patient_id,
        doctor_id: req.doctor_id,
        scheduled_at: req.scheduled_at,
        duration_minutes: duration,
        reason: req.reason.trim().to_string(),
        notes: req.notes,
        status: AppointmentStatus::Scheduled,
        created_by: user.id,
        meta: DocumentMeta::new(),
    };
    let appointment = book(&*state.appointments, appointment).await?;
    info!(
        appointment_id = %appointment.id,
        doctor_id = %appointment.doctor_id,
        patient_id = %appointment.patient_id,
        "Appointment booked"
    );
    Ok(created(appointment, "Appointment booked"))
}

/// `GET /appointments/:id`
pub async fn get(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: AppointmentId = parse_id(&id, "appointment")?;
    let appointment =
        load_scoped(&*state.appointments, Resource::Appointment, &user, id.as_uuid(), LABEL).await?;
    Ok(ok(appointment))
}

/// `PATCH /appointments/:id/status`
pub async fn update_status(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateAppointmentStatusRequest>,
) -> ApiResult<Response> {
    let id: AppointmentId = parse_id(&id, "appointment")?;
    let mut previous = None;
    let appointment = update_scoped(
        &*state.appointments,
        Resource::Appointment,
        &user,
        id.as_uuid(),
        LABEL,
        None,
        |appointment: &mut Appointment, _: &[Appointment]| {
            if !appointment.status.can_transition_to(req.status) {
                return Err(invalid_transition(appointment.status, req.status));
            }
            previous = Some(appointment.status);
            appointment.status = req.status;
            if req.notes.is_some() {
                appointment.notes = req.notes;
            }
            Ok(())
        },
    )
    .await?;
    info!(
        appointment_id = %appointment.id,
        from = ?previous,
        to = %appointment.status,
        changed_by = %user.id,
        "Appointment status changed"
    );
    Ok(with_message(appointment, "Appointment status updated"))
}

/// `PUT /appointments/:id`: reschedule an appointment that still holds a slot.
pub async fn reschedule(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<RescheduleAppointmentRequest>,
) -> ApiResult<Response> {
    let id: AppointmentId = parse_id(&id, "appointment")?;
    let current =
        load_scoped(&*state.appointments, Resource::Appointment, &user, id.as_uuid(), LABEL).await?;
    let booked = booked_filter(current.doctor_id);

    let appointment = update_scoped(
        &*state.appointments,
        Resource::Appointment,
        &user,
        id.as_uuid(),
        LABEL,
        Some(&booked),
        |appointment: &mut Appointment, others: &[Appointment]| {
            if !appointment.status.is_blocking() {
                return Err(ApiError::InvalidTransition(format!(
                    "Cannot reschedule a {} appointment",
                    appointment.status
                )));
            }
            let duration = req.duration_minutes.unwrap_or(appointment.duration_minutes);
            check_slot(others, req.scheduled_at, duration)?;

            appointment.scheduled_at = req.scheduled_at;
            appointment.duration_minutes = duration;
            if let Some(reason) = req.reason {
                appointment.reason = reason.trim().to_string();
            }
            if req.notes.is_some() {
                appointment.notes = req.notes;
            }
            Ok(())
        },
    )
    .await?;
    info!(appointment_id = %appointment.id, changed_by = %user.id, "Appointment rescheduled");
    Ok(with_message(appointment, "Appointment rescheduled"))
}

/// `DELETE /appointments/:id`
pub async fn delete(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: AppointmentId = parse_id(&id, "appointment")?;
    delete_scoped(&*state.appointments, Resource::Appointment, &user, id.as_uuid(), LABEL).await?;
    Ok(with_message(serde_json::Value::Null, "Appointment deleted"))
}
