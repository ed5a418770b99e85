//! Doctor availability.

use crate::error::{ApiError, ApiResult};
use crate::models::{fields, wire, Appointment, AppointmentStatus};
use crate::store::{Check, Filter, Rejection, Repository};
use chrono::{DateTime, Utc};
use hms_common_core::UserId;

/// Active appointments that hold one of the doctor's slots.
pub fn booked_filter(doctor_id: UserId) -> Filter {
    Filter::active()
        .eq(fields::DOCTOR_ID, doctor_id)
        .any_of(fields::STATUS, AppointmentStatus::BLOCKING.iter().map(wire))
}

/// Fail with `SLOT_UNAVAILABLE` if any of `booked` intersects
/// `[start, start + minutes)`.
pub fn check_slot(booked: &[Appointment], start: DateTime<Utc>, minutes: u32) -> ApiResult<()> {
    match booked.iter().find(|a| a.status.is_blocking() && a.overlaps(start, minutes)) {
        Some(existing) => Err(ApiError::SlotUnavailable(format!(
            "Doctor already has an appointment from {} to {}",
            existing.scheduled_at.to_rfc3339(),
            existing.ends_at().to_rfc3339()
        ))),
        None => Ok(()),
    }
}

/// Store a new appointment if its doctor is free, checking and inserting as
/// one step so concurrent bookings cannot both take the slot.
pub async fn book(
    appointments: &dyn Repository<Appointment>,
    appointment: Appointment,
) -> ApiResult<Appointment> {
    let start = appointment.scheduled_at;
    let minutes = appointment.duration_minutes;
    let check: Check<'_, Appointment> = Box::new(move |booked: &[Appointment]| {
        check_slot(booked, start, minutes).map_err(Rejection::from)
    });
    let peers = booked_filter(appointment.doctor_id);
    Ok(appointments.insert_checked(appointment, &peers, check).await?)
}
