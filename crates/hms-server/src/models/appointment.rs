//! Appointments between a patient and a doctor.

use crate::store::DocumentMeta;
use chrono::{DateTime, Datelike, Duration, Utc};
use hms_common_core::{AppointmentId, UserId};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use validator::{Validate, ValidationError};

pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Years an appointment may be booked in.
const BOOKABLE_YEARS: std::ops::RangeInclusive<i32> = 1970..=9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Whether an appointment in this status holds the doctor's time slot.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Confirmed)
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Scheduled, Confirmed | Completed | Cancelled | NoShow)
                | (Confirmed, Completed | Cancelled | NoShow)
        )
    }

    pub const BLOCKING: [AppointmentStatus; 2] = [Self::Scheduled, Self::Confirmed];
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: UserId,
    pub doctor_id: UserId,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub reason: String,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_by: UserId,
    #[serde(flatten)]
    pub meta: DocumentMeta,
}

impl_document!(Appointment, "appointments");

impl Appointment {
    pub fn ends_at(&self) -> DateTime<Utc> {
        slot_end(self.scheduled_at, self.duration_minutes)
    }

    /// Whether this appointment's slot intersects `[start, start + minutes)`.
    pub fn overlaps(&self, start: DateTime<Utc>, minutes: u32) -> bool {
        self.scheduled_at < slot_end(start, minutes) && start < self.ends_at()
    }
}

/// End of a slot, clamped to the latest representable instant.
fn slot_end(start: DateTime<Utc>, minutes: u32) -> DateTime<Utc> {
    start
        .checked_add_signed(Duration::minutes(i64::from(minutes)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Validator hook keeping `scheduledAt` within bookable years.
fn validate_scheduled_at(at: &DateTime<Utc>) -> Result<(), ValidationError> {
    if BOOKABLE_YEARS.contains(&at.year()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("range");
        err.message = Some(Cow::from("must fall between the years 1970 and 9999"));
        Err(err)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    /// Ignored for patients, who always book for themselves.
    pub patient_id: Option<UserId>,
    pub doctor_id: UserId,
    #[validate(custom(function = "validate_scheduled_at"))]
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 5, max = 480))]
    pub duration_minutes: Option<u32>,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleAppointmentRequest {
    #[validate(custom(function = "validate_scheduled_at"))]
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 5, max = 480))]
    pub duration_minutes: Option<u32>,
    #[validate(length(min = 1, max = 500))]
    pub reason: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Resource-specific list filters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentQuery {
    pub status: Option<AppointmentStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub patient_id: Option<UserId>,
    pub doctor_id: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, minute, 0).unwrap()
    }

    fn appointment(start: DateTime<Utc>, minutes: u32) -> Appointment {
        Appointment {
            id: AppointmentId::new(),
            patient_id: UserId::new(),
            doctor_id: UserId::new(),
            scheduled_at: start,
            duration_minutes: minutes,
            reason: "checkup".into(),
            notes: None,
            status: AppointmentStatus::Scheduled,
            created_by: UserId::new(),
            meta: DocumentMeta::new(),
        }
    }

    #[test]
    fn test_transitions() {
        use AppointmentStatus::*;
        assert!(Scheduled.can_transition_to(Confirmed));
        assert!(Scheduled.can_transition_to(NoShow));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Scheduled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Scheduled.can_transition_to(Scheduled));
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = appointment(at(10, 0), 30);
        assert!(a.overlaps(at(10, 15), 30));
        assert!(a.overlaps(at(9, 45), 30));
        assert!(!a.overlaps(at(10, 30), 30));
        assert!(!a.overlaps(at(9, 30), 30));
    }

    #[test]
    fn test_overlap_near_end_of_time_does_not_panic() {
        let last = DateTime::<Utc>::MAX_UTC - Duration::minutes(1);
        let a = appointment(last, 480);
        assert_eq!(a.ends_at(), DateTime::<Utc>::MAX_UTC);
        assert!(a.overlaps(last, 480));
        assert!(!appointment(at(10, 0), 30).overlaps(last, 480));
    }

    #[test]
    fn test_scheduled_at_year_bounds() {
        let request = |when: &str| -> CreateAppointmentRequest {
            serde_json::from_value(serde_json::json!({
                "doctorId": UserId::new(),
                "scheduledAt": when,
                "reason": "x"
            }))
            .unwrap()
        };
        assert!(request("2026-03-01T10:00:00Z").validate().is_ok());
        let errors = request("+262142-12-31T23:59:00Z").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("scheduled_at"));

        let reschedule: RescheduleAppointmentRequest = serde_json::from_value(serde_json::json!({
            "scheduledAt": "+10000-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(reschedule.validate().is_err());
    }

    #[test]
    fn test_status_wire_form() {
        assert_eq!(
            serde_json::to_value(AppointmentStatus::NoShow).unwrap(),
            "no_show"
        );
        assert_eq!(AppointmentStatus::NoShow.to_string(), "no_show");
    }

    #[test]
    fn test_duration_bounds() {
        let req: CreateAppointmentRequest = serde_json::from_value(serde_json::json!({
            "doctorId": UserId::new(),
            "scheduledAt": "2026-03-01T10:00:00Z",
            "durationMinutes": 600,
            "reason": "x"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }
}
