//! Laboratory orders and their results.

use crate::store::DocumentMeta;
use chrono::{DateTime, Utc};
use hms_common_core::{LabOrderId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabPriority {
    Routine,
    Urgent,
    Stat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabOrderStatus {
    Ordered,
    SampleCollected,
    InProgress,
    Completed,
    Cancelled,
}

impl LabOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::SampleCollected => "sample_collected",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Forward progress one step at a time, or cancellation from any
    /// non-terminal status.
    pub fn can_transition_to(&self, next: LabOrderStatus) -> bool {
        use LabOrderStatus::*;
        match (self, next) {
            (current, Cancelled) => !current.is_terminal(),
            (Ordered, SampleCollected) | (SampleCollected, InProgress) | (InProgress, Completed) => {
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for LabOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultFlag {
    Normal,
    Low,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LabTest {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LabResult {
    #[validate(length(min = 1, max = 32))]
    pub test_code: String,
    #[validate(length(min = 1, max = 200))]
    pub value: String,
    #[validate(length(max = 32))]
    pub unit: Option<String>,
    #[validate(length(max = 100))]
    pub reference_range: Option<String>,
    pub flag: ResultFlag,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabOrder {
    pub id: LabOrderId,
    pub patient_id: UserId,
    pub doctor_id: UserId,
    /// `None` while no technician has claimed the order.
    pub technician_id: Option<UserId>,
    pub tests: Vec<LabTest>,
    pub priority: LabPriority,
    pub status: LabOrderStatus,
    pub results: Vec<LabResult>,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub meta: DocumentMeta,
}

impl_document!(LabOrder, "lab_orders");

impl LabOrder {
    pub fn has_test(&self, code: &str) -> bool {
        self.tests.iter().any(|t| t.code.eq_ignore_ascii_case(code))
    }

    /// First result code that names no test on this order.
    pub fn unknown_result_code<'a>(&self, results: &'a [LabResult]) -> Option<&'a str> {
        results
            .iter()
            .map(|r| r.test_code.as_str())
            .find(|code| !self.has_test(code))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabOrderRequest {
    pub patient_id: UserId,
    /// Required for admins; doctors always order as themselves.
    pub doctor_id: Option<UserId>,
    #[validate(length(min = 1, max = 50))]
    #[validate(nested)]
    pub tests: Vec<LabTest>,
    pub priority: Option<LabPriority>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLabStatusRequest {
    pub status: LabOrderStatus,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResultsRequest {
    #[validate(length(min = 1, max = 50))]
    #[validate(nested)]
    pub results: Vec<LabResult>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabOrderQuery {
    pub status: Option<LabOrderStatus>,
    pub priority: Option<LabPriority>,
    pub patient_id: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> LabOrder {
        LabOrder {
            id: LabOrderId::new(),
            patient_id: UserId::new(),
            doctor_id: UserId::new(),
            technician_id: None,
            tests: vec![LabTest {
                code: "CBC".into(),
                name: "Complete blood count".into(),
            }],
            priority: LabPriority::Routine,
            status: LabOrderStatus::Ordered,
            results: Vec::new(),
            notes: None,
            completed_at: None,
            meta: DocumentMeta::new(),
        }
    }

    fn result(code: &str) -> LabResult {
        LabResult {
            test_code: code.into(),
            value: "5.1".into(),
            unit: None,
            reference_range: None,
            flag: ResultFlag::Normal,
        }
    }

    #[test]
    fn test_transitions() {
        use LabOrderStatus::*;
        assert!(Ordered.can_transition_to(SampleCollected));
        assert!(SampleCollected.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Cancelled));
        assert!(!Ordered.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Ordered));
    }

    #[test]
    fn test_unknown_result_code() {
        let o = order();
        assert_eq!(o.unknown_result_code(&[result("cbc")]), None);
        assert_eq!(o.unknown_result_code(&[result("CBC"), result("LFT")]), Some("LFT"));
    }

    #[test]
    fn test_null_technician_serialized() {
        let json = serde_json::to_value(order()).unwrap();
        assert!(json["technicianId"].is_null());
        assert_eq!(json["status"], "ordered");
    }
}
