//! Per-role visibility of documents.
//!
//! Every read of a clinical or financial document goes through
//! [`scope_for`], which turns the requesting account into the storage
//! filter that bounds what it may see. Single-document reads add an id
//! clause to the same filter, so a document outside the caller's scope is
//! indistinguishable from one that does not exist.

use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::models::fields::{DOCTOR_ID, PATIENT_ID, RECIPIENT_ID, SENDER_ID, TECHNICIAN_ID};
use crate::store::{Filter, ID, IS_ACTIVE};
use hms_common_core::Role;
use serde_json::Value;
use uuid::Uuid;

/// Collections whose reads are scoped by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Appointment,
    Encounter,
    MedicalRecord,
    LabOrder,
    Invoice,
    ChatMessage,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Appointment => "appointments",
            Self::Encounter => "encounters",
            Self::MedicalRecord => "medical records",
            Self::LabOrder => "lab orders",
            Self::Invoice => "invoices",
            Self::ChatMessage => "messages",
        }
    }
}

/// How a role sees a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
    All,
    OwnDoctor,
    OwnPatient,
    /// Assigned to the caller, or not yet assigned to anyone.
    AssignedOrOpen,
    /// Caller is sender or recipient.
    Participant,
    Forbidden,
}

fn visibility(resource: Resource, role: Role) -> Visibility {
    use Resource::*;
    use Role::*;
    use Visibility as V;

    match (resource, role) {
        (ChatMessage, _) => V::Participant,

        (_, Admin) => V::All,

        (Appointment | Encounter | MedicalRecord | LabOrder, Doctor) => V::OwnDoctor,
        (Invoice, Doctor) => V::Forbidden,

        (_, Patient) => V::OwnPatient,

        (LabOrder, Technician) => V::AssignedOrOpen,
        (_, Technician) => V::Forbidden,

        (Appointment | Encounter | Invoice, Receptionist) => V::All,
        (MedicalRecord | LabOrder, Receptionist) => V::Forbidden,
    }
}

/// Whether `role` may read `resource` at all.
pub fn can_read(resource: Resource, role: Role) -> bool {
    visibility(resource, role) != Visibility::Forbidden
}

/// Build the storage filter bounding what `user` may read of `resource`.
///
/// Inactive documents are excluded unless an admin asks for them.
pub fn scope_for(resource: Resource, user: &AuthUser, include_inactive: bool) -> ApiResult<Filter> {
    let me = Value::from(user.id);
    let base = if include_inactive && user.role == Role::Admin {
        Filter::new()
    } else {
        Filter::new().eq(IS_ACTIVE, true)
    };

    let filter = match visibility(resource, user.role) {
        Visibility::All => base,
        Visibility::OwnDoctor => base.eq(DOCTOR_ID, me),
        Visibility::OwnPatient => base.eq(PATIENT_ID, me),
        Visibility::AssignedOrOpen => base.any_of(TECHNICIAN_ID, [me, Value::Null]),
        Visibility::Participant => base.or(vec![
            Filter::new().eq(SENDER_ID, me.clone()),
            Filter::new().eq(RECIPIENT_ID, me),
        ]),
        Visibility::Forbidden => {
            tracing::debug!(
                resource = resource.as_str(),
                role = %user.role,
                "Scoped read refused"
            );
            return Err(ApiError::role_not_allowed(user.role));
        }
    };
    Ok(filter)
}

/// Scope filter narrowed to a single active document.
pub fn scope_one(resource: Resource, user: &AuthUser, id: Uuid) -> ApiResult<Filter> {
    Ok(scope_for(resource, user, false)?.eq(ID, id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hms_common_core::UserId;
    use proptest::prelude::*;
    use serde_json::json;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            id: UserId::new(),
            name: "Test".into(),
            email: "t@example.com".into(),
            role,
        }
    }

    #[test]
    fn test_forbidden_cells() {
        let forbidden = [
            (Resource::Appointment, Role::Technician),
            (Resource::Encounter, Role::Technician),
            (Resource::MedicalRecord, Role::Technician),
            (Resource::MedicalRecord, Role::Receptionist),
            (Resource::LabOrder, Role::Receptionist),
            (Resource::Invoice, Role::Doctor),
            (Resource::Invoice, Role::Technician),
        ];
        for (resource, role) in forbidden {
            let err = scope_for(resource, &user(role), false).unwrap_err();
            assert_eq!(err.error_code(), "FORBIDDEN", "{resource:?} {role}");
        }
    }

    #[test]
    fn test_everyone_may_read_chat() {
        for role in Role::ALL {
            assert!(can_read(Resource::ChatMessage, role));
        }
    }

    #[test]
    fn test_admin_sees_inactive_only_on_request() {
        let admin = user(Role::Admin);
        let inactive = json!({"isActive": false});
        assert!(!scope_for(Resource::Invoice, &admin, false).unwrap().matches(&inactive));
        assert!(scope_for(Resource::Invoice, &admin, true).unwrap().matches(&inactive));

        let receptionist = user(Role::Receptionist);
        assert!(!scope_for(Resource::Invoice, &receptionist, true)
            .unwrap()
            .matches(&inactive));
    }

    #[test]
    fn test_technician_sees_own_and_unassigned() {
        let tech = user(Role::Technician);
        let filter = scope_for(Resource::LabOrder, &tech, false).unwrap();
        let mine = json!({"isActive": true, "technicianId": tech.id});
        let open = json!({"isActive": true, "technicianId": null});
        let other = json!({"isActive": true, "technicianId": UserId::new()});
        assert!(filter.matches(&mine));
        assert!(filter.matches(&open));
        assert!(!filter.matches(&other));
    }

    #[test]
    fn test_chat_participant() {
        let me = user(Role::Patient);
        let filter = scope_for(Resource::ChatMessage, &me, false).unwrap();
        let other = UserId::new();
        assert!(filter.matches(&json!({"isActive": true, "senderId": me.id, "recipientId": other})));
        assert!(filter.matches(&json!({"isActive": true, "senderId": other, "recipientId": me.id})));
        assert!(!filter.matches(&json!({"isActive": true, "senderId": other, "recipientId": other})));
    }

    #[test]
    fn test_scope_one_adds_id() {
        let doctor = user(Role::Doctor);
        let id = Uuid::new_v4();
        let filter = scope_one(Resource::Encounter, &doctor, id).unwrap();
        assert!(filter.matches(&json!({"id": id.to_string(), "isActive": true, "doctorId": doctor.id})));
        assert!(!filter.matches(&json!({"id": Uuid::new_v4().to_string(), "isActive": true, "doctorId": doctor.id})));
    }

    proptest! {
        #[test]
        fn prop_doctor_scope_never_matches_other_doctor(
            other in any::<u128>(),
            active in any::<bool>(),
            include_inactive in any::<bool>(),
        ) {
            let doctor = user(Role::Doctor);
            let other = Uuid::from_u128(other);
            prop_assume!(other != doctor.id.as_uuid());

            for resource in [Resource::Appointment, Resource::Encounter, Resource::MedicalRecord, Resource::LabOrder] {
                let filter = scope_for(resource, &doctor, include_inactive).unwrap();
                let doc = json!({"isActive": active, "doctorId": other.to_string()});
                prop_assert!(!filter.matches(&doc));
            }
        }

        #[test]
        fn prop_patient_scope_never_matches_other_patient(other in any::<u128>()) {
            let patient = user(Role::Patient);
            let other = Uuid::from_u128(other);
            prop_assume!(other != patient.id.as_uuid());

            for resource in [Resource::Appointment, Resource::Encounter, Resource::MedicalRecord, Resource::LabOrder, Resource::Invoice] {
                let filter = scope_for(resource, &patient, false).unwrap();
                let doc = json!({"isActive": true, "patientId": other.to_string()});
                prop_assert!(!filter.matches(&doc));
            }
        }
    }
}
