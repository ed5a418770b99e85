//! Domain documents and their request payloads.

/// Implement [`crate::store::Document`] for a struct with `id` and `meta` fields.
macro_rules! impl_document {
    ($ty:ty, $collection:literal) => {
        impl $crate::store::Document for $ty {
            const COLLECTION: &'static str = $collection;

            fn key(&self) -> uuid::Uuid {
                self.id.as_uuid()
            }

            fn meta(&self) -> &$crate::store::DocumentMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut $crate::store::DocumentMeta {
                &mut self.meta
            }
        }
    };
}

pub mod appointment;
pub mod chat;
pub mod encounter;
pub mod invoice;
pub mod lab_order;
pub mod medical_record;
pub mod user;

pub use appointment::*;
pub use chat::*;
pub use encounter::*;
pub use invoice::*;
pub use lab_order::*;
pub use medical_record::*;
pub use user::*;

/// Wire names of fields used in store filters.
pub mod fields {
    pub const PATIENT_ID: &str = "patientId";
    pub const DOCTOR_ID: &str = "doctorId";
    pub const TECHNICIAN_ID: &str = "technicianId";
    pub const SENDER_ID: &str = "senderId";
    pub const RECIPIENT_ID: &str = "recipientId";
    pub const STATUS: &str = "status";
    pub const ROLE: &str = "role";
    pub const EMAIL: &str = "email";
    pub const NAME: &str = "name";
    pub const SPECIALIZATION: &str = "specialization";
    pub const SCHEDULED_AT: &str = "scheduledAt";
    pub const RECORD_TYPE: &str = "recordType";
    pub const PRIORITY: &str = "priority";
    pub const READ_AT: &str = "readAt";
}

/// Serialize an enum value into its wire form for use in filters.
pub fn wire<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}
