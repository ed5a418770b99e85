//! Business logic shared by handlers.

pub mod bootstrap;
pub mod icd10;
pub mod password;
pub mod references;
pub mod scheduling;

pub use bootstrap::seed_admin;
pub use password::{hash_password, verify_password};
pub use references::{ensure_document, ensure_user};
pub use scheduling::{book, booked_filter, check_slot};
