//! Referential checks on create.

use crate::error::{invalid_reference, ApiResult};
use crate::models::User;
use crate::store::{Document, Repository};
use hms_common_core::{Role, UserId};
use uuid::Uuid;

/// Resolve `id` to an active account holding `role`.
///
/// Missing, deactivated and wrong-role accounts are all reported as an
/// `INVALID_REFERENCE` on `field`.
pub async fn ensure_user(
    users: &dyn Repository<User>,
    id: UserId,
    role: Role,
    field: &str,
) -> ApiResult<User> {
    match users.get(id.as_uuid()).await? {
        Some(user) if user.is_active() && user.role == role => Ok(user),
        Some(user) if user.is_active() => Err(invalid_reference(
            field,
            format_args!("user {} is a {}, expected a {}", id, user.role, role),
        )),
        _ => Err(invalid_reference(
            field,
            format_args!("no active {} with id {}", role, id),
        )),
    }
}

/// Resolve `id` to an active document of `T`.
pub async fn ensure_document<T: Document>(
    repo: &dyn Repository<T>,
    id: Uuid,
    field: &str,
) -> ApiResult<T> {
    match repo.get(id).await? {
        Some(doc) if doc.is_active() => Ok(doc),
        _ => Err(invalid_reference(
            field,
            format_args!("no active {} document with id {}", T::COLLECTION, id),
        )),
    }
}
