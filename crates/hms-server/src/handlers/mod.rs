//! Request handlers, one module per resource.

pub mod appointments;
pub mod auth;
pub mod billing;
pub mod chat;
pub mod encounters;
pub mod icd10;
pub mod lab_orders;
pub mod medical_records;
pub mod users;

use crate::error::{ApiError, ApiResult, ErrorContext};
use crate::middleware::auth::AuthUser;
use crate::request::ListParams;
use crate::response::paginated;
use crate::scope::{scope_one, Resource};
use crate::store::{Document, Filter, FindOptions, Mutation, Rejection, Repository, SortOrder};
use axum::response::Response;
use hms_common_core::{Role, UserId};
use std::collections::HashMap;
use uuid::Uuid;

/// Load one document through the caller's scope, or 404.
pub(crate) async fn load_scoped<T: Document>(
    repo: &dyn Repository<T>,
    resource: Resource,
    user: &AuthUser,
    id: Uuid,
    label: &str,
) -> ApiResult<T> {
    let filter = scope_one(resource, user, id)?;
    repo.find_one(&filter).await?.not_found(label)
}

/// Apply `edit` to one document the caller can see, as a single store write.
///
/// `edit` runs while the collection is locked, so checks made inside it hold
/// when the document is written. `peers` selects other documents it can see.
pub(crate) async fn update_scoped<T, F>(
    repo: &dyn Repository<T>,
    resource: Resource,
    user: &AuthUser,
    id: Uuid,
    label: &str,
    peers: Option<&Filter>,
    edit: F,
) -> ApiResult<T>
where
    T: Document,
    F: FnOnce(&mut T, &[T]) -> ApiResult<()> + Send,
{
    let filter = scope_one(resource, user, id)?;
    update_where(repo, &filter, peers, edit).await?.not_found(label)
}

/// Apply `edit` to the first document matching `filter`, as a single store
/// write. `None` when nothing matches.
pub(crate) async fn update_where<T, F>(
    repo: &dyn Repository<T>,
    filter: &Filter,
    peers: Option<&Filter>,
    edit: F,
) -> ApiResult<Option<T>>
where
    T: Document,
    F: FnOnce(&mut T, &[T]) -> ApiResult<()> + Send,
{
    let mutation: Mutation<'_, T> =
        Box::new(move |doc: &mut T, others: &[T]| edit(doc, others).map_err(Rejection::from));
    Ok(repo.update_with(filter, peers, mutation).await?)
}

/// Respond with one page of `filter` matches.
pub(crate) async fn list_page<T: Document>(
    repo: &dyn Repository<T>,
    filter: &Filter,
    params: &ListParams,
    sort: SortOrder,
) -> ApiResult<Response> {
    let pagination = params.pagination();
    let options = FindOptions::page(pagination.page(), pagination.limit()).sorted(sort);
    let (items, total) = repo.find_page(filter, options).await?;
    Ok(paginated(items, &pagination, total))
}

/// Soft-delete a document the caller can see.
pub(crate) async fn delete_scoped<T: Document>(
    repo: &dyn Repository<T>,
    resource: Resource,
    user: &AuthUser,
    id: Uuid,
    label: &str,
) -> ApiResult<()> {
    let doc = load_scoped(repo, resource, user, id, label).await?;
    if !repo.soft_delete(doc.key()).await? {
        return Err(ApiError::NotFound(label.to_string()));
    }
    tracing::info!(
        collection = T::COLLECTION,
        id = %id,
        deleted_by = %user.id,
        "Document soft-deleted"
    );
    Ok(())
}

/// The doctor a clinical document is attributed to.
///
/// Doctors always act as themselves; other roles must name one.
pub(crate) fn acting_doctor(user: &AuthUser, requested: Option<UserId>) -> ApiResult<UserId> {
    match user.role {
        Role::Doctor => Ok(user.id),
        _ => requested.ok_or_else(|| missing_field("doctorId")),
    }
}

/// `VALIDATION_ERROR` for a required field that was absent.
pub(crate) fn missing_field(field: &str) -> ApiError {
    let mut errors = HashMap::new();
    errors.insert(field.to_string(), vec!["required".to_string()]);
    ApiError::ValidationError(errors)
}
