//! Lab order handlers.

use super::{acting_doctor, delete_scoped, list_page, load_scoped, update_scoped};
use crate::error::{conflict, invalid_transition, ApiError, ApiResult};
use crate::middleware::auth::{Auth, AuthUser};
use crate::models::{
    fields, wire, CreateLabOrderRequest, LabOrder, LabOrderQuery, LabOrderStatus, LabPriority,
    SubmitResultsRequest, UpdateLabStatusRequest,
};
use crate::request::{parse_id, ApiQuery, ListParams, ValidatedJson};
use crate::response::{created, ok, with_message};
use crate::scope::{scope_for, Resource};
use crate::services::ensure_user;
use crate::state::AppState;
use crate::store::{DocumentMeta, SortOrder};
use axum::{
    extract::{Path, State},
    response::Response,
};
use chrono::Utc;
use hms_common_core::{LabOrderId, Role};
use tracing::info;

const LABEL: &str = "Lab order";

/// `GET /lab-orders`
pub async fn list(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(query): ApiQuery<LabOrderQuery>,
) -> ApiResult<Response> {
    let filter = scope_for(Resource::LabOrder, &user, params.include_inactive)?
        .eq_opt(fields::STATUS, query.status.as_ref().map(wire))
        .eq_opt(fields::PRIORITY, query.priority.as_ref().map(wire))
        .eq_opt(fields::PATIENT_ID, query.patient_id);
    list_page(&*state.lab_orders, &filter, &params, SortOrder::NewestFirst).await
}

/// `POST /lab-orders`
pub async fn create(
    State(state): State<AppState>,
    Auth(user): Auth,
    ValidatedJson(req): ValidatedJson<CreateLabOrderRequest>,
) -> ApiResult<Response> {
    let doctor_id = acting_doctor(&user, req.doctor_id)?;
    ensure_user(&*state.users, req.patient_id, Role::Patient, "patientId").await?;
    ensure_user(&*state.users, doctor_id, Role::Doctor, "doctorId").await?;

    let order = LabOrder {
        id: LabOrderId::new(),
        patient_id: req.patient_id,
        doctor_id,
        technician_id: None,
        tests: req.tests,
        priority: req.priority.unwrap_or(LabPriority::Routine),
        status: LabOrderStatus::Ordered,
        results: Vec::new(),
        notes: req.notes,
        completed_at: None,
        meta: DocumentMeta::new(),
    };
    let order = state.lab_orders.insert(order).await?;
    info!(
        lab_order_id = %order.id,
        doctor_id = %order.doctor_id,
        tests = order.tests.len(),
        "Lab order placed"
    );
    Ok(created(order, "Lab order created"))
}

/// `GET /lab-orders/:id`
pub async fn get(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: LabOrderId = parse_id(&id, "lab order")?;
    let order = load_scoped(&*state.lab_orders, Resource::LabOrder, &user, id.as_uuid(), LABEL).await?;
    Ok(ok(order))
}

/// `POST /lab-orders/:id/claim`: a technician takes an unassigned order.
pub async fn claim(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: LabOrderId = parse_id(&id, "lab order")?;
    let order = update_scoped(
        &*state.lab_orders,
        Resource::LabOrder,
        &user,
        id.as_uuid(),
        LABEL,
        None,
        |order: &mut LabOrder, _: &[LabOrder]| {
            if order.technician_id.is_some() {
                return Err(conflict("Lab order is already assigned"));
            }
            if order.status.is_terminal() {
                return Err(conflict(format!("Lab order is {}", order.status)));
            }
            order.technician_id = Some(user.id);
            Ok(())
        },
    )
    .await?;
    info!(lab_order_id = %order.id, technician_id = %user.id, "Lab order claimed");
    Ok(with_message(order, "Lab order claimed"))
}

/// `PATCH /lab-orders/:id/status`
pub async fn update_status(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateLabStatusRequest>,
) -> ApiResult<Response> {
    let id: LabOrderId = parse_id(&id, "lab order")?;
    let mut previous = None;
    let order = update_scoped(
        &*state.lab_orders,
        Resource::LabOrder,
        &user,
        id.as_uuid(),
        LABEL,
        None,
        |order: &mut LabOrder, _: &[LabOrder]| {
            ensure_assigned(order, &user)?;
            if !order.status.can_transition_to(req.status) {
                return Err(invalid_transition(order.status, req.status));
            }
            previous = Some(order.status);
            order.status = req.status;
            if req.status == LabOrderStatus::Completed {
                order.completed_at = Some(Utc::now());
            }
            if req.notes.is_some() {
                order.notes = req.notes;
            }
            Ok(())
        },
    )
    .await?;
    info!(
        lab_order_id = %order.id,
        from = ?previous,
        to = %order.status,
        changed_by = %user.id,
        "Lab order status changed"
    );
    Ok(with_message(order, "Lab order status updated"))
}

/// `POST /lab-orders/:id/results`: record results and complete the order.
pub async fn submit_results(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<SubmitResultsRequest>,
) -> ApiResult<Response> {
    let id: LabOrderId = parse_id(&id, "lab order")?;
    let order = update_scoped(
        &*state.lab_orders,
        Resource::LabOrder,
        &user,
        id.as_uuid(),
        LABEL,
        None,
        |order: &mut LabOrder, _: &[LabOrder]| {
            ensure_assigned(order, &user)?;
            if order.status.is_terminal() {
                return Err(invalid_transition(order.status, LabOrderStatus::Completed));
            }
            if let Some(code) = order.unknown_result_code(&req.results) {
                return Err(ApiError::BadRequest(format!(
                    "Result for test '{}' which is not on this order",
                    code
                )));
            }

            order.results = req.results;
            order.status = LabOrderStatus::Completed;
            order.completed_at = Some(Utc::now());
            if req.notes.is_some() {
                order.notes = req.notes;
            }
            Ok(())
        },
    )
    .await?;
    info!(
        lab_order_id = %order.id,
        results = order.results.len(),
        submitted_by = %user.id,
        "Lab results submitted"
    );
    Ok(with_message(order, "Lab results submitted"))
}

/// `DELETE /lab-orders/:id`
pub async fn delete(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: LabOrderId = parse_id(&id, "lab order")?;
    delete_scoped(&*state.lab_orders, Resource::LabOrder, &user, id.as_uuid(), LABEL).await?;
    Ok(with_message(serde_json::Value::Null, "Lab order deleted"))
}

/// Technicians may only work orders they have claimed.
fn ensure_assigned(order: &LabOrder, user: &AuthUser) -> ApiResult<()> {
    if user.role == Role::Technician && order.technician_id != Some(user.id) {
        return Err(ApiError::Forbidden(
            "Claim this lab order before working on it".into(),
        ));
    }
    Ok(())
}
