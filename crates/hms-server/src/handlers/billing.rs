//! Invoice and payment handlers.

use super::{delete_scoped, list_page, load_scoped, update_scoped};
use crate::error::{invalid_reference, ApiResult};
use crate::middleware::auth::Auth;
use crate::models::{
    fields, wire, CreateInvoiceRequest, Invoice, InvoiceQuery, Payment, RecordPaymentRequest,
};
use crate::request::{parse_id, ApiQuery, ListParams, ValidatedJson};
use crate::response::{created, ok, with_message};
use crate::scope::{scope_for, Resource};
use crate::services::{ensure_document, ensure_user};
use crate::state::AppState;
use crate::store::SortOrder;
use axum::{
    extract::{Path, State},
    response::Response,
};
use chrono::Utc;
use hms_common_core::{InvoiceId, Role};
use tracing::info;

const LABEL: &str = "Invoice";

/// `GET /billing`
pub async fn list(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(query): ApiQuery<InvoiceQuery>,
) -> ApiResult<Response> {
    let filter = scope_for(Resource::Invoice, &user, params.include_inactive)?
        .eq_opt(fields::STATUS, query.status.as_ref().map(wire))
        .eq_opt(fields::PATIENT_ID, query.patient_id);
    list_page(&*state.invoices, &filter, &params, SortOrder::NewestFirst).await
}

/// `POST /billing`
pub async fn create(
    State(state): State<AppState>,
    Auth(user): Auth,
    ValidatedJson(req): ValidatedJson<CreateInvoiceRequest>,
) -> ApiResult<Response> {
    ensure_user(&*state.users, req.patient_id, Role::Patient, "patientId").await?;

    if let Some(encounter_id) = req.encounter_id {
        let encounter =
            ensure_document(&*state.encounters, encounter_id.as_uuid(), "encounterId").await?;
        if encounter.patient_id != req.patient_id {
            return Err(invalid_reference(
                "encounterId",
                "encounter belongs to a different patient",
            ));
        }
    }
    if let Some(appointment_id) = req.appointment_id {
        let appointment =
            ensure_document(&*state.appointments, appointment_id.as_uuid(), "appointmentId").await?;
        if appointment.patient_id != req.patient_id {
            return Err(invalid_reference(
                "appointmentId",
                "appointment belongs to a different patient",
            ));
        }
    }

    let invoice = state.invoices.insert(Invoice::from_request(req, user.id)?).await?;
    info!(
        invoice_id = %invoice.id,
        patient_id = %invoice.patient_id,
        total_cents = invoice.total_cents,
        "Invoice issued"
    );
    Ok(created(invoice, "Invoice created"))
}

/// `GET /billing/:id`
pub async fn get(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: InvoiceId = parse_id(&id, "invoice")?;
    let invoice = load_scoped(&*state.invoices, Resource::Invoice, &user, id.as_uuid(), LABEL).await?;
    Ok(ok(invoice))
}

/// `POST /billing/:id/payments`
pub async fn record_payment(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<RecordPaymentRequest>,
) -> ApiResult<Response> {
    let id: InvoiceId = parse_id(&id, "invoice")?;
    let payment = Payment {
        amount_cents: req.amount_cents,
        method: req.method,
        reference: req.reference,
        paid_at: Utc::now(),
        received_by: user.id,
    };
    let invoice = update_scoped(
        &*state.invoices,
        Resource::Invoice,
        &user,
        id.as_uuid(),
        LABEL,
        None,
        |invoice: &mut Invoice, _: &[Invoice]| invoice.record_payment(payment),
    )
    .await?;
    info!(
        invoice_id = %invoice.id,
        amount_cents = req.amount_cents,
        outstanding_cents = invoice.outstanding_cents(),
        received_by = %user.id,
        "Payment recorded"
    );
    Ok(with_message(invoice, "Payment recorded"))
}

/// `POST /billing/:id/void`
pub async fn void(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: InvoiceId = parse_id(&id, "invoice")?;
    let invoice = update_scoped(
        &*state.invoices,
        Resource::Invoice,
        &user,
        id.as_uuid(),
        LABEL,
        None,
        |invoice: &mut Invoice, _: &[Invoice]| invoice.void(),
    )
    .await?;
    info!(invoice_id = %invoice.id, voided_by = %user.id, "Invoice voided");
    Ok(with_message(invoice, "Invoice voided"))
}

/// `DELETE /billing/:id`
pub async fn delete(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: InvoiceId = parse_id(&id, "invoice")?;
    delete_scoped(&*state.invoices, Resource::Invoice, &user, id.as_uuid(), LABEL).await?;
    Ok(with_message(serde_json::Value::Null, "Invoice deleted"))
}
