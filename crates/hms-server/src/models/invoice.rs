//! Invoices and payments. All amounts are integer cents.

use crate::error::{ApiError, ApiResult};
use crate::store::DocumentMeta;
use chrono::{DateTime, NaiveDate, Utc};
use hms_common_core::{AppointmentId, EncounterId, InvoiceId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Insurance,
    BankTransfer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[validate(length(min = 1, max = 300))]
    pub description: String,
    #[validate(range(min = 1, max = 10000))]
    pub quantity: u32,
    #[validate(range(min = 0, max = 100_000_000_000_i64))]
    pub unit_price_cents: i64,
}

impl LineItem {
    /// `None` when the product does not fit in an `i64`.
    pub fn amount_cents(&self) -> Option<i64> {
        self.unit_price_cents.checked_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub received_by: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub patient_id: UserId,
    pub encounter_id: Option<EncounterId>,
    pub appointment_id: Option<AppointmentId>,
    pub items: Vec<LineItem>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub amount_paid_cents: i64,
    pub status: InvoiceStatus,
    pub due_date: Option<NaiveDate>,
    pub payments: Vec<Payment>,
    pub notes: Option<String>,
    pub created_by: UserId,
    #[serde(flatten)]
    pub meta: DocumentMeta,
}

impl_document!(Invoice, "invoices");

impl Invoice {
    /// Build an unpaid invoice. One whose total comes to zero is already settled.
    pub fn from_request(req: CreateInvoiceRequest, created_by: UserId) -> ApiResult<Self> {
        let mut invoice = Self {
            id: InvoiceId::new(),
            patient_id: req.patient_id,
            encounter_id: req.encounter_id,
            appointment_id: req.appointment_id,
            items: req.items,
            subtotal_cents: 0,
            tax_cents: req.tax_cents.unwrap_or(0),
            discount_cents: req.discount_cents.unwrap_or(0),
            total_cents: 0,
            amount_paid_cents: 0,
            status: InvoiceStatus::Unpaid,
            due_date: req.due_date,
            payments: Vec::new(),
            notes: req.notes,
            created_by,
            meta: DocumentMeta::new(),
        };
        invoice.recompute_totals()?;
        if invoice.total_cents == 0 {
            invoice.status = InvoiceStatus::Paid;
        }
        Ok(invoice)
    }

    /// Derive subtotal and total from the line items.
    pub fn recompute_totals(&mut self) -> ApiResult<()> {
        let subtotal = self
            .items
            .iter()
            .try_fold(0i64, |sum, item| sum.checked_add(item.amount_cents()?))
            .ok_or_else(|| amount_out_of_range("items"))?;
        let total = subtotal
            .checked_add(self.tax_cents)
            .and_then(|t| t.checked_sub(self.discount_cents))
            .ok_or_else(|| amount_out_of_range("taxCents"))?;

        self.subtotal_cents = subtotal;
        self.total_cents = total.max(0);
        Ok(())
    }

    pub fn outstanding_cents(&self) -> i64 {
        (self.total_cents - self.amount_paid_cents).max(0)
    }

    pub fn record_payment(&mut self, payment: Payment) -> ApiResult<()> {
        match self.status {
            InvoiceStatus::Void => return Err(ApiError::InvoiceVoid),
            InvoiceStatus::Paid => {
                return Err(ApiError::Conflict("Invoice is already paid in full".into()))
            }
            InvoiceStatus::Unpaid | InvoiceStatus::PartiallyPaid => {}
        }

        let outstanding = self.outstanding_cents();
        if payment.amount_cents > outstanding {
            return Err(ApiError::Overpayment {
                outstanding_cents: outstanding,
            });
        }

        self.amount_paid_cents += payment.amount_cents;
        self.payments.push(payment);
        self.status = if self.amount_paid_cents >= self.total_cents {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::PartiallyPaid
        };
        Ok(())
    }

    pub fn void(&mut self) -> ApiResult<()> {
        match self.status {
            InvoiceStatus::Void => Err(ApiError::InvoiceVoid),
            InvoiceStatus::Paid => Err(ApiError::Conflict(
                "A paid invoice cannot be voided".into(),
            )),
            InvoiceStatus::Unpaid | InvoiceStatus::PartiallyPaid => {
                self.status = InvoiceStatus::Void;
                Ok(())
            }
        }
    }
}

fn amount_out_of_range(field: &str) -> ApiError {
    let mut errors = HashMap::new();
    errors.insert(field.to_string(), vec!["amount out of range".to_string()]);
    ApiError::ValidationError(errors)
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub patient_id: UserId,
    pub encounter_id: Option<EncounterId>,
    pub appointment_id: Option<AppointmentId>,
    #[validate(length(min = 1, max = 100))]
    #[validate(nested)]
    pub items: Vec<LineItem>,
    #[validate(range(min = 0, max = 100_000_000_000_i64))]
    pub tax_cents: Option<i64>,
    #[validate(range(min = 0, max = 100_000_000_000_i64))]
    pub discount_cents: Option<i64>,
    pub due_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    #[validate(range(min = 1, max = 100_000_000_000_i64))]
    pub amount_cents: i64,
    pub method: PaymentMethod,
    #[validate(length(max = 200))]
    pub reference: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceQuery {
    pub status: Option<InvoiceStatus>,
    pub patient_id: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(items: Vec<(u32, i64)>, tax: i64, discount: i64) -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            patient_id: UserId::new(),
            encounter_id: None,
            appointment_id: None,
            items: items
                .into_iter()
                .map(|(quantity, unit_price_cents)| LineItem {
                    description: "item".into(),
                    quantity,
                    unit_price_cents,
                })
                .collect(),
            tax_cents: Some(tax),
            discount_cents: Some(discount),
            due_date: None,
            notes: None,
        }
    }

    fn invoice(items: Vec<(u32, i64)>, tax: i64, discount: i64) -> Invoice {
        Invoice::from_request(request(items, tax, discount), UserId::new()).unwrap()
    }

    fn payment(amount_cents: i64) -> Payment {
        Payment {
            amount_cents,
            method: PaymentMethod::Card,
            reference: None,
            paid_at: Utc::now(),
            received_by: UserId::new(),
        }
    }

    #[test]
    fn test_totals() {
        let inv = invoice(vec![(2, 1500), (1, 4000)], 500, 1000);
        assert_eq!(inv.subtotal_cents, 7000);
        assert_eq!(inv.total_cents, 6500);
        assert_eq!(inv.outstanding_cents(), 6500);
    }

    #[test]
    fn test_total_never_negative() {
        let inv = invoice(vec![(1, 100)], 0, 5000);
        assert_eq!(inv.total_cents, 0);
    }

    #[test]
    fn test_zero_total_is_settled() {
        let inv = invoice(vec![(1, 100)], 0, 100);
        assert_eq!(inv.status, InvoiceStatus::Paid);
        assert_eq!(inv.outstanding_cents(), 0);

        let free = invoice(vec![(3, 0)], 0, 0);
        assert_eq!(free.status, InvoiceStatus::Paid);
        assert_eq!(invoice(vec![(1, 1)], 0, 0).status, InvoiceStatus::Unpaid);
    }

    #[test]
    fn test_overflowing_totals_are_rejected() {
        let err = Invoice::from_request(request(vec![(1, i64::MAX)], 1, 0), UserId::new())
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err = Invoice::from_request(request(vec![(2, i64::MAX / 2 + 1)], 0, 0), UserId::new())
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err = Invoice::from_request(request(vec![(1, i64::MAX), (1, 1)], 0, 0), UserId::new())
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_amount_bounds_validated() {
        assert!(request(vec![(10_000, 100_000_000_000)], 0, 0).validate().is_ok());
        assert!(request(vec![(1, i64::MAX)], 0, 0).validate().is_err());
        assert!(request(vec![(1, 100)], i64::MAX, 0).validate().is_err());
    }

    #[test]
    fn test_partial_then_full_payment() {
        let mut inv = invoice(vec![(1, 1000)], 0, 0);
        inv.record_payment(payment(400)).unwrap();
        assert_eq!(inv.status, InvoiceStatus::PartiallyPaid);
        inv.record_payment(payment(600)).unwrap();
        assert_eq!(inv.status, InvoiceStatus::Paid);
        assert_eq!(inv.payments.len(), 2);
    }

    #[test]
    fn test_overpayment_rejected() {
        let mut inv = invoice(vec![(1, 1000)], 0, 0);
        let err = inv.record_payment(payment(1001)).unwrap_err();
        assert!(matches!(err, ApiError::Overpayment { outstanding_cents: 1000 }));
        assert_eq!(inv.amount_paid_cents, 0);
    }

    #[test]
    fn test_void_rules() {
        let mut inv = invoice(vec![(1, 1000)], 0, 0);
        inv.void().unwrap();
        assert!(matches!(inv.record_payment(payment(1)), Err(ApiError::InvoiceVoid)));
        assert!(matches!(inv.void(), Err(ApiError::InvoiceVoid)));

        let mut paid = invoice(vec![(1, 1000)], 0, 0);
        paid.record_payment(payment(1000)).unwrap();
        assert!(paid.void().is_err());
        assert_eq!(paid.status, InvoiceStatus::Paid);
    }
}
