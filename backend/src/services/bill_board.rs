use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::error::AppError;
use crate::models::bill::parse_deadline;
use crate::models::{Bill, BillItem, BillListing, Money, NewBillRequest};
use crate::store::DocumentStore;

pub const INVALID_ITEM: &str = "Please enter an item detail and an amount greater than zero.";
pub const INCOMPLETE_BILL: &str = "Please fill in the purpose, deadline and at least one item.";
pub const INVALID_DEADLINE: &str = "Deadline must be a date in YYYY-MM-DD format.";
pub const TOTAL_TOO_LARGE: &str = "The bill total is too large.";

/// A bill being put together before it is published.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillDraft {
    pub purpose: String,
    pub deadline: Option<NaiveDate>,
    pub remarks: String,
    items: Vec<BillItem>,
    total: Money,
}

impl BillDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a draft from a submitted form, validating every item.
    pub fn from_request(request: &NewBillRequest) -> Result<Self, AppError> {
        let deadline = match request.deadline.trim() {
            "" => None,
            raw => Some(parse_deadline(raw).ok_or_else(|| AppError::Validation(INVALID_DEADLINE.to_string()))?),
        };

        let mut draft = Self {
            purpose: request.purpose.clone(),
            deadline,
            remarks: request.remarks.clone(),
            ..Self::default()
        };
        for item in &request.items {
            let amount = match &item.amount {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => String::new(),
            };
            draft.add_item(&item.detail, &amount)?;
        }
        Ok(draft)
    }

    pub fn items(&self) -> &[BillItem] {
        &self.items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn add_item(&mut self, detail: &str, amount: &str) -> Result<(), AppError> {
        let detail = detail.trim();
        let amount = Money::parse(amount)
            .filter(|amount| amount.is_positive())
            .filter(|_| !detail.is_empty())
            .ok_or_else(|| AppError::Validation(INVALID_ITEM.to_string()))?;
        let total = self
            .total
            .checked_add(amount)
            .ok_or_else(|| AppError::Validation(TOTAL_TOO_LARGE.to_string()))?;

        self.items.push(BillItem {
            detail: detail.to_string(),
            amount,
        });
        self.total = total;
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> Result<BillItem, AppError> {
        if index >= self.items.len() {
            return Err(AppError::Validation(format!("No item at row {}", index + 1)));
        }
        let item = self.items.remove(index);
        self.total = self.total.saturating_sub(item.amount);
        Ok(item)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Published academic bills.
pub struct BillBoard {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    bills: Vec<Bill>,
}

impl BillBoard {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            bills: Vec::new(),
        }
    }

    pub fn bills(&self) -> &[Bill] {
        &self.bills
    }

    pub async fn load(&mut self) {
        let docs = match self.store.list_all(&Bill::collection(), None).await {
            Ok(docs) => docs,
            Err(e) => {
                error!("Error fetching academic bills: {}", e);
                self.bills.clear();
                return;
            }
        };

        self.bills = docs
            .iter()
            .filter_map(|doc| match Bill::from_document(doc) {
                Ok(bill) => Some(bill),
                Err(e) => {
                    warn!("Skipping academic bill: {}", e);
                    None
                }
            })
            .collect();
    }

    /// Publishes the draft. On success the draft is cleared; on failure it
    /// is left as it was.
    pub async fn create(&mut self, draft: &mut BillDraft) -> Result<Bill, AppError> {
        let purpose = draft.purpose.trim();
        let deadline = match draft.deadline {
            Some(deadline) if !purpose.is_empty() && !draft.items.is_empty() => deadline,
            _ => return Err(AppError::Validation(INCOMPLETE_BILL.to_string())),
        };

        let total = Money::checked_sum(draft.items.iter().map(|item| item.amount))
            .ok_or_else(|| AppError::Validation(TOTAL_TOO_LARGE.to_string()))?;

        let remarks = draft.remarks.trim();
        let mut bill = Bill {
            id: String::new(),
            purpose: purpose.to_string(),
            deadline,
            remarks: (!remarks.is_empty()).then(|| remarks.to_string()),
            items: draft.items.clone(),
            total,
            created_at: self.clock.now(),
        };
        bill.id = self.store.create(&Bill::collection(), bill.to_fields()).await?;

        info!("Created academic bill {} ({}, total {})", bill.id, bill.purpose, bill.total);
        self.bills.push(bill.clone());
        draft.clear();
        Ok(bill)
    }

    pub fn listing(&self, now: DateTime<Utc>) -> Vec<BillListing> {
        self.bills
            .iter()
            .map(|bill| BillListing {
                bill: bill.clone(),
                status: bill.status(now),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::BillStatus;
    use crate::store::MemoryDocumentStore;
    use chrono::TimeZone;

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()))
    }

    #[test]
    fn total_follows_items() {
        let mut draft = BillDraft::new();
        draft.add_item("Tuition", "1500").unwrap();
        draft.add_item("Lab", "250.50").unwrap();
        draft.add_item("Library", "0.10").unwrap();
        assert_eq!(draft.total(), Money::from_minor(175_060));

        draft.remove_item(1).unwrap();
        assert_eq!(draft.total(), Money::from_minor(150_010));
        assert_eq!(Some(draft.total()), Money::checked_sum(draft.items().iter().map(|i| i.amount)));

        assert!(draft.remove_item(7).is_err());
    }

    #[test]
    fn invalid_items_leave_draft_unchanged() {
        let mut draft = BillDraft::new();
        draft.add_item("Tuition", "100").unwrap();
        let before = draft.clone();

        for (detail, amount) in [("", "10"), ("Fee", "0"), ("Fee", "-5"), ("Fee", "ten"), ("  ", "")] {
            assert!(draft.add_item(detail, amount).is_err());
        }
        assert_eq!(draft, before);
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let mut draft = BillDraft::new();
        assert!(draft.add_item("Tuition", "1e20").is_err());

        draft.add_item("Tuition", "50000000000000000").unwrap();
        let before = draft.clone();
        let err = draft.add_item("Lab", "50000000000000000").unwrap_err();
        assert_eq!(err.to_string(), TOTAL_TOO_LARGE);
        assert_eq!(draft, before);
    }

    #[tokio::test]
    async fn create_requires_complete_draft() {
        let store = Arc::new(MemoryDocumentStore::new());
        let mut board = BillBoard::new(store.clone(), clock());

        let mut draft = BillDraft::new();
        draft.purpose = "Semester Fee".to_string();
        draft.add_item("Tuition", "100").unwrap();
        assert!(board.create(&mut draft).await.is_err());
        assert_eq!(draft.purpose, "Semester Fee");

        draft.deadline = NaiveDate::from_ymd_opt(2025, 7, 1);
        let bill = board.create(&mut draft).await.unwrap();
        assert_eq!(bill.total, Money::from_minor(10_000));
        assert_eq!(bill.remarks, None);
        assert_eq!(draft, BillDraft::default());

        let listing = board.listing(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
        assert_eq!(listing[0].status, BillStatus::Active);
    }

    #[tokio::test]
    async fn load_skips_malformed_bills() {
        let store = Arc::new(MemoryDocumentStore::new());
        let mut fields = crate::store::Fields::new();
        fields.insert("purpose".to_string(), Value::from("No deadline"));
        store.create(&Bill::collection(), fields).await.unwrap();

        let mut board = BillBoard::new(store.clone(), clock());
        let mut draft = BillDraft::new();
        draft.purpose = "Exam Fee".to_string();
        draft.deadline = NaiveDate::from_ymd_opt(2025, 5, 1);
        draft.add_item("Exam", "300").unwrap();
        board.create(&mut draft).await.unwrap();

        let mut reloaded = BillBoard::new(store, clock());
        reloaded.load().await;
        assert_eq!(reloaded.bills().len(), 1);
        assert_eq!(reloaded.bills()[0].purpose, "Exam Fee");
        assert_eq!(reloaded.listing(Utc::now())[0].status, BillStatus::Expired);
    }

    #[test]
    fn request_amounts_may_be_numbers_or_text() {
        let request: NewBillRequest = serde_json::from_value(serde_json::json!({
            "purpose": "Hall Fee",
            "deadline": "2025-08-01",
            "items": [ { "detail": "Seat", "amount": 1200 }, { "detail": "Mess", "amount": "800.25" } ]
        }))
        .unwrap();

        let draft = BillDraft::from_request(&request).unwrap();
        assert_eq!(draft.total(), Money::from_minor(200_025));
        assert_eq!(draft.deadline, NaiveDate::from_ymd_opt(2025, 8, 1));
    }
}
