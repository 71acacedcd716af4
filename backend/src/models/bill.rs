use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};

use crate::clock::{format_timestamp, parse_timestamp};
use crate::store::{CollectionPath, Document, Fields, StoreError};

pub const BILLS_COLLECTION: &str = "academic_fees";
pub const DEADLINE_FORMAT: &str = "%Y-%m-%d";

/// An amount in hundredths of the currency unit. Sums are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Parses decimal text such as `"1500"` or `"12.50"`.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<f64>().ok().and_then(Self::from_f64)
    }

    /// `None` for non-finite values and amounts too large to hold.
    pub fn from_f64(value: f64) -> Option<Self> {
        let minor = (value * 100.0).round();
        (minor.is_finite() && minor.abs() < i64::MAX as f64).then(|| Money(minor as i64))
    }

    /// Accepts numbers and numeric strings, as stored amounts may be either.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().and_then(Self::from_f64),
            Value::String(s) => Self::parse(s),
            _ => None,
        }
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn saturating_sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }

    /// Sums the amounts, or `None` if the total does not fit.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
        amounts.into_iter().try_fold(Money::ZERO, Money::checked_add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Money::from_value(&value).ok_or_else(|| D::Error::custom(format!("invalid amount: {}", value)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    pub detail: String,
    pub amount: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillStatus {
    Active,
    Expired,
}

impl BillStatus {
    /// Active while the deadline (midnight UTC starting that day) is still
    /// ahead of `now`.
    pub fn at(deadline: NaiveDate, now: DateTime<Utc>) -> Self {
        if deadline_instant(deadline) > now {
            BillStatus::Active
        } else {
            BillStatus::Expired
        }
    }
}

pub fn deadline_instant(deadline: NaiveDate) -> DateTime<Utc> {
    deadline.and_time(NaiveTime::MIN).and_utc()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: String,
    pub purpose: String,
    pub deadline: NaiveDate,
    pub remarks: Option<String>,
    pub items: Vec<BillItem>,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillListing {
    #[serde(flatten)]
    pub bill: Bill,
    pub status: BillStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBillItem {
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub amount: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBillRequest {
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub items: Vec<NewBillItem>,
}

impl Bill {
    pub fn collection() -> CollectionPath {
        CollectionPath::root(BILLS_COLLECTION)
    }

    pub fn status(&self, now: DateTime<Utc>) -> BillStatus {
        BillStatus::at(self.deadline, now)
    }

    /// Reads a stored bill. The total is recomputed from the items rather
    /// than taken from the document.
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let malformed = |what: &str| StoreError::Malformed(format!("bill {}: {}", doc.key, what));

        let purpose = doc
            .fields
            .get("purpose")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("missing purpose"))?
            .to_string();

        let deadline = doc
            .fields
            .get("deadline")
            .and_then(Value::as_str)
            .and_then(parse_deadline)
            .ok_or_else(|| malformed("missing or invalid deadline"))?;

        let remarks = doc
            .fields
            .get("remarks")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        let items: Vec<BillItem> = doc
            .fields
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| BillItem {
                        detail: item
                            .get("detail")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        amount: item.get("amount").and_then(Money::from_value).unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let created_at = doc
            .fields
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or_default();

        let total = Money::checked_sum(items.iter().map(|item| item.amount))
            .ok_or_else(|| malformed("total out of range"))?;

        Ok(Self {
            id: doc.key.clone(),
            purpose,
            deadline,
            remarks,
            items,
            total,
            created_at,
        })
    }

    pub fn to_fields(&self) -> Fields {
        let items: Vec<Value> = self
            .items
            .iter()
            .map(|item| json!({ "detail": item.detail, "amount": item.amount }))
            .collect();

        let mut fields = Fields::new();
        fields.insert("purpose".to_string(), json!(self.purpose));
        fields.insert("deadline".to_string(), json!(self.deadline.format(DEADLINE_FORMAT).to_string()));
        fields.insert("remarks".to_string(), json!(self.remarks.clone().unwrap_or_default()));
        fields.insert("items".to_string(), Value::Array(items));
        fields.insert("total".to_string(), json!(self.total));
        fields.insert("createdAt".to_string(), json!(format_timestamp(self.created_at)));
        fields
    }
}

/// Accepts a plain date or a full timestamp, keeping the date part.
pub fn parse_deadline(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DEADLINE_FORMAT)
        .ok()
        .or_else(|| parse_timestamp(raw).map(|at| at.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn status_boundary_is_expired() {
        let deadline = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let at_deadline = Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap();

        assert_eq!(BillStatus::at(deadline, at_deadline), BillStatus::Expired);
        assert_eq!(
            BillStatus::at(deadline, at_deadline - Duration::milliseconds(1)),
            BillStatus::Active
        );
        assert_eq!(
            BillStatus::at(deadline, at_deadline + Duration::hours(12)),
            BillStatus::Expired
        );
    }

    #[test]
    fn money_parses_numbers_and_strings() {
        assert_eq!(Money::parse("12.50"), Some(Money::from_minor(1250)));
        assert_eq!(Money::from_value(&json!("1500")), Some(Money::from_minor(150_000)));
        assert_eq!(Money::from_value(&json!(0.1)), Some(Money::from_minor(10)));
        assert_eq!(Money::parse("abc"), None);
        assert_eq!(Money::from_value(&json!(null)), None);
        assert_eq!(Money::from_minor(-5).to_string(), "-0.05");
        assert_eq!(Money::from_minor(150_075).to_string(), "1500.75");
        assert_eq!(Money::parse("1e20"), None);
    }

    #[test]
    fn sums_that_overflow_are_rejected() {
        let big = Money::parse("50000000000000000").unwrap();
        assert_eq!(big.checked_add(big), None);
        assert_eq!(Money::checked_sum([big, big]), None);
        assert_eq!(
            Money::checked_sum([Money::from_minor(150), Money::from_minor(25)]),
            Some(Money::from_minor(175))
        );
    }

    #[test]
    fn bill_with_overflowing_items_is_malformed() {
        let doc = Document {
            key: "huge".to_string(),
            fields: json!({
                "purpose": "Endowment",
                "deadline": "2025-07-01",
                "items": [
                    { "detail": "A", "amount": 50000000000000000.0 },
                    { "detail": "B", "amount": "50000000000000000" }
                ]
            })
            .as_object()
            .cloned()
            .unwrap(),
        };
        assert!(matches!(Bill::from_document(&doc), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn stored_total_is_recomputed_from_items() {
        let doc = Document {
            key: "bill1".to_string(),
            fields: json!({
                "purpose": "Semester Fee",
                "deadline": "2025-07-01",
                "remarks": "",
                "items": [
                    { "detail": "Tuition", "amount": "1000.50" },
                    { "detail": "Library", "amount": 250 },
                    { "detail": "Broken", "amount": "n/a" }
                ],
                "total": "9999",
                "status": "active",
                "createdAt": "2025-05-01T09:00:00.000Z"
            })
            .as_object()
            .cloned()
            .unwrap(),
        };

        let bill = Bill::from_document(&doc).unwrap();
        assert_eq!(bill.total, Money::from_minor(125_050));
        assert_eq!(bill.items[2].amount, Money::ZERO);
        assert_eq!(bill.remarks, None);
        assert_eq!(bill.deadline, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
    }

    #[test]
    fn bill_without_deadline_is_malformed() {
        let doc = Document {
            key: "bad".to_string(),
            fields: json!({ "purpose": "Lab Fee", "items": [] }).as_object().cloned().unwrap(),
        };
        assert!(Bill::from_document(&doc).is_err());
    }

    #[test]
    fn fields_never_carry_status() {
        let bill = Bill {
            id: "x".to_string(),
            purpose: "Library Fee".to_string(),
            deadline: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            remarks: Some("Pay at the counter".to_string()),
            items: vec![BillItem {
                detail: "Card".to_string(),
                amount: Money::from_minor(20_000),
            }],
            total: Money::from_minor(20_000),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        };

        let fields = bill.to_fields();
        assert!(!fields.contains_key("status"));
        assert_eq!(fields["deadline"], "2025-01-10");
        assert_eq!(fields["total"], 200.0);
        assert_eq!(fields["items"][0]["amount"], 200.0);
    }
}
