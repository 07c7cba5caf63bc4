use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, MAX_AMOUNT_CENTS};

pub type TransactionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in (salary, refunds, interest)
    Income,
    /// Money going out (rent, groceries, bills)
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }

    /// Sign used when displaying an amount of this type.
    pub fn sign(&self) -> char {
        match self {
            TransactionType::Income => '+',
            TransactionType::Expense => '-',
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A view restriction over the ledger by transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl TransactionFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionFilter::All => "all",
            TransactionFilter::Income => "income",
            TransactionFilter::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(TransactionFilter::All),
            "income" => Some(TransactionFilter::Income),
            "expense" => Some(TransactionFilter::Expense),
            _ => None,
        }
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        match self {
            TransactionFilter::All => true,
            TransactionFilter::Income => transaction.transaction_type == TransactionType::Income,
            TransactionFilter::Expense => transaction.transaction_type == TransactionType::Expense,
        }
    }
}

impl From<TransactionType> for TransactionFilter {
    fn from(transaction_type: TransactionType) -> Self {
        match transaction_type {
            TransactionType::Income => TransactionFilter::Income,
            TransactionType::Expense => TransactionFilter::Expense,
        }
    }
}

impl std::fmt::Display for TransactionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single income or expense entry.
///
/// The serialized form is the durable storage record:
/// `{id, description, amount, type, date}` with `amount` as a decimal number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub description: String,
    /// Amount in cents (always positive)
    #[serde(rename = "amount", with = "decimal_amount")]
    pub amount_cents: Cents,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// When the entry was created. Never changed by updates.
    pub date: DateTime<Utc>,
}

impl Transaction {
    /// Signed contribution of this entry to the net balance.
    pub fn signed_amount(&self) -> Cents {
        match self.transaction_type {
            TransactionType::Income => self.amount_cents,
            TransactionType::Expense => -self.amount_cents,
        }
    }

    /// The user-editable fields of this entry.
    pub fn to_draft(&self) -> TransactionDraft {
        TransactionDraft {
            description: self.description.clone(),
            amount_cents: self.amount_cents,
            transaction_type: self.transaction_type,
        }
    }

    /// Check the stored-record invariants: non-empty description, amount in
    /// `1..=MAX_AMOUNT_CENTS`.
    pub fn check(&self) -> Result<(), ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        check_amount(self.amount_cents)
    }
}

/// User input for creating or updating an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub description: String,
    pub amount_cents: Cents,
    pub transaction_type: TransactionType,
}

impl TransactionDraft {
    pub fn new(
        description: impl Into<String>,
        amount_cents: Cents,
        transaction_type: TransactionType,
    ) -> Self {
        Self {
            description: description.into(),
            amount_cents,
            transaction_type,
        }
    }

    pub fn income(description: impl Into<String>, amount_cents: Cents) -> Self {
        Self::new(description, amount_cents, TransactionType::Income)
    }

    pub fn expense(description: impl Into<String>, amount_cents: Cents) -> Self {
        Self::new(description, amount_cents, TransactionType::Expense)
    }

    /// Validate the draft, returning it with the description trimmed.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        check_amount(self.amount_cents)?;
        Ok(Self {
            description: description.to_string(),
            ..self
        })
    }
}

fn check_amount(amount_cents: Cents) -> Result<(), ValidationError> {
    if amount_cents <= 0 {
        return Err(ValidationError::NonPositiveAmount(amount_cents));
    }
    if amount_cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::AmountTooLarge(amount_cents));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyDescription,
    NonPositiveAmount(Cents),
    AmountTooLarge(Cents),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyDescription => write!(f, "description must not be empty"),
            ValidationError::NonPositiveAmount(cents) => {
                write!(
                    f,
                    "amount must be positive, got {}",
                    super::format_cents(*cents)
                )
            }
            ValidationError::AmountTooLarge(cents) => {
                write!(
                    f,
                    "amount must not exceed {}, got {}",
                    super::format_cents(MAX_AMOUNT_CENTS),
                    super::format_cents(*cents)
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Serde adapter writing cents as a decimal JSON number.
mod decimal_amount {
    use serde::{Deserialize, Deserializer, Serializer, de};

    use crate::domain::{Cents, cents_to_decimal, decimal_to_cents};

    pub fn serialize<S: Serializer>(cents: &Cents, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(cents_to_decimal(*cents))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Cents, D::Error> {
        let value = f64::deserialize(deserializer)?;
        decimal_to_cents(value)
            .ok_or_else(|| de::Error::custom(format!("amount out of range: {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn rent() -> Transaction {
        Transaction {
            id: 7,
            description: "Rent".to_string(),
            amount_cents: 120000,
            transaction_type: TransactionType::Expense,
            date: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!(TransactionType::from_str("income"), Some(TransactionType::Income));
        assert_eq!(TransactionType::from_str("EXPENSE"), Some(TransactionType::Expense));
        assert_eq!(TransactionType::from_str("transfer"), None);
        assert_eq!(TransactionFilter::from_str("All"), Some(TransactionFilter::All));
        assert_eq!(TransactionFilter::from_str("savings"), None);
    }

    #[test]
    fn test_filter_matches() {
        let rent = rent();
        assert!(TransactionFilter::All.matches(&rent));
        assert!(TransactionFilter::Expense.matches(&rent));
        assert!(!TransactionFilter::Income.matches(&rent));
    }

    #[test]
    fn test_draft_validation_trims_description() {
        let draft = TransactionDraft::income("  Salary \n", 500000).validate().unwrap();
        assert_eq!(draft.description, "Salary");
        assert_eq!(draft.amount_cents, 500000);
    }

    #[test]
    fn test_draft_validation_rejects_bad_input() {
        assert_eq!(
            TransactionDraft::income("   ", 100).validate(),
            Err(ValidationError::EmptyDescription)
        );
        assert_eq!(
            TransactionDraft::expense("Refund", -500).validate(),
            Err(ValidationError::NonPositiveAmount(-500))
        );
        assert_eq!(
            TransactionDraft::expense("Nothing", 0).validate(),
            Err(ValidationError::NonPositiveAmount(0))
        );
    }

    #[test]
    fn test_draft_validation_caps_amount() {
        assert!(
            TransactionDraft::income("Windfall", MAX_AMOUNT_CENTS)
                .validate()
                .is_ok()
        );
        assert_eq!(
            TransactionDraft::income("Windfall", MAX_AMOUNT_CENTS + 1).validate(),
            Err(ValidationError::AmountTooLarge(MAX_AMOUNT_CENTS + 1))
        );

        let mut record = rent();
        record.amount_cents = Cents::MAX;
        assert_eq!(
            record.check(),
            Err(ValidationError::AmountTooLarge(Cents::MAX))
        );
    }

    #[test]
    fn test_storage_record_format() {
        let value = serde_json::to_value(rent()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "description": "Rent",
                "amount": 1200.0,
                "type": "expense",
                "date": "2024-03-01T09:30:00Z"
            })
        );
    }

    #[test]
    fn test_parse_browser_record() {
        // Integer amounts and millisecond timestamps, as written by a browser.
        let parsed: Transaction = serde_json::from_value(json!({
            "id": 48213907,
            "description": "Groceries",
            "amount": 45.5,
            "type": "expense",
            "date": "2024-05-12T18:04:11.123Z"
        }))
        .unwrap();

        assert_eq!(parsed.id, 48213907);
        assert_eq!(parsed.amount_cents, 4550);
        assert_eq!(parsed.transaction_type, TransactionType::Expense);
        assert_eq!(parsed.date.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        let parsed = serde_json::from_value::<Transaction>(json!({
            "id": 1,
            "description": "Gift",
            "amount": 10,
            "type": "transfer",
            "date": "2024-05-12T18:04:11Z"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_signed_amount() {
        let mut entry = rent();
        assert_eq!(entry.signed_amount(), -120000);
        entry.transaction_type = TransactionType::Income;
        assert_eq!(entry.signed_amount(), 120000);
    }
}
