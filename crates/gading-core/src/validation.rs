//! # Validation Module
//!
//! Input validation for engine requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (CLI argument parsing)                                │
//! │  └── Shape: numbers are numbers, flags are present                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any unit of work opens)                  │
//! │  ├── ids are UUIDs, quantities positive and bounded                    │
//! │  └── payment method / amount, notes length, paging                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (PostgreSQL)                                        │
//! │  ├── CHECK (stock_reserved <= stock_on_hand), CHECK (qty > 0)          │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gading_core::validation::{validate_id, validate_quantity};
//!
//! assert!(validate_quantity("qty", 5).is_ok());
//! assert!(validate_id("customer_id", "not-a-uuid").is_err());
//! ```

use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CreateTransactionInput, ListTransactionsInput, PaymentMethod};
use crate::{
    DEFAULT_PAGE_SIZE, MAX_ITEM_QUANTITY, MAX_NOTES_LEN, MAX_PAGE_SIZE, MAX_TRANSACTION_ITEMS,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an entity id and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be a UUID
pub fn validate_id(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Uuid::parse_str(value).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a UUID".to_string(),
    })?;

    Ok(value.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity (sellable units).
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates the number of line items on a transaction.
pub fn validate_item_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if count > MAX_TRANSACTION_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_TRANSACTION_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Text Validators
// =============================================================================

/// Trims optional free text; blank becomes `None`.
pub fn validate_notes(field: &str, value: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if value.chars().count() > MAX_NOTES_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NOTES_LEN,
        });
    }

    Ok(Some(value.to_string()))
}

// =============================================================================
// Payment Validators
// =============================================================================

/// Parses a payment method (`cash` or `transfer`, surrounding whitespace ignored).
pub fn validate_payment_method(value: &str) -> ValidationResult<PaymentMethod> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "method".to_string(),
        });
    }
    value.parse()
}

/// Rejects amounts above [`Money::max_amount`].
pub fn validate_amount_limit(field: &str, amount: Money) -> ValidationResult<Money> {
    let max = Money::max_amount();
    if amount > max {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max: max.to_string(),
        });
    }
    Ok(amount)
}

/// Parses a payment amount.
///
/// ## Rules
/// - Must not be empty
/// - Decimal with at most two fractional digits
/// - Must be positive and at most [`Money::max_amount`]
///
/// ## Example
/// ```rust
/// use gading_core::validation::validate_payment_amount;
///
/// assert_eq!(validate_payment_amount("5000").unwrap().to_string(), "5000.00");
/// assert!(validate_payment_amount("0").is_err());
/// assert!(validate_payment_amount("12.345").is_err());
/// ```
pub fn validate_payment_amount(value: &str) -> ValidationResult<Money> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "amount".to_string(),
        });
    }

    let amount: Money = value.parse().map_err(|e: crate::error::MoneyError| {
        ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: e.to_string(),
        }
    })?;

    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    validate_amount_limit("amount", amount)
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates a create request and returns it with trimmed ids and notes.
///
/// Item errors name the offending position, e.g. `items[2].qty`.
pub fn validate_create_input(input: &CreateTransactionInput) -> ValidationResult<CreateTransactionInput> {
    let customer_id = validate_id("customer_id", &input.customer_id)?;
    validate_item_count(input.items.len())?;

    let mut items = Vec::with_capacity(input.items.len());
    for (i, item) in input.items.iter().enumerate() {
        let product_id = validate_id(&format!("items[{i}].product_id"), &item.product_id)?;
        validate_quantity(&format!("items[{i}].qty"), item.qty)?;
        items.push(crate::types::CreateItemInput {
            product_id,
            qty: item.qty,
        });
    }

    Ok(CreateTransactionInput {
        customer_id,
        notes: validate_notes("notes", input.notes.as_deref())?,
        items,
        status: input.status,
    })
}

/// Clamps paging: a limit outside `1..=MAX_PAGE_SIZE` becomes the default
/// page size, a negative offset becomes zero.
pub fn normalize_list_input(input: ListTransactionsInput) -> ListTransactionsInput {
    let limit = if input.limit <= 0 || input.limit > MAX_PAGE_SIZE {
        DEFAULT_PAGE_SIZE
    } else {
        input.limit
    };
    ListTransactionsInput {
        status: input.status,
        limit,
        offset: input.offset.max(0),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CreateItemInput, TransactionStatus};

    const ID: &str = "6f1c1c8e-5a0b-4d8e-9b52-0c3f1b1f2a10";

    #[test]
    fn test_validate_id() {
        assert_eq!(validate_id("id", &format!("  {ID} ")).unwrap(), ID);
        assert!(matches!(
            validate_id("id", "   "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_id("id", "abc"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity("qty", 1).is_ok());
        assert!(validate_quantity("qty", MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity("qty", 0).is_err());
        assert!(validate_quantity("qty", -3).is_err());
        assert!(validate_quantity("qty", MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_notes() {
        assert_eq!(validate_notes("notes", None).unwrap(), None);
        assert_eq!(validate_notes("notes", Some("  ")).unwrap(), None);
        assert_eq!(validate_notes("notes", Some(" hi ")).unwrap().as_deref(), Some("hi"));
        let long = "x".repeat(MAX_NOTES_LEN + 1);
        assert!(validate_notes("notes", Some(&long)).is_err());
    }

    #[test]
    fn test_payment_method_and_amount() {
        assert_eq!(validate_payment_method(" transfer").unwrap(), PaymentMethod::Transfer);
        assert!(matches!(
            validate_payment_method(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_payment_method("qris").is_err());

        assert!(matches!(
            validate_payment_amount(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_payment_amount("ten"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            validate_payment_amount("-5"),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_payment_amount_ceiling() {
        assert_eq!(
            validate_payment_amount("9999999999999999.99").unwrap(),
            Money::max_amount()
        );
        assert_eq!(
            validate_payment_amount("10000000000000000.00"),
            Err(ValidationError::TooLarge {
                field: "amount".into(),
                max: "9999999999999999.99".into(),
            })
        );
    }

    #[test]
    fn test_create_input_errors_name_the_item() {
        let input = CreateTransactionInput {
            customer_id: ID.into(),
            notes: None,
            items: vec![
                CreateItemInput { product_id: ID.into(), qty: 1 },
                CreateItemInput { product_id: ID.into(), qty: 0 },
            ],
            status: Some(TransactionStatus::Pending),
        };
        let err = validate_create_input(&input).unwrap_err();
        assert_eq!(err.field(), "items[1].qty");

        let empty = CreateTransactionInput {
            customer_id: ID.into(),
            ..Default::default()
        };
        assert_eq!(validate_create_input(&empty).unwrap_err().field(), "items");
    }

    #[test]
    fn test_normalize_list_input() {
        let n = normalize_list_input(ListTransactionsInput { status: None, limit: 0, offset: -4 });
        assert_eq!((n.limit, n.offset), (DEFAULT_PAGE_SIZE, 0));

        let n = normalize_list_input(ListTransactionsInput { status: None, limit: 101, offset: 5 });
        assert_eq!((n.limit, n.offset), (DEFAULT_PAGE_SIZE, 5));

        let n = normalize_list_input(ListTransactionsInput { status: None, limit: 100, offset: 0 });
        assert_eq!(n.limit, 100);
    }
}
