//! Ledger entities and operation parameters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::{AccountId, EntryId, MinorUnits, TransferId};
use crate::currency;
use crate::error::ValidationError;

// ============================================================================
// Entities
// ============================================================================

/// Account row. `balance` changes only through additive deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Account {
    pub id: AccountId,
    pub owner: String,
    pub balance: MinorUnits,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// One signed balance movement: positive = credit, negative = debit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Entry {
    pub id: EntryId,
    pub account_id: AccountId,
    pub amount: MinorUnits,
    pub created_at: DateTime<Utc>,
}

/// Transfer row. `amount` is always positive; direction is from -> to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Transfer {
    pub id: TransferId,
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: MinorUnits,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Store parameters
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreateAccountParams {
    pub owner: String,
    pub balance: MinorUnits,
    pub currency: String,
}

impl CreateAccountParams {
    /// Checked by every store before the row is written
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.owner.trim().is_empty() {
            return Err(ValidationError::EmptyOwner);
        }
        if !currency::is_supported(&self.currency) {
            return Err(ValidationError::UnsupportedCurrency(self.currency.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateTransferParams {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: MinorUnits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateEntryParams {
    pub account_id: AccountId,
    pub amount: MinorUnits,
}

/// Atomic `balance = balance + amount`; `amount` may be negative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddAccountBalanceParams {
    pub account_id: AccountId,
    pub amount: MinorUnits,
}

/// Limit/offset window for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// 1-based page number and page size, as the HTTP layer receives them
    pub fn from_page_id(page_id: i64, page_size: i64) -> Result<Self, ValidationError> {
        if page_id < 1 || page_size < 1 {
            return Err(ValidationError::InvalidPage(format!(
                "page_id {page_id}, page_size {page_size}"
            )));
        }
        let offset = (page_id - 1).checked_mul(page_size).ok_or_else(|| {
            ValidationError::InvalidPage(format!("page_id {page_id} is out of range"))
        })?;
        Ok(Self {
            limit: page_size,
            offset,
        })
    }
}

// ============================================================================
// Transfer
// ============================================================================

/// Input of a money transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferParams {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: MinorUnits,
}

impl TransferParams {
    pub fn new(from_account_id: AccountId, to_account_id: AccountId, amount: MinorUnits) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
        }
    }
}

/// Everything a committed transfer wrote, as post-update rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransferResult {
    pub transfer: Transfer,
    pub from_account: Account,
    pub to_account: Account,
    pub from_entry: Entry,
    pub to_entry: Entry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_from_page_id() {
        assert_eq!(Page::from_page_id(1, 5), Ok(Page::new(5, 0)));
        assert_eq!(Page::from_page_id(3, 10), Ok(Page::new(10, 20)));
    }

    #[test]
    fn test_page_offset_overflow_is_rejected() {
        assert!(matches!(
            Page::from_page_id(i64::MAX, 10),
            Err(ValidationError::InvalidPage(_))
        ));
        assert!(matches!(
            Page::from_page_id(0, 10),
            Err(ValidationError::InvalidPage(_))
        ));
        // Largest page whose offset still fits
        let last = i64::MAX / 10 + 1;
        assert_eq!(
            Page::from_page_id(last, 10),
            Ok(Page::new(10, (last - 1) * 10))
        );
    }

    #[test]
    fn test_create_account_params_rules() {
        let params = |owner: &str, currency: &str| CreateAccountParams {
            owner: owner.to_string(),
            balance: 0,
            currency: currency.to_string(),
        };
        assert_eq!(params("alice", "USD").validate(), Ok(()));
        assert_eq!(params("  ", "USD").validate(), Err(ValidationError::EmptyOwner));
        assert_eq!(
            params("alice", "GBP").validate(),
            Err(ValidationError::UnsupportedCurrency("GBP".to_string()))
        );
    }
}
