//! Core types used throughout the ledger
//!
//! Type aliases that give the raw database integers a semantic name.

/// Account ID - assigned monotonically by the store, never reused.
///
/// # Ordering:
/// Balance updates inside a transfer always lock the lower `AccountId`
/// first, so the numeric order of this type is part of the locking protocol.
pub type AccountId = i64;

/// Entry ID - one signed balance movement on one account
pub type EntryId = i64;

/// Transfer ID - one paired debit/credit between two accounts
pub type TransferId = i64;

/// Amount in minor currency units (cents). Signed: entries carry direction.
pub type MinorUnits = i64;
