//! Money Transfer
//!
//! One transfer moves `amount` from a source account to a destination account.
//! Within a single transaction it writes:
//!
//! ```text
//! transfers(from, to, amount)
//! entries(from, -amount)
//! entries(to,   +amount)
//! accounts[min(from, to)].balance += delta
//! accounts[max(from, to)].balance += delta
//! ```
//!
//! # Guarantees
//!
//! 1. **All or nothing**: any failure leaves no transfer, no entries and no
//!    balance change behind
//! 2. **Conservation**: the two balance deltas sum to zero
//! 3. **Deadlock freedom**: row locks are always taken in ascending id order
//! 4. **Not idempotent**: retrying a successful call records a second transfer

pub mod coordinator;

pub use coordinator::{TransferCoordinator, TransferPolicy, validate_transfer};
