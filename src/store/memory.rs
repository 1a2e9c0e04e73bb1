//! In-process Ledger Store
//!
//! Committed rows live in ordered maps behind one mutex. A transaction stages
//! its writes privately and publishes them in a single critical section on
//! commit. Balance updates take a per-account async row lock that is held until
//! the transaction finishes, which gives the same blocking behaviour as
//! `UPDATE ... SET balance = balance + $1` under PostgreSQL: a second writer on
//! the same row waits, and two writers locking rows in opposite order deadlock.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};
use tracing::debug;

use super::{LedgerQueries, LedgerStore, LedgerTx};
use crate::core_types::{AccountId, EntryId, MinorUnits, TransferId};
use crate::error::LedgerError;
use crate::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, Page, Transfer,
};

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<AccountId, Account>,
    entries: BTreeMap<EntryId, Entry>,
    transfers: BTreeMap<TransferId, Transfer>,
}

#[derive(Default)]
struct Shared {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<AccountId, Arc<RowLock<()>>>>,
    account_seq: AtomicI64,
    entry_seq: AtomicI64,
    transfer_seq: AtomicI64,
}

impl Shared {
    // Writes happen in one non-async critical section, so a poisoned guard
    // still holds consistent tables.
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn row_lock(&self, account_id: AccountId) -> Option<Arc<RowLock<()>>> {
        self.row_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&account_id)
            .cloned()
    }

    fn require_account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        self.tables()
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("account", account_id))
    }
}

fn window<T: Clone>(rows: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    let offset = usize::try_from(page.offset).unwrap_or(0);
    let limit = usize::try_from(page.limit).unwrap_or(0);
    rows.skip(offset).take(limit).collect()
}

/// In-memory ledger backend
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    shared: Arc<Shared>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all committed entries on an account
    pub fn entry_sum(&self, account_id: AccountId) -> MinorUnits {
        self.shared
            .tables()
            .entries
            .values()
            .filter(|e| e.account_id == account_id)
            .map(|e| e.amount)
            .sum()
    }

    /// Committed row counts: (accounts, entries, transfers)
    pub fn row_counts(&self) -> (usize, usize, usize) {
        let tables = self.shared.tables();
        (
            tables.accounts.len(),
            tables.entries.len(),
            tables.transfers.len(),
        )
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, LedgerError> {
        Ok(Box::new(MemoryTx::new(self.shared.clone())))
    }

    async fn create_account(&self, arg: CreateAccountParams) -> Result<Account, LedgerError> {
        arg.validate()?;
        let mut tables = self.shared.tables();
        if tables
            .accounts
            .values()
            .any(|a| a.owner == arg.owner && a.currency == arg.currency)
        {
            return Err(LedgerError::Conflict(format!(
                "account for owner '{}' in {} already exists",
                arg.owner, arg.currency
            )));
        }

        let account = Account {
            id: self.shared.account_seq.fetch_add(1, Ordering::SeqCst) + 1,
            owner: arg.owner,
            balance: arg.balance,
            currency: arg.currency,
            created_at: Utc::now(),
        };
        tables.accounts.insert(account.id, account.clone());
        self.shared
            .row_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(account.id, Arc::new(RowLock::new(())));

        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.shared.require_account(id)
    }

    async fn get_entry(&self, id: EntryId) -> Result<Entry, LedgerError> {
        self.shared
            .tables()
            .entries
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("entry", id))
    }

    async fn get_transfer(&self, id: TransferId) -> Result<Transfer, LedgerError> {
        self.shared
            .tables()
            .transfers
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("transfer", id))
    }

    async fn list_accounts(&self, owner: &str, page: Page) -> Result<Vec<Account>, LedgerError> {
        let tables = self.shared.tables();
        Ok(window(
            tables.accounts.values().filter(|a| a.owner == owner).cloned(),
            page,
        ))
    }

    async fn list_entries(
        &self,
        account_id: AccountId,
        page: Page,
    ) -> Result<Vec<Entry>, LedgerError> {
        let tables = self.shared.tables();
        Ok(window(
            tables
                .entries
                .values()
                .filter(|e| e.account_id == account_id)
                .cloned(),
            page,
        ))
    }

    async fn list_transfers(
        &self,
        account_id: AccountId,
        page: Page,
    ) -> Result<Vec<Transfer>, LedgerError> {
        let tables = self.shared.tables();
        Ok(window(
            tables
                .transfers
                .values()
                .filter(|t| t.from_account_id == account_id || t.to_account_id == account_id)
                .cloned(),
            page,
        ))
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}

/// Open transaction on a [`MemoryLedgerStore`]
pub struct MemoryTx {
    shared: Arc<Shared>,
    held: HashMap<AccountId, OwnedMutexGuard<()>>,
    balances: HashMap<AccountId, MinorUnits>,
    entries: Vec<Entry>,
    transfers: Vec<Transfer>,
    finished: bool,
}

impl MemoryTx {
    fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            held: HashMap::new(),
            balances: HashMap::new(),
            entries: Vec::new(),
            transfers: Vec::new(),
            finished: false,
        }
    }

    fn has_writes(&self) -> bool {
        !(self.balances.is_empty() && self.entries.is_empty() && self.transfers.is_empty())
    }

    fn discard(&mut self) {
        self.balances.clear();
        self.entries.clear();
        self.transfers.clear();
        // Releasing the guards wakes writers queued on these rows
        self.held.clear();
        self.finished = true;
    }

    fn overlay(&self, mut account: Account) -> Account {
        if let Some(balance) = self.balances.get(&account.id) {
            account.balance = *balance;
        }
        account
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if !self.finished && self.has_writes() {
            debug!(
                staged_entries = self.entries.len(),
                staged_transfers = self.transfers.len(),
                "Transaction dropped before commit, rolling back"
            );
        }
    }
}

#[async_trait]
impl LedgerQueries for MemoryTx {
    async fn create_transfer(
        &mut self,
        arg: CreateTransferParams,
    ) -> Result<Transfer, LedgerError> {
        self.shared.require_account(arg.from_account_id)?;
        self.shared.require_account(arg.to_account_id)?;

        let transfer = Transfer {
            id: self.shared.transfer_seq.fetch_add(1, Ordering::SeqCst) + 1,
            from_account_id: arg.from_account_id,
            to_account_id: arg.to_account_id,
            amount: arg.amount,
            created_at: Utc::now(),
        };
        self.transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn create_entry(&mut self, arg: CreateEntryParams) -> Result<Entry, LedgerError> {
        self.shared.require_account(arg.account_id)?;

        let entry = Entry {
            id: self.shared.entry_seq.fetch_add(1, Ordering::SeqCst) + 1,
            account_id: arg.account_id,
            amount: arg.amount,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    async fn add_account_balance(
        &mut self,
        arg: AddAccountBalanceParams,
    ) -> Result<Account, LedgerError> {
        let lock = self
            .shared
            .row_lock(arg.account_id)
            .ok_or_else(|| LedgerError::not_found("account", arg.account_id))?;

        if !self.held.contains_key(&arg.account_id) {
            let guard = lock.lock_owned().await;
            self.held.insert(arg.account_id, guard);
        }

        // Row is locked by this transaction: the committed balance cannot move
        let account = self.overlay(self.shared.require_account(arg.account_id)?);
        let balance = account.balance.checked_add(arg.amount).ok_or_else(|| {
            LedgerError::Storage(format!("balance overflow on account {}", arg.account_id))
        })?;
        self.balances.insert(arg.account_id, balance);

        Ok(Account { balance, ..account })
    }

    async fn get_account(&mut self, id: AccountId) -> Result<Account, LedgerError> {
        let account = self.shared.require_account(id)?;
        Ok(self.overlay(account))
    }

    async fn get_entry(&mut self, id: EntryId) -> Result<Entry, LedgerError> {
        if let Some(entry) = self.entries.iter().find(|e| e.id == id) {
            return Ok(entry.clone());
        }
        self.shared
            .tables()
            .entries
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("entry", id))
    }

    async fn get_transfer(&mut self, id: TransferId) -> Result<Transfer, LedgerError> {
        if let Some(transfer) = self.transfers.iter().find(|t| t.id == id) {
            return Ok(transfer.clone());
        }
        self.shared
            .tables()
            .transfers
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("transfer", id))
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    fn queries(&mut self) -> &mut dyn LedgerQueries {
        self
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        let mut this = self;
        {
            let mut tables = this.shared.tables();
            for (account_id, balance) in &this.balances {
                let account = tables
                    .accounts
                    .get_mut(account_id)
                    .ok_or_else(|| LedgerError::not_found("account", account_id))?;
                account.balance = *balance;
            }
            for entry in &this.entries {
                tables.entries.insert(entry.id, entry.clone());
            }
            for transfer in &this.transfers {
                tables.transfers.insert(transfer.id, transfer.clone());
            }
        }
        this.discard();
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        let mut this = self;
        this.discard();
        Ok(())
    }
}
