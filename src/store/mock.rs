//! Recording store for tests
//!
//! Wraps a [`MemoryLedgerStore`], counts every operation and can inject
//! failures at chosen points.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{LedgerQueries, LedgerStore, LedgerTx, MemoryLedgerStore};
use crate::core_types::{AccountId, EntryId, TransferId};
use crate::error::LedgerError;
use crate::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, Page, Transfer,
};

#[derive(Default)]
struct Counters {
    begin: AtomicUsize,
    commit: AtomicUsize,
    rollback: AtomicUsize,
    create_transfer: AtomicUsize,
    create_entry: AtomicUsize,
    add_balance: AtomicUsize,
    /// 1-based create_entry call that fails, 0 = never
    fail_entry_call: AtomicUsize,
    fail_rollback: AtomicBool,
    fail_health: AtomicBool,
    balance_order: Mutex<Vec<AccountId>>,
}

pub struct RecordingStore {
    inner: MemoryLedgerStore,
    counters: Arc<Counters>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryLedgerStore::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn inner(&self) -> &MemoryLedgerStore {
        &self.inner
    }

    /// Make the n-th `create_entry` call (counted across transactions) fail
    pub fn fail_create_entry_on_call(&self, n: usize) {
        self.counters.fail_entry_call.store(n, Ordering::SeqCst);
    }

    pub fn set_fail_rollback(&self, fail: bool) {
        self.counters.fail_rollback.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_health(&self, fail: bool) {
        self.counters.fail_health.store(fail, Ordering::SeqCst);
    }

    pub fn begin_count(&self) -> usize {
        self.counters.begin.load(Ordering::SeqCst)
    }

    pub fn commit_count(&self) -> usize {
        self.counters.commit.load(Ordering::SeqCst)
    }

    pub fn rollback_count(&self) -> usize {
        self.counters.rollback.load(Ordering::SeqCst)
    }

    /// Writes issued through transactions (transfers + entries + balance deltas)
    pub fn write_count(&self) -> usize {
        self.counters.create_transfer.load(Ordering::SeqCst)
            + self.counters.create_entry.load(Ordering::SeqCst)
            + self.counters.add_balance.load(Ordering::SeqCst)
    }

    /// Account ids in the order `add_account_balance` was called
    pub fn balance_order(&self) -> Vec<AccountId> {
        self.counters.balance_order.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerStore for RecordingStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, LedgerError> {
        self.counters.begin.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.begin().await?;
        Ok(Box::new(RecordingTx {
            inner,
            counters: self.counters.clone(),
        }))
    }

    async fn create_account(&self, arg: CreateAccountParams) -> Result<Account, LedgerError> {
        self.inner.create_account(arg).await
    }

    async fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.inner.get_account(id).await
    }

    async fn get_entry(&self, id: EntryId) -> Result<Entry, LedgerError> {
        self.inner.get_entry(id).await
    }

    async fn get_transfer(&self, id: TransferId) -> Result<Transfer, LedgerError> {
        self.inner.get_transfer(id).await
    }

    async fn list_accounts(&self, owner: &str, page: Page) -> Result<Vec<Account>, LedgerError> {
        self.inner.list_accounts(owner, page).await
    }

    async fn list_entries(
        &self,
        account_id: AccountId,
        page: Page,
    ) -> Result<Vec<Entry>, LedgerError> {
        self.inner.list_entries(account_id, page).await
    }

    async fn list_transfers(
        &self,
        account_id: AccountId,
        page: Page,
    ) -> Result<Vec<Transfer>, LedgerError> {
        self.inner.list_transfers(account_id, page).await
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        if self.counters.fail_health.load(Ordering::SeqCst) {
            return Err(LedgerError::Storage("injected ping failure".into()));
        }
        self.inner.health_check().await
    }
}

struct RecordingTx {
    inner: Box<dyn LedgerTx>,
    counters: Arc<Counters>,
}

#[async_trait]
impl LedgerQueries for RecordingTx {
    async fn create_transfer(
        &mut self,
        arg: CreateTransferParams,
    ) -> Result<Transfer, LedgerError> {
        self.counters.create_transfer.fetch_add(1, Ordering::SeqCst);
        self.inner.queries().create_transfer(arg).await
    }

    async fn create_entry(&mut self, arg: CreateEntryParams) -> Result<Entry, LedgerError> {
        let call = self.counters.create_entry.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.counters.fail_entry_call.load(Ordering::SeqCst) {
            return Err(LedgerError::Storage("injected create_entry failure".into()));
        }
        self.inner.queries().create_entry(arg).await
    }

    async fn add_account_balance(
        &mut self,
        arg: AddAccountBalanceParams,
    ) -> Result<Account, LedgerError> {
        self.counters.add_balance.fetch_add(1, Ordering::SeqCst);
        self.counters
            .balance_order
            .lock()
            .unwrap()
            .push(arg.account_id);
        self.inner.queries().add_account_balance(arg).await
    }

    async fn get_account(&mut self, id: AccountId) -> Result<Account, LedgerError> {
        self.inner.queries().get_account(id).await
    }

    async fn get_entry(&mut self, id: EntryId) -> Result<Entry, LedgerError> {
        self.inner.queries().get_entry(id).await
    }

    async fn get_transfer(&mut self, id: TransferId) -> Result<Transfer, LedgerError> {
        self.inner.queries().get_transfer(id).await
    }
}

#[async_trait]
impl LedgerTx for RecordingTx {
    fn queries(&mut self) -> &mut dyn LedgerQueries {
        self
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        self.counters.commit.fetch_add(1, Ordering::SeqCst);
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        self.counters.rollback.fetch_add(1, Ordering::SeqCst);
        let fail = self.counters.fail_rollback.load(Ordering::SeqCst);
        // Real rollback still happens so row locks are released
        self.inner.rollback().await?;
        if fail {
            return Err(LedgerError::Storage("injected rollback failure".into()));
        }
        Ok(())
    }
}
