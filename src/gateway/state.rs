use std::sync::Arc;

use crate::store::LedgerStore;
use crate::transfer::{TransferCoordinator, TransferPolicy};

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    /// Single-row reads and account creation
    pub store: Arc<dyn LedgerStore>,
    /// Money movement over the same store
    pub transfers: Arc<TransferCoordinator<dyn LedgerStore>>,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>, policy: TransferPolicy) -> Self {
        let transfers = Arc::new(TransferCoordinator::with_policy(store.clone(), policy));
        Self { store, transfers }
    }
}
