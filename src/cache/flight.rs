use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::record::AssetId;

/// Registry size at which dead entries are first swept.
const DEFAULT_SWEEP_AT: usize = 1024;

/// Per-identity async locks.
///
/// The registry only holds weak references. A lock stays reachable for as
/// long as a guard or a waiter holds its `Arc`, so an identity that is
/// currently locked always resolves to the same mutex. Entries whose lock
/// is no longer referenced are swept once the registry grows past a
/// threshold, which then doubles with the number of live entries.
pub struct InFlight {
    registry: Mutex<Registry>,
    min_sweep: usize,
}

struct Registry {
    locks: HashMap<AssetId, Weak<AsyncMutex<()>>>,
    sweep_at: usize,
}

impl InFlight {
    pub fn new() -> Self {
        Self::with_sweep_threshold(DEFAULT_SWEEP_AT)
    }

    /// Sweep dead entries once more than `threshold` identities are tracked.
    pub fn with_sweep_threshold(threshold: usize) -> Self {
        let min_sweep = threshold.max(1);
        Self {
            registry: Mutex::new(Registry {
                locks: HashMap::new(),
                sweep_at: min_sweep,
            }),
            min_sweep,
        }
    }

    /// Wait for exclusive access to `id`'s cache slot.
    pub async fn acquire(&self, id: &AssetId) -> OwnedMutexGuard<()> {
        self.lock_for(id).lock_owned().await
    }

    /// Number of identities currently tracked, live or not yet swept.
    pub fn tracked(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .locks
            .len()
    }

    fn lock_for(&self, id: &AssetId) -> Arc<AsyncMutex<()>> {
        let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(lock) = registry.locks.get(id).and_then(Weak::upgrade) {
            return lock;
        }

        let lock = Arc::new(AsyncMutex::new(()));
        registry.locks.insert(id.clone(), Arc::downgrade(&lock));

        if registry.locks.len() > registry.sweep_at {
            registry.locks.retain(|_, weak| weak.strong_count() > 0);
            registry.sweep_at = (registry.locks.len() * 2).max(self.min_sweep);
        }
        lock
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}
