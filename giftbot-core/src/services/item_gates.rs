use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async gate per key (item names, board keys).
///
/// A gift holds its item's gate from withdrawal until delivery is confirmed
/// or the codes are restored, so no other stock operation on that item can
/// observe the half-finished state. Different keys proceed independently.
/// A gate lives only while someone holds or waits on it.
#[derive(Default)]
pub struct ItemGates {
    gates: DashMap<String, Arc<Mutex<()>>>,
}

/// Held gate. Dropping it releases the key and forgets the gate if nobody
/// else is waiting.
pub struct ItemGuard<'a> {
    gates: &'a ItemGates,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ItemGates {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &str) -> ItemGuard<'_> {
        let gate = self.gates.entry(key.to_string()).or_default().clone();
        let guard = gate.lock_owned().await;
        ItemGuard {
            gates: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

impl Drop for ItemGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Clones are only taken under the map's shard lock, so a count of one
        // here means no holder and no waiter.
        self.gates
            .gates
            .remove_if(&self.key, |_, gate| Arc::strong_count(gate) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_same_item_waits_other_item_does_not() {
        let gates = ItemGates::new();
        let held = gates.lock("diamond").await;

        let blocked = timeout(Duration::from_millis(30), gates.lock("diamond")).await;
        assert!(blocked.is_err(), "second lock on the same item should wait");

        let other = timeout(Duration::from_millis(30), gates.lock("gold")).await;
        assert!(other.is_ok(), "a different item must not wait");

        drop(held);
        let after = timeout(Duration::from_millis(30), gates.lock("diamond")).await;
        assert!(after.is_ok());
    }

    #[tokio::test]
    async fn test_released_gates_are_forgotten() {
        let gates = ItemGates::new();
        for name in ["ghost", "phantom", "nobody"] {
            let _g = gates.lock(name).await;
            assert_eq!(gates.len(), 1);
        }
        assert!(gates.is_empty());
    }

    #[tokio::test]
    async fn test_gate_kept_while_someone_waits() {
        let gates = Arc::new(ItemGates::new());
        let held = gates.lock("diamond").await;

        let waiter = {
            let gates = gates.clone();
            tokio::spawn(async move {
                let _g = gates.lock("diamond").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(held);
        assert_eq!(gates.len(), 1, "the waiter still needs the gate");

        waiter.await.unwrap();
        assert!(gates.is_empty());
    }
}
