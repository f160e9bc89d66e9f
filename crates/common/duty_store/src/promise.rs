use std::{collections::HashMap, hash::Hash};

use parking_lot::Mutex;
use tessera_fetcher::AwaitError;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Write-once values keyed by `K`, with readers that block until their key is resolved.
///
/// The first write for a key wins. Writing the same value again is a no-op and writing a
/// different one fails with [`AwaitError::Mismatch`].
pub struct AwaitMap<K, V> {
    entries: Mutex<HashMap<K, watch::Sender<Option<V>>>>,
}

impl<K, V> Default for AwaitMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> AwaitMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn subscribe(&self, key: K) -> Pending<'_, K, V> {
        let receiver = self
            .entries
            .lock()
            .entry(key.clone())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe();
        Pending {
            map: self,
            key,
            receiver,
        }
    }

    pub fn store(&self, key: K, value: V) -> Result<(), AwaitError> {
        let mut entries = self.entries.lock();
        let sender = entries
            .entry(key)
            .or_insert_with(|| watch::channel(None).0);

        let mut result = Ok(());
        sender.send_if_modified(|current| match current {
            Some(existing) => {
                if *existing != value {
                    result = Err(AwaitError::Mismatch);
                }
                false
            }
            None => {
                *current = Some(value);
                true
            }
        });
        result
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .lock()
            .get(key)
            .and_then(|sender| sender.borrow().clone())
    }

    /// Waits for the value of `key`, or for `cancel` to fire. A key that is still unresolved when
    /// its last reader gives up is forgotten.
    pub async fn await_value(&self, cancel: &CancellationToken, key: K) -> Result<V, AwaitError> {
        let mut pending = self.subscribe(key);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AwaitError::Cancelled),
            result = pending.receiver.wait_for(Option::is_some) => match result {
                Ok(value) => value.clone().ok_or(AwaitError::Closed),
                Err(_) => Err(AwaitError::Closed),
            },
        }
    }

    /// Drops every entry whose key matches `predicate`. Pending readers of a dropped key fail
    /// with [`AwaitError::Closed`].
    pub fn trim(&self, predicate: impl Fn(&K) -> bool) {
        self.entries.lock().retain(|key, _| !predicate(key));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A reader's interest in one key, released on drop.
struct Pending<'a, K, V>
where
    K: Eq + Hash,
{
    map: &'a AwaitMap<K, V>,
    key: K,
    receiver: watch::Receiver<Option<V>>,
}

impl<K, V> Drop for Pending<'_, K, V>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        let mut entries = self.map.entries.lock();
        let unclaimed = entries.get(&self.key).is_some_and(|sender| {
            // The only receiver left is this one.
            sender.borrow().is_none() && sender.receiver_count() == 1
        });
        if unclaimed {
            entries.remove(&self.key);
        }
    }
}
