use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde::Serialize;
use tokio::sync::watch;

use crate::models::Id;

/// One delivery of a live query: the full result set, or why there is none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "items", rename_all = "snake_case")]
pub enum Snapshot<T> {
    Pending,
    Ready(Vec<T>),
    Failed(String),
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Snapshot::Pending
    }
}

impl<T> Snapshot<T> {
    pub fn items(&self) -> Option<&[T]> {
        match self {
            Snapshot::Ready(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Snapshot::Pending)
    }
}

type Unsubscribe = Box<dyn FnOnce() + Send + Sync>;

/// Handle to a live query. Dropping it deregisters the listener.
pub struct Subscription<T> {
    receiver: watch::Receiver<Snapshot<T>>,
    unsubscribe: Option<Unsubscribe>,
}

impl<T: Clone> Subscription<T> {
    fn new(receiver: watch::Receiver<Snapshot<T>>, unsubscribe: Unsubscribe) -> Self {
        Self {
            receiver,
            unsubscribe: Some(unsubscribe),
        }
    }

    /// The latest snapshot, without waiting.
    pub fn current(&self) -> Snapshot<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next snapshot.
    pub async fn changed(&mut self) -> Result<Snapshot<T>> {
        self.receiver
            .changed()
            .await
            .map_err(|_| anyhow::anyhow!("Store closed the subscription"))?;
        Ok(self.receiver.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

struct Listener<T, Q> {
    user: Id,
    query: Q,
    sender: watch::Sender<Snapshot<T>>,
}

struct Listeners<T, Q> {
    next_key: u64,
    entries: HashMap<u64, Listener<T, Q>>,
}

/// Live-query listeners of one collection, keyed so each subscription can
/// remove exactly its own entry.
pub(crate) struct ListenerRegistry<T, Q> {
    inner: Arc<Mutex<Listeners<T, Q>>>,
}

impl<T, Q> ListenerRegistry<T, Q>
where
    T: Clone + Send + Sync + 'static,
    Q: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Listeners {
                next_key: 0,
                entries: HashMap::new(),
            })),
        }
    }

    pub fn register(&self, user: Id, query: Q, initial: Snapshot<T>) -> Subscription<T> {
        let (sender, receiver) = watch::channel(initial);
        let key = {
            let mut listeners = self.inner.lock().expect("listener lock poisoned");
            let key = listeners.next_key;
            listeners.next_key += 1;
            listeners.entries.insert(
                key,
                Listener {
                    user,
                    query,
                    sender,
                },
            );
            key
        };
        tracing::debug!(listener = key, "Registered live query");

        let registry = Arc::downgrade(&self.inner);
        Subscription::new(
            receiver,
            Box::new(move || {
                if let Some(inner) = registry.upgrade() {
                    if let Ok(mut listeners) = inner.lock() {
                        listeners.entries.remove(&key);
                        tracing::debug!(listener = key, "Removed live query");
                    }
                }
            }),
        )
    }

    /// Push a fresh snapshot to every listener of `user`.
    pub fn notify(&self, user: &Id, mut snapshot_for: impl FnMut(&Q) -> Snapshot<T>) {
        let listeners = self.inner.lock().expect("listener lock poisoned");
        for listener in listeners.entries.values().filter(|l| &l.user == user) {
            listener.sender.send_replace(snapshot_for(&listener.query));
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("listener lock poisoned")
            .entries
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropping_a_subscription_removes_only_its_listener() {
        let registry: ListenerRegistry<u32, ()> = ListenerRegistry::new();
        let user = Id::from_string("user-1");
        let first = registry.register(user.clone(), (), Snapshot::Pending);
        let second = registry.register(user.clone(), (), Snapshot::Ready(vec![1]));
        assert_eq!(registry.len(), 2);

        drop(first);
        assert_eq!(registry.len(), 1);
        assert_eq!(second.current(), Snapshot::Ready(vec![1]));

        second.unsubscribe();
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn notify_reaches_only_the_matching_user() {
        let registry: ListenerRegistry<u32, ()> = ListenerRegistry::new();
        let mut mine = registry.register(Id::from_string("a"), (), Snapshot::Pending);
        let theirs = registry.register(Id::from_string("b"), (), Snapshot::Pending);

        registry.notify(&Id::from_string("a"), |_| Snapshot::Ready(vec![7]));

        assert_eq!(mine.changed().await.unwrap(), Snapshot::Ready(vec![7]));
        assert!(theirs.current().is_pending());
    }
}
