//! Observable values for push-on-change reads.
//!
//! # Responsibility
//! - Hold the latest value of a projection and push changes to subscribers.
//! - Derive a single-row view from the full item list.
//!
//! # Invariants
//! - Producers are multi-writer safe; the latest write wins.
//! - A new subscription first yields the value current at subscribe time.
//! - Dropping a subscription unsubscribes; producers keep no per-subscriber state.

use crate::model::item::{Item, ItemId};
use tokio::sync::watch;

/// Producer side of an observable value.
#[derive(Debug)]
pub struct Observable<T> {
    sender: watch::Sender<T>,
}

impl<T: Clone> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Replaces the value and notifies subscribers, even when nobody listens.
    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Replaces the value only when it differs. Returns whether it changed.
    pub fn set_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        self.sender.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        })
    }

    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> Subscription<T> {
        Subscription::new(self.sender.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Consumer side of an observable value.
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    fn new(mut receiver: watch::Receiver<T>) -> Self {
        receiver.mark_changed();
        Self { receiver }
    }

    /// Latest value without marking it as delivered.
    pub fn current(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Waits for a value not yet delivered to this subscription.
    ///
    /// Returns `None` once the producer is gone.
    pub async fn next(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    fn inspect_and_mark<R>(&mut self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.receiver.borrow_and_update())
    }

    async fn changed(&mut self) -> Option<()> {
        self.receiver.changed().await.ok()
    }
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
        }
    }
}

/// Live view over every item in the store.
pub type LiveList = Subscription<Vec<Item>>;

/// Live view over one item, projected from the full list.
///
/// Stays pending while the row is absent, including after deletion.
#[derive(Debug)]
pub struct LiveItem {
    id: ItemId,
    items: LiveList,
    last_emitted: Option<Item>,
}

impl LiveItem {
    pub(crate) fn new(id: ItemId, items: LiveList) -> Self {
        Self {
            id,
            items,
            last_emitted: None,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn current(&self) -> Option<Item> {
        find_item(&self.items.current(), self.id)
    }

    /// Waits until the row exists and differs from the last emitted value.
    ///
    /// Returns `None` only once the store is gone.
    pub async fn next(&mut self) -> Option<Item> {
        loop {
            let id = self.id;
            let found = self.items.inspect_and_mark(|items| find_item(items, id));
            if let Some(item) = found {
                if self.last_emitted.as_ref() != Some(&item) {
                    self.last_emitted = Some(item.clone());
                    return Some(item);
                }
            }
            self.items.changed().await?;
        }
    }
}

fn find_item(items: &[Item], id: ItemId) -> Option<Item> {
    items.iter().find(|item| item.id == Some(id)).cloned()
}
