//! Change notification.
//!
//! Observers register a zero-argument callback and get a [`SubscriptionId`]
//! back; they stay registered until that id is explicitly unsubscribed.
//! Delivery is synchronous, on the mutating call.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{trace, warn};

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        Self(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

pub type Listener = Box<dyn FnMut()>;

/// A list of change listeners, notified in subscription order.
#[derive(Default)]
pub struct Listeners {
    entries: BTreeMap<SubscriptionId, Listener>,
}

impl Listeners {
    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.entries.insert(id, Box::new(listener));
        id
    }

    /// Returns `false` when `id` was not subscribed here.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn notify(&mut self) {
        for listener in self.entries.values_mut() {
            listener();
        }
    }

    fn ids(&self) -> Vec<SubscriptionId> {
        self.entries.keys().copied().collect()
    }

    fn absorb(&mut self, other: Listeners) {
        self.entries.extend(other.entries);
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[derive(Debug, Default)]
struct HubState {
    listeners: Listeners,
    batch_depth: usize,
    pending: bool,
    dispatching: bool,
    /// Ids of the listeners currently out for dispatch.
    in_flight: Vec<SubscriptionId>,
    cancelled: Vec<SubscriptionId>,
    version: u64,
}

/// The store-level broadcast point.
///
/// Shared (through a weak handle) with the forwarders subscribed on each
/// node, so a node-internal change reaches the store's observers. While a
/// batch is open, changes are coalesced into one pending notification.
#[derive(Debug, Clone, Default)]
pub(crate) struct ChangeHub {
    state: Rc<RefCell<HubState>>,
}

impl ChangeHub {
    pub(crate) fn subscribe(&self, listener: impl FnMut() + 'static) -> SubscriptionId {
        self.state.borrow_mut().listeners.subscribe(listener)
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.state.borrow_mut();
        if state.listeners.unsubscribe(id) {
            return true;
        }
        // Out for dispatch right now; dropped once the dispatch finishes.
        if state.in_flight.contains(&id) && !state.cancelled.contains(&id) {
            state.cancelled.push(id);
            return true;
        }
        false
    }

    /// Number of notifications delivered so far.
    pub(crate) fn version(&self) -> u64 {
        self.state.borrow().version
    }

    pub(crate) fn changed(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.batch_depth > 0 {
                state.pending = true;
                return;
            }
            if state.dispatching {
                warn!("change notification raised from inside a notification; dropped");
                return;
            }
            state.dispatching = true;
        }

        // Listeners run without the state borrowed so that a listener reaching
        // back into the hub does not panic.
        let mut listeners = {
            let mut state = self.state.borrow_mut();
            let listeners = std::mem::take(&mut state.listeners);
            state.in_flight = listeners.ids();
            listeners
        };
        trace!("notifying {} observers", listeners.len());
        listeners.notify();

        let mut state = self.state.borrow_mut();
        let added = std::mem::replace(&mut state.listeners, listeners);
        state.listeners.absorb(added);
        for id in std::mem::take(&mut state.cancelled) {
            state.listeners.unsubscribe(id);
        }
        state.in_flight.clear();
        state.dispatching = false;
        state.version += 1;
    }

    pub(crate) fn begin_batch(&self) {
        self.state.borrow_mut().batch_depth += 1;
    }

    /// Closes a batch. When the outermost batch closes, the pending
    /// notification (if any) is delivered when `deliver` is set and discarded
    /// otherwise. Returns whether a notification went out.
    pub(crate) fn end_batch(&self, deliver: bool) -> bool {
        let pending = {
            let mut state = self.state.borrow_mut();
            state.batch_depth = state.batch_depth.saturating_sub(1);
            if state.batch_depth > 0 {
                return false;
            }
            std::mem::take(&mut state.pending)
        };
        if pending && deliver {
            self.changed();
            true
        } else {
            false
        }
    }

    /// A callback that raises a change on this hub for as long as it lives.
    pub(crate) fn forwarder(&self) -> impl FnMut() + 'static {
        let hub = Rc::downgrade(&self.state);
        move || {
            if let Some(state) = hub.upgrade() {
                ChangeHub { state }.changed();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter(hub: &ChangeHub) -> (Rc<Cell<usize>>, SubscriptionId) {
        let count = Rc::new(Cell::new(0));
        let seen = count.clone();
        let id = hub.subscribe(move || seen.set(seen.get() + 1));
        (count, id)
    }

    #[test]
    fn notifies_every_listener_once() {
        let hub = ChangeHub::default();
        let (a, _) = counter(&hub);
        let (b, _) = counter(&hub);
        hub.changed();
        assert_eq!((a.get(), b.get()), (1, 1));
        assert_eq!(hub.version(), 1);
    }

    #[test]
    fn unsubscribed_listener_is_silent() {
        let hub = ChangeHub::default();
        let (count, id) = counter(&hub);
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        hub.changed();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn batch_coalesces_into_one_notification() {
        let hub = ChangeHub::default();
        let (count, _) = counter(&hub);
        hub.begin_batch();
        hub.changed();
        hub.changed();
        hub.begin_batch();
        hub.changed();
        assert!(!hub.end_batch(true));
        assert_eq!(count.get(), 0);
        assert!(hub.end_batch(true));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn discarded_batch_notifies_nobody() {
        let hub = ChangeHub::default();
        let (count, _) = counter(&hub);
        hub.begin_batch();
        hub.changed();
        assert!(!hub.end_batch(false));
        assert_eq!(count.get(), 0);
        assert_eq!(hub.version(), 0);
    }

    #[test]
    fn empty_batch_notifies_nobody() {
        let hub = ChangeHub::default();
        let (count, _) = counter(&hub);
        hub.begin_batch();
        assert!(!hub.end_batch(true));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn forwarder_stops_once_hub_is_gone() {
        let mut node_listeners = Listeners::default();
        let count = {
            let hub = ChangeHub::default();
            let (count, _) = counter(&hub);
            node_listeners.subscribe(hub.forwarder());
            node_listeners.notify();
            assert_eq!(count.get(), 1);
            count
        };
        node_listeners.notify();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn reentrant_notification_is_dropped() {
        let hub = ChangeHub::default();
        let (count, _) = counter(&hub);
        let inner = hub.clone();
        hub.subscribe(move || inner.changed());
        hub.changed();
        assert_eq!(count.get(), 1);
        assert_eq!(hub.version(), 1);
    }

    #[test]
    fn unsubscribe_during_dispatch_reports_unknown_ids() {
        let hub = ChangeHub::default();
        let (_, id) = counter(&hub);
        let stranger = {
            let other = ChangeHub::default();
            counter(&other).1
        };
        let results = Rc::new(RefCell::new(Vec::new()));
        let seen = results.clone();
        let inner = hub.clone();
        hub.subscribe(move || {
            let mut seen = seen.borrow_mut();
            seen.push(inner.unsubscribe(stranger));
            seen.push(inner.unsubscribe(id));
            seen.push(inner.unsubscribe(id));
        });
        hub.changed();
        assert_eq!(*results.borrow(), vec![false, true, false]);
    }

    #[test]
    fn unsubscribe_during_dispatch_takes_effect_afterwards() {
        let hub = ChangeHub::default();
        let (count, id) = counter(&hub);
        let inner = hub.clone();
        hub.subscribe(move || {
            inner.unsubscribe(id);
        });
        hub.changed();
        assert_eq!(count.get(), 1);
        hub.changed();
        assert_eq!(count.get(), 1);
    }
}
