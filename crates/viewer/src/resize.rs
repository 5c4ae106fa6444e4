use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

type Mailbox = Rc<Cell<Option<(u32, u32)>>>;

struct HubState {
    size: (u32, u32),
    next_id: u64,
    subscribers: BTreeMap<u64, Mailbox>,
}

/// Window-side source of resize notifications.
///
/// Clones share state. Subscribers do not run code on notification; each
/// keeps the latest unseen size until it takes it.
#[derive(Clone)]
pub struct ResizeHub {
    inner: Rc<RefCell<HubState>>,
}

impl ResizeHub {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(HubState {
                size: (width, height),
                next_id: 0,
                subscribers: BTreeMap::new(),
            })),
        }
    }

    /// Current size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        self.inner.borrow().size
    }

    pub fn notify(&self, width: u32, height: u32) {
        let mut state = self.inner.borrow_mut();
        state.size = (width, height);
        for mailbox in state.subscribers.values() {
            mailbox.set(Some((width, height)));
        }
    }

    pub fn subscribe(&self) -> ResizeSubscription {
        let mut state = self.inner.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        let mailbox = Mailbox::default();
        state.subscribers.insert(id, Rc::clone(&mailbox));
        ResizeSubscription {
            id,
            hub: Rc::downgrade(&self.inner),
            mailbox,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

impl std::fmt::Debug for ResizeHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("ResizeHub")
            .field("size", &state.size)
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}

/// Registration with a [`ResizeHub`]. Dropping it deregisters.
pub struct ResizeSubscription {
    id: u64,
    hub: Weak<RefCell<HubState>>,
    mailbox: Mailbox,
}

impl ResizeSubscription {
    /// The latest size notified since the last call, if any.
    pub fn take(&self) -> Option<(u32, u32)> {
        self.mailbox.take()
    }

    /// Current size of the hub, or `None` once the hub is gone.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.hub.upgrade().map(|hub| hub.borrow().size)
    }
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.borrow_mut().subscribers.remove(&self.id);
        }
    }
}

impl std::fmt::Debug for ResizeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResizeSubscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_see_latest_size_once() {
        let hub = ResizeHub::new(800, 600);
        let sub = hub.subscribe();
        assert_eq!(sub.take(), None);
        assert_eq!(sub.size(), Some((800, 600)));

        hub.notify(1024, 768);
        hub.notify(1280, 720);
        assert_eq!(sub.take(), Some((1280, 720)));
        assert_eq!(sub.take(), None);
        assert_eq!(hub.size(), (1280, 720));
    }

    #[test]
    fn drop_deregisters() {
        let hub = ResizeHub::new(1, 1);
        let a = hub.subscribe();
        let b = hub.clone().subscribe();
        assert_eq!(hub.subscriber_count(), 2);
        drop(a);
        assert_eq!(hub.subscriber_count(), 1);
        drop(b);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn subscription_outlives_hub() {
        let hub = ResizeHub::new(1, 1);
        let sub = hub.subscribe();
        drop(hub);
        assert_eq!(sub.size(), None);
        drop(sub);
    }
}
