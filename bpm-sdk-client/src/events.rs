//! Attachable pub-sub used by the client and the forms lifecycle.
//!
//! Handlers are keyed by event name and dispatched synchronously in
//! registration order. `on` hands back a subscription id so a single
//! handler can be detached later without clearing the whole event.

use serde_json::Value;
use std::collections::BTreeMap;

pub type HandlerId = u64;

type Handler = Box<dyn FnMut(&Value) + Send>;

struct Subscription {
    id: HandlerId,
    once: bool,
    handler: Handler,
}

#[derive(Default)]
pub struct Emitter {
    next_id: HandlerId,
    handlers: BTreeMap<String, Vec<Subscription>>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `event`. Returns the subscription id.
    pub fn on<F>(&mut self, event: &str, handler: F) -> HandlerId
    where
        F: FnMut(&Value) + Send + 'static,
    {
        self.subscribe(event, handler, false)
    }

    /// Subscribe to `event` for a single delivery.
    pub fn once<F>(&mut self, event: &str, handler: F) -> HandlerId
    where
        F: FnMut(&Value) + Send + 'static,
    {
        self.subscribe(event, handler, true)
    }

    fn subscribe<F>(&mut self, event: &str, handler: F, once: bool) -> HandlerId
    where
        F: FnMut(&Value) + Send + 'static,
    {
        self.next_id += 1;
        let id = self.next_id;
        self.handlers
            .entry(event.to_owned())
            .or_default()
            .push(Subscription {
                id,
                once,
                handler: Box::new(handler),
            });
        id
    }

    /// Drop every handler registered for `event`.
    pub fn off(&mut self, event: &str) {
        self.handlers.remove(event);
    }

    /// Drop one handler by its subscription id. Returns whether it existed.
    pub fn off_handler(&mut self, event: &str, id: HandlerId) -> bool {
        match self.handlers.get_mut(event) {
            Some(subs) => {
                let before = subs.len();
                subs.retain(|s| s.id != id);
                before != subs.len()
            }
            None => false,
        }
    }

    /// Dispatch `payload` to every handler of `event`, in registration
    /// order. Returns the number of handlers invoked.
    pub fn trigger(&mut self, event: &str, payload: &Value) -> usize {
        let Some(mut subs) = self.handlers.remove(event) else {
            return 0;
        };
        let mut delivered = 0;
        for sub in &mut subs {
            (sub.handler)(payload);
            delivered += 1;
        }
        subs.retain(|s| !s.once);
        // handlers registered during dispatch land after the survivors
        if let Some(added) = self.handlers.remove(event) {
            subs.extend(added);
        }
        if !subs.is_empty() {
            self.handlers.insert(event.to_owned(), subs);
        }
        delivered
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.get(event).map_or(0, Vec::len)
    }
}
