use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use futures_util::future::BoxFuture;

use vaportrader_core::protocol::{ChatMessage, Order};

use crate::dispatch::PrivateMessage;

pub type HookFuture = BoxFuture<'static, ()>;
pub type OrderHook = Arc<dyn Fn(Order) -> HookFuture + Send + Sync>;
pub type NewMessageHook = Arc<dyn Fn(ChatMessage) -> HookFuture + Send + Sync>;
pub type PrivateMessageHook = Arc<dyn Fn(PrivateMessage) -> HookFuture + Send + Sync>;

/// Hook slots, one callback per event class. Setting a slot replaces the
/// previous callback (last writer wins).
///
/// Priority rule for `NEW_MESSAGE`: when the private-message hook is set it
/// takes the frame (after a read receipt is queued) and the new-message hook
/// is not called. The new-message hook only sees direct messages while no
/// private-message hook is registered.
#[derive(Default)]
pub struct Hooks {
    order: RwLock<Option<OrderHook>>,
    new_message: RwLock<Option<NewMessageHook>>,
    private_message: RwLock<Option<PrivateMessageHook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_order<F, Fut>(&self, hook: F)
    where
        F: Fn(Order) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let boxed: OrderHook = Arc::new(move |order: Order| -> HookFuture { Box::pin(hook(order)) });
        replace(&self.order, boxed);
    }

    pub fn set_new_message<F, Fut>(&self, hook: F)
    where
        F: Fn(ChatMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let boxed: NewMessageHook = Arc::new(move |msg: ChatMessage| -> HookFuture { Box::pin(hook(msg)) });
        replace(&self.new_message, boxed);
    }

    pub fn set_private_message<F, Fut>(&self, hook: F)
    where
        F: Fn(PrivateMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let boxed: PrivateMessageHook = Arc::new(move |pm: PrivateMessage| -> HookFuture { Box::pin(hook(pm)) });
        replace(&self.private_message, boxed);
    }

    pub fn order(&self) -> Option<OrderHook> {
        current(&self.order)
    }

    pub fn new_message(&self) -> Option<NewMessageHook> {
        current(&self.new_message)
    }

    pub fn private_message(&self) -> Option<PrivateMessageHook> {
        current(&self.private_message)
    }
}

// Slots are only ever replaced wholesale; a poisoned lock still holds a valid value.
fn replace<T>(slot: &RwLock<Option<T>>, value: T) {
    *slot.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
}

fn current<T: Clone>(slot: &RwLock<Option<T>>) -> Option<T> {
    slot.read().unwrap_or_else(PoisonError::into_inner).clone()
}
