use std::collections::HashMap;

use crate::error::{NetError, Result};
use crate::message::Message;

pub type Handler<S> = Box<dyn Fn(&mut S, Message) + Send + Sync + 'static>;

/// Maps message type ids to handlers.
///
/// Filled once before connecting and shared read-only afterwards; the
/// table is moved into the client, so there is no way to register later.
pub struct DispatchTable<S> {
    handlers: HashMap<i32, Handler<S>>,
}

impl<S> Default for DispatchTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> DispatchTable<S> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, type_id: impl Into<i32>, handler: F) -> Result<()>
    where
        F: Fn(&mut S, Message) + Send + Sync + 'static,
    {
        let type_id = type_id.into();
        if self.handlers.contains_key(&type_id) {
            return Err(NetError::DuplicateHandler(type_id));
        }
        self.handlers.insert(type_id, Box::new(handler));
        Ok(())
    }

    pub fn contains(&self, type_id: i32) -> bool {
        self.handlers.contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn dispatch(&self, state: &mut S, message: Message) -> Result<()> {
        let type_id = message.type_id();
        let handler = self
            .handlers
            .get(&type_id)
            .ok_or(NetError::UnregisteredMessage(type_id))?;
        handler(state, message);
        Ok(())
    }

    /// Dispatches and logs instead of returning unregistered ids.
    pub fn dispatch_or_drop(&self, state: &mut S, message: Message) {
        if let Err(e) = self.dispatch(state, message) {
            log::warn!("Dropping message: {}", e);
        }
    }
}
