//! Hand-off from I/O worker threads to the thread that owns game state.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};

pub type Action<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// Single-consumer queue of deferred actions.
///
/// Any thread may enqueue through a [`MainThreadHandle`]; the owner runs
/// everything queued so far, in enqueue order, when it calls
/// [`MainThread::update`] once per tick.
pub struct MainThread<S> {
    sender: UnboundedSender<Action<S>>,
    receiver: UnboundedReceiver<Action<S>>,
}

pub struct MainThreadHandle<S> {
    sender: UnboundedSender<Action<S>>,
}

impl<S> Clone for MainThreadHandle<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<S> Default for MainThread<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> MainThread<S> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    pub fn handle(&self) -> MainThreadHandle<S> {
        MainThreadHandle {
            sender: self.sender.clone(),
        }
    }

    pub fn execute(&self, action: impl FnOnce(&mut S) + Send + 'static) {
        let _ = self.sender.send(Box::new(action));
    }

    /// Runs the actions that were queued before this call. Actions enqueued
    /// while draining wait for the next tick.
    pub fn update(&mut self, state: &mut S) -> usize {
        let pending = self.receiver.len();
        let mut executed = 0;
        while executed < pending {
            match self.receiver.try_recv() {
                Ok(action) => {
                    action(state);
                    executed += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        executed
    }

    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl<S> MainThreadHandle<S> {
    pub fn execute(&self, action: impl FnOnce(&mut S) + Send + 'static) {
        // The receiver lives as long as the owning `MainThread`; once that is
        // gone there is nobody left to run the action.
        let _ = self.sender.send(Box::new(action));
    }
}
