//! Change notifications.
//!
//! A [`SignalBus`] carries "something changed" notifications from the
//! component that owns it to any number of listeners. Each listener sees at
//! most one pending value: when a listener falls behind, older values are
//! dropped and it only receives the latest one. Senders never block.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Single-slot broadcast channel.
#[derive(Debug)]
pub struct SignalBus<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> SignalBus<T> {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self { sender }
    }

    /// Publish `value` to every current listener.
    ///
    /// A value posted while nobody listens is dropped.
    pub fn post(&self, value: T) {
        let _ = self.sender.send(value);
    }

    /// Start listening. Only values posted after this call are received.
    pub fn subscribe(&self) -> SignalReceiver<T> {
        SignalReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone + Send + 'static> Default for SignalBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Listening end of a [`SignalBus`].
#[derive(Debug)]
pub struct SignalReceiver<T> {
    receiver: broadcast::Receiver<T>,
}

impl<T: Clone> SignalReceiver<T> {
    /// Wait for the next value.
    ///
    /// Returns `None` once the bus has been dropped and every pending value
    /// was received.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.receiver.recv().await {
                Ok(value) => return Some(value),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the pending value, if any, without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        loop {
            match self.receiver.try_recv() {
                Ok(value) => return Some(value),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}
