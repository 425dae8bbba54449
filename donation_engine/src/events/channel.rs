//! Stateless pub-sub for donation events
//!
//! Components subscribe to donation events through these hooks and react to them without touching the ledger. A
//! handler only ever receives the event itself.
//!
//! Handlers are async and every event is handled on its own task. Publishing waits at most
//! [`PUBLISH_TIMEOUT`] for space in the channel, so a stalled handler can never hold up a payment confirmation.
use std::{
    future::Future,
    pin::Pin,
    sync::{atomic::AtomicI64, Arc},
    time::Duration,
};

use log::*;
use tokio::sync::mpsc::{self, error::SendTimeoutError};

pub const PUBLISH_TIMEOUT: Duration = Duration::from_millis(500);

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // drop the internal sender so that when the last subscriber is dropped, we can automatically shut down the
        // handler
        drop(self.sender);
        let jobs = Arc::new(AtomicI64::new(0));
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Handling event");
            let handler = Arc::clone(&self.handler);
            jobs.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let job = jobs.clone();
            tokio::spawn(async move {
                (handler)(ev).await;
                job.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
                trace!("📬️ Event handled");
            });
        }
        match tokio::spawn(async move {
            while jobs.load(std::sync::atomic::Ordering::SeqCst) > 0 {
                debug!("📬️ Waiting for jobs to complete");
                tokio::time::sleep(tokio::time::Duration::from_millis(250)).await;
            }
        })
        .await
        {
            Ok(_) => {
                debug!("📬️ Event handler shutting down gracefully");
            },
            Err(e) => {
                warn!("📬️ Event handler shutdown did not complete cleanly: {e}");
            },
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Hands the event to the handler. Delivery is best effort: if the channel stays full for longer than
    /// [`PUBLISH_TIMEOUT`], or the handler has shut down, the event is dropped and an error is logged.
    pub async fn publish_event(&self, event: E) {
        match self.sender.send_timeout(event, PUBLISH_TIMEOUT).await {
            Ok(()) => {},
            Err(SendTimeoutError::Timeout(_)) => {
                error!("📬️ Event channel is full. The event was dropped after waiting {PUBLISH_TIMEOUT:?}");
            },
            Err(SendTimeoutError::Closed(_)) => {
                error!("📬️ Event handler has shut down. The event was dropped");
            },
        }
    }
}
