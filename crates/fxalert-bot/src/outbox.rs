//! Outbound notification queue and its sender task.

use futures::stream::{self, StreamExt};
use fxalert_holder::Shutdown;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{Answer, ChatTransport};

/// A message waiting to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Destination chat.
    pub chat_id: i64,
    /// Message this answers, if any.
    pub reply_to: Option<i64>,
    /// Content.
    pub answer: Answer,
}

impl Notification {
    /// Creates a notification that is not a reply.
    #[must_use]
    pub const fn new(chat_id: i64, answer: Answer) -> Self {
        Self {
            chat_id,
            reply_to: None,
            answer,
        }
    }

    /// Creates a reply to `message_id`.
    #[must_use]
    pub const fn reply(chat_id: i64, message_id: i64, answer: Answer) -> Self {
        Self {
            chat_id,
            reply_to: Some(message_id),
            answer,
        }
    }
}

/// Producer side of the notification queue.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<Notification>,
}

/// Consumer side of the notification queue, driven by [`run_sender`].
#[derive(Debug)]
pub struct OutboxReceiver {
    rx: mpsc::Receiver<Notification>,
}

impl Outbox {
    /// Creates a bounded queue.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, OutboxReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, OutboxReceiver { rx })
    }

    /// Queues a notification, waiting while the queue is full.
    ///
    /// Returns false if the sender task is gone; the notification is
    /// dropped and logged.
    pub async fn push(&self, notification: Notification) -> bool {
        match self.tx.send(notification).await {
            Ok(()) => true,
            Err(mpsc::error::SendError(n)) => {
                warn!(chat_id = n.chat_id, text = %n.answer.text, "outbox closed, dropping notification");
                false
            }
        }
    }
}

#[cfg(test)]
impl OutboxReceiver {
    pub(crate) fn try_recv(&mut self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }
}

/// Delivers queued notifications with up to `concurrency` sends in flight.
///
/// Runs until every [`Outbox`] is dropped and the queue is drained, or until
/// `shutdown` fires, in which case queued notifications are dropped. Send
/// failures are logged and never retried.
pub async fn run_sender(
    transport: Arc<dyn ChatTransport>,
    receiver: OutboxReceiver,
    concurrency: usize,
    shutdown: Shutdown,
) {
    info!("notification sender started");
    let deliveries = stream::unfold(receiver.rx, |mut rx| async move {
        rx.recv().await.map(|n| (n, rx))
    })
    .map(|n| {
        let transport = Arc::clone(&transport);
        async move { deliver(transport.as_ref(), n).await }
    })
    .buffer_unordered(concurrency.max(1))
    .for_each(|()| async {});

    tokio::select! {
        () = shutdown.cancelled() => info!("notification sender cancelled"),
        () = deliveries => info!("notification sender drained"),
    }
}

async fn deliver(transport: &dyn ChatTransport, n: Notification) {
    match transport
        .send_message(n.chat_id, n.reply_to, &n.answer)
        .await
    {
        Ok(()) => debug!(chat_id = n.chat_id, text = %n.answer.text, "sent message"),
        Err(e) => error!(chat_id = n.chat_id, text = %n.answer.text, error = %e, "can't send message"),
    }
}
