use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// One progress update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub message: String,
    pub current: Option<usize>,
    pub total: Option<usize>,
}

impl ProgressEvent {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            current: None,
            total: None,
        }
    }

    pub fn step(message: impl Into<String>, current: usize, total: usize) -> Self {
        Self {
            message: message.into(),
            current: Some(current),
            total: Some(total),
        }
    }
}

/// Writing half of the progress channel, held by the engine.
///
/// Sending never blocks and never fails the run: events sent after the
/// stream was dropped are discarded.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    sender: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressSink {
    /// A sink that discards everything
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn send(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}

/// Reading half: a lazy, finite, non-restartable stream of events that ends
/// once every sink clone has been dropped
#[derive(Debug)]
pub struct ProgressStream {
    receiver: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl Stream for ProgressStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Creates a connected sink/stream pair
pub fn progress_channel() -> (ProgressSink, ProgressStream) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        ProgressSink {
            sender: Some(sender),
        },
        ProgressStream { receiver },
    )
}
