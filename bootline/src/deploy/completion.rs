//! Resolve-once completion primitives for deployment rounds

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::error;

use crate::models::unit::AggregateResult;

type Callback = Box<dyn FnOnce(AggregateResult) + Send>;

enum SinkInner {
    Channel(oneshot::Sender<AggregateResult>),
    Callback(Callback),
}

/// Receives the aggregate result of a round exactly once
pub struct CompletionSink {
    inner: Mutex<Option<SinkInner>>,
}

impl CompletionSink {
    /// Sink backed by a callback
    pub fn from_fn<F>(callback: F) -> Self
    where
        F: FnOnce(AggregateResult) + Send + 'static,
    {
        Self {
            inner: Mutex::new(Some(SinkInner::Callback(Box::new(callback)))),
        }
    }

    /// Deliver the result. Returns false if the sink already fired.
    pub fn resolve(&self, result: AggregateResult) -> bool {
        let taken = match self.inner.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        match taken {
            Some(SinkInner::Channel(tx)) => {
                // The receiver may have been dropped; the round is still resolved.
                let _ = tx.send(result);
                true
            }
            Some(SinkInner::Callback(callback)) => {
                callback(result);
                true
            }
            None => false,
        }
    }

    /// Whether the sink has already fired
    pub fn is_resolved(&self) -> bool {
        match self.inner.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

/// Create a sink and the future that observes it
pub fn completion_channel(total: usize) -> (CompletionSink, RoundHandle) {
    let (tx, rx) = oneshot::channel();
    let sink = CompletionSink {
        inner: Mutex::new(Some(SinkInner::Channel(tx))),
    };
    (sink, RoundHandle { rx, total })
}

/// Future resolving to the aggregate result of one round
#[derive(Debug)]
pub struct RoundHandle {
    rx: oneshot::Receiver<AggregateResult>,
    total: usize,
}

impl RoundHandle {
    /// Number of deployments the round waits for
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Future for RoundHandle {
    type Output = AggregateResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let total = self.total;
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => {
                error!("Deployment round abandoned before completion");
                Poll::Ready(AggregateResult::Failure {
                    failed: total,
                    total,
                })
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
