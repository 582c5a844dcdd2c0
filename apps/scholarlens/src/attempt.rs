use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// One run of a workflow action: an id for log correlation and the token
/// that aborts it.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub id: Uuid,
    token: CancellationToken,
}

impl Attempt {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drives `fut` unless the attempt is cancelled first. A cancelled call
    /// is dropped mid-flight and its response never observed.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

/// Owns the lifetime of a workflow and the attempt currently in flight.
///
/// Attempts are child tokens of the lifetime token, so `teardown` aborts
/// whatever is running and every later attempt starts already cancelled.
#[derive(Debug, Default)]
pub struct AttemptSlot {
    lifetime: CancellationToken,
    current: Mutex<Option<CancellationToken>>,
}

impl AttemptSlot {
    pub fn is_torn_down(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    /// Cancels the previous attempt (if any) and registers a fresh one.
    pub fn begin(&self) -> Attempt {
        let token = self.lifetime.child_token();
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }
        Attempt {
            id: Uuid::new_v4(),
            token,
        }
    }

    /// Cancels the attempt in flight. Returns whether there was one.
    pub fn cancel_current(&self) -> bool {
        let current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match current {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn teardown(&self) {
        self.lifetime.cancel();
    }
}
