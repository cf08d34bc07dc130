//! Scriptable remote source for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{NetworkError, SourceError};

use super::client::RemoteSource;

struct FakeState {
    body: Mutex<Option<String>>,
    calls: AtomicUsize,
    delay: Duration,
}

/// Remote source that serves a fixed body, or fails when it has none.
///
/// Clones share state, so a test can keep a handle after handing the source
/// to a resolver.
#[derive(Clone)]
pub(crate) struct FakeRemote {
    state: Arc<FakeState>,
}

/// Read-only view of how often a [`FakeRemote`] was called.
pub(crate) struct Calls(Arc<FakeState>);

impl Calls {
    pub(crate) fn get(&self) -> usize {
        self.0.calls.load(Ordering::SeqCst)
    }
}

impl FakeRemote {
    fn with_body(body: Option<String>, delay: Duration) -> Self {
        Self {
            state: Arc::new(FakeState {
                body: Mutex::new(body),
                calls: AtomicUsize::new(0),
                delay,
            }),
        }
    }

    pub(crate) fn ok(body: &str) -> Self {
        Self::with_body(Some(body.to_string()), Duration::ZERO)
    }

    pub(crate) fn failing() -> Self {
        Self::with_body(None, Duration::ZERO)
    }

    /// Serve `body` after sleeping for `delay`.
    pub(crate) fn slow(body: &str, delay: Duration) -> Self {
        Self::with_body(Some(body.to_string()), delay)
    }

    pub(crate) fn calls(&self) -> Calls {
        Calls(self.state.clone())
    }

    /// Replace the served body; `None` makes later fetches fail.
    pub(crate) fn set_body(&self, body: Option<&str>) {
        *self.state.body.lock().unwrap() = body.map(str::to_string);
    }
}

#[async_trait]
impl RemoteSource for FakeRemote {
    async fn fetch_raw(&self) -> Result<String, SourceError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        if !self.state.delay.is_zero() {
            tokio::time::sleep(self.state.delay).await;
        }
        let body = self.state.body.lock().unwrap().clone();
        body.ok_or_else(|| NetworkError::NoConnection("fake remote offline".to_string()).into())
    }
}
