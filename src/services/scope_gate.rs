//! Once-per-scope load gate.
//!
//! Each bulk-loaded scope owns one gate. The gate runs the load body at most
//! once to completion: concurrent callers queue behind the in-flight load, and
//! a failed or cancelled load leaves the gate unloaded so the next caller
//! retries it.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

/// Observable state of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeState {
    /// Never loaded, or the last attempt failed.
    Unloaded,
    /// A load body is running.
    Loading,
    /// A load body completed successfully.
    Loaded,
}

/// One-shot gate guarding the bulk load of a single scope.
#[derive(Debug, Default)]
pub struct ScopeGate {
    loaded: OnceCell<()>,
    in_flight: AtomicBool,
}

impl ScopeGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScopeState {
        if self.loaded.initialized() {
            ScopeState::Loaded
        } else if self.in_flight.load(Ordering::SeqCst) {
            ScopeState::Loading
        } else {
            ScopeState::Unloaded
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    /// Run `load` unless the scope is already loaded.
    ///
    /// Returns `Ok(true)` when this call ran the body to success, `Ok(false)`
    /// when another call already had. Callers arriving while a load is in
    /// flight wait for it; if it fails they take their turn at running their
    /// own `load`.
    pub async fn load_once<F, Fut, E>(&self, load: F) -> Result<bool, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        if self.loaded.initialized() {
            return Ok(false);
        }

        let mut ran = false;
        let flag = &self.in_flight;
        self.loaded
            .get_or_try_init(|| {
                ran = true;
                async move {
                    let _in_flight = InFlight::enter(flag);
                    load().await
                }
            })
            .await?;
        Ok(ran)
    }

    /// Wait until no load body is running.
    ///
    /// Returns immediately when the scope is loaded or idle. Never marks the
    /// scope loaded itself.
    pub async fn settled(&self) {
        if self.loaded.initialized() || !self.in_flight.load(Ordering::SeqCst) {
            return;
        }
        // Initializers are serialized, so this one only runs after the
        // in-flight load has finished; it always fails and leaves the state alone.
        let _ = self
            .loaded
            .get_or_try_init(|| async { Err::<(), ()>(()) })
            .await;
    }
}

/// Marks a gate as loading for as long as the guard lives, including when the
/// load future is dropped mid-flight.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
