//! Test doubles for the process exit and relaunch seams.
//!
//! Used by the controller's unit tests and the integration tests, so stop and
//! restart can run inside a test process without ending it.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::lifecycle::{Exit, Relaunch};

/// What a [`RecordingExit`] was asked to do.
#[derive(Debug, PartialEq, Eq)]
pub enum ExitEvent {
    Exit(i32),
    Terminate,
}

/// Records exits instead of performing them.
pub struct RecordingExit {
    tx: mpsc::UnboundedSender<ExitEvent>,
}

impl RecordingExit {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ExitEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl Exit for RecordingExit {
    fn exit(&self, code: i32) {
        let _ = self.tx.send(ExitEvent::Exit(code));
    }

    fn terminate_self(&self) {
        let _ = self.tx.send(ExitEvent::Terminate);
    }
}

/// Relauncher returning scripted results in order.
pub struct FakeRelaunch {
    results: Mutex<Vec<std::io::Result<u32>>>,
}

impl FakeRelaunch {
    pub fn new(results: Vec<std::io::Result<u32>>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results),
        })
    }
}

impl Relaunch for FakeRelaunch {
    fn relaunch(&self) -> std::io::Result<u32> {
        let mut results = self
            .results
            .lock()
            .map_err(|_| std::io::Error::other("relaunch script poisoned"))?;
        if results.is_empty() {
            return Err(std::io::Error::other("no scripted relaunch result left"));
        }
        results.remove(0)
    }
}
