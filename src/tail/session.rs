//! Per-connection tail-follow state machine.
//!
//! ```text
//! Opening ──ok──▶ Polling ──cancel / error──▶ Closed
//!    │
//!    └── invalid name / not found ──▶ Closed (before any frame)
//! ```

use std::io::SeekFrom;
use std::path::Path;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;
use crate::tail::{LogFileName, TailError};

/// Upper bound on bytes read in one poll. Larger backlogs drain over
/// consecutive polls without waiting for the interval.
pub const MAX_READ_PER_POLL: u64 = 1024 * 1024;

/// One unit delivered to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailFrame {
    /// A complete line, without its terminator.
    Line(String),
    /// Nothing new this cycle; keeps the connection flowing.
    Idle,
    /// Terminal in-band error.
    Error(String),
}

/// Result of a single poll cycle.
#[derive(Debug, Default)]
pub struct PollOutcome {
    pub lines: Vec<String>,
    /// More unread data is already available.
    pub backlog: bool,
    /// The file shrank and the offset was reset.
    pub truncated: bool,
}

/// Connection-scoped tail state. Owns its file handle exclusively.
#[derive(Debug)]
pub struct TailSession {
    name: LogFileName,
    file: File,
    offset: u64,
    interval: Duration,
    cancel: CancellationToken,
}

impl TailSession {
    /// Opening: resolve and open `name` under `root`.
    pub async fn open(
        root: &Path,
        name: LogFileName,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Result<Self, TailError> {
        let path = name.resolve(root);

        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TailError::NotFound(name.to_string()))
            }
            Err(e) => return Err(TailError::Open(e)),
        };
        if !meta.is_file() {
            return Err(TailError::NotFound(name.to_string()));
        }

        let file = File::open(&path).await.map_err(TailError::Open)?;
        tracing::debug!(file = %name, path = ?path, "Tail session opened");

        Ok(Self {
            name,
            file,
            offset: 0,
            interval,
            cancel,
        })
    }

    pub fn name(&self) -> &LogFileName {
        &self.name
    }

    /// Byte offset just past the last delivered line.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// One Polling step: re-stat, detect truncation, read complete lines.
    pub async fn poll(&mut self) -> Result<PollOutcome, TailError> {
        let size = self.file.metadata().await.map_err(TailError::Stat)?.len();
        let mut outcome = PollOutcome::default();

        if size < self.offset {
            tracing::info!(
                file = %self.name,
                offset = self.offset,
                size,
                "File truncated, restarting from the beginning"
            );
            metrics::record_truncation();
            self.offset = 0;
            outcome.truncated = true;
        }
        if size == self.offset {
            return Ok(outcome);
        }

        let want = (size - self.offset).min(MAX_READ_PER_POLL);
        self.file
            .seek(SeekFrom::Start(self.offset))
            .await
            .map_err(TailError::Read)?;
        let mut buf = Vec::with_capacity(want as usize);
        (&mut self.file)
            .take(want)
            .read_to_end(&mut buf)
            .await
            .map_err(TailError::Read)?;

        let consumed = match buf.iter().rposition(|b| *b == b'\n') {
            Some(last) => last + 1,
            // A full chunk with no newline would never complete; ship it whole.
            None if buf.len() as u64 == MAX_READ_PER_POLL => buf.len(),
            None => 0,
        };

        outcome.lines = split_lines(&buf[..consumed]);
        self.offset += consumed as u64;
        outcome.backlog = size > self.offset && consumed > 0 && want == MAX_READ_PER_POLL;
        Ok(outcome)
    }

    /// Polling loop. Sends frames into `tx` until cancelled, the receiver
    /// goes away, or an I/O error ends the session.
    pub async fn run(mut self, tx: mpsc::Sender<TailFrame>) {
        metrics::tail_session_opened();

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let outcome = match self.poll().await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(file = %self.name, error = %e, "Tail session failed");
                    let _ = self.send(&tx, TailFrame::Error(e.to_string())).await;
                    break;
                }
            };

            let delivered = if outcome.lines.is_empty() {
                self.send(&tx, TailFrame::Idle).await
            } else {
                metrics::record_lines(outcome.lines.len());
                let mut ok = true;
                for line in outcome.lines {
                    if !self.send(&tx, TailFrame::Line(line)).await {
                        ok = false;
                        break;
                    }
                }
                ok
            };
            if !delivered {
                break;
            }

            if outcome.backlog {
                continue;
            }
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        metrics::tail_session_closed();
        tracing::info!(file = %self.name, offset = self.offset, "Tail session closed");
    }

    /// Returns false once the session must stop.
    async fn send(&self, tx: &mpsc::Sender<TailFrame>, frame: TailFrame) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = tx.send(frame) => sent.is_ok(),
        }
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    bytes
        .split_inclusive(|b| *b == b'\n')
        .map(|raw| {
            let line = raw.strip_suffix(b"\n").unwrap_or(raw);
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            String::from_utf8_lossy(line).into_owned()
        })
        .collect()
}
