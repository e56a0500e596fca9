//! `GET /stream-logs` as Server-Sent Events.

use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
};
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::http::server::AppState;
use crate::tail::{LogFileName, TailError, TailFrame, TailSession};

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub file: Option<String>,
}

/// Validate and open the file, then hand it to a polling task.
///
/// Everything that can fail before the first frame (bad name, missing file)
/// is reported as a plain HTTP error; later failures arrive in-band.
pub async fn stream_logs(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, TailError> {
    let tail = &state.config.tail;
    let raw = query
        .file
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| tail.default_file.clone());

    let name = LogFileName::parse(&raw, &tail.extension).inspect_err(|e| {
        tracing::warn!(file = %raw, error = %e, "Rejected stream request");
    })?;

    let cancel = state.shutdown.session_token();
    let session = TailSession::open(&tail.logs_dir, name, tail.poll_interval(), cancel.clone())
        .await
        .inspect_err(|e| {
            tracing::warn!(file = %raw, error = %e, "Cannot stream file");
        })?;

    tracing::info!(file = %raw, "Streaming started");
    let (tx, rx) = mpsc::channel(tail.channel_capacity);
    tokio::spawn(session.run(tx));

    // Dropping the body (client gone) drops the guard and cancels the session.
    let guard = cancel.drop_guard();
    let frames = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let frame = rx.recv().await?;
        Some((Ok(to_event(frame)), (rx, guard)))
    });

    Ok(Sse::new(frames))
}

fn to_event(frame: TailFrame) -> Event {
    match frame {
        TailFrame::Line(line) => Event::default().data(line),
        TailFrame::Idle => Event::default().comment("keep-alive"),
        TailFrame::Error(message) => Event::default().data(format!("Error: {}", message)),
    }
}
