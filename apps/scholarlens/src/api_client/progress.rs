//! Upload body that reports how many bytes the transport has pulled.

use std::sync::Arc;

use bytes::Bytes;
use futures::{stream, Stream, StreamExt};

const CHUNK_SIZE: usize = 64 * 1024;

/// Receives progress for one transfer. Called from inside the HTTP body stream.
pub type ProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    /// Rounded percentage, clamped to 100. An empty transfer counts as done.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.sent * 100 + self.total / 2) / self.total).min(100) as u8
    }
}

pub fn progress_body(bytes: Bytes, progress: ProgressFn) -> reqwest::Body {
    reqwest::Body::wrap_stream(progress_stream(bytes, progress))
}

fn progress_stream(
    bytes: Bytes,
    progress: ProgressFn,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static {
    let total = bytes.len() as u64;
    let mut sent = 0u64;
    stream::iter(chunks(bytes, CHUNK_SIZE)).map(move |chunk| {
        sent += chunk.len() as u64;
        progress(UploadProgress { sent, total });
        Ok(chunk)
    })
}

fn chunks(bytes: Bytes, size: usize) -> impl Iterator<Item = Bytes> + Send + Sync {
    let len = bytes.len();
    (0..len)
        .step_by(size)
        .map(move |start| bytes.slice(start..(start + size).min(len)))
}
