//! Byte-range playback.
//!
//! A playback request resolves the video's tier, validates the requested
//! range against the object size, then relays the tier's byte stream to the
//! client through a bounded buffer. The buffer is the backpressure seam: a
//! slow client suspends the tier read instead of letting chunks pile up in
//! memory. Dropping the returned stream, or firing the cancellation token,
//! stops the upstream read within one chunk.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use vodcast_core::{AppError, VideoRecord};
use vodcast_db::VideoCatalog;
use vodcast_storage::{ObjectByteStream, TierSet};

use crate::media_type::content_type_for;
use crate::resolve::resolve_source;

/// Nominal chunk size used to convert the configured buffer size into a
/// channel capacity. Backends may yield smaller chunks; the bound is then
/// simply tighter.
const RELAY_CHUNK_HINT: usize = 64 * 1024;

/// Whether the response carries the whole object or a part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// No (usable) `Range` header: full body.
    Full,
    /// Satisfiable range: partial content with a `Content-Range`.
    Partial,
}

/// A ready-to-serve playback body plus its response metadata.
pub struct PlaybackStream {
    pub status: PlaybackStatus,
    /// Exact number of body bytes.
    pub content_length: u64,
    /// `bytes <start>-<end>/<total>`, present only for partial responses.
    pub content_range: Option<String>,
    pub total_size: u64,
    pub content_type: &'static str,
    pub stream: ObjectByteStream,
    /// Aborts the upstream tier read mid-transfer. Dropping `stream` has the
    /// same effect one chunk later.
    pub cancel: CancellationToken,
}

impl std::fmt::Debug for PlaybackStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackStream")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .field("content_range", &self.content_range)
            .field("total_size", &self.total_size)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Parsed `Range` header. Anything unparseable (including multi-range
/// requests, which playback never needs) degrades to `Full` per RFC 7233's
/// "may ignore" allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RangeSpec {
    Full,
    /// `bytes=<start>-` or `bytes=<start>-<end>` (end inclusive).
    Bounded { start: u64, end: Option<u64> },
    /// `bytes=-<n>`: the final `n` bytes.
    Suffix(u64),
}

impl RangeSpec {
    pub(crate) fn parse(header: Option<&str>) -> RangeSpec {
        let Some(header) = header else {
            return RangeSpec::Full;
        };
        let Some(ranges) = header.trim().strip_prefix("bytes=") else {
            return RangeSpec::Full;
        };
        if ranges.contains(',') {
            return RangeSpec::Full;
        }
        let Some((start, end)) = ranges.split_once('-') else {
            return RangeSpec::Full;
        };
        match (start.trim(), end.trim()) {
            ("", "") => RangeSpec::Full,
            ("", n) => match n.parse() {
                Ok(n) => RangeSpec::Suffix(n),
                Err(_) => RangeSpec::Full,
            },
            (s, "") => match s.parse() {
                Ok(start) => RangeSpec::Bounded { start, end: None },
                Err(_) => RangeSpec::Full,
            },
            (s, e) => match (s.parse::<u64>(), e.parse::<u64>()) {
                (Ok(start), Ok(end)) if start <= end => RangeSpec::Bounded {
                    start,
                    end: Some(end),
                },
                _ => RangeSpec::Full,
            },
        }
    }

    /// Concrete `[start, end]` window against an object of `total_size`
    /// bytes, or a 416 when the range starts past the end.
    pub(crate) fn window(
        &self,
        total_size: u64,
    ) -> Result<(u64, u64, PlaybackStatus), AppError> {
        let last = total_size.saturating_sub(1);
        match *self {
            RangeSpec::Full => Ok((0, last, PlaybackStatus::Full)),
            RangeSpec::Bounded { start, end } => {
                if start >= total_size {
                    return Err(AppError::RangeNotSatisfiable { start, total_size });
                }
                let end = end.map_or(last, |e| e.min(last));
                Ok((start, end, PlaybackStatus::Partial))
            }
            RangeSpec::Suffix(n) => {
                if n == 0 || total_size == 0 {
                    return Err(AppError::RangeNotSatisfiable {
                        start: total_size,
                        total_size,
                    });
                }
                Ok((total_size - n.min(total_size), last, PlaybackStatus::Partial))
            }
        }
    }
}

pub struct RangeStreamer {
    tiers: TierSet,
    catalog: Arc<dyn VideoCatalog>,
    probe_timeout: Duration,
    buffer_bytes: usize,
}

impl RangeStreamer {
    pub fn new(
        tiers: TierSet,
        catalog: Arc<dyn VideoCatalog>,
        probe_timeout: Duration,
        buffer_bytes: usize,
    ) -> Self {
        Self {
            tiers,
            catalog,
            probe_timeout,
            buffer_bytes,
        }
    }

    /// Open a playback stream for `record`, honoring an optional raw `Range`
    /// header value. Range validation happens before any transfer is opened,
    /// so a 416 never touches the tier beyond the existence probe.
    pub async fn stream(
        &self,
        record: &VideoRecord,
        range_header: Option<&str>,
    ) -> Result<PlaybackStream, AppError> {
        let resolved = resolve_source(
            &self.tiers,
            self.catalog.as_ref(),
            record,
            self.probe_timeout,
        )
        .await?;
        let total_size = resolved.size_bytes;
        let parsed = RangeSpec::parse(range_header);
        let (start, end, status) = parsed.window(total_size)?;
        let content_type = content_type_for(&record.original_filename);
        let cancel = CancellationToken::new();

        if total_size == 0 {
            // Empty object: nothing to relay.
            return Ok(PlaybackStream {
                status,
                content_length: 0,
                content_range: None,
                total_size,
                content_type,
                stream: Box::pin(futures::stream::empty()),
                cancel,
            });
        }

        let upstream = resolved.backend.get_range(&resolved.key, start, end).await?;
        let stream = self.relay(upstream, cancel.clone());

        let content_length = end - start + 1;
        let content_range = match status {
            PlaybackStatus::Partial => {
                Some(format!("bytes {}-{}/{}", start, end, total_size))
            }
            PlaybackStatus::Full => None,
        };

        tracing::debug!(
            video_id = %record.id,
            tier = %resolved.tier,
            start,
            end,
            total_size,
            "Opened playback stream"
        );

        Ok(PlaybackStream {
            status,
            content_length,
            content_range,
            total_size,
            content_type,
            stream: Box::pin(ReceiverStream::new(stream)),
            cancel,
        })
    }

    /// Pump `upstream` into a bounded channel. The send suspends when the
    /// buffer is full; a dropped receiver or a fired token ends the pump.
    fn relay(
        &self,
        mut upstream: ObjectByteStream,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<Result<bytes::Bytes, vodcast_storage::TierError>> {
        let capacity = (self.buffer_bytes / RELAY_CHUNK_HINT).max(1);
        let (tx, rx) = mpsc::channel(capacity);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    item = upstream.next() => match item {
                        Some(Ok(chunk)) => {
                            tokio::select! {
                                _ = cancel.cancelled() => break,
                                sent = tx.send(Ok(chunk)) => {
                                    if sent.is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                        Some(Err(e)) => {
                            let _ = tx.send(Err(e)).await;
                            break;
                        }
                        None => break,
                    },
                }
            }
        });

        rx
    }
}
