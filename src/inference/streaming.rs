// Chat completions streaming (SSE) parser
// Author: kelexine (https://github.com/kelexine)

use crate::error::{EcoChatError, Result};
use crate::models::ChatCompletionChunk;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use tracing::{debug, warn};

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk>> + Send>>;

/// Parse an SSE byte stream into completion chunks.
pub fn parse_sse_stream<S>(byte_stream: S) -> ChunkStream
where
    S: Stream<Item = reqwest::Result<bytes::Bytes>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        // Raw bytes: a multi-byte character may straddle two network chunks
        let mut buffer: Vec<u8> = Vec::new();

        futures::pin_mut!(byte_stream);

        while let Some(chunk_result) = byte_stream.next().await {
            match chunk_result {
                Ok(chunk) => {
                    buffer.extend_from_slice(&chunk);

                    // Process complete events (ends with a blank line)
                    while let Some((event_end, separator_len)) = find_event_end(&buffer) {
                        let event_bytes: Vec<u8> = buffer.drain(..event_end + separator_len).collect();

                        match decode_event(&event_bytes[..event_end]) {
                            SseEvent::Chunk(chunk) => yield Ok(chunk),
                            SseEvent::Done => {
                                debug!("Completion stream reached [DONE]");
                                return;
                            }
                            SseEvent::Skip => {}
                        }
                    }
                }
                Err(e) => {
                    warn!("Stream error: {}", e);
                    yield Err(EcoChatError::Http(e));
                    return;
                }
            }
        }

        // The final event may lack a trailing blank line
        if let SseEvent::Chunk(chunk) = decode_event(&buffer) {
            yield Ok(chunk);
        }

        debug!("Completion stream ended");
    })
}

/// Position and length of the first event separator (`\n\n` or `\r\n\r\n`).
fn find_event_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn decode_event(bytes: &[u8]) -> SseEvent {
    match std::str::from_utf8(bytes) {
        Ok(event) if !event.trim().is_empty() => parse_sse_event(event),
        Ok(_) => SseEvent::Skip,
        Err(e) => {
            warn!("Dropping SSE event that is not valid UTF-8: {}", e);
            SseEvent::Skip
        }
    }
}

/// Drain a chunk stream into the full response text.
pub async fn collect_text(mut stream: ChunkStream) -> Result<String> {
    let mut text = String::new();
    let mut chunks = 0usize;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        chunks += 1;
        if let Some(token) = chunk.text() {
            text.push_str(token);
        }
    }

    debug!("Assembled {} chars from {} chunks", text.len(), chunks);
    Ok(text)
}

enum SseEvent {
    Chunk(ChatCompletionChunk),
    Done,
    Skip,
}

/// Parse a single SSE event. Comments, pings and malformed payloads are skipped.
fn parse_sse_event(event_data: &str) -> SseEvent {
    let Some(data) = event_data
        .lines()
        .find_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
    else {
        return SseEvent::Skip;
    };

    if data.is_empty() {
        return SseEvent::Skip;
    }
    if data == "[DONE]" {
        return SseEvent::Done;
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => SseEvent::Chunk(chunk),
        Err(e) => {
            warn!("Failed to parse SSE JSON: {}", e);
            SseEvent::Skip
        }
    }
}
