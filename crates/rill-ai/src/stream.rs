//! Streaming frame types and decoding
//!
//! The endpoint answers with a chunked body of newline-separated lines. Each
//! line starting with `data: ` carries one JSON frame; everything else is
//! ignored. Chunk boundaries are arbitrary, so lines (and UTF-8 sequences)
//! may be split across reads.

use crate::error::Result;
use async_stream::stream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// Prefix that marks a protocol frame
pub const FRAME_PREFIX: &str = "data: ";

/// Raw response body, one item per network read
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// Decoded frames in arrival order
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame>> + Send>>;

/// One incremental piece of the assistant's reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Content delta
    #[serde(default)]
    pub content: String,
    /// Set on the final frame
    #[serde(default)]
    pub done: bool,
}

impl Frame {
    /// A content delta
    pub fn delta(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            done: false,
        }
    }

    /// The completion marker
    pub fn done() -> Self {
        Self {
            content: String::new(),
            done: true,
        }
    }

    /// Parse the JSON payload of a `data: ` line
    pub fn parse(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Render as a wire line, including the trailing newline
    pub fn to_line(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        format!("{}{}\n", FRAME_PREFIX, json)
    }
}

/// Return the frame payload of a line, or `None` if the line is not a frame
pub fn frame_payload(line: &str) -> Option<&str> {
    line.strip_prefix(FRAME_PREFIX)
}

/// Splits a byte stream into lines, carrying partial lines across reads
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read and return every line it completed
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        // '\n' never occurs inside a multi-byte UTF-8 sequence, so splitting
        // on the raw byte leaves partial characters in the buffer.
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(decode_line(&raw[..raw.len() - 1]));
        }
        lines
    }

    /// Flush the final unterminated line at end of stream
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.buffer);
        Some(decode_line(&raw))
    }

    /// Bytes held back waiting for a newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Decode a response body into frames.
///
/// Stops after the first `done` frame (which is yielded), after the first
/// error, or when the body ends.
pub fn decode_frames(mut bytes: ByteStream) -> FrameStream {
    Box::pin(stream! {
        let mut decoder = LineDecoder::new();

        loop {
            let (lines, ended) = match bytes.next().await {
                Some(Ok(chunk)) => {
                    tracing::trace!("Read {} bytes", chunk.len());
                    (decoder.feed(&chunk), false)
                }
                Some(Err(e)) => {
                    yield Err(e);
                    return;
                }
                None => (decoder.finish().into_iter().collect::<Vec<_>>(), true),
            };

            for line in lines {
                let Some(payload) = frame_payload(&line) else {
                    continue;
                };
                match Frame::parse(payload) {
                    Ok(frame) => {
                        let done = frame.done;
                        yield Ok(frame);
                        if done {
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::debug!("Malformed frame: {}", line);
                        yield Err(e);
                        return;
                    }
                }
            }

            if ended {
                return;
            }
        }
    })
}
