// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! `Content-Length` framing over byte streams.

use crate::protocol::{Message, Outgoing};
use std::io::{BufRead, Read, Write};
use thiserror::Error;

/// Largest frame body accepted from a client.
pub const MAX_CONTENT_LENGTH: usize = 64 * 1024 * 1024;

/// Errors raised while reading or writing a frame.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame has no Content-Length header")]
    MissingContentLength,

    #[error("invalid Content-Length header: {0}")]
    InvalidContentLength(String),

    #[error("frame of {0} bytes exceeds the {max} byte limit", max = MAX_CONTENT_LENGTH)]
    FrameTooLarge(usize),

    #[error("invalid JSON-RPC message: {0}")]
    Json(#[from] serde_json::Error),
}

impl TransportError {
    /// Errors confined to a single frame; the stream itself is still usable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TransportError::Io(_))
    }
}

/// Read one frame body. Returns `Ok(None)` at end of stream.
///
/// Header lines are decoded lossily, so stray bytes in a header the server
/// does not use are harmless. The body of an oversized frame is left
/// unread; reading resumes at the next header block.
pub fn read_frame(reader: &mut impl BufRead) -> Result<Option<Vec<u8>>, TransportError> {
    let mut content_length = None;
    let mut saw_header = false;
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            // End of stream, possibly in the middle of a header block
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&line);
        let header = text.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            if saw_header {
                break;
            }
            // Stray blank line between frames
            continue;
        }
        saw_header = true;

        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                let value = value.trim();
                let length = value
                    .parse::<usize>()
                    .map_err(|_| TransportError::InvalidContentLength(value.to_string()))?;
                content_length = Some(length);
            }
        }
    }

    let length = content_length.ok_or(TransportError::MissingContentLength)?;
    if length > MAX_CONTENT_LENGTH {
        return Err(TransportError::FrameTooLarge(length));
    }
    let mut body = Vec::with_capacity(length);
    reader.by_ref().take(length as u64).read_to_end(&mut body)?;
    if body.len() < length {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("frame body ended after {} of {} bytes", body.len(), length),
        )
        .into());
    }
    Ok(Some(body))
}

/// Read and decode one message. Returns `Ok(None)` at end of stream.
pub fn read_message(reader: &mut impl BufRead) -> Result<Option<Message>, TransportError> {
    match read_frame(reader)? {
        Some(body) => Ok(Some(serde_json::from_slice(&body)?)),
        None => Ok(None),
    }
}

/// Write one message with its `Content-Length` header.
pub fn write_message(writer: &mut impl Write, message: &Message) -> Result<(), TransportError> {
    let body = serde_json::to_vec(&Outgoing::new(message))?;
    write!(writer, "Content-Length: {}\r\n\r\n", body.len())?;
    writer.write_all(&body)?;
    writer.flush()?;
    Ok(())
}
