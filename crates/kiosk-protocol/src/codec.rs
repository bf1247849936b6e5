//! Tokio codec for record-separated hub frames.
//!
//! Hub records are JSON texts each terminated by `0x1E`. A single transport
//! frame may carry several records, and a record may in principle be split
//! across frames, so inbound text is appended to a [`BytesMut`] and
//! [`HubCodec`] extracts complete records from it.
//!
//! ```text
//! ws text frame -> BytesMut -> Decoder -> record (String) -> HubMessage::parse
//! record (String) -> Encoder -> bytes + 0x1E -> ws text frame
//! ```
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use tokio_util::codec::Decoder;
//! use kiosk_protocol::HubCodec;
//!
//! let mut codec = HubCodec::new();
//! let mut buf = BytesMut::from("{}\u{1e}{\"type\":6}\u{1e}");
//!
//! assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("{}"));
//! assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("{\"type\":6}"));
//! assert_eq!(codec.decode(&mut buf).unwrap(), None);
//! ```

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{ProtocolError, RECORD_SEPARATOR};

/// Default maximum record size in bytes (1 MB).
const DEFAULT_MAX_RECORD_SIZE: usize = 1024 * 1024;

/// Splits and terminates hub records.
#[derive(Debug, Clone)]
pub struct HubCodec {
    /// Maximum allowed record size in bytes.
    max_record_size: usize,
}

impl HubCodec {
    pub fn new() -> Self {
        Self {
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
        }
    }

    /// Create a codec with a custom record size limit.
    pub fn with_max_record_size(max_record_size: usize) -> Self {
        Self { max_record_size }
    }

    pub fn max_record_size(&self) -> usize {
        self.max_record_size
    }
}

impl Default for HubCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for HubCodec {
    type Item = String;
    type Error = ProtocolError;

    /// Extract the next non-empty record, or `None` if more bytes are needed.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        loop {
            let Some(end) = src.iter().position(|b| *b == RECORD_SEPARATOR) else {
                if src.len() > self.max_record_size {
                    let size = src.len();
                    src.clear();
                    return Err(ProtocolError::RecordTooLarge {
                        size,
                        max: self.max_record_size,
                    });
                }
                return Ok(None);
            };

            let record = src.split_to(end + 1);
            let body = &record[..end];
            if body.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            if body.len() > self.max_record_size {
                return Err(ProtocolError::RecordTooLarge {
                    size: body.len(),
                    max: self.max_record_size,
                });
            }

            return std::str::from_utf8(body)
                .map(|text| Some(text.to_string()))
                .map_err(|_| ProtocolError::InvalidUtf8);
        }
    }
}

impl Encoder<String> for HubCodec {
    type Error = ProtocolError;

    fn encode(&mut self, record: String, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        if record.len() > self.max_record_size {
            return Err(ProtocolError::RecordTooLarge {
                size: record.len(),
                max: self.max_record_size,
            });
        }
        dst.reserve(record.len() + 1);
        dst.put_slice(record.as_bytes());
        dst.put_u8(RECORD_SEPARATOR);
        Ok(())
    }
}
