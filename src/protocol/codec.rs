use std::marker::PhantomData;

use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::codec::{Decoder, Encoder};

use crate::protocol::{ProtocolError, Request, Response};

/// Maximum size of a single buffered document in bytes (16 MB).
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Codec used by the server: decodes [`Request`], encodes [`Response`].
pub type ServerCodec = JsonCodec<Request, Response>;

/// Codec used by clients: decodes [`Response`], encodes [`Request`].
pub type ClientCodec = JsonCodec<Response, Request>;

/// Streaming JSON codec.
///
/// Decodes a sequence of concatenated JSON documents of type `In` (optionally
/// separated by whitespace) and encodes values of type `Out` as one document
/// followed by a newline.
pub struct JsonCodec<In, Out> {
    pub(crate) max_document_size: usize,
    scan: Scan,
    _marker: PhantomData<fn(Out) -> In>,
}

/// Progress through the document at the front of the read buffer.
///
/// Bytes before `offset` have been scanned already, so each call only
/// looks at data that arrived since the previous one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Scan {
    offset: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl Scan {
    /// Advances over `bytes[self.offset..]` and returns the end of the
    /// document once its outermost object or array closes.
    fn advance(&mut self, bytes: &[u8]) -> Option<usize> {
        for (i, &b) in bytes.iter().enumerate().skip(self.offset) {
            if self.in_string {
                match b {
                    _ if self.escaped => self.escaped = false,
                    b'\\' => self.escaped = true,
                    b'"' => self.in_string = false,
                    _ => {}
                }
                continue;
            }
            match b {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        *self = Scan::default();
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
        }
        self.offset = bytes.len();
        None
    }
}

impl<In, Out> JsonCodec<In, Out> {
    /// Creates a codec with the default maximum document size.
    pub fn new() -> Self {
        Self::with_max_document_size(DEFAULT_MAX_DOCUMENT_SIZE)
    }

    pub fn with_max_document_size(max_document_size: usize) -> Self {
        Self {
            max_document_size,
            scan: Scan::default(),
            _marker: PhantomData,
        }
    }

    fn check_size(&self, buffered: usize) -> Result<(), ProtocolError> {
        if buffered > self.max_document_size {
            return Err(ProtocolError::DocumentTooLarge {
                limit: self.max_document_size,
            });
        }
        Ok(())
    }
}

impl<In, Out> Default for JsonCodec<In, Out> {
    fn default() -> Self {
        Self::new()
    }
}

impl<In: DeserializeOwned, Out> Decoder for JsonCodec<In, Out> {
    type Item = In;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.scan.offset == 0 {
            // Drop inter-document whitespace so an idle buffer stays empty
            let Some(start) = src.iter().position(|b| !b.is_ascii_whitespace()) else {
                src.clear();
                return Ok(None);
            };
            src.advance(start);

            if !matches!(src[0], b'{' | b'[') {
                return self.decode_scalar(src);
            }
        }

        match self.scan.advance(&src[..]) {
            Some(end) => {
                let doc = serde_json::from_slice::<In>(&src[..end]);
                src.advance(end);
                Ok(Some(doc?))
            }
            None => {
                self.check_size(src.len())?;
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(doc) => Ok(Some(doc)),
            None if buf.is_empty() => Ok(None),
            None => {
                self.scan = Scan::default();
                Err(ProtocolError::Truncated {
                    remaining: buf.len(),
                })
            }
        }
    }
}

impl<In: DeserializeOwned, Out> JsonCodec<In, Out> {
    /// Hands a document that does not start with `{` or `[` straight to
    /// serde_json, which either rejects it or needs more input.
    fn decode_scalar(&mut self, src: &mut BytesMut) -> Result<Option<In>, ProtocolError> {
        let (next, consumed) = {
            let mut stream = serde_json::Deserializer::from_slice(&src[..]).into_iter::<In>();
            let next = stream.next();
            (next, stream.byte_offset())
        };

        match next {
            Some(Ok(doc)) => {
                src.advance(consumed);
                Ok(Some(doc))
            }
            Some(Err(e)) if e.is_eof() => {
                self.check_size(src.len())?;
                Ok(None)
            }
            Some(Err(e)) => Err(ProtocolError::Json(e)),
            None => Ok(None),
        }
    }
}

impl<In, Out: Serialize> Encoder<Out> for JsonCodec<In, Out> {
    type Error = ProtocolError;

    fn encode(&mut self, item: Out, dst: &mut BytesMut) -> Result<(), Self::Error> {
        serde_json::to_writer((&mut *dst).writer(), &item)?;
        dst.put_u8(b'\n');
        Ok(())
    }
}
