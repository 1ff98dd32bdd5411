//! Response body module
//!
//! `AssetBody` either carries a small in-memory message (error pages) or
//! streams a resolved asset in fixed-size chunks. The asset reader is owned by
//! the body, so dropping the body at any point closes the underlying handle.

use crate::asset::AssetReader;
use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Default chunk size used when streaming assets
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Body of every response the filer produces
pub struct AssetBody {
    kind: Kind,
}

enum Kind {
    Empty,
    Full(Option<Bytes>),
    Stream {
        reader: Option<AssetReader>,
        buf: Box<[u8]>,
    },
}

impl AssetBody {
    pub const fn empty() -> Self {
        Self { kind: Kind::Empty }
    }

    pub fn full(data: impl Into<Bytes>) -> Self {
        Self {
            kind: Kind::Full(Some(data.into())),
        }
    }

    /// Stream `reader` in chunks of at most `chunk_size` bytes
    pub fn stream(reader: AssetReader, chunk_size: usize) -> Self {
        Self {
            kind: Kind::Stream {
                reader: Some(reader),
                buf: vec![0; chunk_size.max(1)].into_boxed_slice(),
            },
        }
    }
}

impl Default for AssetBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for AssetBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            Kind::Empty => "empty",
            Kind::Full(_) => "full",
            Kind::Stream { .. } => "stream",
        };
        f.debug_struct("AssetBody").field("kind", &kind).finish()
    }
}

impl Body for AssetBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().kind {
            Kind::Empty => Poll::Ready(None),
            Kind::Full(data) => Poll::Ready(data.take().map(|d| Ok(Frame::data(d)))),
            Kind::Stream { reader, buf } => {
                let Some(inner) = reader.as_mut() else {
                    return Poll::Ready(None);
                };

                let mut read_buf = ReadBuf::new(buf);
                match Pin::new(inner).poll_read(cx, &mut read_buf) {
                    Poll::Pending => Poll::Pending,
                    Poll::Ready(Err(e)) => {
                        // Release the handle before surfacing the error
                        *reader = None;
                        Poll::Ready(Some(Err(e)))
                    }
                    Poll::Ready(Ok(())) => {
                        let filled = read_buf.filled();
                        if filled.is_empty() {
                            *reader = None;
                            Poll::Ready(None)
                        } else {
                            Poll::Ready(Some(Ok(Frame::data(Bytes::copy_from_slice(filled)))))
                        }
                    }
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            Kind::Empty => true,
            Kind::Full(data) => data.is_none(),
            Kind::Stream { reader, .. } => reader.is_none(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            Kind::Empty => SizeHint::with_exact(0),
            Kind::Full(data) => SizeHint::with_exact(data.as_ref().map_or(0, |d| d.len() as u64)),
            Kind::Stream { reader, .. } if reader.is_none() => SizeHint::with_exact(0),
            Kind::Stream { .. } => SizeHint::default(),
        }
    }
}
