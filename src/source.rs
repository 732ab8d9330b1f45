//! Reading an upload into memory.
//!
//! This is the only suspension point of a conversion. Decoding and reconstruction start once the
//! whole buffer is available.

use futures::io::{self, AsyncRead, AsyncReadExt};
use tracing::debug;

/// Largest upload accepted, in bytes.
pub const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

/// Reads `io` to the end, failing if it holds more than [`MAX_UPLOAD_BYTES`].
///
/// [`MAX_UPLOAD_BYTES`]: constant.MAX_UPLOAD_BYTES.html
pub async fn read_source<TRead: AsyncRead + Unpin>(io: TRead) -> Result<Vec<u8>, io::Error> {
    read_source_with_limit(io, MAX_UPLOAD_BYTES).await
}

pub async fn read_source_with_limit<TRead: AsyncRead + Unpin>(
    io: TRead,
    limit: u64,
) -> Result<Vec<u8>, io::Error> {
    let mut data = Vec::new();
    // one byte past the limit tells an oversized upload apart from one that fits exactly
    io.take(limit.saturating_add(1)).read_to_end(&mut data).await?;

    if data.len() as u64 > limit {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "upload exceeds size limit",
        ));
    }

    debug!(bytes = data.len(), "upload read");
    Ok(data)
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use futures::io::{self, AsyncRead};
    use futures::FutureExt;

    use super::{read_source, read_source_with_limit};

    struct Broken;

    impl AsyncRead for Broken {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut [u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::ConnectionReset.into()))
        }
    }

    #[test]
    fn test_read_source() {
        let bytes: &[u8] = b"MThd";
        let data = read_source(bytes).now_or_never().unwrap().unwrap();
        assert_eq!(data, b"MThd");
    }

    #[test]
    fn test_read_source_limit() {
        let bytes: &[u8] = &[0u8; 8];
        assert!(read_source_with_limit(bytes, 8).now_or_never().unwrap().is_ok());

        let err = read_source_with_limit(bytes, 7).now_or_never().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_read_source_error() {
        let err = read_source(Broken).now_or_never().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }
}
