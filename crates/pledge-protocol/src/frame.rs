//! Length framing for stream transports: [4 bytes len][payload]

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::{ProtocolError, ProtocolResult};

/// Read one frame.
///
/// Returns `Ok(None)` when the stream ends cleanly before a new frame starts.
/// A stream that ends mid-frame is an I/O error.
pub async fn read_frame<R>(reader: &mut R, max_size: usize) -> ProtocolResult<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    if reader.read(&mut header[..1]).await? == 0 {
        return Ok(None);
    }
    reader.read_exact(&mut header[1..]).await?;

    let size = u32::from_be_bytes(header) as usize;
    if size > max_size {
        trace!(size, max_size, "rejecting oversized frame");
        return Err(ProtocolError::FrameTooLarge {
            size,
            max: max_size,
        });
    }
    let mut payload = vec![0u8; size];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

/// Write one frame and flush it.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin,
{
    let size = u32::try_from(payload.len()).map_err(|_| ProtocolError::FrameTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    writer.write_all(&size.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}
