//! Output pumps.

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use crate::buffer::SharedBuffer;
use crate::StreamSource;

pub const DEFAULT_READ_CHUNK_SIZE: usize = 8192;

/// Drain `reader` into `buffer` until EOF.
///
/// Returns the total number of bytes read, including any the buffer later
/// dropped. A read error ends the pump as if the pipe had closed.
pub async fn pump_output<R>(
    mut reader: R,
    buffer: SharedBuffer,
    chunk_size: usize,
    source: StreamSource,
    pid: u32,
) -> u64
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;

    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                trace!("Read {} bytes from {} of process {}", n, source, pid);
                buffer.push(&chunk[..n]);
                total += n as u64;
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Stopped reading {} of process {}: {}", source, pid, e);
                break;
            }
        }
    }

    debug!("Pump for {} of process {} finished after {} bytes", source, pid, total);
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferLimit;

    #[tokio::test]
    async fn test_pump_drains_to_eof() {
        let buffer = SharedBuffer::new(BufferLimit::default());
        let input: &[u8] = b"first chunk\nsecond chunk\n";

        let total = pump_output(input, buffer.clone(), 4, StreamSource::Stdout, 1).await;

        assert_eq!(total, input.len() as u64);
        assert_eq!(buffer.read_lossy(), "first chunk\nsecond chunk\n");
    }

    #[tokio::test]
    async fn test_pump_respects_limit() {
        let buffer = SharedBuffer::new(BufferLimit::new(6));
        let input: &[u8] = b"abcdefghijkl";

        let total = pump_output(input, buffer.clone(), 5, StreamSource::Stderr, 1).await;

        assert_eq!(total, 12);
        assert_eq!(buffer.read_lossy(), "ghijkl");
        assert_eq!(buffer.dropped(), 6);
    }
}
