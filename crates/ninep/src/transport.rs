//! TCP connection setup and message framing.
//!
//! Connection setup resolves `host`/`service` and tries each resolved
//! address in turn, the first to accept winning — this covers both IPv4 and
//! IPv6 targets without a raw socket option, since a dual-stack-capable
//! resolver already yields both address families for a single hostname.
//!
//! Framing reads the four-byte little-endian length prefix, then reads
//! exactly that many bytes total (prefix included), retrying short reads
//! until satisfied; a zero-byte read before the frame is complete means the
//! peer closed the connection.

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Resolves `host`/`service` and connects to the first address that accepts
/// a connection. `service` must be numeric; this crate does not depend on a
/// service-name resolver.
pub fn connect(host: &str, service: &str) -> Result<TcpStream> {
    let port: u16 = service
        .parse()
        .map_err(|_| Error::ConnectFailed(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "service must be a numeric port",
        )))?;

    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(Error::ConnectFailed)?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(Error::ConnectFailed(last_err.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "name resolution returned no addresses")
    })))
}

/// Reads exactly `buf.len()` bytes, retrying on short reads. A zero-byte
/// read before `buf` is filled means the peer closed the connection.
fn read_exact_retrying<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = r.read(&mut buf[filled..]).map_err(Error::RecvFailed)?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        filled += n;
    }
    Ok(())
}

/// Reads one complete 9P2000 frame (length prefix included) from `r`.
pub fn read_frame<R: Read>(r: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; 4];
    read_exact_retrying(r, &mut header)?;
    let declared = LittleEndian::read_u32(&header) as usize;
    if declared < 4 {
        return Err(Error::BufferOverrun);
    }
    let mut frame = vec![0u8; declared];
    frame[..4].copy_from_slice(&header);
    read_exact_retrying(r, &mut frame[4..])?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// A mock transport that delivers bytes in fixed-size chunks, modeling
    /// a peer that never hands back more than `chunk` bytes per recv call.
    struct ChunkedReader {
        data: VecDeque<u8>,
        chunk: usize,
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len());
            for slot in buf.iter_mut().take(n) {
                *slot = self.data.pop_front().unwrap();
            }
            Ok(n)
        }
    }

    #[test]
    fn partial_recv_reconstructs_full_frame() {
        let mut body = vec![0xABu8; 124];
        let mut frame = (128u32).to_le_bytes().to_vec();
        frame.append(&mut body);

        let mut reader = ChunkedReader { data: frame.iter().copied().collect(), chunk: 37 };
        let reconstructed = read_frame(&mut reader).unwrap();
        assert_eq!(reconstructed, frame);
    }

    #[test]
    fn zero_byte_read_mid_frame_is_connection_closed() {
        struct EofAfter4 {
            sent_header: bool,
        }
        impl Read for EofAfter4 {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if !self.sent_header {
                    self.sent_header = true;
                    let header = 10u32.to_le_bytes();
                    buf[..4].copy_from_slice(&header);
                    Ok(4)
                } else {
                    Ok(0)
                }
            }
        }
        let mut reader = EofAfter4 { sent_header: false };
        assert!(matches!(read_frame(&mut reader), Err(Error::ConnectionClosed)));
    }
}
