//! Single-owner transmit scratch buffer.
//!
//! One `TxBuffer` is allocated per session and reused for every outgoing
//! message: `reset` clears it (without freeing the backing allocation) and
//! reserves the four-byte length prefix, the message body is appended by the
//! encoder, and `finalize` backfills the reserved prefix with the total byte
//! count and returns the complete frame.

use byteorder::{ByteOrder, LittleEndian};

pub struct TxBuffer {
    buf: Vec<u8>,
}

impl TxBuffer {
    pub fn with_capacity(capacity: usize) -> TxBuffer {
        TxBuffer { buf: Vec::with_capacity(capacity) }
    }

    /// Clears any previous contents and reserves the four-byte length
    /// prefix, returning a mutable reference ready for the encoder to
    /// append the type octet, tag, and body onto.
    pub fn reset(&mut self) -> &mut Vec<u8> {
        self.buf.clear();
        self.buf.extend_from_slice(&[0u8; 4]);
        &mut self.buf
    }

    /// Backfills the reserved length prefix with the total frame size and
    /// returns the finished frame as a byte slice.
    pub fn finalize(&mut self) -> &[u8] {
        let total = self.buf.len() as u32;
        LittleEndian::write_u32(&mut self.buf[0..4], total);
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_backfills_total_length() {
        let mut tx = TxBuffer::with_capacity(64);
        {
            let buf = tx.reset();
            buf.extend_from_slice(&[1, 2, 3]);
        }
        let frame = tx.finalize();
        assert_eq!(frame.len(), 7);
        assert_eq!(&frame[0..4], &7u32.to_le_bytes());
        assert_eq!(&frame[4..], &[1, 2, 3]);
    }

    #[test]
    fn reset_reuses_allocation_across_messages() {
        let mut tx = TxBuffer::with_capacity(64);
        tx.reset().extend_from_slice(&[0u8; 100]);
        let first_cap = tx.buf.capacity();
        tx.reset().extend_from_slice(&[1, 2]);
        assert_eq!(tx.buf.capacity(), first_cap);
        assert_eq!(tx.finalize().len(), 6);
    }
}
