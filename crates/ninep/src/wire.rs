//! Little-endian wire primitives: bounded integer and string I/O, and
//! qid/stat (de)serialization.
//!
//! Decoding works over a `Reader`, a length-checked cursor into a byte slice
//! that never panics on short input: every `read_*` fails with
//! [`Error::BufferOverrun`] instead of indexing out of bounds. Encoding
//! appends to a plain `Vec<u8>`; the [`crate::txbuffer::TxBuffer`] wraps that
//! with the length-prefix/finalize dance described in the component design.

use byteorder::{ByteOrder, LittleEndian};
use bitflags::bitflags;

use crate::error::{Error, Result};

bitflags! {
    /// Bits of [`Qid::typ`]. Bit 7 directory, bit 6 append-only, bit 5
    /// exclusive-use, bit 2 mount, bit 1 auth, bit 0 temporary.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct QidType: u8 {
        const DIR    = 0x80;
        const APPEND = 0x40;
        const EXCL   = 0x20;
        const MOUNT  = 0x04;
        const AUTH   = 0x02;
        const TMP    = 0x01;
        const FILE   = 0x00;
    }
}

/// Server-assigned file identity. Immutable once returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Qid {
    pub typ: QidType,
    pub version: u32,
    pub path: u64,
}

impl Qid {
    pub const SIZE: usize = 1 + 4 + 8;
}

/// File metadata, encoded on the wire prefixed by a u16 size of the bytes
/// that follow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stat {
    pub typ: u16,
    pub dev: u32,
    pub qid: Qid,
    pub mode: u32,
    pub atime: u32,
    pub mtime: u32,
    pub length: u64,
    pub name: String,
    pub uid: String,
    pub gid: String,
    pub muid: String,
}

impl Stat {
    /// Size of the fields that follow the outer u16 size prefix, in bytes.
    fn inner_size(&self) -> usize {
        2 + 4 + Qid::SIZE + 4 + 4 + 4 + 8
            + 2 + self.name.len()
            + 2 + self.uid.len()
            + 2 + self.gid.len()
            + 2 + self.muid.len()
    }
}

/// A length-checked, non-owning cursor into a receive buffer.
///
/// Borrowed string and byte-slice views point into the underlying buffer,
/// valid only as long as the `Reader` (and its backing slice) are alive; the
/// session copies out whatever must outlive the next receive.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Reader<'a> {
        Reader { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::BufferOverrun);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    /// Reads a u16 length followed by that many bytes, interpreted as UTF-8.
    /// The bytes are opaque to the codec: a payload that is not valid UTF-8
    /// is not a framing error, so it is not rejected here; invalid sequences
    /// are replaced per `String::from_utf8_lossy` rather than failing the
    /// decode.
    pub fn read_string(&mut self) -> Result<String> {
        let n = self.read_u16()? as usize;
        let bytes = self.take(n)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Reads a byte slice view of exactly `n` bytes, non-owning.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    pub fn read_qid(&mut self) -> Result<Qid> {
        let typ = QidType::from_bits_truncate(self.read_u8()?);
        let version = self.read_u32()?;
        let path = self.read_u64()?;
        Ok(Qid { typ, version, path })
    }

    /// Reads the outer u16 size, then parses exactly that many bytes into a
    /// `Stat`. A mismatch between the declared and consumed byte counts is a
    /// protocol error, not silently tolerated.
    pub fn read_stat(&mut self) -> Result<Stat> {
        let declared = self.read_u16()? as usize;
        let start = self.pos;
        let typ = self.read_u16()?;
        let dev = self.read_u32()?;
        let qid = self.read_qid()?;
        let mode = self.read_u32()?;
        let atime = self.read_u32()?;
        let mtime = self.read_u32()?;
        let length = self.read_u64()?;
        let name = self.read_string()?;
        let uid = self.read_string()?;
        let gid = self.read_string()?;
        let muid = self.read_string()?;
        let consumed = self.pos - start;
        if consumed != declared {
            return Err(Error::StatSizeMismatch { declared, consumed });
        }
        Ok(Stat {
            typ,
            dev,
            qid,
            mode,
            atime,
            mtime,
            length,
            name,
            uid,
            gid,
            muid,
        })
    }
}

pub fn write_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

pub fn write_u16(buf: &mut Vec<u8>, v: u16) {
    let mut tmp = [0u8; 2];
    LittleEndian::write_u16(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

pub fn write_u32(buf: &mut Vec<u8>, v: u32) {
    let mut tmp = [0u8; 4];
    LittleEndian::write_u32(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

pub fn write_u64(buf: &mut Vec<u8>, v: u64) {
    let mut tmp = [0u8; 8];
    LittleEndian::write_u64(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

/// Writes a u16 length followed by the string's UTF-8 bytes. Rejects strings
/// whose byte length exceeds `u16::MAX`; the wire format has no way to carry
/// a longer length.
pub fn write_string(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    if s.len() > u16::MAX as usize {
        return Err(Error::StringTooLong(s.len()));
    }
    write_u16(buf, s.len() as u16);
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

pub fn write_qid(buf: &mut Vec<u8>, qid: &Qid) {
    write_u8(buf, qid.typ.bits());
    write_u32(buf, qid.version);
    write_u64(buf, qid.path);
}

/// Writes the u16 outer size followed by the stat fields; the size is
/// computed from the fields themselves so it can never drift from what is
/// actually written.
pub fn write_stat(buf: &mut Vec<u8>, stat: &Stat) -> Result<()> {
    let inner_size = stat.inner_size();
    if inner_size > u16::MAX as usize {
        return Err(Error::StringTooLong(inner_size));
    }
    write_u16(buf, inner_size as u16);
    write_u16(buf, stat.typ);
    write_u32(buf, stat.dev);
    write_qid(buf, &stat.qid);
    write_u32(buf, stat.mode);
    write_u32(buf, stat.atime);
    write_u32(buf, stat.mtime);
    write_u64(buf, stat.length);
    write_string(buf, &stat.name)?;
    write_string(buf, &stat.uid)?;
    write_string(buf, &stat.gid)?;
    write_string(buf, &stat.muid)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qid_round_trip() {
        let qid = Qid {
            typ: QidType::DIR,
            version: 7,
            path: 0x1122334455667788,
        };
        let mut buf = Vec::new();
        write_qid(&mut buf, &qid);
        let mut r = Reader::new(&buf);
        assert_eq!(r.read_qid().unwrap(), qid);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn stat_round_trip() {
        let stat = Stat {
            typ: 0,
            dev: 0,
            qid: Qid { typ: QidType::FILE, version: 1, path: 42 },
            mode: 0o644,
            atime: 1000,
            mtime: 2000,
            length: 4096,
            name: "file.txt".into(),
            uid: "nobody".into(),
            gid: "nobody".into(),
            muid: "".into(),
        };
        let mut buf = Vec::new();
        write_stat(&mut buf, &stat).unwrap();
        let mut r = Reader::new(&buf);
        let decoded = r.read_stat().unwrap();
        assert_eq!(decoded, stat);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn stat_size_mismatch_is_rejected() {
        let mut buf = Vec::new();
        write_u16(&mut buf, 3); // declares 3 bytes but none follow correctly
        buf.extend_from_slice(&[0u8; 3]);
        let mut r = Reader::new(&buf);
        // inner fields require far more than 3 bytes, so this must overrun
        // before a size-mismatch check would even apply.
        assert!(r.read_stat().is_err());
    }

    #[test]
    fn string_at_u16_max_encodes_longer_is_rejected() {
        let s = "a".repeat(u16::MAX as usize);
        let mut buf = Vec::new();
        assert!(write_string(&mut buf, &s).is_ok());

        let too_long = "a".repeat(u16::MAX as usize + 1);
        let mut buf2 = Vec::new();
        assert!(matches!(
            write_string(&mut buf2, &too_long),
            Err(Error::StringTooLong(_))
        ));
    }

    #[test]
    fn buffer_overrun_on_short_input() {
        let buf = [0u8; 1];
        let mut r = Reader::new(&buf);
        assert!(matches!(r.read_u32(), Err(Error::BufferOverrun)));
    }

    #[test]
    fn invalid_utf8_payload_is_not_a_framing_error() {
        let mut buf = Vec::new();
        let bytes: &[u8] = &[0xFF, 0xFE, b'O', b'K'];
        write_u16(&mut buf, bytes.len() as u16);
        buf.extend_from_slice(bytes);
        let mut r = Reader::new(&buf);
        let s = r.read_string().unwrap();
        assert!(s.ends_with("OK"));
    }
}
