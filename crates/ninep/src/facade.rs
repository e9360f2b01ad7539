//! Translates host filesystem callbacks into sequences of 9P2000
//! transactions on top of a [`Session`].
//!
//! Every operation here follows the same shape: walk from the root to the
//! target path into a fresh fid, perform the operation-specific exchange,
//! then always clunk the fid — even when the operation failed. A clunk
//! failure observed after an earlier operation error is logged but never
//! overwrites that earlier error.

use std::io::{Read, Write};
use std::net::TcpStream;

use log::warn;

use crate::error::{Error, Result};
use crate::mode::{OpenAccess, OpenMode};
use crate::session::{Session, SessionConfig};
use crate::wire::Stat;

/// Maximum per-read chunk size used by `list_directory` and `read`, absent
/// a tighter bound from the negotiated `msize`. 65535 comfortably exceeds
/// any single 9P2000 directory entry.
const MAX_READ_CHUNK: u32 = 65535;

/// Per-message overhead subtracted from `msize` when sizing a read request,
/// so the reply (header plus `RRead`'s `count:u32` field) cannot overflow
/// the negotiated message size.
const MSG_HEADER_OVERHEAD: u32 = 24;

/// Splits a host path on `\`, eliding leading/trailing/adjacent separators.
/// An empty or root-only path yields an empty component list, which a
/// `TWalk` with `nwname = 0` resolves to the root fid itself.
fn split_path(path: &str) -> Vec<String> {
    path.split('\\').filter(|c| !c.is_empty()).map(str::to_string).collect()
}

pub struct Filesystem<T> {
    session: Session<T>,
}

impl Filesystem<TcpStream> {
    /// Connects and runs the handshake/attach sequence described in the
    /// session engine, returning a façade ready to service callbacks.
    pub fn connect(config: &SessionConfig) -> Result<Filesystem<TcpStream>> {
        Ok(Filesystem { session: Session::connect(config)? })
    }
}

impl<T: Read + Write> Filesystem<T> {
    pub fn attach_over(transport: T, config: &SessionConfig) -> Result<Filesystem<T>> {
        Ok(Filesystem { session: Session::attach_over(transport, config)? })
    }

    fn read_chunk_size(&self) -> u32 {
        let msize_bound = self.session.msize().saturating_sub(MSG_HEADER_OVERHEAD);
        MAX_READ_CHUNK.min(msize_bound.max(1))
    }

    /// Walks to `path`, runs `op` against the resulting fid, then always
    /// clunks it. If `op` fails, that error is returned even if the clunk
    /// also fails (the clunk failure is only logged).
    fn with_walked_fid<R>(
        &mut self,
        path: &str,
        op: impl FnOnce(&mut Session<T>, u32) -> Result<R>,
    ) -> Result<R> {
        let wnames = split_path(path);
        let fid = self.session.walk(wnames).map_err(|e| match e {
            Error::ErrorMessageReceived(_) => Error::FileNotAvailable,
            other => other,
        })?;

        let result = op(&mut self.session, fid);
        if let Err(clunk_err) = self.session.clunk(fid) {
            warn!("clunk of fid {fid} failed after operation: {clunk_err}");
        }
        result
    }

    /// Reads the target's directory entries by opening it for read and
    /// issuing TReads at advancing offsets until one returns zero bytes,
    /// decoding the concatenated payload as a sequence of length-prefixed
    /// Stat records.
    pub fn list_directory(&mut self, path: &str) -> Result<Vec<Stat>> {
        let chunk = self.read_chunk_size();
        self.with_walked_fid(path, |session, fid| {
            session.open(fid, OpenMode::new(OpenAccess::Read))?;

            let mut entries = Vec::new();
            let mut offset: u64 = 0;
            loop {
                let data = session.read_at(fid, offset, chunk)?;
                if data.is_empty() {
                    break;
                }
                offset += data.len() as u64;

                let mut r = crate::wire::Reader::new(&data);
                while r.remaining() > 0 {
                    entries.push(r.read_stat()?);
                }
            }
            Ok(entries)
        })
    }

    /// Returns the metadata for `path`, or `FileNotAvailable` if the server
    /// could not resolve it.
    pub fn stat(&mut self, path: &str) -> Result<Stat> {
        self.with_walked_fid(path, |session, fid| session.stat_fid(fid))
    }

    /// Reads up to `buf.len()` bytes from `path` starting at `offset`,
    /// returning the number of bytes copied. `Ok(0)` is a legitimate
    /// end-of-file, distinct from any `Err` outcome.
    pub fn read(&mut self, path: &str, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let want = (buf.len() as u64).min(self.read_chunk_size() as u64) as u32;
        self.with_walked_fid(path, |session, fid| {
            session.open(fid, OpenMode::new(OpenAccess::Read))?;
            let data = session.read_at(fid, offset, want)?;
            let n = data.len().min(buf.len());
            buf[..n].copy_from_slice(&data[..n]);
            Ok(n)
        })
    }
}
