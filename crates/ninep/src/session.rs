//! The synchronous 9P2000 session engine: transport lifecycle, version
//! handshake, authentication probe, attach, and the request/response
//! dispatch every façade operation is built from.
//!
//! A `Session` writes one T-message and reads exactly one R-message per
//! call; there is no pipelining and no background thread. Once a
//! session-fatal error is observed the session is marked unusable and every
//! subsequent call fails immediately without touching the transport again.

use std::io::Write;
use std::net::TcpStream;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::fcall::{FCall, Fid, MsgType, Msg, Tag, NOFID, NOTAG, VERSION_9P2000};
use crate::fidtracker::FidTracker;
use crate::ids::{FidIssuer, TagIssuer};
use crate::mode::OpenMode;
use crate::transport::{connect, read_frame};
use crate::txbuffer::TxBuffer;
use crate::wire::{Qid, Stat};
use crate::{decoder, encoder};

/// The four knobs the session accepts, per the external-interfaces contract.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub host: String,
    pub service: String,
    pub uname: String,
    pub aname: String,
    /// Client-preferred maximum message size, capped by the server's reply.
    pub msize: u32,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, service: impl Into<String>) -> SessionConfig {
        SessionConfig {
            host: host.into(),
            service: service.into(),
            uname: "nobody".to_string(),
            aname: String::new(),
            msize: 16384,
        }
    }
}

/// An established, attached 9P2000 session.
///
/// Generic over the transport so tests can exercise the engine against an
/// in-memory mock instead of a real socket.
pub struct Session<T> {
    transport: T,
    tx: TxBuffer,
    tags: TagIssuer,
    fids: FidIssuer,
    tracker: FidTracker,
    msize: u32,
    root_fid: Fid,
    poisoned: bool,
}

impl Session<TcpStream> {
    /// Resolves and connects to `config.host`/`config.service`, then runs
    /// the version handshake, authentication probe, and attach.
    pub fn connect(config: &SessionConfig) -> Result<Session<TcpStream>> {
        let stream = connect(&config.host, &config.service)?;
        Session::attach_over(stream, config)
    }
}

impl<T: std::io::Read + Write> Session<T> {
    /// Runs the handshake over an already-established transport. Exposed
    /// separately from [`Session::connect`] so tests can supply a mock
    /// transport.
    pub fn attach_over(transport: T, config: &SessionConfig) -> Result<Session<T>> {
        let mut session = Session {
            transport,
            tx: TxBuffer::with_capacity(config.msize as usize),
            tags: TagIssuer::new(),
            fids: FidIssuer::new(),
            tracker: FidTracker::new(),
            msize: config.msize,
            root_fid: 0,
            poisoned: false,
        };
        session.version(config.msize)?;
        session.auth_probe(&config.uname, &config.aname)?;
        session.attach(&config.uname, &config.aname)?;
        Ok(session)
    }

    pub fn msize(&self) -> u32 {
        self.msize
    }

    pub fn root_fid(&self) -> Fid {
        self.root_fid
    }

    pub fn tracker(&self) -> &FidTracker {
        &self.tracker
    }

    pub fn is_usable(&self) -> bool {
        !self.poisoned
    }

    /// Sends one message and reads exactly one reply, validating that the
    /// reply's tag matches the request's. Any transport or decode failure,
    /// or a tag mismatch, marks the session unusable.
    fn exchange(&mut self, tag: Tag, body: FCall) -> Result<Msg> {
        if self.poisoned {
            return Err(Error::SessionUnusable);
        }
        let msg = Msg { tag, body };
        let frame = match encoder::encode_msg(&mut self.tx, &msg) {
            Ok(f) => f.to_vec(),
            Err(e) => {
                self.poisoned = true;
                return Err(e);
            }
        };
        if let Err(e) = self.transport.write_all(&frame) {
            self.poisoned = true;
            return Err(Error::SendFailed(e));
        }
        let reply_frame = match read_frame(&mut self.transport) {
            Ok(f) => f,
            Err(e) => {
                self.poisoned = true;
                return Err(e);
            }
        };
        let reply = match decoder::decode_frame(&reply_frame) {
            Ok(m) => m,
            Err(e) => {
                self.poisoned = true;
                return Err(e);
            }
        };
        if reply.tag != tag {
            self.poisoned = true;
            return Err(Error::UnexpectedMessageReceived);
        }
        Ok(reply)
    }

    /// Performs one request/response exchange for a façade-facing operation:
    /// the reply must be either `expected` or `RError`; anything else is
    /// fatal. `RError` is surfaced as an operation-fatal error, not a
    /// session-fatal one.
    fn op(&mut self, body: FCall, expected: MsgType) -> Result<FCall> {
        let tag = self.tags.issue()?;
        let reply = self.exchange(tag, body)?;
        match reply.body {
            FCall::RError { ename } => {
                warn!("server returned error: {ename}");
                Err(Error::ErrorMessageReceived(ename))
            }
            other if other.msg_type() == expected => Ok(other),
            _ => {
                self.poisoned = true;
                Err(Error::UnexpectedMessageReceived)
            }
        }
    }

    fn version(&mut self, msize_preference: u32) -> Result<()> {
        let reply = self.exchange(
            NOTAG,
            FCall::TVersion { msize: msize_preference, version: VERSION_9P2000.to_string() },
        )?;
        match reply.body {
            FCall::RVersion { msize, version } if version == VERSION_9P2000 => {
                self.msize = msize.min(msize_preference);
                debug!("negotiated msize = {}", self.msize);
                Ok(())
            }
            _ => {
                self.poisoned = true;
                Err(Error::VersionHandshakeFailed)
            }
        }
    }

    /// An `RError` reply to `TAuth` is the expected outcome for a server
    /// that does not require authentication, and is not an error at all. A
    /// well-formed `RAuth` means the server requires authentication this
    /// client does not implement, which is fatal.
    fn auth_probe(&mut self, uname: &str, aname: &str) -> Result<()> {
        let tag = self.tags.issue()?;
        let reply = self.exchange(
            tag,
            FCall::TAuth { afid: NOFID, uname: uname.to_string(), aname: aname.to_string() },
        )?;
        match reply.body {
            FCall::RError { .. } => Ok(()),
            FCall::RAuth { .. } => {
                self.poisoned = true;
                Err(Error::ServerRequestedAuthentication)
            }
            _ => {
                self.poisoned = true;
                Err(Error::UnexpectedMessageReceived)
            }
        }
    }

    fn attach(&mut self, uname: &str, aname: &str) -> Result<()> {
        let fid = self.fids.issue()?;
        let tag = self.tags.issue()?;
        let reply = self.exchange(
            tag,
            FCall::TAttach {
                fid,
                afid: NOFID,
                uname: uname.to_string(),
                aname: aname.to_string(),
            },
        )?;
        match reply.body {
            FCall::RAttach { qid } => {
                self.tracker.set_root(fid, qid);
                self.root_fid = fid;
                Ok(())
            }
            _ => {
                self.poisoned = true;
                Err(Error::AttachFailed)
            }
        }
    }

    /// Walks from the root fid through `wnames`, always issuing a fresh
    /// fid. A reply with fewer wqids than requested components is treated
    /// as an operation failure: only exact matches are used.
    pub fn walk(&mut self, wnames: Vec<String>) -> Result<Fid> {
        let newfid = self.fids.issue()?;
        let requested = wnames.len();
        let body = self.op(
            FCall::TWalk { fid: self.root_fid, newfid, wnames: wnames.clone() },
            MsgType::RWalk,
        )?;
        let wqids = match body {
            FCall::RWalk { wqids } => wqids,
            _ => unreachable!("op() guarantees the expected variant"),
        };
        if wqids.len() != requested {
            return Err(Error::ErrorMessageReceived(format!(
                "server walked only {} of {requested} requested path components",
                wqids.len()
            )));
        }
        let qid = match wqids.last() {
            Some(q) => *q,
            None => self
                .tracker
                .root_entry()
                .expect("root entry set during attach")
                .qid,
        };
        self.tracker.add(newfid, wnames, qid);
        Ok(newfid)
    }

    pub fn open(&mut self, fid: Fid, mode: OpenMode) -> Result<Qid> {
        let body = self.op(FCall::TOpen { fid, mode: mode.encode() }, MsgType::ROpen)?;
        match body {
            FCall::ROpen { qid, .. } => Ok(qid),
            _ => unreachable!("op() guarantees the expected variant"),
        }
    }

    pub fn read_at(&mut self, fid: Fid, offset: u64, count: u32) -> Result<Vec<u8>> {
        let body = self.op(FCall::TRead { fid, offset, count }, MsgType::RRead)?;
        match body {
            FCall::RRead { data } => Ok(data),
            _ => unreachable!("op() guarantees the expected variant"),
        }
    }

    pub fn stat_fid(&mut self, fid: Fid) -> Result<Stat> {
        let body = self.op(FCall::TStat { fid }, MsgType::RStat)?;
        match body {
            FCall::RStat { stat } => Ok(stat),
            _ => unreachable!("op() guarantees the expected variant"),
        }
    }

    /// Always attempted, even when the caller already has an earlier error
    /// to report: failure here is logged but must not override that earlier
    /// error. The fid is dropped from the tracker regardless of outcome,
    /// since after TClunk is sent the fid is no longer valid at the client
    /// either way.
    pub fn clunk(&mut self, fid: Fid) -> Result<()> {
        let result = self.op(FCall::TClunk { fid }, MsgType::RClunk);
        self.tracker.remove(fid);
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Read;

    /// An in-memory duplex transport: queued server replies to read, sent
    /// client bytes captured for inspection.
    struct MockTransport {
        inbound: VecDeque<u8>,
        outbound: Vec<u8>,
    }

    impl MockTransport {
        fn with_replies(frames: Vec<Vec<u8>>) -> MockTransport {
            let mut inbound = VecDeque::new();
            for frame in frames {
                inbound.extend(frame);
            }
            MockTransport { inbound, outbound: Vec::new() }
        }
    }

    impl Read for MockTransport {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = buf.len().min(self.inbound.len());
            for slot in buf.iter_mut().take(n) {
                *slot = self.inbound.pop_front().unwrap();
            }
            Ok(n)
        }
    }

    impl Write for MockTransport {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.outbound.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn frame_for(tag: Tag, body: FCall) -> Vec<u8> {
        let mut tx = TxBuffer::with_capacity(256);
        encoder::encode_msg(&mut tx, &Msg { tag, body }).unwrap().to_vec()
    }

    fn qid(path: u64) -> Qid {
        Qid { typ: crate::wire::QidType::FILE, version: 0, path }
    }

    fn handshake_frames(uname_tag_base: Tag, msize: u32) -> Vec<Vec<u8>> {
        vec![
            frame_for(NOTAG, FCall::RVersion { msize, version: VERSION_9P2000.to_string() }),
            frame_for(uname_tag_base, FCall::RError { ename: "auth not required".into() }),
            frame_for(uname_tag_base + 1, FCall::RAttach { qid: qid(0) }),
        ]
    }

    #[test]
    fn handshake_downgrades_msize_to_server_reply() {
        let frames = handshake_frames(1, 8192);
        let transport = MockTransport::with_replies(frames);
        let config = SessionConfig::new("example.invalid", "564");
        let session = Session::attach_over(transport, &config).unwrap();
        assert_eq!(session.msize(), 8192);
        assert!(session.is_usable());
    }

    #[test]
    fn rauth_reply_is_fatal() {
        let frames = vec![
            frame_for(NOTAG, FCall::RVersion { msize: 8192, version: VERSION_9P2000.to_string() }),
            frame_for(1, FCall::RAuth { aqid: qid(1) }),
        ];
        let transport = MockTransport::with_replies(frames);
        let config = SessionConfig::new("example.invalid", "564");
        let result = Session::attach_over(transport, &config);
        assert!(matches!(result, Err(Error::ServerRequestedAuthentication)));
    }

    #[test]
    fn walk_of_missing_file_does_not_track_fid_and_reuses_tag_counter() {
        let mut frames = handshake_frames(1, 8192);
        // Attach's root fid is 1, the tags issued during handshake are 1 and 2.
        frames.push(frame_for(3, FCall::RError { ename: "file not found".into() }));
        let transport = MockTransport::with_replies(frames);
        let config = SessionConfig::new("example.invalid", "564");
        let mut session = Session::attach_over(transport, &config).unwrap();

        let before = session.tracker().live_count();
        let result = session.walk(vec!["missing".into()]);
        assert!(matches!(result, Err(Error::ErrorMessageReceived(_))));
        assert_eq!(session.tracker().live_count(), before);
        assert!(session.is_usable());
    }

    #[test]
    fn unexpected_reply_type_poisons_the_session() {
        let mut frames = handshake_frames(1, 8192);
        frames.push(frame_for(3, FCall::RRead { data: vec![] }));
        let transport = MockTransport::with_replies(frames);
        let config = SessionConfig::new("example.invalid", "564");
        let mut session = Session::attach_over(transport, &config).unwrap();

        let root_fid = session.root_fid();
        let result = session.stat_fid(root_fid);
        assert!(matches!(result, Err(Error::UnexpectedMessageReceived)));
        assert!(!session.is_usable());

        let second = session.stat_fid(root_fid);
        assert!(matches!(second, Err(Error::SessionUnusable)));
    }
}
