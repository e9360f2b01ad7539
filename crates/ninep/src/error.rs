//! Error types returned by the wire codec, the session engine, and the
//! filesystem façade.
//!
//! Modeled as a single enum rather than several, but grouped in `Display`
//! and in this module's doc comments along the taxonomy the wire protocol
//! and the session state machine actually produce: decode failures, transport
//! failures, session-level protocol violations, remote (`RError`) failures,
//! and façade-level outcomes that are expected rather than exceptional.

use std::fmt;
use std::io;

/// The single error type for this crate.
///
/// `ProtocolDecodeError`, `TransportError`, and `SessionError` variants are
/// session-fatal: once observed, the session that produced them must not be
/// reused. `RemoteError` is operation-fatal only. `FileNotAvailable` and
/// `EndOfFile` are expected outcomes a façade caller should handle, not bugs.
#[derive(Debug)]
pub enum Error {
    // --- ProtocolDecodeError ---
    /// A decode attempted to read past the end of the current byte window.
    BufferOverrun,
    /// The message-type octet did not match any known 9P2000 message.
    UnknownMessageTag(u8),
    /// A Stat's declared outer size did not match the bytes actually consumed.
    StatSizeMismatch { declared: usize, consumed: usize },
    /// An open-mode byte had bits set outside access/truncate/rclose.
    ReservedBitsSet(u8),
    /// A string exceeded the u16 length the wire format can carry.
    StringTooLong(usize),
    /// A decoded message left bytes unconsumed within its declared frame length.
    TrailingBytes(usize),

    // --- TransportError ---
    /// Establishing the TCP connection failed against every resolved address.
    ConnectFailed(io::Error),
    /// Writing a message to the transport failed.
    SendFailed(io::Error),
    /// Reading a message from the transport failed.
    RecvFailed(io::Error),
    /// The peer closed the connection (a zero-byte read where bytes were expected).
    ConnectionClosed,

    // --- SessionError ---
    /// The server's RVersion reply was missing, malformed, or used the wrong dialect string.
    VersionHandshakeFailed,
    /// The server replied RAuth to our TAuth, i.e. it requires authentication we don't implement.
    ServerRequestedAuthentication,
    /// TAttach did not complete with RAttach.
    AttachFailed,
    /// A reply's message type was neither the expected R-type nor RError.
    UnexpectedMessageReceived,
    /// The tag or fid issuer reached its numeric limit.
    FidSpaceExhausted,
    /// A call was made on a session already marked unusable by an earlier fatal error.
    SessionUnusable,

    // --- RemoteError ---
    /// The server replied RError for a single operation; the session otherwise remains usable.
    ErrorMessageReceived(String),

    // --- CallbackError ---
    /// The façade could not resolve the requested path (the server returned RError on walk/stat).
    FileNotAvailable,
    /// A read returned zero bytes at the requested offset: legitimate end-of-file, not a failure.
    EndOfFile,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BufferOverrun => write!(f, "buffer overrun while decoding a message"),
            Error::UnknownMessageTag(t) => write!(f, "unknown message type {t}"),
            Error::StatSizeMismatch { declared, consumed } => write!(
                f,
                "stat declared {declared} bytes but {consumed} were consumed"
            ),
            Error::ReservedBitsSet(b) => write!(f, "reserved bits set in mode byte {b:#04x}"),
            Error::StringTooLong(n) => write!(f, "string of {n} bytes exceeds u16::MAX"),
            Error::TrailingBytes(n) => write!(f, "{n} bytes left unconsumed after decoding the message body"),
            Error::ConnectFailed(e) => write!(f, "connect failed: {e}"),
            Error::SendFailed(e) => write!(f, "send failed: {e}"),
            Error::RecvFailed(e) => write!(f, "recv failed: {e}"),
            Error::ConnectionClosed => write!(f, "connection closed by peer"),
            Error::VersionHandshakeFailed => write!(f, "version handshake failed"),
            Error::ServerRequestedAuthentication => {
                write!(f, "server requested authentication, which is not supported")
            }
            Error::AttachFailed => write!(f, "attach failed"),
            Error::UnexpectedMessageReceived => write!(f, "unexpected message type received"),
            Error::FidSpaceExhausted => write!(f, "fid or tag space exhausted"),
            Error::SessionUnusable => write!(f, "session is no longer usable after a prior fatal error"),
            Error::ErrorMessageReceived(ename) => write!(f, "server returned error: {ename}"),
            Error::FileNotAvailable => write!(f, "file not available"),
            Error::EndOfFile => write!(f, "end of file"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::ConnectionClosed,
            _ => Error::RecvFailed(e),
        }
    }
}

/// True if this error is session-fatal, i.e. the session must be discarded.
impl Error {
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            Error::BufferOverrun
                | Error::UnknownMessageTag(_)
                | Error::StatSizeMismatch { .. }
                | Error::ReservedBitsSet(_)
                | Error::StringTooLong(_)
                | Error::TrailingBytes(_)
                | Error::ConnectFailed(_)
                | Error::SendFailed(_)
                | Error::RecvFailed(_)
                | Error::ConnectionClosed
                | Error::VersionHandshakeFailed
                | Error::ServerRequestedAuthentication
                | Error::AttachFailed
                | Error::UnexpectedMessageReceived
                | Error::FidSpaceExhausted
                | Error::SessionUnusable
        )
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;
