#![forbid(unsafe_code)]
//! Synchronous client library for the 9P2000 filesystem protocol.
//!
//! This crate implements the wire codec, the fid/tag identifier lifecycles,
//! the session state machine (version handshake, authentication probe,
//! attach, walk/open/read/clunk), and a filesystem façade translating host
//! callbacks into 9P transactions — strictly the base 9P2000 dialect, no
//! 9P2000.L or 9P2000.u extensions, and strictly request/reply with no
//! pipelining.
//!
//! # Getting started
//!
//! ```no_run
//! use ninep::{facade::Filesystem, session::SessionConfig};
//!
//! # fn main() -> ninep::Result<()> {
//! let config = SessionConfig::new("127.0.0.1", "564");
//! let mut fs = Filesystem::connect(&config)?;
//! let entries = fs.list_directory("\\")?;
//! for entry in entries {
//!     println!("{}", entry.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error handling
//!
//! All operations return [`Error`]. `ProtocolDecodeError`, `TransportError`,
//! and `SessionError` kinds are session-fatal: once observed, a `Session`
//! reports [`Error::SessionUnusable`] for every subsequent call instead of
//! touching the transport again. Remote (`RError`) failures and façade-level
//! outcomes like end-of-file are ordinary, expected results.
//!
//! # Transport
//!
//! The client connects over TCP, trying every address a DNS lookup of
//! `host`/`service` returns (IPv4 and IPv6 alike) until one accepts.
//!
//! # Safety
//!
//! This crate forbids unsafe code (`#![forbid(unsafe_code)]`).
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod facade;
pub mod fcall;
pub mod fidtracker;
pub mod ids;
pub mod mode;
pub mod session;
pub mod transport;
pub mod txbuffer;
pub mod wire;

pub use crate::error::{Error, Result};
pub use crate::facade::Filesystem;
pub use crate::session::{Session, SessionConfig};
