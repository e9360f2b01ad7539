//! 9P2000 message types: the tagged `FCall` union, message-type octets, and
//! the sentinel values used throughout the session engine.

use enum_primitive::*;

use crate::wire::{Qid, Stat};

/// 32-bit client-chosen file handle.
pub type Fid = u32;

/// 16-bit request/reply correlator.
pub type Tag = u16;

/// Protocol dialect string this crate speaks. No 9P2000.L or 9P2000.u
/// extensions.
pub const VERSION_9P2000: &str = "9P2000";

/// Reserved tag used only by TVersion.
pub const NOTAG: Tag = 0xFFFF;

/// Sentinel meaning "no such fid", used for the `afid` field of TAuth and
/// TAttach. Both sites must use this single named constant; the original
/// reference implementation used it inconsistently (a literal `-1` cast at
/// one call site and the named constant at the other), which this crate
/// deliberately does not reproduce.
pub const NOFID: Fid = 0xFFFFFFFF;

enum_from_primitive! {
    /// The 9P2000 message-type octet, values 100-127 per the Plan 9 manual.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum MsgType {
        TVersion = 100,
        RVersion = 101,
        TAuth = 102,
        RAuth = 103,
        TAttach = 104,
        RAttach = 105,
        RError = 107,
        TFlush = 108,
        RFlush = 109,
        TWalk = 110,
        RWalk = 111,
        TOpen = 112,
        ROpen = 113,
        TCreate = 114,
        RCreate = 115,
        TRead = 116,
        RRead = 117,
        TWrite = 118,
        RWrite = 119,
        TClunk = 120,
        RClunk = 121,
        TRemove = 122,
        RRemove = 123,
        TStat = 124,
        RStat = 125,
        TWstat = 126,
        RWstat = 127,
    }
}

impl MsgType {
    pub fn is_t(self) -> bool {
        (self as u8) % 2 == 0
    }

    pub fn is_r(self) -> bool {
        !self.is_t()
    }
}

/// A decoded (or to-be-encoded) 9P2000 message body, without its tag.
#[derive(Clone, Debug, PartialEq)]
pub enum FCall {
    TVersion { msize: u32, version: String },
    RVersion { msize: u32, version: String },

    TAuth { afid: Fid, uname: String, aname: String },
    RAuth { aqid: Qid },

    TAttach { fid: Fid, afid: Fid, uname: String, aname: String },
    RAttach { qid: Qid },

    RError { ename: String },

    TFlush { oldtag: Tag },
    RFlush,

    TWalk { fid: Fid, newfid: Fid, wnames: Vec<String> },
    RWalk { wqids: Vec<Qid> },

    TOpen { fid: Fid, mode: u8 },
    ROpen { qid: Qid, iounit: u32 },

    TCreate { fid: Fid, name: String, perm: u32, mode: u8 },
    RCreate { qid: Qid, iounit: u32 },

    TRead { fid: Fid, offset: u64, count: u32 },
    RRead { data: Vec<u8> },

    TWrite { fid: Fid, offset: u64, data: Vec<u8> },
    RWrite { count: u32 },

    TClunk { fid: Fid },
    RClunk,

    TRemove { fid: Fid },
    RRemove,

    TStat { fid: Fid },
    RStat { stat: Stat },

    TWstat { fid: Fid, stat: Stat },
    RWstat,
}

impl FCall {
    pub fn msg_type(&self) -> MsgType {
        match self {
            FCall::TVersion { .. } => MsgType::TVersion,
            FCall::RVersion { .. } => MsgType::RVersion,
            FCall::TAuth { .. } => MsgType::TAuth,
            FCall::RAuth { .. } => MsgType::RAuth,
            FCall::TAttach { .. } => MsgType::TAttach,
            FCall::RAttach { .. } => MsgType::RAttach,
            FCall::RError { .. } => MsgType::RError,
            FCall::TFlush { .. } => MsgType::TFlush,
            FCall::RFlush => MsgType::RFlush,
            FCall::TWalk { .. } => MsgType::TWalk,
            FCall::RWalk { .. } => MsgType::RWalk,
            FCall::TOpen { .. } => MsgType::TOpen,
            FCall::ROpen { .. } => MsgType::ROpen,
            FCall::TCreate { .. } => MsgType::TCreate,
            FCall::RCreate { .. } => MsgType::RCreate,
            FCall::TRead { .. } => MsgType::TRead,
            FCall::RRead { .. } => MsgType::RRead,
            FCall::TWrite { .. } => MsgType::TWrite,
            FCall::RWrite { .. } => MsgType::RWrite,
            FCall::TClunk { .. } => MsgType::TClunk,
            FCall::RClunk => MsgType::RClunk,
            FCall::TRemove { .. } => MsgType::TRemove,
            FCall::RRemove => MsgType::RRemove,
            FCall::TStat { .. } => MsgType::TStat,
            FCall::RStat { .. } => MsgType::RStat,
            FCall::TWstat { .. } => MsgType::TWstat,
            FCall::RWstat => MsgType::RWstat,
        }
    }
}

/// A full message: the type-specific body plus its correlating tag.
#[derive(Clone, Debug, PartialEq)]
pub struct Msg {
    pub tag: Tag,
    pub body: FCall,
}
