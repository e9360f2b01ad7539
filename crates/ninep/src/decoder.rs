//! Parses a framed 9P2000 message into a tagged [`Msg`] value.
//!
//! `decode_frame` is handed the bytes of exactly one frame, header included
//! (the caller already used the length prefix to know how much to read).
//! Dispatch happens on the type octet; an unrecognized value yields
//! [`Error::UnknownMessageTag`] rather than guessing at a payload shape.

use enum_primitive::FromPrimitive;

use crate::error::{Error, Result};
use crate::fcall::{FCall, MsgType, Msg};
use crate::wire::Reader;

/// Decodes one complete frame, including its 4-byte length prefix.
pub fn decode_frame(frame: &[u8]) -> Result<Msg> {
    let mut r = Reader::new(frame);
    let _size = r.read_u32()?;
    let type_octet = r.read_u8()?;
    let tag = r.read_u16()?;
    let msg_type = MsgType::from_u8(type_octet).ok_or(Error::UnknownMessageTag(type_octet))?;
    let body = decode_body(&mut r, msg_type)?;
    if r.remaining() != 0 {
        return Err(Error::TrailingBytes(r.remaining()));
    }
    Ok(Msg { tag, body })
}

fn decode_body(r: &mut Reader<'_>, msg_type: MsgType) -> Result<FCall> {
    Ok(match msg_type {
        MsgType::TVersion => FCall::TVersion { msize: r.read_u32()?, version: r.read_string()? },
        MsgType::RVersion => FCall::RVersion { msize: r.read_u32()?, version: r.read_string()? },
        MsgType::TAuth => FCall::TAuth {
            afid: r.read_u32()?,
            uname: r.read_string()?,
            aname: r.read_string()?,
        },
        MsgType::RAuth => FCall::RAuth { aqid: r.read_qid()? },
        MsgType::TAttach => FCall::TAttach {
            fid: r.read_u32()?,
            afid: r.read_u32()?,
            uname: r.read_string()?,
            aname: r.read_string()?,
        },
        MsgType::RAttach => FCall::RAttach { qid: r.read_qid()? },
        MsgType::RError => FCall::RError { ename: r.read_string()? },
        MsgType::TFlush => FCall::TFlush { oldtag: r.read_u16()? },
        MsgType::RFlush => FCall::RFlush,
        MsgType::TWalk => {
            let fid = r.read_u32()?;
            let newfid = r.read_u32()?;
            let nwname = r.read_u16()?;
            let mut wnames = Vec::with_capacity(nwname as usize);
            for _ in 0..nwname {
                wnames.push(r.read_string()?);
            }
            FCall::TWalk { fid, newfid, wnames }
        }
        MsgType::RWalk => {
            let nwqid = r.read_u16()?;
            let mut wqids = Vec::with_capacity(nwqid as usize);
            for _ in 0..nwqid {
                wqids.push(r.read_qid()?);
            }
            FCall::RWalk { wqids }
        }
        MsgType::TOpen => FCall::TOpen { fid: r.read_u32()?, mode: r.read_u8()? },
        MsgType::ROpen => FCall::ROpen { qid: r.read_qid()?, iounit: r.read_u32()? },
        MsgType::TCreate => FCall::TCreate {
            fid: r.read_u32()?,
            name: r.read_string()?,
            perm: r.read_u32()?,
            mode: r.read_u8()?,
        },
        MsgType::RCreate => FCall::RCreate { qid: r.read_qid()?, iounit: r.read_u32()? },
        MsgType::TRead => FCall::TRead {
            fid: r.read_u32()?,
            offset: r.read_u64()?,
            count: r.read_u32()?,
        },
        MsgType::RRead => {
            let count = r.read_u32()?;
            let data = r.read_bytes(count as usize)?.to_vec();
            FCall::RRead { data }
        }
        MsgType::TWrite => {
            let fid = r.read_u32()?;
            let offset = r.read_u64()?;
            let count = r.read_u32()?;
            let data = r.read_bytes(count as usize)?.to_vec();
            FCall::TWrite { fid, offset, data }
        }
        MsgType::RWrite => FCall::RWrite { count: r.read_u32()? },
        MsgType::TClunk => FCall::TClunk { fid: r.read_u32()? },
        MsgType::RClunk => FCall::RClunk,
        MsgType::TRemove => FCall::TRemove { fid: r.read_u32()? },
        MsgType::RRemove => FCall::RRemove,
        MsgType::TStat => FCall::TStat { fid: r.read_u32()? },
        MsgType::RStat => FCall::RStat { stat: r.read_stat()? },
        MsgType::TWstat => FCall::TWstat { fid: r.read_u32()?, stat: r.read_stat()? },
        MsgType::RWstat => FCall::RWstat,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode_msg;
    use crate::txbuffer::TxBuffer;

    fn round_trip(msg: Msg) {
        let mut tx = TxBuffer::with_capacity(128);
        let frame = encode_msg(&mut tx, &msg).unwrap().to_vec();
        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn tversion_round_trip() {
        round_trip(Msg {
            tag: crate::fcall::NOTAG,
            body: FCall::TVersion { msize: 16384, version: "9P2000".into() },
        });
    }

    #[test]
    fn rwalk_empty_round_trip() {
        round_trip(Msg { tag: 5, body: FCall::RWalk { wqids: vec![] } });
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut frame = vec![0u8; 7];
        frame[4] = 0xEE;
        assert!(matches!(decode_frame(&frame), Err(Error::UnknownMessageTag(0xEE))));
    }

    #[test]
    fn rerror_round_trip() {
        round_trip(Msg { tag: 3, body: FCall::RError { ename: "file not found".into() } });
    }

    #[test]
    fn trailing_bytes_after_body_are_rejected() {
        let mut tx = TxBuffer::with_capacity(64);
        let mut frame = encode_msg(&mut tx, &Msg { tag: 1, body: FCall::RClunk }).unwrap().to_vec();
        let declared = frame.len() as u32 + 1;
        frame[0..4].copy_from_slice(&declared.to_le_bytes());
        frame.push(0xAA);
        assert!(matches!(decode_frame(&frame), Err(Error::TrailingBytes(1))));
    }
}
