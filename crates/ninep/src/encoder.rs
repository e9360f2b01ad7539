//! Builds a 9P2000 message into a [`TxBuffer`].
//!
//! Each `encode` call resets the buffer, writes the message-type octet, the
//! tag, and the message-specific fields in protocol order, then finalizes
//! the four-byte length prefix. One call produces one complete frame ready
//! to hand to the transport.

use crate::error::Result;
use crate::fcall::{FCall, Msg};
use crate::txbuffer::TxBuffer;
use crate::wire::{write_qid, write_stat, write_string, write_u16, write_u32, write_u64, write_u8};

pub fn encode_msg<'a>(tx: &'a mut TxBuffer, msg: &Msg) -> Result<&'a [u8]> {
    let buf = tx.reset();
    write_u8(buf, msg.body.msg_type() as u8);
    write_u16(buf, msg.tag);
    encode_body(buf, &msg.body)?;
    Ok(tx.finalize())
}

fn encode_body(buf: &mut Vec<u8>, body: &FCall) -> Result<()> {
    match body {
        FCall::TVersion { msize, version } => {
            write_u32(buf, *msize);
            write_string(buf, version)?;
        }
        FCall::RVersion { msize, version } => {
            write_u32(buf, *msize);
            write_string(buf, version)?;
        }
        FCall::TAuth { afid, uname, aname } => {
            write_u32(buf, *afid);
            write_string(buf, uname)?;
            write_string(buf, aname)?;
        }
        FCall::RAuth { aqid } => write_qid(buf, aqid),
        FCall::TAttach { fid, afid, uname, aname } => {
            write_u32(buf, *fid);
            write_u32(buf, *afid);
            write_string(buf, uname)?;
            write_string(buf, aname)?;
        }
        FCall::RAttach { qid } => write_qid(buf, qid),
        FCall::RError { ename } => write_string(buf, ename)?,
        FCall::TFlush { oldtag } => write_u16(buf, *oldtag),
        FCall::RFlush => {}
        FCall::TWalk { fid, newfid, wnames } => {
            write_u32(buf, *fid);
            write_u32(buf, *newfid);
            write_u16(buf, wnames.len() as u16);
            for name in wnames {
                write_string(buf, name)?;
            }
        }
        FCall::RWalk { wqids } => {
            write_u16(buf, wqids.len() as u16);
            for qid in wqids {
                write_qid(buf, qid);
            }
        }
        FCall::TOpen { fid, mode } => {
            write_u32(buf, *fid);
            write_u8(buf, *mode);
        }
        FCall::ROpen { qid, iounit } => {
            write_qid(buf, qid);
            write_u32(buf, *iounit);
        }
        FCall::TCreate { fid, name, perm, mode } => {
            write_u32(buf, *fid);
            write_string(buf, name)?;
            write_u32(buf, *perm);
            write_u8(buf, *mode);
        }
        FCall::RCreate { qid, iounit } => {
            write_qid(buf, qid);
            write_u32(buf, *iounit);
        }
        FCall::TRead { fid, offset, count } => {
            write_u32(buf, *fid);
            write_u64(buf, *offset);
            write_u32(buf, *count);
        }
        FCall::RRead { data } => {
            write_u32(buf, data.len() as u32);
            buf.extend_from_slice(data);
        }
        FCall::TWrite { fid, offset, data } => {
            write_u32(buf, *fid);
            write_u64(buf, *offset);
            write_u32(buf, data.len() as u32);
            buf.extend_from_slice(data);
        }
        FCall::RWrite { count } => write_u32(buf, *count),
        FCall::TClunk { fid } | FCall::TRemove { fid } | FCall::TStat { fid } => write_u32(buf, *fid),
        FCall::RClunk | FCall::RRemove | FCall::RWstat => {}
        FCall::RStat { stat } => write_stat(buf, stat)?,
        FCall::TWstat { fid, stat } => {
            write_u32(buf, *fid);
            write_stat(buf, stat)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tversion_matches_literal_frame() {
        let msg = Msg {
            tag: crate::fcall::NOTAG,
            body: FCall::TVersion { msize: 16384, version: "9P2000".into() },
        };
        let mut tx = TxBuffer::with_capacity(64);
        let frame = encode_msg(&mut tx, &msg).unwrap();
        let expected: &[u8] = &[
            0x13, 0x00, 0x00, 0x00, // size = 19
            0x64, // TVersion = 100
            0xFF, 0xFF, // NOTAG
            0x00, 0x40, 0x00, 0x00, // msize = 16384
            0x06, 0x00, // version length
            b'9', b'P', b'2', b'0', b'0', b'0',
        ];
        assert_eq!(frame, expected);
    }

    #[test]
    fn length_prefix_matches_frame_length() {
        let msg = Msg { tag: 1, body: FCall::TClunk { fid: 7 } };
        let mut tx = TxBuffer::with_capacity(64);
        let frame = encode_msg(&mut tx, &msg).unwrap().to_vec();
        let declared = u32::from_le_bytes(frame[0..4].try_into().unwrap()) as usize;
        assert_eq!(declared, frame.len());
    }
}
