//! Hot Lane binary frames (panic-free).
//!
//! Request: `v | opcode | flags | id_len | [seq:u32] | id | [value:u128]`
//! Reply:   `v | status | flags | [seq:u32] | value:u128 | id_len | id`
//!
//! All integers are little-endian. `value` is present in a request only for
//! `set`; `status` is `0` on success, otherwise a [`ClientCode`] status byte.
//!
//! Parsing rules:
//! - Never index (`buf[0]`); always use `Buf` and `remaining()` checks.
//! - Never `unwrap()` / `expect()` / `panic!()` in production paths.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::counter::Value;
use crate::error::{ClientCode, Result, TallyError};
use crate::protocol::command::{Command, Op, Outcome, Reply};
use crate::protocol::PROTOCOL_VERSION;

/// Hot Lane flag: seq (u32) is present.
pub const HOT_FLAG_SEQ_PRESENT: u8 = 0x01;

/// Hot Lane status byte for a successful reply.
pub const HOT_STATUS_OK: u8 = 0;

const VALUE_LEN: usize = 16;

/// Parsed Hot Lane reply (client side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotReply {
    /// `0` on success, otherwise a [`ClientCode`] status byte.
    pub status: u8,
    pub seq: Option<u32>,
    pub value: Value,
    pub counter: String,
}

impl HotReply {
    /// Error code carried by a failed reply.
    pub fn code(&self) -> Option<ClientCode> {
        ClientCode::from_status_byte(self.status)
    }
}

fn read_seq(buf: &mut Bytes, flags: u8) -> Result<Option<u32>> {
    if (flags & HOT_FLAG_SEQ_PRESENT) == 0 {
        return Ok(None);
    }
    if buf.remaining() < 4 {
        return Err(TallyError::BadRequest(
            "seq flag set but missing u32".into(),
        ));
    }
    Ok(Some(buf.get_u32_le()))
}

fn read_id(buf: &mut Bytes, len: usize) -> Result<String> {
    if buf.remaining() < len {
        return Err(TallyError::BadRequest("counter id truncated".into()));
    }
    let raw = buf.copy_to_bytes(len);
    String::from_utf8(raw.to_vec())
        .map_err(|_| TallyError::BadRequest("counter id is not utf-8".into()))
}

fn seq_flag(seq: Option<u32>) -> u8 {
    if seq.is_some() {
        HOT_FLAG_SEQ_PRESENT
    } else {
        0
    }
}

fn id_len(id: &str) -> Result<u8> {
    u8::try_from(id.len())
        .map_err(|_| TallyError::BadRequest("counter id longer than 255 bytes".into()))
}

/// Decode a Hot Lane request frame into a command.
pub fn decode_hot_command(mut buf: Bytes) -> Result<Command> {
    // Minimum header: v, opcode, flags, id_len
    if buf.remaining() < 4 {
        return Err(TallyError::BadRequest("hot frame too short".into()));
    }

    let v = buf.get_u8();
    if v != PROTOCOL_VERSION {
        return Err(TallyError::UnsupportedVersion);
    }

    let op = Op::from_code(buf.get_u8())?;
    let flags = buf.get_u8();
    let id_len = usize::from(buf.get_u8());
    let seq = read_seq(&mut buf, flags)?;

    let id = read_id(&mut buf, id_len)?;
    // An empty id means "none": generated on create, rejected elsewhere.
    let counter = (!id.is_empty()).then_some(id);

    let value = if op == Op::Set {
        if buf.remaining() < VALUE_LEN {
            return Err(TallyError::BadRequest("set frame missing u128 value".into()));
        }
        Some(buf.get_u128_le())
    } else {
        None
    };

    if buf.has_remaining() {
        return Err(TallyError::BadRequest(format!(
            "{} trailing bytes in hot frame",
            buf.remaining()
        )));
    }

    Command::new(op, counter, value, seq.map(u64::from))
}

/// Encode a command as a Hot Lane request frame (client side).
pub fn encode_hot_command(cmd: &Command) -> Result<Bytes> {
    let id = cmd.counter_id();
    let seq = cmd.seq.map(hot_seq).transpose()?;

    let mut out = BytesMut::with_capacity(8 + id.len() + VALUE_LEN);
    out.put_u8(PROTOCOL_VERSION);
    out.put_u8(cmd.op.code());
    out.put_u8(seq_flag(seq));
    out.put_u8(id_len(id)?);
    if let Some(s) = seq {
        out.put_u32_le(s);
    }
    out.put_slice(id.as_bytes());
    if let Some(v) = cmd.value {
        out.put_u128_le(v);
    }
    Ok(out.freeze())
}

/// Encode a reply as a Hot Lane reply frame.
pub fn encode_hot_reply(reply: &Reply) -> Result<Bytes> {
    let id = reply.counter.as_deref().unwrap_or_default();
    let seq = reply.seq.map(hot_seq).transpose()?;
    let (status, value) = match &reply.outcome {
        Ok(Outcome::Value(v)) => (HOT_STATUS_OK, *v),
        Ok(Outcome::Destroyed) => (HOT_STATUS_OK, 0),
        Err(e) => (e.client_code().status_byte(), 0),
    };

    let mut out = BytesMut::with_capacity(8 + VALUE_LEN + id.len());
    out.put_u8(PROTOCOL_VERSION);
    out.put_u8(status);
    out.put_u8(seq_flag(seq));
    if let Some(s) = seq {
        out.put_u32_le(s);
    }
    out.put_u128_le(value);
    out.put_u8(id_len(id)?);
    out.put_slice(id.as_bytes());
    Ok(out.freeze())
}

/// Decode a Hot Lane reply frame (client side).
pub fn decode_hot_reply(mut buf: Bytes) -> Result<HotReply> {
    if buf.remaining() < 3 {
        return Err(TallyError::BadRequest("hot reply too short".into()));
    }
    let v = buf.get_u8();
    if v != PROTOCOL_VERSION {
        return Err(TallyError::UnsupportedVersion);
    }
    let status = buf.get_u8();
    let flags = buf.get_u8();
    let seq = read_seq(&mut buf, flags)?;

    if buf.remaining() < VALUE_LEN + 1 {
        return Err(TallyError::BadRequest("hot reply truncated".into()));
    }
    let value = buf.get_u128_le();
    let id_len = usize::from(buf.get_u8());
    let counter = read_id(&mut buf, id_len)?;

    Ok(HotReply {
        status,
        seq,
        value,
        counter,
    })
}

// Hot Lane sequence numbers are u32.
fn hot_seq(seq: u64) -> Result<u32> {
    u32::try_from(seq).map_err(|_| TallyError::BadRequest(format!("seq {seq} exceeds u32")))
}
