//! Ext Lane envelope (JSON).
//!
//! `value` is kept as `RawValue` so numbers wider than any native integer can
//! still be told apart from malformed input: they are parsed as decimal text
//! and narrowed, yielding `OutOfRange` rather than a generic decode error.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::counter::Value;
use crate::error::{Result, TallyError};
use crate::protocol::command::{Command, Outcome, Reply};
use crate::protocol::PROTOCOL_VERSION;
use crate::word::parse_decimal;

/// Ext Lane command envelope (Text frame).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    /// Protocol version.
    pub v: u8,
    /// Operation name (e.g., "increment").
    pub op: String,
    /// Target counter id. Optional for `create`.
    #[serde(default)]
    pub counter: Option<String>,
    /// New value for `set`: a JSON number or a decimal string.
    #[serde(default)]
    pub value: Option<Box<RawValue>>,
    /// Optional sequence number, echoed in the reply.
    #[serde(default)]
    pub seq: Option<u64>,
}

impl Envelope {
    pub fn into_command(self) -> Result<Command> {
        if self.v != PROTOCOL_VERSION {
            return Err(TallyError::UnsupportedVersion);
        }
        let op = self.op.parse()?;
        let value = self.value.as_deref().map(parse_raw_value).transpose()?;
        Command::new(op, self.counter, value, self.seq)
    }
}

/// Decode a text frame into a command.
pub fn decode_text_command(s: &str) -> Result<Command> {
    let env: Envelope = serde_json::from_str(s)
        .map_err(|e| TallyError::BadRequest(format!("invalid envelope json: {e}")))?;
    env.into_command()
}

/// Parse a JSON number or decimal string into a counter value.
pub fn parse_raw_value(raw: &RawValue) -> Result<Value> {
    let text = raw.get().trim();
    if text.starts_with('"') {
        let s: String = serde_json::from_str(text)
            .map_err(|e| TallyError::BadRequest(format!("invalid value string: {e}")))?;
        parse_decimal(&s)
    } else {
        parse_decimal(text)
    }
}

/// Ext Lane reply as it appears on the wire.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplyEnvelope {
    pub v: u8,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl From<&Reply> for ReplyEnvelope {
    fn from(reply: &Reply) -> Self {
        let mut out = ReplyEnvelope {
            v: PROTOCOL_VERSION,
            kind: String::new(),
            counter: reply.counter.clone(),
            value: None,
            code: None,
            msg: None,
            seq: reply.seq,
        };
        match &reply.outcome {
            Ok(Outcome::Value(v)) => {
                out.kind = "value".into();
                out.value = Some(*v);
            }
            Ok(Outcome::Destroyed) => out.kind = "destroyed".into(),
            Err(e) => {
                out.kind = "error".into();
                out.code = Some(e.client_code().as_str().into());
                out.msg = Some(e.to_string());
            }
        }
        out
    }
}

/// Encode a reply as a text frame.
pub fn encode_text_reply(reply: &Reply) -> Result<String> {
    serde_json::to_string(&ReplyEnvelope::from(reply))
        .map_err(|e| TallyError::Internal(format!("json encode failed: {e}")))
}

/// Decode a text reply (client side).
pub fn decode_text_reply(s: &str) -> Result<ReplyEnvelope> {
    serde_json::from_str(s).map_err(|e| TallyError::BadRequest(format!("invalid reply json: {e}")))
}
