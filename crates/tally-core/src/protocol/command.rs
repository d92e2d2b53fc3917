//! Transport-agnostic command and reply model.

use std::fmt;
use std::str::FromStr;

use crate::counter::Value;
use crate::error::{Result, TallyError};

/// Counter operation requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Deploy a fresh instance (value 0).
    Create,
    /// Read the current value.
    Get,
    /// Overwrite the value.
    Set,
    Increment,
    Decrement,
    /// Remove the instance.
    Destroy,
}

impl Op {
    pub const ALL: [Op; 6] = [
        Op::Create,
        Op::Get,
        Op::Set,
        Op::Increment,
        Op::Decrement,
        Op::Destroy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Op::Create => "create",
            Op::Get => "get",
            Op::Set => "set",
            Op::Increment => "increment",
            Op::Decrement => "decrement",
            Op::Destroy => "destroy",
        }
    }

    /// Hot Lane opcode.
    pub fn code(self) -> u8 {
        match self {
            Op::Get => 0,
            Op::Set => 1,
            Op::Increment => 2,
            Op::Decrement => 3,
            Op::Create => 4,
            Op::Destroy => 5,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        Op::ALL
            .into_iter()
            .find(|op| op.code() == code)
            .ok_or_else(|| TallyError::BadRequest(format!("unknown opcode: {code}")))
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Op {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self> {
        Op::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| TallyError::BadRequest(format!("unknown op: {s}")))
    }
}

/// A decoded, validated request.
///
/// Shape invariants are checked by [`Command::new`]: `counter` is present for
/// every op but `Create`, and `value` is present exactly for `Set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub op: Op,
    pub counter: Option<String>,
    pub value: Option<Value>,
    pub seq: Option<u64>,
}

impl Command {
    pub fn new(op: Op, counter: Option<String>, value: Option<Value>, seq: Option<u64>) -> Result<Self> {
        if op != Op::Create && counter.is_none() {
            return Err(TallyError::BadRequest(format!("{op} requires counter")));
        }
        match (op, value.is_some()) {
            (Op::Set, false) => {
                return Err(TallyError::BadRequest("set requires value".into()));
            }
            (op, true) if op != Op::Set => {
                return Err(TallyError::BadRequest(format!("{op} does not take a value")));
            }
            _ => {}
        }
        Ok(Self { op, counter, value, seq })
    }

    /// Counter id, or `""` for a create without a requested id.
    pub fn counter_id(&self) -> &str {
        self.counter.as_deref().unwrap_or_default()
    }
}

/// Successful result of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The counter's value after the command.
    Value(Value),
    /// The counter no longer exists.
    Destroyed,
}

/// Reply to exactly one command, addressed to the caller that sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub seq: Option<u64>,
    pub counter: Option<String>,
    pub outcome: Result<Outcome>,
}

impl Reply {
    pub fn ok(seq: Option<u64>, counter: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            seq,
            counter: Some(counter.into()),
            outcome: Ok(outcome),
        }
    }

    pub fn error(seq: Option<u64>, counter: Option<String>, err: TallyError) -> Self {
        Self {
            seq,
            counter,
            outcome: Err(err),
        }
    }
}
