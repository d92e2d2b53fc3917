//! Decode-once codec for the WebSocket transport.
//!
//! - Text frames => `Command` via the Ext Lane envelope
//! - Binary frames => `Command` via the Hot Lane frame (panic-free bytes::Buf parsing)
//! - Ping/Pong/Close are surfaced for lifecycle management
//!
//! Replies go back on the lane the command came in on.

use axum::extract::ws::Message;
use tally_core::{
    error::Result,
    protocol::{command::Command, command::Reply, hot, text},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Text,
    Hot,
}

impl Lane {
    pub fn as_str(self) -> &'static str {
        match self {
            Lane::Text => "text",
            Lane::Hot => "hot",
        }
    }
}

#[derive(Debug)]
pub enum Inbound {
    Command { lane: Lane, cmd: Command },
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

/// Frame size, computed without decoding.
pub fn frame_len(msg: &Message) -> usize {
    match msg {
        Message::Text(s) => s.len(),
        Message::Binary(b) => b.len(),
        Message::Ping(v) => v.len(),
        Message::Pong(v) => v.len(),
        Message::Close(_) => 0,
    }
}

/// Command lane of a data frame; `None` for control frames.
pub fn lane_of(msg: &Message) -> Option<Lane> {
    match msg {
        Message::Text(_) => Some(Lane::Text),
        Message::Binary(_) => Some(Lane::Hot),
        _ => None,
    }
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => {
            let cmd = text::decode_text_command(&s)?;
            Ok(Inbound::Command { lane: Lane::Text, cmd })
        }
        Message::Binary(b) => {
            let cmd = hot::decode_hot_command(bytes::Bytes::from(b))?;
            Ok(Inbound::Command { lane: Lane::Hot, cmd })
        }
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(v) => Ok(Inbound::Pong(v)),
        Message::Close(_) => Ok(Inbound::Close),
    }
}

pub fn encode_reply(lane: Lane, reply: &Reply) -> Result<Message> {
    match lane {
        Lane::Text => Ok(Message::Text(text::encode_text_reply(reply)?)),
        Lane::Hot => Ok(Message::Binary(hot::encode_hot_reply(reply)?.to_vec())),
    }
}
