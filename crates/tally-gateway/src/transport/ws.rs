//! WebSocket command channel.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Lifecycle: ping + idle timeout
//! - Cheap-first: reject oversized frames before decoding
//! - Decode-once, execute, reply on the same lane to this session only
//!
//! Decode and guard failures are replied as errors; they never end the session.

use std::fmt;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::Instrument;

use tally_core::error::{Result, TallyError};
use tally_core::protocol::command::Reply;

use crate::app_state::AppState;
use crate::transport::codec::{decode, encode_reply, frame_len, lane_of, Inbound, Lane};

const IDLE_CHECK: Duration = Duration::from_millis(250);

/// What the session loop should do after one inbound frame.
#[derive(Debug)]
pub enum Step {
    Reply(Message),
    Ignore,
    Close,
}

pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| {
        let session = app.next_session_id();
        let span = tracing::info_span!("ws_session", session);
        async move {
            if let Err(e) = run_session(app, socket).await {
                tracing::debug!(error = %e, "session ended with error");
            }
        }
        .instrument(span)
    })
}

/// Keeps the active-session gauge balanced however the loop exits.
struct SessionGauge(AppState);

impl SessionGauge {
    fn enter(app: &AppState) -> Self {
        app.metrics().ws_sessions.inc(&[]);
        Self(app.clone())
    }
}

impl Drop for SessionGauge {
    fn drop(&mut self) {
        self.0.metrics().ws_sessions.dec(&[]);
    }
}

async fn run_session(app: AppState, socket: WebSocket) -> Result<()> {
    let (ws_tx, ws_rx) = socket.split();
    drive_session(app, ws_rx, ws_tx).await
}

/// Session loop over any frame stream and sink; returns when the peer
/// closes, the idle timeout fires, or the socket fails.
async fn drive_session<R, T, E>(app: AppState, mut ws_rx: R, mut ws_tx: T) -> Result<()>
where
    R: Stream<Item = std::result::Result<Message, E>> + Unpin,
    E: fmt::Display,
    T: Sink<Message> + Unpin,
    T::Error: fmt::Display,
{
    let _gauge = SessionGauge::enter(&app);
    tracing::info!("session opened");

    let gw = &app.cfg().gateway;
    let ping_every = Duration::from_millis(gw.ping_interval_ms);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);

    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut idle_tick = tokio::time::interval(IDLE_CHECK);
    idle_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let msg = incoming
                    .map_err(|e| TallyError::Internal(format!("websocket read failed: {e}")))?;
                last_activity = Instant::now();

                match handle_frame(&app, msg) {
                    Step::Reply(out) => {
                        ws_tx
                            .send(out)
                            .await
                            .map_err(|e| TallyError::Internal(format!("websocket write failed: {e}")))?;
                    }
                    Step::Ignore => {}
                    Step::Close => break,
                }
            }

            _ = ping_tick.tick() => {
                if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }

            _ = idle_tick.tick() => {
                if last_activity.elapsed() >= idle_timeout {
                    tracing::info!("idle timeout");
                    let _ = ws_tx
                        .send(Message::Close(Some(CloseFrame {
                            code: close_code::NORMAL,
                            reason: "idle timeout".into(),
                        })))
                        .await;
                    break;
                }
            }
        }
    }

    tracing::info!("session closed");
    Ok(())
}

/// Process one inbound frame. Pure with respect to the socket, so it can be
/// driven directly in tests.
pub fn handle_frame(app: &AppState, msg: Message) -> Step {
    let lane = lane_of(&msg);
    let bytes_len = frame_len(&msg);

    if let Some(lane) = lane {
        if bytes_len > app.cfg().gateway.max_frame_bytes {
            tracing::warn!(lane = lane.as_str(), bytes_len, "frame too large");
            return reject(app, lane, "too_large", TallyError::PayloadTooLarge);
        }
    }

    match decode(msg) {
        Ok(Inbound::Command { lane, cmd }) => reply(lane, &app.execute(cmd)),
        Ok(Inbound::Ping(payload)) => Step::Reply(Message::Pong(payload)),
        Ok(Inbound::Pong(_)) => Step::Ignore,
        Ok(Inbound::Close) => Step::Close,
        Err(e) => match lane {
            Some(lane) => {
                tracing::debug!(lane = lane.as_str(), error = %e, "decode failed");
                reject(app, lane, "decode", e)
            }
            None => Step::Ignore,
        },
    }
}

fn reject(app: &AppState, lane: Lane, reason: &str, err: TallyError) -> Step {
    app.metrics()
        .ws_rejected_frames
        .inc(&[("lane", lane.as_str()), ("reason", reason)]);
    reply(lane, &Reply::error(None, None, err))
}

fn reply(lane: Lane, reply: &Reply) -> Step {
    match encode_reply(lane, reply) {
        Ok(msg) => Step::Reply(msg),
        Err(e) => {
            tracing::warn!(lane = lane.as_str(), error = %e, "reply encode failed");
            Step::Ignore
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use futures_util::{sink, stream};
    use tally_core::protocol::hot::HOT_FLAG_SEQ_PRESENT;
    use tally_core::protocol::command::{Command, Op};
    use tally_core::protocol::hot::{decode_hot_reply, encode_hot_command};
    use tally_core::protocol::text::decode_text_reply;
    use tally_core::ClientCode;

    fn app() -> AppState {
        let cfg = config::load_from_str(
            "version: 1\ngateway:\n  max_frame_bytes: 128\ncounters:\n  - id: main\n",
        )
        .unwrap();
        AppState::new(cfg).unwrap()
    }

    fn text(app: &AppState, s: &str) -> tally_core::protocol::text::ReplyEnvelope {
        match handle_frame(app, Message::Text(s.to_string())) {
            Step::Reply(Message::Text(out)) => decode_text_reply(&out).unwrap(),
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn text_lane_round_trip() {
        let app = app();
        let r = text(&app, r#"{"v":1,"op":"set","counter":"main","value":5,"seq":1}"#);
        assert_eq!((r.kind.as_str(), r.value, r.seq), ("value", Some(5), Some(1)));
        let r = text(&app, r#"{"v":1,"op":"increment","counter":"main"}"#);
        assert_eq!(r.value, Some(6));
    }

    #[test]
    fn text_decode_error_is_replied() {
        let app = app();
        let r = text(&app, "{");
        assert_eq!(r.kind, "error");
        assert_eq!(r.code.as_deref(), Some("BAD_REQUEST"));
        assert_eq!(
            app.metrics()
                .ws_rejected_frames
                .get(&[("lane", "text"), ("reason", "decode")]),
            1
        );
    }

    #[test]
    fn oversized_frame_rejected_before_decode() {
        let app = app();
        let r = text(&app, &" ".repeat(129));
        assert_eq!(r.code.as_deref(), Some("PAYLOAD_TOO_LARGE"));
    }

    #[test]
    fn hot_lane_underflow() {
        let app = app();
        let cmd = Command::new(Op::Decrement, Some("main".into()), None, Some(9)).unwrap();
        let frame = encode_hot_command(&cmd).unwrap().to_vec();
        let Step::Reply(Message::Binary(out)) = handle_frame(&app, Message::Binary(frame)) else {
            panic!("expected binary reply");
        };
        let r = decode_hot_reply(bytes::Bytes::from(out)).unwrap();
        assert_eq!(r.code(), Some(ClientCode::Underflow));
        assert_eq!(r.seq, Some(9));
        assert_eq!(r.counter, "main");
    }

    #[test]
    fn hot_decode_error_is_replied() {
        let app = app();
        // v=1, op=increment, flags=seq, id_len=4, but the seq and id are cut short.
        let frame = vec![1, 2, HOT_FLAG_SEQ_PRESENT, 4, 9];
        let Step::Reply(Message::Binary(out)) = handle_frame(&app, Message::Binary(frame)) else {
            panic!("expected binary reply");
        };
        let r = decode_hot_reply(bytes::Bytes::from(out)).unwrap();
        assert_eq!(r.code(), Some(ClientCode::BadRequest));
        assert_eq!((r.seq, r.value, r.counter.as_str()), (None, 0, ""));
        assert_eq!(
            app.metrics()
                .ws_rejected_frames
                .get(&[("lane", "hot"), ("reason", "decode")]),
            1
        );
        assert_eq!(app.registry().get("main").unwrap().number(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_is_closed() {
        let app = app();
        let idle = Duration::from_millis(app.cfg().gateway.idle_timeout_ms);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let out = std::pin::pin!(sink::unfold(tx, |tx, msg: Message| async move {
            tx.send(msg).map(|()| tx).map_err(|e| e.to_string())
        }));

        let started = Instant::now();
        drive_session(app.clone(), stream::pending::<Result<Message>>(), out)
            .await
            .unwrap();

        let mut sent = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            sent.push(msg);
        }
        assert!(started.elapsed() >= idle);
        assert!(sent.iter().any(|m| matches!(m, Message::Ping(_))));
        match sent.last() {
            Some(Message::Close(Some(frame))) => {
                assert_eq!(frame.code, close_code::NORMAL);
                assert_eq!(frame.reason, "idle timeout");
            }
            other => panic!("expected close frame, got {other:?}"),
        }
        assert_eq!(app.metrics().ws_sessions.get(&[]), 0);
    }

    #[test]
    fn control_frames() {
        let app = app();
        assert!(matches!(
            handle_frame(&app, Message::Ping(vec![1, 2])),
            Step::Reply(Message::Pong(p)) if p == vec![1, 2]
        ));
        assert!(matches!(handle_frame(&app, Message::Pong(vec![])), Step::Ignore));
        assert!(matches!(handle_frame(&app, Message::Close(None)), Step::Close));
    }
}
