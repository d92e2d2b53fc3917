//! Hot Lane vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bytes::Bytes;

use tally_core::protocol::command::{Command, Op, Outcome, Reply};
use tally_core::protocol::hot::{
    decode_hot_command, decode_hot_reply, encode_hot_command, encode_hot_reply, HOT_STATUS_OK,
};
use tally_core::{ClientCode, TallyError};

use vector_loader::load_vector;

#[test]
fn hot_vectors() {
    let files = [
        "hot_increment.json",
        "hot_set_seq.json",
        "hot_set_max_b64.json",
        "hot_decrement_b64.json",
        "hot_create_anon.json",
        "hot_bad_version.json",
        "hot_too_short.json",
        "hot_unknown_opcode.json",
        "hot_set_missing_value.json",
        "hot_seq_flag_missing_u32.json",
        "hot_trailing_bytes.json",
        "hot_get_missing_counter.json",
    ];

    for f in files {
        let v = load_vector(f);
        let raw = v.frame.decode();
        let res = decode_hot_command(Bytes::from(raw));

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.client_code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let cmd = res.expect("expected ok command");
        let ex = v.expect.expect("missing expect block");

        assert_eq!(cmd.op.as_str(), ex["op"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(cmd.counter.as_deref(), ex["counter"].as_str(), "vector={}", v.description);
        assert_eq!(
            cmd.value.map(|n| n.to_string()).as_deref(),
            ex["value"].as_str(),
            "vector={}",
            v.description
        );
        assert_eq!(cmd.seq, ex["seq"].as_u64(), "vector={}", v.description);
    }
}

#[test]
fn command_frame_survives_encoding() {
    let cmd = Command::new(Op::Set, Some("main".into()), Some(u128::MAX), Some(7)).unwrap();
    let frame = encode_hot_command(&cmd).unwrap();
    assert_eq!(decode_hot_command(frame).unwrap(), cmd);
}

#[test]
fn value_reply_layout() {
    let reply = Reply::ok(Some(3), "c-1", Outcome::Value(6));
    let frame = encode_hot_reply(&reply).unwrap();

    let mut expected = vec![1u8, HOT_STATUS_OK, 0x01, 3, 0, 0, 0, 6];
    expected.extend_from_slice(&[0u8; 15]);
    expected.push(3);
    expected.extend_from_slice(b"c-1");
    assert_eq!(frame.as_ref(), expected.as_slice());

    let back = decode_hot_reply(frame).unwrap();
    assert_eq!(back.status, HOT_STATUS_OK);
    assert_eq!(back.seq, Some(3));
    assert_eq!(back.value, 6);
    assert_eq!(back.counter, "c-1");
    assert_eq!(back.code(), None);
}

#[test]
fn error_reply_carries_status_byte() {
    let reply = Reply::error(None, Some("main".into()), TallyError::Underflow);
    let back = decode_hot_reply(encode_hot_reply(&reply).unwrap()).unwrap();
    assert_eq!(back.code(), Some(ClientCode::Underflow));
    assert_eq!(back.value, 0);
    assert_eq!(back.seq, None);
}

#[test]
fn text_seq_too_wide_for_hot_reply() {
    let reply = Reply::ok(Some(u64::from(u32::MAX) + 1), "main", Outcome::Destroyed);
    let err = encode_hot_reply(&reply).unwrap_err();
    assert_eq!(err.client_code(), ClientCode::BadRequest);
}

#[test]
fn every_status_byte_maps_back() {
    let codes = [
        ClientCode::Overflow,
        ClientCode::Underflow,
        ClientCode::OutOfRange,
        ClientCode::BadRequest,
        ClientCode::NotFound,
        ClientCode::AlreadyExists,
        ClientCode::RegistryFull,
        ClientCode::PayloadTooLarge,
        ClientCode::UnsupportedVersion,
        ClientCode::Internal,
    ];
    for code in codes {
        assert_ne!(code.status_byte(), HOT_STATUS_OK);
        assert_eq!(ClientCode::from_status_byte(code.status_byte()), Some(code));
    }
    assert_eq!(ClientCode::from_status_byte(HOT_STATUS_OK), None);
}
