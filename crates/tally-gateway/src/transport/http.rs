//! REST handlers for counters.
//!
//! Each handler builds a `Command` and runs it through the shared executor;
//! errors become `{"error": CODE, "message": text}` with a mapped status.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, value::RawValue};

use tally_core::error::{ClientCode, TallyError};
use tally_core::protocol::command::{Command, Op, Outcome, Reply};
use tally_core::protocol::text::parse_raw_value;
use tally_core::Value;

use crate::app_state::AppState;

/// HTTP face of a `TallyError`.
#[derive(Debug)]
pub struct ApiError(pub TallyError);

impl From<TallyError> for ApiError {
    fn from(e: TallyError) -> Self {
        Self(e)
    }
}

pub fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::Overflow | ClientCode::Underflow | ClientCode::AlreadyExists => {
            StatusCode::CONFLICT
        }
        ClientCode::OutOfRange | ClientCode::BadRequest | ClientCode::UnsupportedVersion => {
            StatusCode::BAD_REQUEST
        }
        ClientCode::NotFound => StatusCode::NOT_FOUND,
        ClientCode::RegistryFull => StatusCode::INSUFFICIENT_STORAGE,
        ClientCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let body = Json(json!({
            "error": code.as_str(),
            "message": self.0.to_string(),
        }));
        (status_for(code), body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CounterBody {
    pub counter: String,
    pub value: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CounterList {
    pub counters: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateReq {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SetReq {
    value: Box<RawValue>,
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError(TallyError::BadRequest(format!("invalid json body: {e}"))))
}

fn value_body(reply: Reply) -> ApiResult<Json<CounterBody>> {
    match reply.outcome? {
        Outcome::Value(value) => Ok(Json(CounterBody {
            counter: reply.counter.unwrap_or_default(),
            value,
        })),
        Outcome::Destroyed => Err(ApiError(TallyError::Internal(
            "unexpected destroyed outcome".into(),
        ))),
    }
}

fn run(app: &AppState, op: Op, id: String, value: Option<Value>) -> ApiResult<Reply> {
    let cmd = Command::new(op, Some(id), value, None)?;
    Ok(app.execute(cmd))
}

/// `POST /v1/counters` with an optional `{"id": "..."}` body.
pub async fn create_counter(
    State(app): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<CounterBody>)> {
    let req: CreateReq = if body.iter().all(u8::is_ascii_whitespace) {
        CreateReq::default()
    } else {
        parse_body(&body)?
    };
    let cmd = Command::new(Op::Create, req.id, None, None)?;
    let created = value_body(app.execute(cmd))?;
    Ok((StatusCode::CREATED, created))
}

/// `GET /v1/counters`
pub async fn list_counters(State(app): State<AppState>) -> Json<CounterList> {
    Json(CounterList {
        counters: app.registry().ids(),
    })
}

/// `GET /v1/counters/:id`
pub async fn get_counter(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CounterBody>> {
    value_body(run(&app, Op::Get, id, None)?)
}

/// `PUT /v1/counters/:id` with `{"value": n}`; `n` may be a number or a decimal string.
pub async fn set_counter(
    State(app): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<CounterBody>> {
    let req: SetReq = parse_body(&body)?;
    let value = parse_raw_value(&req.value)?;
    value_body(run(&app, Op::Set, id, Some(value))?)
}

/// `POST /v1/counters/:id/increment`
pub async fn increment_counter(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CounterBody>> {
    value_body(run(&app, Op::Increment, id, None)?)
}

/// `POST /v1/counters/:id/decrement`
pub async fn decrement_counter(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CounterBody>> {
    value_body(run(&app, Op::Decrement, id, None)?)
}

/// `DELETE /v1/counters/:id`
pub async fn destroy_counter(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    run(&app, Op::Destroy, id, None)?.outcome?;
    Ok(StatusCode::NO_CONTENT)
}
