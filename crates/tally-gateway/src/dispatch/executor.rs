use std::time::Instant;

use tally_core::error::{Result, TallyError};
use tally_core::protocol::command::{Command, Op, Outcome, Reply};

use crate::obs::metrics::GatewayMetrics;
use crate::registry::CounterRegistry;

/// Run one command against the registry and build the caller's reply.
///
/// Failures are carried in the reply, never raised: the transport decides how
/// to surface them. Every call is counted by op and outcome and timed by op.
pub fn execute(registry: &CounterRegistry, metrics: &GatewayMetrics, cmd: Command) -> Reply {
    let started = Instant::now();
    let op = cmd.op;
    let seq = cmd.seq;

    let (counter, outcome) = match run(registry, &cmd) {
        Ok((id, outcome)) => (Some(id), Ok(outcome)),
        Err(e) => (cmd.counter, Err(e)),
    };

    let outcome_label = match &outcome {
        Ok(_) => "ok",
        Err(e) => e.client_code().as_str(),
    };
    metrics.ops.inc(&[("op", op.as_str()), ("outcome", outcome_label)]);
    metrics.op_duration.observe(&[("op", op.as_str())], started.elapsed());

    match &outcome {
        Ok(o) => tracing::debug!(%op, counter = ?counter, outcome = ?o, "counter op"),
        Err(e) => tracing::debug!(%op, counter = ?counter, error = %e, "counter op rejected"),
    }

    Reply {
        seq,
        counter,
        outcome,
    }
}

fn run(registry: &CounterRegistry, cmd: &Command) -> Result<(String, Outcome)> {
    if cmd.op == Op::Create {
        let id = registry.create(cmd.counter.as_deref())?;
        return Ok((id, Outcome::Value(0)));
    }

    let id = cmd
        .counter
        .clone()
        .ok_or_else(|| TallyError::BadRequest(format!("{} requires counter", cmd.op)))?;

    let outcome = match cmd.op {
        Op::Destroy => {
            registry.destroy(&id)?;
            Outcome::Destroyed
        }
        op => {
            let counter = registry.get(&id)?;
            let value = match op {
                Op::Get => counter.number(),
                Op::Set => {
                    let n = cmd
                        .value
                        .ok_or_else(|| TallyError::BadRequest("set requires value".into()))?;
                    counter.set_number(n);
                    n
                }
                Op::Increment => counter.increment()?,
                Op::Decrement => counter.decrement()?,
                Op::Create | Op::Destroy => {
                    return Err(TallyError::Internal(format!("{op} reached counter path")));
                }
            };
            Outcome::Value(value)
        }
    };
    Ok((id, outcome))
}
