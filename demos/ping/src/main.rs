//! Ping Demo
//!
//! A small relay wiring a request, a message and a middleware together.
//!
//! Configuration is read from `relay.toml` (or `RELAY_*` environment
//! variables), for example:
//!
//! ```toml
//! name = "ping"
//!
//! [dispatch]
//! trace = true
//! unhandled_messages = "warn"
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package ping-relay
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use relay::prelude::*;
use tracing::{info, warn};

// ============================================================================
// Contracts
// ============================================================================

#[derive(Debug, Request)]
#[request(response = "Pong")]
struct Ping {
    seq: u64,
    payload: String,
}

#[derive(Debug, PartialEq)]
struct Pong {
    seq: u64,
    payload: String,
}

#[derive(Debug, Message)]
struct Heartbeat {
    from: &'static str,
}

/// Never registered, so it falls through to the configured default.
#[derive(Debug, Message)]
struct Stray;

#[derive(Debug, thiserror::Error)]
#[error("ping payload exceeds {limit} bytes")]
struct PayloadTooLarge {
    limit: usize,
}

const PAYLOAD_LIMIT: usize = 16;

// ============================================================================
// Middleware
// ============================================================================

/// Rejects oversized pings before they reach the handler.
fn payload_guard(ctx: &mut dyn AnyContext, next: Next<'_>) {
    if ctx
        .request_ref::<Ping>()
        .is_some_and(|ping| ping.payload.len() > PAYLOAD_LIMIT)
    {
        ctx.set_error(RelayError::handler(PayloadTooLarge {
            limit: PAYLOAD_LIMIT,
        }));
        return;
    }
    next.run(ctx);
}

fn main() -> Result<()> {
    let config = relay::runtime::init()?;
    let beats = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&beats);

    let relay = RelayBuilder::new()
        .configure(&config)
        .register_middleware(payload_guard)
        .register(|ping: Ping| {
            Ok(Pong {
                seq: ping.seq,
                payload: ping.payload,
            })
        })
        .register_message(move |beat: Heartbeat| {
            counter.fetch_add(1, Ordering::Relaxed);
            info!(from = beat.from, "Heartbeat received");
        })
        .build();

    info!(relay = relay.name(), "Relay ready");

    for seq in 0..3 {
        let pong = relay.handle(Ping {
            seq,
            payload: format!("hello #{seq}"),
        })?;
        info!(seq = pong.seq, payload = %pong.payload, "Pong");
    }

    let oversized = Ping {
        seq: 99,
        payload: "x".repeat(PAYLOAD_LIMIT + 1),
    };
    match relay.handle(oversized) {
        Ok(pong) => warn!(?pong, "Oversized ping was answered"),
        Err(err) => match err.downcast_handler_ref::<PayloadTooLarge>() {
            Some(too_large) => info!(limit = too_large.limit, "Oversized ping rejected"),
            None => return Err(err.into()),
        },
    }

    relay.handle_message(Heartbeat { from: "main" })?;
    if let Err(err) = relay.handle_message(Stray) {
        warn!(%err, "Stray message rejected");
    }

    info!(heartbeats = beats.load(Ordering::Relaxed), "Done");
    Ok(())
}
