use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use relay_core::prelude::*;
use relay_core::{AnyValue, TypeKey};

#[derive(Debug, Default)]
struct EgReq;

impl Request for EgReq {
    type Response = i32;
}

#[derive(Debug, Default)]
struct EgReq2;

impl Request for EgReq2 {
    type Response = i32;
}

#[derive(Debug, Clone, PartialEq)]
struct Transfer {
    from: u64,
    to: u64,
    amount: i64,
}

impl Request for Transfer {
    type Response = i64;
}

fn transfer(from: u64, to: u64, amount: i64) -> Transfer {
    Transfer { from, to, amount }
}

struct AccountOpened(u64);

impl Message for AccountOpened {}

#[derive(Debug, thiserror::Error)]
#[error("insufficient funds")]
struct InsufficientFunds;

type Trace = Arc<Mutex<Vec<String>>>;

fn marker(
    trace: &Trace,
    name: &'static str,
) -> impl Fn(&mut dyn AnyContext, Next<'_>) + Send + Sync + 'static {
    let trace = Arc::clone(trace);
    move |ctx, next| {
        trace.lock().push(format!("{name}-before"));
        next.run(ctx);
        trace.lock().push(format!("{name}-after"));
    }
}

#[test]
fn type_keys_are_unique_per_type() {
    assert_eq!(TypeKey::of::<EgReq>(), TypeKey::of::<EgReq>());
    assert_ne!(TypeKey::of::<EgReq>(), TypeKey::of::<EgReq2>());
    assert_ne!(TypeKey::of::<EgReq>(), TypeKey::of::<Transfer>());
}

#[test]
fn second_registration_fails_and_first_stays_active() {
    let mut builder = RelayBuilder::new();
    builder.try_register(|_: EgReq| Ok(1)).unwrap();
    let err = builder.try_register(|_: EgReq| Ok(2)).unwrap_err();
    assert!(matches!(err, RelayError::HandlerAlreadyExists { .. }));

    let relay = builder.build();
    assert_eq!(relay.handle(EgReq).unwrap(), 1);
}

#[test]
fn default_handler_reports_not_found() {
    let relay = RelayBuilder::new().build();
    let (response, error) = relay.dispatch(EgReq).into_parts();
    assert!(response.is_none());
    assert!(matches!(error, Some(RelayError::HandlerNotFound { .. })));
}

#[test]
fn custom_default_handler_outcome_is_returned() {
    let relay = RelayBuilder::new()
        .default_handler(|ctx| ctx.set_error(RelayError::handler(InsufficientFunds)))
        .build();
    let err = relay.handle(EgReq).unwrap_err();
    assert!(err.downcast_handler_ref::<InsufficientFunds>().is_some());

    let relay = RelayBuilder::new()
        .default_handler(|ctx| {
            if ctx.is::<EgReq>() {
                ctx.replace_response(-1_i32).unwrap();
            }
        })
        .build();
    assert_eq!(relay.handle(EgReq).unwrap(), -1);
}

#[test]
fn middleware_wraps_like_an_onion() {
    let trace = Trace::default();
    let handler_trace = Arc::clone(&trace);
    let relay = RelayBuilder::new()
        .register_middleware(marker(&trace, "m0"))
        .register_middleware(marker(&trace, "m1"))
        .register(move |_: EgReq| {
            handler_trace.lock().push("H".into());
            Ok(0)
        })
        .build();

    relay.handle(EgReq).unwrap();
    assert_eq!(
        *trace.lock(),
        ["m0-before", "m1-before", "H", "m1-after", "m0-after"]
    );
}

#[test]
fn short_circuit_skips_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let relay = RelayBuilder::new()
        .register_middleware(|_ctx, _next| {})
        .register(move |_: EgReq| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        })
        .build();

    let (response, error) = relay.dispatch(EgReq).into_parts();
    assert!(response.is_none());
    assert!(error.is_none());
    assert!(matches!(
        relay.handle(EgReq),
        Err(RelayError::NoResponse { .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn short_circuit_can_answer_itself() {
    let relay = RelayBuilder::new()
        .register_middleware(|ctx, next| {
            if ctx.request_ref::<Transfer>().is_some_and(|t| t.amount == 0) {
                ctx.replace_response(0_i64).unwrap();
                return;
            }
            next.run(ctx);
        })
        .register(|t: Transfer| Ok(t.amount * 100))
        .build();

    let zero = transfer(1, 2, 0);
    assert_eq!(relay.handle(zero).unwrap(), 0);
    let some = transfer(1, 2, 3);
    assert_eq!(relay.handle(some).unwrap(), 300);
}

#[test]
fn erased_setters_reject_wrong_types() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let relay = RelayBuilder::new()
        .register_middleware(move |ctx, next| {
            recorder.lock().push(ctx.replace_request("nope").is_err());
            recorder.lock().push(ctx.replace_response(1.5_f32).is_err());
            let rewritten = transfer(9, 8, 7);
            recorder.lock().push(ctx.replace_request(rewritten).is_ok());
            next.run(ctx);
            recorder.lock().push(ctx.replace_response(42_i64).is_ok());
        })
        .register(|t: Transfer| {
            assert_eq!(t, transfer(9, 8, 7));
            Ok(t.amount)
        })
        .build();

    let response = relay.handle(transfer(1, 2, 3)).unwrap();
    assert_eq!(response, 42);
    assert_eq!(*seen.lock(), [true, true, true, true]);
}

#[test]
fn middleware_can_rewrite_handler_errors() {
    let relay = RelayBuilder::new()
        .register_middleware(|ctx, next| {
            next.run(ctx);
            if ctx
                .error()
                .is_some_and(|e| e.downcast_handler_ref::<InsufficientFunds>().is_some())
            {
                ctx.take_error();
                ctx.replace_response(0_i64).unwrap();
            }
        })
        .register(|_: Transfer| Err(RelayError::handler(InsufficientFunds)))
        .build();

    let response = relay.handle(transfer(1, 2, 3)).unwrap();
    assert_eq!(response, 0);
}

#[test]
fn handler_error_passes_through_unchanged() {
    let relay = RelayBuilder::new()
        .register(|_: Transfer| Err(RelayError::handler(InsufficientFunds)))
        .build();

    let (response, error) = relay.dispatch(transfer(1, 2, 3)).into_parts();
    assert!(response.is_none());
    let error = error.unwrap();
    assert_eq!(error.to_string(), "insufficient funds");
    assert!(error.downcast_handler_ref::<InsufficientFunds>().is_some());
}

#[test]
fn messages_are_fire_and_forget() {
    let relay = RelayBuilder::new().build();
    assert!(relay.handle_message(AccountOpened(1)).is_ok());

    let opened = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&opened);
    let relay = RelayBuilder::new()
        .register_message(move |msg: AccountOpened| {
            counter.fetch_add(msg.0 as usize, Ordering::SeqCst);
        })
        .build();

    relay.handle_message(AccountOpened(1)).unwrap();
    assert_eq!(opened.load(Ordering::SeqCst), 1);
    relay.handle_message(AccountOpened(1)).unwrap();
    assert_eq!(opened.load(Ordering::SeqCst), 2);
}

#[test]
fn message_middleware_can_reject() {
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    let relay = RelayBuilder::new()
        .register_message_middleware(|ctx, next| {
            if ctx.message_ref::<AccountOpened>().is_some_and(|m| m.0 == 0) {
                ctx.set_error(RelayError::handler("account 0 is reserved"));
                return;
            }
            next.run(ctx);
        })
        .register_message(move |_: AccountOpened| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    assert!(relay.handle_message(AccountOpened(0)).is_err());
    assert!(relay.handle_message(AccountOpened(5)).is_ok());
    assert_eq!(delivered.load(Ordering::SeqCst), 1);
}

#[test]
fn end_to_end_two_unrelated_handlers() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let (c1, c2) = (Arc::clone(&first), Arc::clone(&second));

    let relay = RelayBuilder::new()
        .register(move |_: EgReq| {
            c1.fetch_add(1, Ordering::SeqCst);
            Ok(10)
        })
        .register(move |_: EgReq2| {
            c2.fetch_add(1, Ordering::SeqCst);
            Ok(11)
        })
        .build();

    assert_eq!(relay.handle(EgReq).unwrap(), 10);
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);

    assert_eq!(relay.handle(EgReq2).unwrap(), 11);
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn dynamic_dispatch_matches_typed_dispatch() {
    let trace = Trace::default();
    let relay = RelayBuilder::new()
        .register_middleware(marker(&trace, "m"))
        .register(|t: Transfer| Ok(t.amount))
        .build();

    let response = relay.handle_any(AnyValue::new(transfer(1, 2, 9))).unwrap();
    assert_eq!(response.downcast::<i64>().ok(), Some(9));

    let err = relay.handle_any(AnyValue::new(EgReq)).unwrap_err();
    assert!(err.is_not_found());

    // Middleware ran for both, including the unregistered one.
    assert_eq!(*trace.lock(), ["m-before", "m-after", "m-before", "m-after"]);
}

#[test]
fn dynamic_default_handler_may_answer_any_type() {
    let relay = RelayBuilder::new()
        .default_handler(|ctx| {
            let name = ctx.request_type().name();
            ctx.replace_response(name.to_owned()).unwrap();
        })
        .build();

    let response = relay.handle_any(AnyValue::new(EgReq)).unwrap();
    assert!(response.downcast_ref::<String>().unwrap().ends_with("EgReq"));
}

#[test]
fn dynamic_message_dispatch() {
    let opened = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&opened);
    let relay = RelayBuilder::new()
        .register_message(move |_: AccountOpened| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    relay.handle_any_message(AnyValue::new(AccountOpened(3))).unwrap();
    relay.handle_any_message(AnyValue::new("unregistered")).unwrap();
    assert_eq!(opened.load(Ordering::SeqCst), 1);
}

#[test]
fn consumed_request_is_reported() {
    let relay = RelayBuilder::new()
        .register_middleware(|ctx, next| {
            if let Some(typed) = ctx.downcast_mut::<Transfer>() {
                typed.take_request();
            }
            next.run(ctx);
        })
        .register(|t: Transfer| Ok(t.amount))
        .build();

    let err = relay.handle(transfer(0, 0, 1)).unwrap_err();
    assert!(matches!(err, RelayError::Consumed { .. }));
}

#[derive(Debug)]
struct Audit(u32);

impl Request for Audit {
    type Response = u32;
}

impl Message for Audit {}

#[test]
fn request_and_message_key_spaces_are_disjoint() {
    let requests = Arc::new(AtomicUsize::new(0));
    let messages = Arc::new(AtomicUsize::new(0));
    let (req_counter, msg_counter) = (Arc::clone(&requests), Arc::clone(&messages));

    let relay = RelayBuilder::new()
        .register(move |audit: Audit| {
            req_counter.fetch_add(1, Ordering::SeqCst);
            Ok(audit.0 + 1)
        })
        .register_message(move |audit: Audit| {
            msg_counter.fetch_add(audit.0 as usize, Ordering::SeqCst);
        })
        .build();

    assert!(relay.has_handler::<Audit>());
    assert!(relay.has_message_handler::<Audit>());

    assert_eq!(relay.handle(Audit(1)).unwrap(), 2);
    assert_eq!(requests.load(Ordering::SeqCst), 1);
    assert_eq!(messages.load(Ordering::SeqCst), 0);

    relay.handle_message(Audit(5)).unwrap();
    assert_eq!(requests.load(Ordering::SeqCst), 1);
    assert_eq!(messages.load(Ordering::SeqCst), 5);
}

#[test]
fn message_only_registration_leaves_request_unhandled() {
    let relay = RelayBuilder::new().register_message(|_: Audit| {}).build();

    assert!(relay.handle(Audit(1)).unwrap_err().is_not_found());
    assert!(relay.handle_message(Audit(1)).is_ok());
}
