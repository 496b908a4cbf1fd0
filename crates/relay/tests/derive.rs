#![cfg(feature = "macros")]

use std::marker::PhantomData;

use relay::prelude::*;
use relay::{AnyValue, TypeKey};

#[derive(Debug, Request)]
#[request(response = "Result<u64, String>")]
struct Lookup {
    id: u64,
}

#[derive(Request)]
#[request(response = "T")]
struct Echo<T: Clone + Send + 'static>(T);

#[derive(Request)]
#[request(response = "usize")]
enum Shape {
    Point,
    Line(usize),
}

#[derive(Request)]
#[request(response = "()", crate = "relay::core")]
struct ViaCorePath;

#[derive(Message)]
struct Tick;

#[derive(Message)]
#[message(crate = "relay::core")]
struct Tagged<T: Send + 'static>(PhantomData<T>);

fn response_of<R: Request>() -> TypeKey {
    TypeKey::of::<R::Response>()
}

#[test]
fn derived_requests_declare_their_response() {
    assert_eq!(response_of::<Lookup>(), TypeKey::of::<Result<u64, String>>());
    assert_eq!(response_of::<Echo<String>>(), TypeKey::of::<String>());
    assert_eq!(response_of::<Shape>(), TypeKey::of::<usize>());
    assert_eq!(response_of::<ViaCorePath>(), TypeKey::of::<()>());
}

#[test]
fn derived_requests_dispatch() {
    let relay = RelayBuilder::new()
        .register(|req: Lookup| Ok(if req.id == 0 { Err("unknown".into()) } else { Ok(req.id) }))
        .register(|Echo(value): Echo<String>| Ok(value))
        .register(|shape: Shape| {
            Ok(match shape {
                Shape::Point => 0,
                Shape::Line(len) => len,
            })
        })
        .build();

    assert_eq!(relay.handle(Lookup { id: 3 }).unwrap(), Ok(3));
    assert_eq!(relay.handle(Lookup { id: 0 }).unwrap(), Err("unknown".into()));
    assert_eq!(relay.handle(Echo("hi".to_string())).unwrap(), "hi");
    assert_eq!(relay.handle(Shape::Line(4)).unwrap(), 4);
    assert!(relay.handle(Echo(1_u8)).unwrap_err().is_not_found());
}

#[test]
fn generic_instantiations_are_distinct_types() {
    let relay = RelayBuilder::new()
        .register(|Echo(value): Echo<u32>| Ok(value + 1))
        .build();

    assert!(relay.has_handler::<Echo<u32>>());
    assert!(!relay.has_handler::<Echo<u64>>());
    assert_eq!(
        relay.response_type(&TypeKey::of::<Echo<u32>>()),
        Some(TypeKey::of::<u32>())
    );
}

#[test]
fn derived_messages_dispatch() {
    let relay = RelayBuilder::new()
        .register_message(|_: Tick| {})
        .build();

    assert!(relay.has_message_handler::<Tick>());
    assert!(!relay.has_message_handler::<Tagged<u8>>());
    relay.handle_message(Tick).unwrap();
    relay.handle_message(Tagged::<u8>(PhantomData)).unwrap();
    relay
        .handle_any_message(AnyValue::new(Tagged::<u8>(PhantomData)))
        .unwrap();
}
