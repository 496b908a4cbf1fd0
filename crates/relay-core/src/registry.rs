//! Handler registry keyed by request/message type.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use crate::context::{AnyContext, AnyMessageContext};
use crate::error::{RelayError, RelayResult};
use crate::handler::{Handler, MessageHandler};
use crate::key::TypeKey;
use crate::relay::Relay;
use crate::request::{Message, Request};
use crate::value::AnyValue;

/// Terminal step of a request dispatch, erased over the handler type.
type RequestCall = Box<dyn Fn(&mut dyn AnyContext) + Send + Sync>;

/// Terminal step of a message dispatch, erased over the handler type.
type MessageCall = Box<dyn Fn(&mut dyn AnyMessageContext) + Send + Sync>;

/// Monomorphized entry point used by dynamic dispatch.
type DynamicRequest = fn(&Relay, AnyValue) -> RelayResult<AnyValue>;

type DynamicMessage = fn(&Relay, AnyValue) -> RelayResult<()>;

pub(crate) struct RequestEntry {
    pub(crate) response: TypeKey,
    pub(crate) call: RequestCall,
    pub(crate) dynamic: DynamicRequest,
}

impl RequestEntry {
    fn new<R, H>(handler: H) -> Self
    where
        R: Request,
        H: Handler<R>,
    {
        let call = move |ctx: &mut dyn AnyContext| match ctx.downcast_mut::<R>() {
            Some(typed) => match typed.take_request() {
                Some(request) => typed.set_outcome(handler.handle(request)),
                None => typed.set_error(RelayError::Consumed {
                    type_name: std::any::type_name::<R>(),
                }),
            },
            None => {
                let found = ctx.request_type().name();
                ctx.set_error(RelayError::InvalidType {
                    expected: std::any::type_name::<R>(),
                    found,
                });
            }
        };

        Self {
            response: TypeKey::of::<R::Response>(),
            call: Box::new(call),
            dynamic: dispatch_request::<R>,
        }
    }
}

pub(crate) struct MessageEntry {
    pub(crate) call: MessageCall,
    pub(crate) dynamic: DynamicMessage,
}

impl MessageEntry {
    fn new<M, H>(handler: H) -> Self
    where
        M: Message,
        H: MessageHandler<M>,
    {
        let call = move |ctx: &mut dyn AnyMessageContext| match ctx.downcast_mut::<M>() {
            Some(typed) => match typed.take_message() {
                Some(message) => handler.handle(message),
                None => typed.set_error(RelayError::Consumed {
                    type_name: std::any::type_name::<M>(),
                }),
            },
            None => {
                let found = ctx.message_type().name();
                ctx.set_error(RelayError::InvalidType {
                    expected: std::any::type_name::<M>(),
                    found,
                });
            }
        };

        Self {
            call: Box::new(call),
            dynamic: dispatch_message::<M>,
        }
    }
}

fn dispatch_request<R: Request>(relay: &Relay, value: AnyValue) -> RelayResult<AnyValue> {
    let request = value.try_into_inner::<R>()?;
    relay.handle(request).map(AnyValue::new)
}

fn dispatch_message<M: Message>(relay: &Relay, value: AnyValue) -> RelayResult<()> {
    let message = value.try_into_inner::<M>()?;
    relay.handle_message(message)
}

/// At most one handler per type, for requests and messages separately.
#[derive(Default)]
pub(crate) struct Registry {
    requests: HashMap<TypeKey, RequestEntry>,
    messages: HashMap<TypeKey, MessageEntry>,
}

impl Registry {
    pub(crate) fn insert_request<R, H>(&mut self, handler: H) -> RelayResult<()>
    where
        R: Request,
        H: Handler<R>,
    {
        match self.requests.entry(TypeKey::of::<R>()) {
            Entry::Occupied(_) => Err(RelayError::HandlerAlreadyExists {
                type_name: std::any::type_name::<R>(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(RequestEntry::new(handler));
                Ok(())
            }
        }
    }

    pub(crate) fn insert_message<M, H>(&mut self, handler: H) -> RelayResult<()>
    where
        M: Message,
        H: MessageHandler<M>,
    {
        match self.messages.entry(TypeKey::of::<M>()) {
            Entry::Occupied(_) => Err(RelayError::HandlerAlreadyExists {
                type_name: std::any::type_name::<M>(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(MessageEntry::new(handler));
                Ok(())
            }
        }
    }

    #[inline]
    pub(crate) fn request(&self, key: &TypeKey) -> Option<&RequestEntry> {
        self.requests.get(key)
    }

    #[inline]
    pub(crate) fn message(&self, key: &TypeKey) -> Option<&MessageEntry> {
        self.messages.get(key)
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.len()
    }

    pub(crate) fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub(crate) fn request_types(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.requests.keys().copied()
    }

    pub(crate) fn message_types(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.messages.keys().copied()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("requests", &self.requests.keys().collect::<Vec<_>>())
            .field("messages", &self.messages.keys().collect::<Vec<_>>())
            .finish()
    }
}
