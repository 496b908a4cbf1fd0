use std::any::Any;
use std::fmt;

use crate::error::{RelayError, RelayResult};
use crate::key::TypeKey;
use crate::request::Message;
use crate::value::AnyValue;

/// Type-erased view over a message dispatch's `(message, error)` cell.
///
/// The error slot lets message middleware and the default message handler
/// report failures back to the caller of
/// [`Relay::handle_message`](crate::Relay::handle_message).
pub trait AnyMessageContext {
    /// Key of the message type this context was created for.
    fn message_type(&self) -> TypeKey;

    /// The in-flight message, or `None` once the handler has consumed it.
    fn message(&self) -> Option<&dyn Any>;

    /// Mutable access to the in-flight message.
    fn message_mut(&mut self) -> Option<&mut dyn Any>;

    /// Replaces the in-flight message.
    ///
    /// # Errors
    ///
    /// [`RelayError::InvalidType`] if `message` is not of the context's
    /// message type. The cell is left unchanged.
    fn set_message(&mut self, message: AnyValue) -> RelayResult<()>;

    /// The error, if one has been recorded.
    fn error(&self) -> Option<&RelayError>;

    /// Records an error, replacing any previous one.
    fn set_error(&mut self, error: RelayError);

    /// Removes and returns the recorded error.
    fn take_error(&mut self) -> Option<RelayError>;

    /// Upcast used to recover the concrete context.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn AnyMessageContext + '_ {
    /// Borrows the message as `T`.
    pub fn message_ref<T: 'static>(&self) -> Option<&T> {
        self.message()?.downcast_ref()
    }

    /// Mutably borrows the message as `T`.
    pub fn message_as_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.message_mut()?.downcast_mut()
    }

    /// Replaces the message with `message`. See [`AnyMessageContext::set_message`].
    pub fn replace_message<T: Send + 'static>(&mut self, message: T) -> RelayResult<()> {
        self.set_message(AnyValue::new(message))
    }

    /// Returns `true` if this context was created for message type `M`.
    pub fn is<M: Message>(&self) -> bool {
        self.message_type().is::<M>()
    }

    /// Recovers the typed context, if this is a `MessageContext<M>`.
    pub fn downcast_mut<M: Message>(&mut self) -> Option<&mut MessageContext<M>> {
        self.as_any_mut().downcast_mut()
    }
}

/// The typed cell of one message dispatch.
pub struct MessageContext<M: Message> {
    message: Option<M>,
    error: Option<RelayError>,
}

impl<M: Message> MessageContext<M> {
    /// Creates a context holding `message`.
    pub fn new(message: M) -> Self {
        Self {
            message: Some(message),
            error: None,
        }
    }

    /// The message, or `None` once the handler has consumed it.
    pub fn message(&self) -> Option<&M> {
        self.message.as_ref()
    }

    /// Mutable access to the message.
    pub fn message_mut(&mut self) -> Option<&mut M> {
        self.message.as_mut()
    }

    /// Replaces the message.
    pub fn set_message(&mut self, message: M) {
        self.message = Some(message);
    }

    /// Removes the message from the context.
    pub fn take_message(&mut self) -> Option<M> {
        self.message.take()
    }

    /// The recorded error, if any.
    pub fn error(&self) -> Option<&RelayError> {
        self.error.as_ref()
    }

    /// Records an error.
    pub fn set_error(&mut self, error: RelayError) {
        self.error = Some(error);
    }

    /// The erased view over this same cell.
    pub fn erased(&mut self) -> &mut dyn AnyMessageContext {
        self
    }

    /// Converts the context into the dispatch result.
    pub fn into_result(self) -> RelayResult<()> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl<M: Message> AnyMessageContext for MessageContext<M> {
    fn message_type(&self) -> TypeKey {
        TypeKey::of::<M>()
    }

    fn message(&self) -> Option<&dyn Any> {
        self.message.as_ref().map(|m| m as &dyn Any)
    }

    fn message_mut(&mut self) -> Option<&mut dyn Any> {
        self.message.as_mut().map(|m| m as &mut dyn Any)
    }

    fn set_message(&mut self, message: AnyValue) -> RelayResult<()> {
        self.message = Some(message.try_into_inner::<M>()?);
        Ok(())
    }

    fn error(&self) -> Option<&RelayError> {
        self.error.as_ref()
    }

    fn set_error(&mut self, error: RelayError) {
        self.error = Some(error);
    }

    fn take_error(&mut self) -> Option<RelayError> {
        self.error.take()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<M: Message> fmt::Debug for MessageContext<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageContext")
            .field("message_type", &std::any::type_name::<M>())
            .field("has_message", &self.message.is_some())
            .field("error", &self.error)
            .finish()
    }
}
