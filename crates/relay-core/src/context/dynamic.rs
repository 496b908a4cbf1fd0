use std::any::Any;

use crate::error::{RelayError, RelayResult};
use crate::key::TypeKey;
use crate::value::AnyValue;

use super::{AnyContext, AnyMessageContext};

/// Request context for a dynamically dispatched value with no registered handler.
///
/// The request slot is pinned to the original value's type. Without a handler
/// the response pairing is unknown, so any response is accepted.
#[derive(Debug)]
pub struct DynamicContext {
    request_type: TypeKey,
    request: Option<AnyValue>,
    response: Option<AnyValue>,
    error: Option<RelayError>,
}

impl DynamicContext {
    /// Creates a context holding `request`.
    pub fn new(request: AnyValue) -> Self {
        Self {
            request_type: request.key(),
            request: Some(request),
            response: None,
            error: None,
        }
    }

    /// Converts the context into the dispatch result.
    pub fn into_result(self) -> RelayResult<AnyValue> {
        match (self.response, self.error) {
            (_, Some(error)) => Err(error),
            (Some(response), None) => Ok(response),
            (None, None) => Err(RelayError::NoResponse {
                type_name: self.request_type.name(),
            }),
        }
    }
}

impl AnyContext for DynamicContext {
    fn request_type(&self) -> TypeKey {
        self.request_type
    }

    fn response_type(&self) -> Option<TypeKey> {
        None
    }

    fn request(&self) -> Option<&dyn Any> {
        self.request.as_ref().map(|r| r.as_any() as &dyn Any)
    }

    fn request_mut(&mut self) -> Option<&mut dyn Any> {
        self.request.as_mut().map(|r| r.as_any_mut() as &mut dyn Any)
    }

    fn set_request(&mut self, request: AnyValue) -> RelayResult<()> {
        if request.key() != self.request_type {
            return Err(RelayError::InvalidType {
                expected: self.request_type.name(),
                found: request.key().name(),
            });
        }
        self.request = Some(request);
        Ok(())
    }

    fn response(&self) -> Option<&dyn Any> {
        self.response.as_ref().map(|r| r.as_any() as &dyn Any)
    }

    fn response_mut(&mut self) -> Option<&mut dyn Any> {
        self.response.as_mut().map(|r| r.as_any_mut() as &mut dyn Any)
    }

    fn set_response(&mut self, response: AnyValue) -> RelayResult<()> {
        self.response = Some(response);
        Ok(())
    }

    fn clear_response(&mut self) {
        self.response = None;
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

/// Message context for a dynamically dispatched value with no registered handler.
#[derive(Debug)]
pub struct DynamicMessageContext {
    message_type: TypeKey,
    message: Option<AnyValue>,
    error: Option<RelayError>,
}

impl DynamicMessageContext {
    /// Creates a context holding `message`.
    pub fn new(message: AnyValue) -> Self {
        Self {
            message_type: message.key(),
            message: Some(message),
            error: None,
        }
    }

    /// Converts the context into the dispatch result.
    pub fn into_result(self) -> RelayResult<()> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AnyMessageContext for DynamicMessageContext {
    fn message_type(&self) -> TypeKey {
        self.message_type
    }

    fn message(&self) -> Option<&dyn Any> {
        self.message.as_ref().map(|m| m.as_any() as &dyn Any)
    }

    fn message_mut(&mut self) -> Option<&mut dyn Any> {
        self.message.as_mut().map(|m| m.as_any_mut() as &mut dyn Any)
    }

    fn set_message(&mut self, message: AnyValue) -> RelayResult<()> {
        if message.key() != self.message_type {
            return Err(RelayError::InvalidType {
                expected: self.message_type.name(),
                found: message.key().name(),
            });
        }
        self.message = Some(message);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_slot_is_pinned() {
        let mut ctx = DynamicContext::new(AnyValue::new(5_u16));
        let erased: &mut dyn AnyContext = &mut ctx;

        assert!(erased.replace_request(5_u32).is_err());
        erased.replace_request(6_u16).unwrap();
        assert_eq!(erased.request_ref::<u16>(), Some(&6));
        assert!(erased.response_type().is_none());
    }

    #[test]
    fn test_any_response_is_accepted() {
        let mut ctx = DynamicContext::new(AnyValue::new(()));
        (&mut ctx as &mut dyn AnyContext)
            .replace_response("anything")
            .unwrap();
        let response = ctx.into_result().unwrap();
        assert_eq!(response.downcast_ref::<&str>(), Some(&"anything"));
    }

    #[test]
    fn test_message_slot_is_pinned() {
        let mut ctx = DynamicMessageContext::new(AnyValue::new('x'));
        let erased: &mut dyn AnyMessageContext = &mut ctx;
        assert!(erased.replace_message("x").is_err());
        assert_eq!(erased.message_ref::<char>(), Some(&'x'));
    }
}
