use std::any::Any;
use std::fmt;

use crate::error::{RelayError, RelayResult};
use crate::key::TypeKey;
use crate::request::Request;
use crate::value::AnyValue;

// =============================================================================
// AnyContext (erased view)
// =============================================================================

/// Type-erased view over a request dispatch's `(request, response, error)` cell.
///
/// This is the only thing middleware and default handlers receive. Reads hand
/// out `&dyn Any`; writes take an [`AnyValue`] and are checked against the
/// context's fixed request and response types.
///
/// The generic helpers on `dyn AnyContext` ([`request_ref`](Self::request_ref),
/// [`replace_response`](Self::replace_response), ...) cover the common cases.
pub trait AnyContext {
    /// Key of the request type this context was created for.
    fn request_type(&self) -> TypeKey;

    /// Key of the paired response type.
    ///
    /// `None` only for a [`DynamicContext`](super::DynamicContext), where the
    /// pairing is unknown and any response is accepted.
    fn response_type(&self) -> Option<TypeKey>;

    /// The in-flight request, or `None` once the handler has consumed it.
    fn request(&self) -> Option<&dyn Any>;

    /// Mutable access to the in-flight request.
    fn request_mut(&mut self) -> Option<&mut dyn Any>;

    /// Replaces the in-flight request.
    ///
    /// # Errors
    ///
    /// [`RelayError::InvalidType`] if `request` is not of the context's
    /// request type. The cell is left unchanged.
    fn set_request(&mut self, request: AnyValue) -> RelayResult<()>;

    /// The response, if the handler (or a middleware) has produced one.
    fn response(&self) -> Option<&dyn Any>;

    /// Mutable access to the response.
    fn response_mut(&mut self) -> Option<&mut dyn Any>;

    /// Sets the response.
    ///
    /// # Errors
    ///
    /// [`RelayError::InvalidType`] if `response` is not of the paired
    /// response type. The cell is left unchanged.
    fn set_response(&mut self, response: AnyValue) -> RelayResult<()>;

    /// Clears the response slot.
    fn clear_response(&mut self);

    /// The error, if one has been recorded.
    fn error(&self) -> Option<&RelayError>;

    /// Records an error, replacing any previous one.
    fn set_error(&mut self, error: RelayError);

    /// Removes and returns the recorded error.
    fn take_error(&mut self) -> Option<RelayError>;

    /// Upcast used to recover the concrete context.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn AnyContext + '_ {
    /// Borrows the request as `T`.
    pub fn request_ref<T: 'static>(&self) -> Option<&T> {
        self.request()?.downcast_ref()
    }

    /// Mutably borrows the request as `T`.
    pub fn request_as_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.request_mut()?.downcast_mut()
    }

    /// Borrows the response as `T`.
    pub fn response_ref<T: 'static>(&self) -> Option<&T> {
        self.response()?.downcast_ref()
    }

    /// Mutably borrows the response as `T`.
    pub fn response_as_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.response_mut()?.downcast_mut()
    }

    /// Replaces the request with `request`. See [`AnyContext::set_request`].
    pub fn replace_request<T: Send + 'static>(&mut self, request: T) -> RelayResult<()> {
        self.set_request(AnyValue::new(request))
    }

    /// Sets the response to `response`. See [`AnyContext::set_response`].
    pub fn replace_response<T: Send + 'static>(&mut self, response: T) -> RelayResult<()> {
        self.set_response(AnyValue::new(response))
    }

    /// Returns `true` if this context was created for request type `R`.
    pub fn is<R: Request>(&self) -> bool {
        self.request_type().is::<R>()
    }

    /// Recovers the typed context, if this is a `Context<R>`.
    pub fn downcast_mut<R: Request>(&mut self) -> Option<&mut Context<R>> {
        self.as_any_mut().downcast_mut()
    }
}

// =============================================================================
// Context (typed view)
// =============================================================================

/// The typed `(request, response, error)` cell of one request dispatch.
///
/// Created at the start of [`Relay::handle`](crate::Relay::handle), threaded
/// through the middleware chain as `&mut dyn AnyContext`, and read back once
/// at the end. Typed accessors perform no checks: the static type already
/// guarantees them.
pub struct Context<R: Request> {
    request: Option<R>,
    response: Option<R::Response>,
    error: Option<RelayError>,
}

impl<R: Request> Context<R> {
    /// Creates a context holding `request` with empty response and error slots.
    pub fn new(request: R) -> Self {
        Self {
            request: Some(request),
            response: None,
            error: None,
        }
    }

    /// The request, or `None` once the handler has consumed it.
    pub fn request(&self) -> Option<&R> {
        self.request.as_ref()
    }

    /// Mutable access to the request.
    pub fn request_mut(&mut self) -> Option<&mut R> {
        self.request.as_mut()
    }

    /// Replaces the request.
    pub fn set_request(&mut self, request: R) {
        self.request = Some(request);
    }

    /// Removes the request from the context.
    pub fn take_request(&mut self) -> Option<R> {
        self.request.take()
    }

    /// The response, if one was produced.
    pub fn response(&self) -> Option<&R::Response> {
        self.response.as_ref()
    }

    /// Sets the response.
    pub fn set_response(&mut self, response: R::Response) {
        self.response = Some(response);
    }

    /// Removes the response from the context.
    pub fn take_response(&mut self) -> Option<R::Response> {
        self.response.take()
    }

    /// The recorded error, if any.
    pub fn error(&self) -> Option<&RelayError> {
        self.error.as_ref()
    }

    /// Records an error.
    pub fn set_error(&mut self, error: RelayError) {
        self.error = Some(error);
    }

    /// Removes the recorded error.
    pub fn take_error(&mut self) -> Option<RelayError> {
        self.error.take()
    }

    /// Writes a handler's outcome into the cell.
    ///
    /// `Ok` sets the response and clears the error; `Err` clears the response
    /// and records the error.
    pub fn set_outcome(&mut self, outcome: RelayResult<R::Response>) {
        match outcome {
            Ok(response) => {
                self.response = Some(response);
                self.error = None;
            }
            Err(error) => {
                self.response = None;
                self.error = Some(error);
            }
        }
    }

    /// The erased view over this same cell.
    pub fn erased(&mut self) -> &mut dyn AnyContext {
        self
    }

    /// Splits the context into its raw `(response, error)` pair.
    pub fn into_parts(self) -> (Option<R::Response>, Option<RelayError>) {
        (self.response, self.error)
    }

    /// Converts the context into the dispatch result.
    ///
    /// A recorded error wins over a response. With neither present the result
    /// is [`RelayError::NoResponse`].
    pub fn into_result(self) -> RelayResult<R::Response> {
        match (self.response, self.error) {
            (_, Some(error)) => Err(error),
            (Some(response), None) => Ok(response),
            (None, None) => Err(RelayError::NoResponse {
                type_name: std::any::type_name::<R>(),
            }),
        }
    }
}

impl<R: Request> AnyContext for Context<R> {
    fn request_type(&self) -> TypeKey {
        TypeKey::of::<R>()
    }

    fn response_type(&self) -> Option<TypeKey> {
        Some(TypeKey::of::<R::Response>())
    }

    fn request(&self) -> Option<&dyn Any> {
        self.request.as_ref().map(|r| r as &dyn Any)
    }

    fn request_mut(&mut self) -> Option<&mut dyn Any> {
        self.request.as_mut().map(|r| r as &mut dyn Any)
    }

    fn set_request(&mut self, request: AnyValue) -> RelayResult<()> {
        self.request = Some(request.try_into_inner::<R>()?);
        Ok(())
    }

    fn response(&self) -> Option<&dyn Any> {
        self.response.as_ref().map(|r| r as &dyn Any)
    }

    fn response_mut(&mut self) -> Option<&mut dyn Any> {
        self.response.as_mut().map(|r| r as &mut dyn Any)
    }

    fn set_response(&mut self, response: AnyValue) -> RelayResult<()> {
        self.response = Some(response.try_into_inner::<R::Response>()?);
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

impl<R: Request> fmt::Debug for Context<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request_type", &std::any::type_name::<R>())
            .field("has_request", &self.request.is_some())
            .field("has_response", &self.response.is_some())
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Add {
        a: i32,
        b: i32,
    }

    impl Request for Add {
        type Response = i32;
    }

    #[test]
    fn test_erased_set_request_checks_type() {
        let mut ctx = Context::new(Add { a: 1, b: 2 });

        let err = ctx.erased().replace_request("not a request").unwrap_err();
        assert!(err.is_invalid_type());
        assert_eq!(ctx.request(), Some(&Add { a: 1, b: 2 }));

        ctx.erased().replace_request(Add { a: 5, b: 5 }).unwrap();
        assert_eq!(ctx.request(), Some(&Add { a: 5, b: 5 }));
    }

    #[test]
    fn test_erased_set_response_checks_type() {
        let mut ctx = Context::new(Add { a: 1, b: 2 });

        assert!(ctx.erased().replace_response(3_i64).is_err());
        assert!(ctx.response().is_none());

        ctx.erased().replace_response(3_i32).unwrap();
        assert_eq!(ctx.response(), Some(&3));
    }

    #[test]
    fn test_views_share_storage() {
        let mut ctx = Context::new(Add { a: 1, b: 2 });
        ctx.set_response(10);

        {
            let erased = ctx.erased();
            assert_eq!(erased.response_ref::<i32>(), Some(&10));
            *erased.response_as_mut::<i32>().unwrap() += 1;
            erased.request_as_mut::<Add>().unwrap().a = 7;
            erased.set_error(RelayError::AlreadyBuilt);
        }

        assert_eq!(ctx.response(), Some(&11));
        assert_eq!(ctx.request().map(|r| r.a), Some(7));
        assert!(matches!(ctx.error(), Some(RelayError::AlreadyBuilt)));
    }

    #[test]
    fn test_erased_reports_types() {
        let mut ctx = Context::new(Add { a: 0, b: 0 });
        let erased = ctx.erased();
        assert!(erased.is::<Add>());
        assert_eq!(erased.response_type(), Some(TypeKey::of::<i32>()));
        assert!(erased.downcast_mut::<Add>().is_some());
    }

    #[test]
    fn test_into_result_prefers_error() {
        let mut ctx = Context::new(Add { a: 0, b: 0 });
        ctx.set_response(1);
        ctx.set_error(RelayError::AlreadyBuilt);
        assert!(ctx.into_result().is_err());
    }

    #[test]
    fn test_into_result_without_outcome() {
        let ctx = Context::new(Add { a: 0, b: 0 });
        assert!(matches!(
            ctx.into_result(),
            Err(RelayError::NoResponse { .. })
        ));
    }

    #[test]
    fn test_set_outcome_overwrites() {
        let mut ctx = Context::new(Add { a: 0, b: 0 });
        ctx.set_error(RelayError::AlreadyBuilt);
        ctx.set_outcome(Ok(4));
        let (response, error) = ctx.into_parts();
        assert_eq!(response, Some(4));
        assert!(error.is_none());

        let mut ctx = Context::new(Add { a: 0, b: 0 });
        ctx.set_response(1);
        ctx.set_outcome(Err(RelayError::AlreadyBuilt));
        let (response, error) = ctx.into_parts();
        assert!(response.is_none());
        assert!(error.is_some());
    }
}
