//! Procedural macros for the Relay dispatcher.
//!
//! This crate provides:
//!
//! - `#[derive(Request)]` - Declares the response type paired with a request
//! - `#[derive(Message)]` - Marks a type as a one-way message
//!
//! Both are re-exported by the `relay` crate under its `macros` feature and
//! expand to impls of `relay::Request` / `relay::Message`. Use
//! `crate = "..."` when the traits are reachable under another path, for
//! example `relay_core`.

mod attrs;
mod message;
mod request;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `Request` for a struct or enum.
///
/// # Attributes
///
/// - `#[request(response = "Type")]` - The response type (required)
/// - `#[request(crate = "path")]` - Path to the crate exporting `Request`
///   (default: `::relay`)
///
/// # Example
///
/// ```rust,ignore
/// use relay::Request;
///
/// #[derive(Request)]
/// #[request(response = "Result<User, LookupError>")]
/// pub struct FindUser {
///     pub id: u64,
/// }
/// ```
#[proc_macro_derive(Request, attributes(request))]
pub fn derive_request(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match request::derive_request(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derives `Message` for a struct or enum.
///
/// Accepts an optional `#[message(crate = "path")]`.
#[proc_macro_derive(Message, attributes(message))]
pub fn derive_message(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match message::derive_message(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
