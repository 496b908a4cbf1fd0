use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, spanned::Spanned};

use crate::attrs;

pub fn derive_request(input: &DeriveInput) -> syn::Result<TokenStream> {
    if let Data::Union(_) = input.data {
        return Err(syn::Error::new(
            input.span(),
            "Request cannot be derived for unions",
        ));
    }

    let options = attrs::parse(&input.attrs, "request", true)?;
    let response = options.response.ok_or_else(|| {
        syn::Error::new(
            input.ident.span(),
            "#[derive(Request)] requires `#[request(response = \"…\")]`",
        )
    })?;

    let name = &input.ident;
    let krate = &options.krate;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #krate::Request for #name #ty_generics #where_clause {
            type Response = #response;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(src: &str) -> syn::Result<String> {
        let input: DeriveInput = syn::parse_str(src)?;
        derive_request(&input).map(|tokens| tokens.to_string())
    }

    #[test]
    fn test_expands_response_type() {
        let out = expand(r#"#[request(response = "Vec<u8>")] struct Fetch { id: u64 }"#).unwrap();
        assert!(out.contains(":: relay :: Request for Fetch"));
        assert!(out.contains("type Response = Vec < u8 >"));
    }

    #[test]
    fn test_custom_crate_path() {
        let out =
            expand(r#"#[request(response = "()", crate = "relay_core")] enum Op { A }"#).unwrap();
        assert!(out.contains("relay_core :: Request for Op"));
    }

    #[test]
    fn test_generics_are_forwarded() {
        let out = expand(
            r#"#[request(response = "T")] struct Echo<T: Send + 'static> where T: Clone { v: T }"#,
        )
        .unwrap();
        assert!(out.contains("impl < T : Send + 'static >"));
        assert!(out.contains("for Echo < T > where T : Clone"));
    }

    #[test]
    fn test_missing_response_is_an_error() {
        let err = expand("struct Fetch;").unwrap_err();
        assert!(err.to_string().contains("requires"));
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        assert!(expand(r#"#[request(reply = "u8")] struct Fetch;"#).is_err());
    }

    #[test]
    fn test_union_is_rejected() {
        assert!(expand(r#"#[request(response = "u8")] union U { a: u8 }"#).is_err());
    }
}
