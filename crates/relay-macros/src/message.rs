use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, spanned::Spanned};

use crate::attrs;

pub fn derive_message(input: &DeriveInput) -> syn::Result<TokenStream> {
    if let Data::Union(_) = input.data {
        return Err(syn::Error::new(
            input.span(),
            "Message cannot be derived for unions",
        ));
    }

    let options = attrs::parse(&input.attrs, "message", false)?;
    let name = &input.ident;
    let krate = &options.krate;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #krate::Message for #name #ty_generics #where_clause {}
    })
}
