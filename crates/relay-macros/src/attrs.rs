use syn::{Attribute, LitStr, Path, Type};

/// Options collected from `#[request(...)]` or `#[message(...)]`.
pub struct Options {
    pub response: Option<Type>,
    pub krate: Path,
}

/// Parses every attribute named `name`, later keys overriding earlier ones.
///
/// `allow_response` rejects `response = ...` on messages.
pub fn parse(attrs: &[Attribute], name: &str, allow_response: bool) -> syn::Result<Options> {
    let mut response = None;
    let mut krate = None;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident(name)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("response") && allow_response {
                let lit: LitStr = meta.value()?.parse()?;
                response = Some(lit.parse::<Type>()?);
            } else if meta.path.is_ident("crate") {
                let lit: LitStr = meta.value()?.parse()?;
                krate = Some(lit.parse::<Path>()?);
            } else {
                return Err(meta.error(format!("unsupported #[{name}] key")));
            }
            Ok(())
        })?;
    }

    Ok(Options {
        response,
        krate: krate.unwrap_or_else(|| syn::parse_quote!(::relay)),
    })
}
