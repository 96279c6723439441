//! Derive macro for error types.
//!
//! Generates `std::fmt::Display` and `std::error::Error` implementations,
//! plus `From` conversions for wrapped errors. Replacement for `thiserror`.
//!
//! # Usage
//!
//! ```ignore
//! use intcode_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum PipelineError {
//!     #[error("stage {stage} failed: {source}")]
//!     Stage { stage: usize, #[source] source: VMError },
//!
//!     #[error("vm error: {0}")]
//!     Vm(#[from] VMError),
//!
//!     #[error("no phases")]
//!     EmptyPhases,
//! }
//! ```
//!
//! # Supported Features
//!
//! - Unit variants: `#[error("message")]`
//! - Tuple variants with positional args: `#[error("error: {0}")]`
//! - Struct variants with named args: `#[error("expected {expected}")]`
//! - `#[source]` on a field: returned from `Error::source`
//! - `#[from]` on the only field of a variant: implies `#[source]` and generates `From`
//!
//! Fields that the message does not mention are not formatted.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{Data, DeriveInput, Field, Fields, Ident, Lit, Meta, parse_macro_input};

/// Derives `Display` and `Error` for an enum or struct.
///
/// Each variant must have an `#[error("...")]` attribute specifying
/// the display message. Supports field interpolation using `{0}`, `{1}`
/// for tuple fields or `{field_name}` for struct fields.
pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_error_derive(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_error_derive(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let (display_body, source_body, from_impls) = match &input.data {
        Data::Enum(data_enum) => {
            let mut display_arms = Vec::new();
            let mut source_arms = Vec::new();
            let mut from_impls = Vec::new();

            for variant in &data_enum.variants {
                let variant_name = &variant.ident;
                let error_msg = extract_error_message_from_attrs(
                    &variant.attrs,
                    variant_name,
                    &format!("variant `{}`", variant_name),
                )?;
                let path = quote! { Self::#variant_name };

                display_arms.push(display_arm(&path, &variant.fields, &error_msg));
                if let Some(arm) = source_arm(&path, &variant.fields)? {
                    source_arms.push(arm);
                }
                if let Some(from) = from_impl(name, &path, &variant.fields)? {
                    from_impls.push(from);
                }
            }

            let display = quote! {
                match self {
                    #(#display_arms)*
                }
            };
            let source = if source_arms.is_empty() {
                quote! { None }
            } else {
                quote! {
                    match self {
                        #(#source_arms)*
                        _ => None,
                    }
                }
            };
            (display, source, from_impls)
        }
        Data::Struct(data_struct) => {
            let error_msg = extract_error_message_from_attrs(
                &input.attrs,
                &input.ident,
                &format!("type `{}`", input.ident),
            )?;
            let path = quote! { Self };
            let arm = display_arm(&path, &data_struct.fields, &error_msg);
            let display = quote! {
                match self {
                    #arm
                }
            };
            let source = match source_arm(&path, &data_struct.fields)? {
                Some(arm) => quote! {
                    match self {
                        #arm
                    }
                },
                None => quote! { None },
            };
            let from_impls = from_impl(name, &path, &data_struct.fields)?
                .into_iter()
                .collect();
            (display, source, from_impls)
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Error derive does not support unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #display_body
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {
            #[allow(unreachable_patterns)]
            fn source(&self) -> ::std::option::Option<&(dyn ::std::error::Error + 'static)> {
                #source_body
            }
        }

        #(#from_impls)*
    })
}

/// Builds a `match` arm that writes the display message, binding only the
/// fields the message refers to.
fn display_arm(path: &TokenStream2, fields: &Fields, error_msg: &str) -> TokenStream2 {
    match fields {
        Fields::Unit => quote! {
            #path => write!(f, #error_msg),
        },
        Fields::Named(fields) => {
            let used: Vec<&Ident> = fields
                .named
                .iter()
                .filter_map(|f| f.ident.as_ref())
                .filter(|ident| references(error_msg, &ident.to_string()))
                .collect();
            quote! {
                #path { #(#used,)* .. } => write!(f, #error_msg, #(#used = #used),*),
            }
        }
        Fields::Unnamed(fields) => {
            let count = fields.unnamed.len();
            let format_str = convert_positional_to_named(error_msg, count);
            let bindings: Vec<TokenStream2> = (0..count)
                .map(|i| {
                    if references(error_msg, &i.to_string()) {
                        format_ident!("f{}", i).to_token_stream()
                    } else {
                        quote! { _ }
                    }
                })
                .collect();
            let used: Vec<Ident> = (0..count)
                .filter(|i| references(error_msg, &i.to_string()))
                .map(|i| format_ident!("f{}", i))
                .collect();
            quote! {
                #path(#(#bindings),*) => write!(f, #format_str, #(#used = #used),*),
            }
        }
    }
}

/// Builds a `match` arm returning the `#[source]` (or `#[from]`) field, if any.
fn source_arm(path: &TokenStream2, fields: &Fields) -> syn::Result<Option<TokenStream2>> {
    let Some((index, field)) = find_source(fields)? else {
        return Ok(None);
    };

    Ok(Some(match &field.ident {
        Some(ident) => quote! {
            #path { #ident, .. } => Some(#ident as &(dyn ::std::error::Error + 'static)),
        },
        None => {
            let bindings: Vec<TokenStream2> = (0..fields.len())
                .map(|i| {
                    if i == index {
                        quote! { source }
                    } else {
                        quote! { _ }
                    }
                })
                .collect();
            quote! {
                #path(#(#bindings),*) => Some(source as &(dyn ::std::error::Error + 'static)),
            }
        }
    }))
}

/// Generates `impl From<Field> for Name` when a field carries `#[from]`.
fn from_impl(
    name: &Ident,
    path: &TokenStream2,
    fields: &Fields,
) -> syn::Result<Option<TokenStream2>> {
    let Some(field) = fields.iter().find(|f| has_attr(f, "from")) else {
        return Ok(None);
    };
    if fields.len() != 1 {
        return Err(syn::Error::new_spanned(
            field,
            "#[from] requires the variant to have exactly one field",
        ));
    }

    let ty = &field.ty;
    let construct = match &field.ident {
        Some(ident) => quote! { #path { #ident: source } },
        None => quote! { #path(source) },
    };
    Ok(Some(quote! {
        impl ::std::convert::From<#ty> for #name {
            fn from(source: #ty) -> Self {
                #construct
            }
        }
    }))
}

/// Returns the position and field marked `#[source]` or `#[from]`.
fn find_source(fields: &Fields) -> syn::Result<Option<(usize, &Field)>> {
    let mut found = None;
    for (index, field) in fields.iter().enumerate() {
        if has_attr(field, "source") || has_attr(field, "from") {
            if found.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field may be marked #[source] or #[from]",
                ));
            }
            found = Some((index, field));
        }
    }
    Ok(found)
}

fn has_attr(field: &Field, name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// Extracts the error message from attributes.
fn extract_error_message_from_attrs<T: ToTokens>(
    attrs: &[syn::Attribute],
    target: &T,
    target_desc: &str,
) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("error") {
            if let Meta::List(meta_list) = &attr.meta {
                let tokens = meta_list.tokens.clone();
                let lit = syn::parse2::<Lit>(tokens).map_err(|_| {
                    syn::Error::new_spanned(
                        &attr.meta,
                        "failed to parse #[error] attribute; expected a string literal like #[error(\"unknown opcode {opcode}\")]",
                    )
                })?;

                if let Lit::Str(lit_str) = lit {
                    return Ok(lit_str.value());
                }

                return Err(syn::Error::new_spanned(
                    &attr.meta,
                    "invalid #[error] attribute: message must be a string literal",
                ));
            }

            return Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute; use #[error(\"message\")] to describe the error",
            ));
        }
    }

    Err(syn::Error::new_spanned(
        target,
        format!(
            "missing #[error(\"...\")] attribute on {}; every error variant must declare a display message",
            target_desc
        ),
    ))
}

/// Returns `true` if `format_str` interpolates the argument `name`
/// (either `{name}` or `{name:spec}`).
fn references(format_str: &str, name: &str) -> bool {
    format_str.contains(&format!("{{{}}}", name)) || format_str.contains(&format!("{{{}:", name))
}

/// Converts positional format args `{0}`, `{1:?}` to named args `{f0}`, `{f1:?}`.
fn convert_positional_to_named(format_str: &str, field_count: usize) -> String {
    let mut result = format_str.to_string();
    for i in (0..field_count).rev() {
        result = result
            .replace(&format!("{{{}}}", i), &format!("{{f{}}}", i))
            .replace(&format!("{{{}:", i), &format!("{{f{}:", i));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_plain_and_formatted() {
        assert!(references("unknown opcode {opcode}", "opcode"));
        assert!(references("mode {mode:?} at {offset}", "mode"));
        assert!(!references("unknown opcode {opcode}", "offset"));
        assert!(!references("stage {stage_count}", "stage"));
    }

    #[test]
    fn positional_args_become_named() {
        assert_eq!(
            convert_positional_to_named("{0} then {1:?}", 2),
            "{f0} then {f1:?}"
        );
    }

    #[test]
    fn positional_conversion_handles_two_digit_indices() {
        let msg = "{1} {10}";
        assert_eq!(convert_positional_to_named(msg, 11), "{f1} {f10}");
    }
}
