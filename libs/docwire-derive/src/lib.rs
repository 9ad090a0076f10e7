use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Ident, LitStr, parse_macro_input};

/// Derive macro for document field bindings.
///
/// Implements three traits on the annotated struct:
///
/// - `docwire::DocumentData`: ordered field bindings, one per named field.
/// - `docwire::Host`: the struct serializes as a record.
/// - `docwire::FromValue`: the struct reads back from a map value
///   (requires `Default`; missing fields keep their default).
///
/// # Example
///
/// ```ignore
/// #[derive(DocumentData, Default)]
/// pub struct Player {
///     name: String,
///
///     #[document(rename = "lastUpdate", server_timestamp)]
///     last_update: Option<docwire::Timestamp>,
///
///     #[document(skip)]
///     cached_rank: u32,
/// }
/// ```
///
/// Field attributes:
/// - `rename = "..."`: document field name (default: the Rust field name).
/// - `server_timestamp`: always write the server-timestamp sentinel.
/// - `read_only`: written to documents, never assigned when reading one.
/// - `skip`: not bound at all.
#[proc_macro_derive(DocumentData, attributes(document))]
pub fn derive_document_data(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

#[derive(Debug, Default, PartialEq)]
struct FieldOptions {
    rename: Option<String>,
    server_timestamp: bool,
    read_only: bool,
    skip: bool,
}

fn field_options(field: &syn::Field) -> Result<FieldOptions, syn::Error> {
    let mut options = FieldOptions::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("document") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(meta.error("document field name cannot be empty"));
                }
                options.rename = Some(value.value());
            } else if meta.path.is_ident("server_timestamp") {
                options.server_timestamp = true;
            } else if meta.path.is_ident("read_only") {
                options.read_only = true;
            } else if meta.path.is_ident("skip") {
                options.skip = true;
            } else {
                return Err(meta.error(
                    "unknown document attribute (expected rename, server_timestamp, read_only or skip)",
                ));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "DocumentData does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "DocumentData only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "DocumentData only supports structs",
            ))
        }
    };

    let mut seen: Vec<(String, &Ident)> = Vec::new();
    let mut accessor_tokens = Vec::new();
    let mut binding_tokens = Vec::new();

    for field in fields {
        let field_name = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;
        let options = field_options(field)?;
        if options.skip {
            continue;
        }

        let wire_name = options
            .rename
            .clone()
            .unwrap_or_else(|| field_name.to_string().trim_start_matches("r#").to_string());
        if let Some((_, first)) = seen.iter().find(|(n, _)| *n == wire_name) {
            return Err(syn::Error::new_spanned(
                field_name,
                format!("document field name '{wire_name}' is already used by `{first}`"),
            ));
        }
        seen.push((wire_name.clone(), field_name));

        let getter = format_ident!("__docwire_get_{}", field_name, span = Span::call_site());
        accessor_tokens.push(quote! {
            fn #getter(record: &#name) -> &dyn ::docwire::host::Host {
                &record.#field_name
            }
        });

        let setter_expr = if options.read_only {
            quote! { ::core::option::Option::None }
        } else {
            let setter = format_ident!("__docwire_set_{}", field_name, span = Span::call_site());
            accessor_tokens.push(quote! {
                fn #setter(
                    record: &mut #name,
                    value: &::docwire::value::Value,
                ) -> ::docwire::error::Result<()> {
                    record.#field_name = ::docwire::de::FromValue::from_value(value)
                        .map_err(|e| e.with_context(#wire_name))?;
                    ::core::result::Result::Ok(())
                }
            });
            quote! { ::core::option::Option::Some(#setter) }
        };

        let server_timestamp = options.server_timestamp;
        binding_tokens.push(quote! {
            ::docwire::binding::FieldBinding {
                name: #wire_name,
                get: #getter,
                set: #setter_expr,
                server_timestamp: #server_timestamp,
            }
        });
    }

    let expanded = quote! {
        const _: () = {
            #(#accessor_tokens)*

            impl ::docwire::binding::DocumentData for #name {
                fn bindings() -> &'static [::docwire::binding::FieldBinding<Self>] {
                    const BINDINGS: &[::docwire::binding::FieldBinding<#name>] = &[
                        #(#binding_tokens),*
                    ];
                    BINDINGS
                }
            }

            impl ::docwire::host::Host for #name {
                fn shape(&self) -> ::docwire::host::Shape<'_> {
                    ::docwire::binding::record_shape(self)
                }
            }

            impl ::docwire::de::FromValue for #name {
                fn from_value(value: &::docwire::value::Value) -> ::docwire::error::Result<Self> {
                    ::docwire::de::record_from_value(value)
                }
            }
        };
    };

    Ok(expanded)
}
