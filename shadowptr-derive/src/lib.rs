//! # shadowptr Derive Macros
//!
//! This crate provides `#[derive(Traverse)]` for `shadowptr`. The generated
//! implementation visits every field in declaration order, which is the order
//! `#[derive(Serialize)]` writes them in.
//!
//! Compatible with `syn 2.0`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, GenericParam, Index};

/// Derives `shadowptr::Traverse`.
///
/// # Attributes
///
/// * `#[traverse(anchor)]` on the type: after the fields, track the value as a
///   whole so that pointers to the value itself resolve.
/// * `#[traverse(skip)]` on a field: leave the field out. Use it for fields
///   that the serde implementation skips as well.
#[proc_macro_derive(Traverse, attributes(traverse))]
pub fn derive_traverse(input: TokenStream) -> TokenStream {
    let mut input = parse_macro_input!(input as DeriveInput);

    let anchor = match parse_container_attributes(&input.attrs) {
        Ok(anchor) => anchor,
        Err(e) => return e.to_compile_error().into(),
    };

    let body = match &input.data {
        Data::Struct(ds) => match visit_struct_fields(&ds.fields) {
            Ok(body) => body,
            Err(e) => return e.to_compile_error().into(),
        },
        Data::Enum(de) => {
            let mut arms = Vec::new();
            for variant in &de.variants {
                match visit_variant(&variant.ident, &variant.fields) {
                    Ok(arm) => arms.push(arm),
                    Err(e) => return e.to_compile_error().into(),
                }
            }
            quote! {
                match self {
                    #(#arms)*
                }
            }
        }
        Data::Union(du) => {
            return syn::Error::new(du.union_token.span, "Traverse does not support unions")
                .to_compile_error()
                .into();
        }
    };

    let track_anchor = if anchor {
        quote! { ::shadowptr::Anchor::new(self).track(mapper); }
    } else {
        quote! {}
    };

    for param in &mut input.generics.params {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(syn::parse_quote!(::shadowptr::Traverse));
        }
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::shadowptr::Traverse for #name #ty_generics #where_clause {
            fn traverse<'__shadow, __M: ::shadowptr::ShadowMapper<'__shadow>>(
                &'__shadow self,
                mapper: &mut __M,
            ) {
                #body
                #track_anchor
            }
        }
    };

    TokenStream::from(expanded)
}

/// Parses `#[traverse(...)]` on the type. Returns whether `anchor` was set.
fn parse_container_attributes(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut anchor = false;

    for attr in attrs {
        if attr.path().is_ident("traverse") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("anchor") {
                    anchor = true;
                    return Ok(());
                }
                Err(meta.error("Unknown traverse attribute key. Supported on types: anchor"))
            })?;
        }
    }
    Ok(anchor)
}

/// Parses `#[traverse(...)]` on a field. Returns whether `skip` was set.
fn parse_field_attributes(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut skip = false;

    for attr in attrs {
        if attr.path().is_ident("traverse") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    skip = true;
                    return Ok(());
                }
                Err(meta.error("Unknown traverse attribute key. Supported on fields: skip"))
            })?;
        }
    }
    Ok(skip)
}

// --- Generator: struct body ---

fn visit_struct_fields(fields: &Fields) -> syn::Result<TokenStream2> {
    let mut stmts = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        if parse_field_attributes(&field.attrs)? {
            continue;
        }
        let access = match &field.ident {
            Some(ident) => quote! { self.#ident },
            None => {
                let index = Index::from(index);
                quote! { self.#index }
            }
        };
        stmts.push(quote! {
            ::shadowptr::Traverse::traverse(&#access, mapper);
        });
    }

    Ok(quote! { #(#stmts)* })
}

// --- Generator: enum match arm ---

fn visit_variant(variant: &syn::Ident, fields: &Fields) -> syn::Result<TokenStream2> {
    let mut bindings = Vec::new();
    let mut stmts = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let binding = match &field.ident {
            Some(ident) => format_ident!("__field_{}", ident),
            None => format_ident!("__field_{}", index),
        };
        if !parse_field_attributes(&field.attrs)? {
            stmts.push(quote! {
                ::shadowptr::Traverse::traverse(#binding, mapper);
            });
        }
        bindings.push((field.ident.clone(), binding));
    }

    let pattern = match fields {
        Fields::Named(_) => {
            let pairs = bindings.iter().map(|(ident, binding)| quote! { #ident: #binding });
            quote! { Self::#variant { #(#pairs),* } }
        }
        Fields::Unnamed(_) => {
            let names = bindings.iter().map(|(_, binding)| binding);
            quote! { Self::#variant ( #(#names),* ) }
        }
        Fields::Unit => quote! { Self::#variant },
    };

    Ok(quote! {
        #[allow(unused_variables)]
        #pattern => {
            #(#stmts)*
        }
    })
}
