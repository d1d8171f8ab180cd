//! FromRow derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

use crate::attrs::{FieldKind, struct_fields};
use crate::common::syn_types::option_inner;

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = struct_fields(&input, "FromRow")?;

    let mut field_extracts = Vec::new();
    let mut columns = Vec::new();

    for field in &fields {
        let ident = field.ident;
        let ty = field.ty;
        let column = &field.column;

        let extract = match field.kind {
            FieldKind::Skip => quote! { ::core::default::Default::default() },
            FieldKind::Flatten => {
                columns.push(quote! {
                    __columns.extend(<#ty as ::sqlkit::FromRow>::select_columns());
                });
                quote! { <#ty as ::sqlkit::FromRow>::from_row(row)? }
            }
            FieldKind::Column => {
                columns.push(quote! { __columns.push(#column); });
                match option_inner(ty) {
                    Some(inner) => quote! { ::sqlkit::RowExt::get_opt::<#inner>(row, #column)? },
                    None if field.omit_empty => quote! {
                        ::sqlkit::RowExt::get_opt::<#ty>(row, #column)?.unwrap_or_default()
                    },
                    None => quote! { ::sqlkit::RowExt::get_as::<#ty>(row, #column)? },
                }
            }
        };

        field_extracts.push(quote! { #ident: #extract });
    }

    Ok(quote! {
        impl #impl_generics ::sqlkit::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &::sqlkit::Row) -> ::sqlkit::OrmResult<Self> {
                Ok(Self {
                    #(#field_extracts),*
                })
            }

            fn select_columns() -> ::std::vec::Vec<&'static str> {
                let mut __columns = ::std::vec::Vec::new();
                #(#columns)*
                __columns
            }
        }
    })
}
