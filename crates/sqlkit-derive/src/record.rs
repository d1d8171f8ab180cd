//! Record derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

use crate::attrs::{FieldKind, struct_fields};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = struct_fields(&input, "Record")?;

    let mut inserts = Vec::new();
    let mut specs = Vec::new();

    for field in &fields {
        let ident = field.ident;
        let ty = field.ty;
        let column = &field.column;

        match field.kind {
            FieldKind::Skip => {}
            FieldKind::Flatten => {
                inserts.push(quote! {
                    __mapping.extend_from(::sqlkit::Record::to_mapping(&self.#ident));
                });
                specs.push(quote! {
                    __schema.extend(
                        <#ty as ::sqlkit::Record>::schema()
                            .into_iter()
                            .map(::sqlkit::FieldSpec::nested),
                    );
                });
            }
            FieldKind::Column => {
                if field.omit_empty {
                    inserts.push(quote! {
                        if !::sqlkit::ToValue::is_empty_value(&self.#ident) {
                            __mapping.insert(#column, ::sqlkit::ToValue::to_value(&self.#ident));
                        }
                    });
                } else {
                    inserts.push(quote! {
                        __mapping.insert(#column, ::sqlkit::ToValue::to_value(&self.#ident));
                    });
                }

                let omit_empty = field.omit_empty;
                let temporal = field.temporal;
                specs.push(quote! {
                    __schema.push(
                        ::sqlkit::FieldSpec::new(#column)
                            .omit_empty(#omit_empty)
                            .temporal(#temporal),
                    );
                });
            }
        }
    }

    let capacity = fields.len();

    Ok(quote! {
        impl #impl_generics ::sqlkit::Record for #name #ty_generics #where_clause {
            fn to_mapping(&self) -> ::sqlkit::Mapping {
                let mut __mapping = ::sqlkit::Mapping::with_capacity(#capacity);
                #(#inserts)*
                __mapping
            }

            fn schema() -> ::std::vec::Vec<::sqlkit::FieldSpec> {
                let mut __schema = ::std::vec::Vec::with_capacity(#capacity);
                #(#specs)*
                __schema
            }
        }
    })
}
