//! `#[orm(...)]` attribute parsing shared by `Record` and `FromRow`.

use heck::{ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use proc_macro2::Span;
use syn::{Data, DeriveInput, Fields, Result};

use crate::common::syn_types::is_temporal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenameRule {
    None,
    Snake,
    Camel,
    Pascal,
    ScreamingSnake,
    Kebab,
}

impl RenameRule {
    fn parse(lit: &syn::LitStr) -> Result<Self> {
        match lit.value().as_str() {
            "snake_case" => Ok(Self::Snake),
            "camelCase" => Ok(Self::Camel),
            "PascalCase" => Ok(Self::Pascal),
            "SCREAMING_SNAKE_CASE" => Ok(Self::ScreamingSnake),
            "kebab-case" => Ok(Self::Kebab),
            other => Err(syn::Error::new(
                lit.span(),
                format!(
                    "unknown rename_all rule '{other}' (expected snake_case, camelCase, PascalCase, SCREAMING_SNAKE_CASE or kebab-case)"
                ),
            )),
        }
    }

    pub(crate) fn apply(self, ident: &str) -> String {
        let ident = ident.strip_prefix("r#").unwrap_or(ident);
        match self {
            Self::None => ident.to_string(),
            Self::Snake => ident.to_snake_case(),
            Self::Camel => ident.to_lower_camel_case(),
            Self::Pascal => ident.to_upper_camel_case(),
            Self::ScreamingSnake => ident.to_shouty_snake_case(),
            Self::Kebab => ident.to_kebab_case(),
        }
    }
}

pub(crate) struct StructAttrs {
    pub(crate) rename_all: RenameRule,
}

struct StructAttrList {
    rename_all: Option<RenameRule>,
}

impl syn::parse::Parse for StructAttrList {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut rename_all = None;

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            let _: syn::Token![=] = input.parse()?;
            let value: syn::LitStr = input.parse()?;
            match ident.to_string().as_str() {
                "rename_all" => rename_all = Some(RenameRule::parse(&value)?),
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown container attribute '{other}'"),
                    ));
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(Self { rename_all })
    }
}

pub(crate) fn get_struct_attrs(input: &DeriveInput) -> Result<StructAttrs> {
    let mut rename_all = RenameRule::None;
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        if let syn::Meta::List(meta_list) = &attr.meta {
            let parsed = syn::parse2::<StructAttrList>(meta_list.tokens.clone())?;
            if let Some(rule) = parsed.rename_all {
                rename_all = rule;
            }
        }
    }
    Ok(StructAttrs { rename_all })
}

#[derive(Default)]
struct FieldAttrList {
    column: Option<String>,
    omit_empty: bool,
    flatten: bool,
    skip: bool,
}

impl syn::parse::Parse for FieldAttrList {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attrs = FieldAttrList::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            match ident.to_string().as_str() {
                "omit_empty" => attrs.omit_empty = true,
                "flatten" => attrs.flatten = true,
                "skip" => attrs.skip = true,
                "column" => {
                    let _: syn::Token![=] = input.parse()?;
                    let value: syn::LitStr = input.parse()?;
                    if value.value().trim().is_empty() {
                        return Err(syn::Error::new(value.span(), "column name cannot be empty"));
                    }
                    attrs.column = Some(value.value());
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown field attribute '{other}'"),
                    ));
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(attrs)
    }
}

/// How a field takes part in mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Column,
    Flatten,
    Skip,
}

pub(crate) struct FieldInfo<'a> {
    pub(crate) ident: &'a syn::Ident,
    pub(crate) ty: &'a syn::Type,
    pub(crate) column: String,
    pub(crate) kind: FieldKind,
    pub(crate) omit_empty: bool,
    pub(crate) temporal: bool,
}

fn get_field_info<'a>(field: &'a syn::Field, rule: RenameRule) -> Result<FieldInfo<'a>> {
    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;

    let mut merged = FieldAttrList::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        if let syn::Meta::List(meta_list) = &attr.meta {
            let parsed = syn::parse2::<FieldAttrList>(meta_list.tokens.clone())?;
            merged.omit_empty |= parsed.omit_empty;
            merged.flatten |= parsed.flatten;
            merged.skip |= parsed.skip;
            if parsed.column.is_some() {
                merged.column = parsed.column;
            }
        }
    }

    if merged.flatten && merged.skip {
        return Err(syn::Error::new_spanned(
            field,
            "flatten and skip are mutually exclusive",
        ));
    }
    if merged.flatten && merged.column.is_some() {
        return Err(syn::Error::new_spanned(
            field,
            "a flattened field has no column of its own",
        ));
    }

    let kind = if merged.skip {
        FieldKind::Skip
    } else if merged.flatten {
        FieldKind::Flatten
    } else {
        FieldKind::Column
    };

    Ok(FieldInfo {
        ident,
        ty: &field.ty,
        column: merged
            .column
            .unwrap_or_else(|| rule.apply(&ident.to_string())),
        kind,
        omit_empty: merged.omit_empty,
        temporal: is_temporal(&field.ty),
    })
}

/// Parse every named field of a struct, in declaration order.
pub(crate) fn struct_fields<'a>(input: &'a DeriveInput, derive: &str) -> Result<Vec<FieldInfo<'a>>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new(
                    Span::call_site(),
                    format!("{derive} can only be derived for structs with named fields"),
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                format!("{derive} can only be derived for structs"),
            ));
        }
    };

    let rule = get_struct_attrs(input)?.rename_all;
    fields.iter().map(|f| get_field_info(f, rule)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn rename_rules() {
        assert_eq!(RenameRule::Camel.apply("created_at"), "createdAt");
        assert_eq!(RenameRule::Pascal.apply("created_at"), "CreatedAt");
        assert_eq!(RenameRule::ScreamingSnake.apply("created_at"), "CREATED_AT");
        assert_eq!(RenameRule::Kebab.apply("created_at"), "created-at");
        assert_eq!(RenameRule::None.apply("r#type"), "type");
    }

    #[test]
    fn field_attributes_are_merged() {
        let input: DeriveInput = parse_quote! {
            #[orm(rename_all = "camelCase")]
            struct User {
                user_id: i64,
                #[orm(column = "nick")]
                #[orm(omit_empty)]
                nickname: String,
                #[orm(flatten)]
                audit: Audit,
                #[orm(skip)]
                cache: Vec<u8>,
                deleted_at: Option<NaiveDateTime>,
            }
        };
        let fields = struct_fields(&input, "Record").unwrap();
        assert_eq!(fields[0].column, "userId");
        assert_eq!(fields[1].column, "nick");
        assert!(fields[1].omit_empty);
        assert_eq!(fields[2].kind, FieldKind::Flatten);
        assert_eq!(fields[3].kind, FieldKind::Skip);
        assert!(fields[4].temporal);
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let input: DeriveInput = parse_quote! {
            struct User {
                #[orm(primary)]
                id: i64,
            }
        };
        assert!(struct_fields(&input, "Record").is_err());
    }

    #[test]
    fn tuple_struct_is_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Id(i64);
        };
        assert!(struct_fields(&input, "FromRow").is_err());
    }
}
