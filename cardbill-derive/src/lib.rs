use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Lit, Meta, Type};

/// Derive macro that describes the serialized fields of an input record.
///
/// For each field, extracts:
/// - Field name as it appears on the wire (respects `#[serde(rename = "...")]`
///   and a container level `#[serde(rename_all = "camelCase")]`)
/// - Required (false for `Option<T>` or `#[serde(default)]` fields)
/// - Description (from doc comments)
///
/// Generates a `field_schema() -> &'static [FieldInfo]` method. `FieldInfo`
/// must be in scope where the derive is used.
#[proc_macro_derive(FieldSchema, attributes(serde))]
pub fn derive_field_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let camel_case = container_renames_camel_case(&input.attrs);

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("FieldSchema only supports structs with named fields"),
        },
        _ => panic!("FieldSchema only supports structs"),
    };

    let field_info: Vec<_> = fields
        .iter()
        .map(|field| {
            let field_name = field.ident.as_ref().unwrap().to_string();
            let field_name = if camel_case {
                to_camel_case(&field_name)
            } else {
                field_name
            };

            let wire_name = get_serde_rename(&field.attrs).unwrap_or(field_name);
            let required = !is_option_type(&field.ty) && !has_serde_default(&field.attrs);
            let doc = get_doc_comment(&field.attrs);

            (wire_name, required, doc)
        })
        .collect();

    let field_entries = field_info.iter().map(|(name, required, desc)| {
        quote! {
            FieldInfo {
                name: #name,
                required: #required,
                description: #desc,
            }
        }
    });

    let expanded = quote! {
        impl #name {
            pub fn field_schema() -> &'static [FieldInfo] {
                static SCHEMA: &[FieldInfo] = &[
                    #(#field_entries),*
                ];
                SCHEMA
            }
        }
    };

    TokenStream::from(expanded)
}

fn serde_tokens(attrs: &[Attribute]) -> impl Iterator<Item = String> + '_ {
    attrs.iter().filter_map(|attr| {
        if !attr.path().is_ident("serde") {
            return None;
        }
        match &attr.meta {
            Meta::List(meta_list) => Some(meta_list.tokens.to_string()),
            _ => None,
        }
    })
}

/// Value of `key = "..."` inside a serde attribute token string.
fn quoted_value(tokens: &str, key: &str) -> Option<String> {
    for part in tokens.split(',') {
        let mut kv = part.splitn(2, '=');
        let k = kv.next()?.trim();
        if k != key {
            continue;
        }
        let v = kv.next()?.trim();
        if let Some(stripped) = v.strip_prefix('"') {
            if let Some(end_quote) = stripped.find('"') {
                return Some(stripped[..end_quote].to_string());
            }
        }
    }
    None
}

fn get_serde_rename(attrs: &[Attribute]) -> Option<String> {
    serde_tokens(attrs).find_map(|tokens| quoted_value(&tokens, "rename"))
}

fn container_renames_camel_case(attrs: &[Attribute]) -> bool {
    serde_tokens(attrs)
        .filter_map(|tokens| quoted_value(&tokens, "rename_all"))
        .any(|style| style == "camelCase")
}

fn has_serde_default(attrs: &[Attribute]) -> bool {
    serde_tokens(attrs).any(|tokens| {
        tokens
            .split(',')
            .any(|part| part.split('=').next().map(str::trim) == Some("default"))
    })
}

fn to_camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper_next = false;
    for c in snake.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn get_doc_comment(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            if !attr.path().is_ident("doc") {
                return None;
            }
            if let Meta::NameValue(meta) = &attr.meta {
                if let syn::Expr::Lit(expr_lit) = &meta.value {
                    if let Lit::Str(lit_str) = &expr_lit.lit {
                        return Some(lit_str.value().trim().to_string());
                    }
                }
            }
            None
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}
