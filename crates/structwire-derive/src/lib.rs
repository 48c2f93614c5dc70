// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashMap;
use structwire::{Assembler, BasicKind, Error, NamedTypes, RawField, RawStruct, RustRenderer, Selection, TypeDesc};
use syn::ext::IdentExt;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Expr, ExprLit, Fields, GenericArgument, Lit,
    LitStr, PathArguments, Type,
};

/// `#[derive(Wire)]` macro: generates `read_from` / `write_to` for a plain struct
///
/// Wire layout: fields in declaration order, little-endian, no tags and no
/// length prefixes.
///
/// Supports:
/// - Scalars: u8, i8, u16, i16, u32, i32, u64, i64, f32, f64
/// - Fixed arrays of scalars: `[T; N]`
/// - `Vec<T>` of scalars with `#[wire(len = "expr")]`, where `expr` may use
///   earlier unsigned fields, integer literals, `+ - * / %` and parentheses
/// - Type aliases of scalars with `#[wire(repr = "u16")]`
///
/// Struct attributes `#[wire(read_fn = "...", write_fn = "...")]` rename the
/// generated methods.
///
/// Example:
/// ```ignore
/// use structwire_derive::Wire;
///
/// type Celsius = f32;
///
/// #[derive(Wire)]
/// struct Reading {
///     count: u8,
///     #[wire(repr = "f32")]
///     peak: Celsius,
///     #[wire(len = "count")]
///     samples: Vec<i16>,
/// }
/// ```
#[proc_macro_derive(Wire, attributes(wire))]
pub fn derive_wire(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Struct-level options.
#[derive(Default)]
struct StructAttrs {
    read_fn: Option<LitStr>,
    write_fn: Option<LitStr>,
}

/// Field-level options.
#[derive(Default)]
struct FieldAttrs {
    len: Option<LitStr>,
    repr: Option<LitStr>,
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(f) => &f.named,
            Fields::Unit => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Unit structs are not supported; use `struct Name {}`",
                ))
            }
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(input, "Only named fields are supported"))
            }
        },
        _ => return Err(syn::Error::new_spanned(input, "Only structs are supported")),
    };
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Generic structs are not supported",
        ));
    }

    let struct_attrs = parse_struct_attrs(&input.attrs)?;

    let mut raw = RawStruct::new(input.ident.unraw().to_string());
    let mut aliases = NamedTypes::new();
    let mut reprs: HashMap<String, String> = HashMap::new();
    let mut by_name: HashMap<String, &syn::Field> = HashMap::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "Field must have a name"));
        };
        let name = ident.unraw().to_string();
        let attrs = parse_field_attrs(&field.attrs)?;
        let desc = type_desc(&field.ty)?;

        let leaf = leaf_name(&desc);
        let is_basic = matches!(BasicKind::lookup(leaf), Ok(Some(_)));
        if let Some(repr) = &attrs.repr {
            if is_basic {
                return Err(syn::Error::new_spanned(
                    repr,
                    format!("`repr` only applies to named types, `{leaf}` is already a primitive"),
                ));
            }
            let underlying = repr.value();
            match reprs.get(leaf) {
                Some(prev) if *prev != underlying => {
                    return Err(syn::Error::new_spanned(
                        repr,
                        format!("`{leaf}` was declared with repr = \"{prev}\" on an earlier field"),
                    ))
                }
                Some(_) => {}
                None => {
                    reprs.insert(leaf.to_string(), underlying.clone());
                    aliases.insert(leaf, underlying);
                }
            }
        } else if !is_basic && !reprs.contains_key(leaf) && BasicKind::lookup(leaf).is_ok() {
            return Err(syn::Error::new_spanned(
                &field.ty,
                format!("`{leaf}` is not a primitive; add #[wire(repr = \"...\")] naming its underlying type"),
            ));
        }

        let mut raw_field = RawField::new(name.clone(), desc);
        if let Some(len) = &attrs.len {
            raw_field = raw_field.with_len(len.value());
        }
        raw = raw.field(raw_field);
        by_name.insert(name, field);
    }

    let unit = Assembler::new(Selection::All, aliases)
        .compile(&raw)
        .map_err(|err| match &err {
            Error::Field { field, source } => {
                let name = field.rsplit_once('.').map_or(field.as_str(), |(_, f)| f);
                match by_name.get(name) {
                    Some(f) => syn::Error::new_spanned(f, source.to_string()),
                    None => syn::Error::new_spanned(&input.ident, err.to_string()),
                }
            }
            other => syn::Error::new_spanned(&input.ident, other.to_string()),
        })?;

    let mut renderer = RustRenderer::new();
    if struct_attrs.read_fn.is_some() || struct_attrs.write_fn.is_some() {
        let read_fn = struct_attrs
            .read_fn
            .as_ref()
            .map_or_else(|| renderer.read_fn().to_string(), LitStr::value);
        let write_fn = struct_attrs
            .write_fn
            .as_ref()
            .map_or_else(|| renderer.write_fn().to_string(), LitStr::value);
        renderer = renderer.with_fn_names(read_fn, write_fn);
    }

    let source = renderer.render_impl(&unit);
    let item: syn::ItemImpl = syn::parse_str(&source).map_err(|e| {
        syn::Error::new_spanned(&input.ident, format!("generated code does not parse: {e}"))
    })?;
    Ok(quote! { #item })
}

fn parse_struct_attrs(attrs: &[Attribute]) -> syn::Result<StructAttrs> {
    let mut out = StructAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("wire")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("read_fn") {
                out.read_fn = Some(fn_name(meta.value()?.parse()?)?);
            } else if meta.path.is_ident("write_fn") {
                out.write_fn = Some(fn_name(meta.value()?.parse()?)?);
            } else {
                return Err(meta.error("expected `read_fn` or `write_fn`"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("wire")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("len") {
                out.len = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("repr") {
                out.repr = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error("expected `len` or `repr`"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

fn fn_name(lit: LitStr) -> syn::Result<LitStr> {
    match syn::parse_str::<syn::Ident>(&lit.value()) {
        Ok(_) => Ok(lit),
        Err(_) => Err(syn::Error::new_spanned(&lit, "not a valid function name")),
    }
}

/// Declared type of a field, as the schema sees it.
fn type_desc(ty: &Type) -> syn::Result<TypeDesc> {
    match ty {
        Type::Path(path) if path.qself.is_none() => {
            let Some(segment) = path.path.segments.last() else {
                return Err(syn::Error::new_spanned(ty, "Empty type path"));
            };
            if segment.ident == "Vec" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return Ok(TypeDesc::sequence(type_desc(inner)?));
                    }
                }
                return Err(syn::Error::new_spanned(ty, "Vec needs an element type"));
            }
            if !segment.arguments.is_empty() {
                return Err(syn::Error::new_spanned(
                    ty,
                    "Unsupported type. Supported types: scalars, [T; N], Vec<T>, scalar aliases.",
                ));
            }
            let name = segment.ident.unraw().to_string();
            let is_basic = matches!(BasicKind::lookup(&name), Ok(Some(_)));
            if path.path.segments.len() > 1 && !is_basic {
                return Err(syn::Error::new_spanned(
                    ty,
                    "Refer to named types by a single identifier (bring the alias into scope)",
                ));
            }
            Ok(TypeDesc::named(name))
        }
        Type::Array(array) => {
            let len = match &array.len {
                Expr::Lit(ExprLit {
                    lit: Lit::Int(int), ..
                }) => int.base10_parse::<usize>()?,
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "Array length must be an integer literal",
                    ))
                }
            };
            Ok(TypeDesc::array(type_desc(&array.elem)?, len))
        }
        Type::Paren(inner) => type_desc(&inner.elem),
        Type::Group(inner) => type_desc(&inner.elem),
        other => Err(syn::Error::new_spanned(
            other,
            "Unsupported type. Supported types: scalars, [T; N], Vec<T>, scalar aliases.",
        )),
    }
}

/// Innermost named type of a descriptor.
fn leaf_name(desc: &TypeDesc) -> &str {
    match desc {
        TypeDesc::Named(name) => name,
        TypeDesc::Array { elem, .. } | TypeDesc::Sequence { elem } => leaf_name(elem),
    }
}
