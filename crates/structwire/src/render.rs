// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Rust source renderer for compiled codec units.
//!
//! The only place that knows Rust syntax. Generated code uses fully qualified
//! paths so it compiles regardless of what the surrounding module imports.
//!
//! Locals are prefixed (`f_<field>`, `len_<field>`, `nbytes_<field>`) so they
//! never collide with each other or with `buf`, `r`, `w`.

use crate::ir::{CodecUnit, DecodeStmt, EncodeStmt, Place, ReadLen, READ_CHUNK};
use crate::types::{BasicKind, SimpleType};

const IO_ERROR: &str = "::std::io::Error::new";
const DEFAULT: &str = "::core::default::Default::default()";

/// Lints that fire on generated casts, conversions and unused procedures.
const ALLOWED_LINTS: &str = "dead_code, clippy::unnecessary_cast, clippy::useless_conversion, clippy::redundant_closure_call";

/// Renders `impl` blocks (and optionally struct definitions) for codec units.
#[derive(Debug, Clone)]
pub struct RustRenderer {
    read_fn: String,
    write_fn: String,
    derives: Vec<String>,
}

impl Default for RustRenderer {
    fn default() -> Self {
        Self {
            read_fn: "read_from".into(),
            write_fn: "write_to".into(),
            derives: vec!["Debug".into(), "Clone".into(), "PartialEq".into()],
        }
    }
}

impl RustRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_fn_names(mut self, read_fn: impl Into<String>, write_fn: impl Into<String>) -> Self {
        self.read_fn = read_fn.into();
        self.write_fn = write_fn.into();
        self
    }

    #[must_use]
    pub fn with_derives<I, S>(mut self, derives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derives = derives.into_iter().map(Into::into).collect();
        self
    }

    pub fn read_fn(&self) -> &str {
        &self.read_fn
    }

    pub fn write_fn(&self) -> &str {
        &self.write_fn
    }

    /// Struct definition with public fields in wire order.
    pub fn render_struct_def(&self, unit: &CodecUnit) -> String {
        let mut code = Code::default();
        if !self.derives.is_empty() {
            code.line(&format!("#[derive({})]", self.derives.join(", ")));
        }
        code.open(&format!("pub struct {} {{", ident(&unit.name)));
        for field in &unit.fields {
            code.line(&format!("pub {}: {},", ident(field.name()), field.ty().rust_type()));
        }
        code.close("}");
        code.finish()
    }

    /// `pub type` for an alias, as an item that may sit next to the structs.
    pub fn render_alias(&self, name: &str, kind: BasicKind) -> String {
        format!("#[allow(dead_code)]\npub type {} = {kind};\n", ident(name))
    }

    /// `impl` block with the fixed-size constant and both procedures.
    pub fn render_impl(&self, unit: &CodecUnit) -> String {
        let mut code = Code::default();
        code.line(&format!("#[allow({ALLOWED_LINTS})]"));
        code.open(&format!("impl {} {{", ident(&unit.name)));

        code.line("/// Bytes occupied by the fixed-size fields.");
        code.line(&format!("pub const WIRE_FIXED_SIZE: usize = {};", unit.fixed_size));
        code.blank();

        self.render_decode(unit, &mut code);
        code.blank();
        self.render_encode(unit, &mut code);

        code.close("}");
        code.finish()
    }

    /// Optional definition followed by the impl.
    pub fn render_unit(&self, unit: &CodecUnit, with_def: bool) -> String {
        if with_def {
            format!("{}\n{}", self.render_struct_def(unit), self.render_impl(unit))
        } else {
            self.render_impl(unit)
        }
    }

    fn render_decode(&self, unit: &CodecUnit, code: &mut Code) {
        let reads = unit
            .decode
            .iter()
            .any(|s| matches!(s, DecodeStmt::ReadBytes(_)));
        let reader = if reads { "r" } else { "_r" };

        code.line(&format!("/// Decode a `{}` from a reader.", unit.name));
        code.open(&format!(
            "pub fn {}<R: ::std::io::Read + ?Sized>({reader}: &mut R) -> ::std::io::Result<Self> {{",
            self.read_fn
        ));

        for stmt in &unit.decode {
            match stmt {
                DecodeStmt::Scratch(n) => {
                    code.line(&format!("let mut buf: ::std::vec::Vec<u8> = ::std::vec![0u8; {n}];"));
                }
                DecodeStmt::EvalLen { field, expr } => {
                    let value = expr.render_checked(&|name| format!("u64::from({})", local(name)));
                    eval_len(code, field, &value, "InvalidData");
                }
                DecodeStmt::ReadBytes(ReadLen::Fixed(n)) => {
                    code.line(&format!("::std::io::Read::read_exact(r, &mut buf[..{n}])?;"));
                }
                DecodeStmt::ReadBytes(ReadLen::Counted { field, unit: size }) => {
                    let nbytes = format!("nbytes_{field}");
                    code.line(&format!(
                        "let {nbytes} = len_{field}.checked_mul({size}).ok_or_else(|| {IO_ERROR}(::std::io::ErrorKind::InvalidData, \"byte length of '{field}' overflows usize\"))?;"
                    ));
                    code.open("{");
                    code.line("let mut filled = 0usize;");
                    code.open(&format!("while filled < {nbytes} {{"));
                    code.line(&format!(
                        "let end = {nbytes}.min(filled.saturating_add({READ_CHUNK}));"
                    ));
                    code.open("if buf.len() < end {");
                    code.line("buf.resize(end, 0);");
                    code.close("}");
                    code.line("::std::io::Read::read_exact(r, &mut buf[filled..end])?;");
                    code.line("filled = end;");
                    code.close("}");
                    code.close("}");
                }
                DecodeStmt::AllocArray { field, len, elem } => {
                    let binding = if *len == 0 { "let" } else { "let mut" };
                    code.line(&format!(
                        "{binding} {}: [{}; {len}] = [{DEFAULT}; {len}];",
                        local(field),
                        elem.display_name()
                    ));
                }
                DecodeStmt::AllocSequence { field, elem } => {
                    code.line(&format!(
                        "let mut {}: ::std::vec::Vec<{}> = ::std::vec![{DEFAULT}; len_{field}];",
                        local(field),
                        elem.display_name()
                    ));
                }
                DecodeStmt::EmitByteOr {
                    place: Place::Field(field),
                    scalar,
                    offset,
                } => {
                    let value = from_bytes(scalar, &|i| (offset + i).to_string());
                    code.line(&format!(
                        "let {}: {} = {value};",
                        local(field),
                        scalar.display_name()
                    ));
                }
                DecodeStmt::EmitByteOr {
                    place: Place::Elements(field),
                    scalar,
                    offset,
                } => {
                    code.open(&format!("for (i, v) in {}.iter_mut().enumerate() {{", local(field)));
                    code.line(&format!("let p = {};", element_pos(*offset, scalar.size())));
                    let value = from_bytes(scalar, &|i| {
                        if i == 0 {
                            "p".to_string()
                        } else {
                            format!("p + {i}")
                        }
                    });
                    code.line(&format!("*v = {value};"));
                    code.close("}");
                }
            }
        }

        let inits: Vec<String> = unit
            .fields
            .iter()
            .map(|f| format!("{}: {}", ident(f.name()), local(f.name())))
            .collect();
        if inits.is_empty() {
            code.line("::std::result::Result::Ok(Self {})");
        } else {
            code.line(&format!(
                "::std::result::Result::Ok(Self {{ {} }})",
                inits.join(", ")
            ));
        }
        code.close("}");
    }

    fn render_encode(&self, unit: &CodecUnit, code: &mut Code) {
        let appends = unit
            .encode
            .iter()
            .any(|s| matches!(s, EncodeStmt::AppendBytes { .. }));

        code.line("/// Encode into `w`; returns the number of bytes written.");
        code.open(&format!(
            "pub fn {}<W: ::std::io::Write + ?Sized>(&self, w: &mut W) -> ::std::io::Result<usize> {{",
            self.write_fn
        ));

        for stmt in &unit.encode {
            match stmt {
                EncodeStmt::EvalLen { field, expr } => {
                    let value =
                        expr.render_checked(&|name| format!("u64::from(self.{})", ident(name)));
                    eval_len(code, field, &value, "InvalidInput");
                }
                EncodeStmt::CheckLen { field } => {
                    let access = format!("self.{}", ident(field));
                    code.open(&format!("if {access}.len() != len_{field} {{"));
                    code.line(&format!(
                        "return ::std::result::Result::Err({IO_ERROR}(::std::io::ErrorKind::InvalidInput, ::std::format!(\"'{field}' holds {{}} elements, its length expression requires {{}}\", {access}.len(), len_{field})));"
                    ));
                    code.close("}");
                }
                EncodeStmt::Reserve { fixed, counted } => {
                    let mut capacity = format!("{fixed}usize");
                    for (field, size) in counted {
                        capacity.push_str(&format!(".saturating_add(len_{field}.saturating_mul({size}))"));
                    }
                    let binding = if appends { "let mut buf" } else { "let buf" };
                    code.line(&format!(
                        "{binding}: ::std::vec::Vec<u8> = ::std::vec::Vec::with_capacity({capacity});"
                    ));
                }
                EncodeStmt::AppendBytes {
                    place: Place::Field(field),
                    scalar,
                } => {
                    code.open("{");
                    let bits = to_bits(scalar, &format!("self.{}", ident(field)));
                    append(code, scalar, &bits);
                    code.close("}");
                }
                EncodeStmt::AppendBytes {
                    place: Place::Elements(field),
                    scalar,
                } => {
                    code.open(&format!("for e in self.{}.iter() {{", ident(field)));
                    let bits = if scalar.is_integer() {
                        to_bits(scalar, "*e")
                    } else {
                        to_bits(scalar, "e")
                    };
                    append(code, scalar, &bits);
                    code.close("}");
                }
                EncodeStmt::WriteAll => {
                    code.line("::std::io::Write::write_all(w, &buf)?;");
                    code.line("::std::result::Result::Ok(buf.len())");
                }
            }
        }
        code.close("}");
    }
}

/// Bind `len_<field>` from a rendered `Option<u64>` expression.
fn eval_len(code: &mut Code, field: &str, value: &str, kind: &str) {
    code.line(&format!("let len_{field}: usize = {value}"));
    code.indent();
    code.line(".and_then(|v| <usize as ::core::convert::TryFrom<u64>>::try_from(v).ok())");
    code.line(&format!(
        ".ok_or_else(|| {IO_ERROR}(::std::io::ErrorKind::{kind}, \"length of '{field}' is out of range\"))?;"
    ));
    code.dedent();
}

/// Unsigned bit pattern of `value`, as the scalar's unsigned kind.
fn to_bits(scalar: &SimpleType, value: &str) -> String {
    let kind = scalar.kind();
    if !kind.is_integer() {
        format!("{value}.to_bits()")
    } else if scalar.alias().is_none() && kind.is_unsigned() {
        value.to_string()
    } else {
        format!("{value} as {}", kind.unsigned())
    }
}

/// `let v = <bits>;` followed by the little-endian byte pushes.
fn append(code: &mut Code, scalar: &SimpleType, bits: &str) {
    let unsigned = scalar.kind().unsigned();
    code.line(&format!("let v: {unsigned} = {bits};"));
    if scalar.size() == 1 {
        code.line("buf.push(v);");
        return;
    }
    let bytes: Vec<String> = (0..scalar.size())
        .map(|i| {
            if i == 0 {
                "v as u8".to_string()
            } else {
                format!("(v >> {}) as u8", 8 * i)
            }
        })
        .collect();
    code.line(&format!("buf.extend_from_slice(&[{}]);", bytes.join(", ")));
}

/// OR of shifted bytes at `pos(i)`, converted back to the scalar's type.
fn from_bytes(scalar: &SimpleType, pos: &dyn Fn(usize) -> String) -> String {
    let kind = scalar.kind();
    let unsigned = kind.unsigned();
    let bits = if scalar.size() == 1 {
        format!("buf[{}]", pos(0))
    } else {
        let parts: Vec<String> = (0..scalar.size())
            .map(|i| {
                let byte = format!("{unsigned}::from(buf[{}])", pos(i));
                if i == 0 {
                    byte
                } else {
                    format!("{byte} << {}", 8 * i)
                }
            })
            .collect();
        parts.join(" | ")
    };

    if !kind.is_integer() {
        let float = format!("{kind}::from_bits({bits})");
        match scalar.alias() {
            Some(alias) => format!("{float} as {alias}"),
            None => float,
        }
    } else if scalar.display_name() == unsigned.name() {
        bits
    } else if scalar.size() == 1 {
        format!("{bits} as {}", scalar.display_name())
    } else {
        format!("({bits}) as {}", scalar.display_name())
    }
}

fn element_pos(offset: usize, size: usize) -> String {
    let scaled = if size == 1 {
        "i".to_string()
    } else {
        format!("i * {size}")
    };
    if offset == 0 {
        scaled
    } else {
        format!("{offset} + {scaled}")
    }
}

fn local(field: &str) -> String {
    format!("f_{field}")
}

/// Field name as a Rust identifier, raw when it is a keyword.
pub fn ident(name: &str) -> String {
    if is_keyword(name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

fn is_keyword(name: &str) -> bool {
    matches!(
        name,
        "as" | "break"
            | "const"
            | "continue"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "static"
            | "struct"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "async"
            | "await"
            | "dyn"
            | "abstract"
            | "become"
            | "box"
            | "do"
            | "final"
            | "macro"
            | "override"
            | "priv"
            | "typeof"
            | "unsized"
            | "virtual"
            | "yield"
            | "try"
            | "gen"
    )
}

/// Indenting line buffer.
#[derive(Default)]
struct Code {
    out: String,
    depth: usize,
}

impl Code {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn open(&mut self, text: &str) {
        self.line(text);
        self.indent();
    }

    fn close(&mut self, text: &str) {
        self.dedent();
        self.line(text);
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::compile;
    use crate::schema::{InputStruct, RawField, RawStruct};
    use crate::types::{BasicKind, NamedTypes};

    fn unit(raw: RawStruct, aliases: &NamedTypes) -> CodecUnit {
        compile(&InputStruct::bind(&raw, aliases).expect("bind"))
    }

    fn field(name: &str, ty: &str) -> RawField {
        RawField::new(name, ty.parse().expect("type desc"))
    }

    #[test]
    fn test_byte_or_reconstruction() {
        let scalar = SimpleType::basic(BasicKind::U32);
        assert_eq!(
            from_bytes(&scalar, &|i| (4 + i).to_string()),
            "u32::from(buf[4]) | u32::from(buf[5]) << 8 | u32::from(buf[6]) << 16 | u32::from(buf[7]) << 24"
        );
        let scalar = SimpleType::basic(BasicKind::I16);
        assert_eq!(
            from_bytes(&scalar, &|i| i.to_string()),
            "(u16::from(buf[0]) | u16::from(buf[1]) << 8) as i16"
        );
        let scalar = SimpleType::basic(BasicKind::I8);
        assert_eq!(from_bytes(&scalar, &|i| i.to_string()), "buf[0] as i8");
        let scalar = SimpleType::named("Celsius", BasicKind::F32);
        assert!(from_bytes(&scalar, &|i| i.to_string()).starts_with("f32::from_bits(u32::from(buf[0])"));
        assert!(from_bytes(&scalar, &|i| i.to_string()).ends_with(") as Celsius"));
    }

    #[test]
    fn test_to_bits() {
        assert_eq!(to_bits(&SimpleType::basic(BasicKind::U16), "self.a"), "self.a");
        assert_eq!(to_bits(&SimpleType::basic(BasicKind::I64), "*e"), "*e as u64");
        assert_eq!(to_bits(&SimpleType::basic(BasicKind::F64), "self.x"), "self.x.to_bits()");
        assert_eq!(
            to_bits(&SimpleType::named("Id", BasicKind::U32), "self.id"),
            "self.id as u32"
        );
    }

    #[test]
    fn test_render_end_to_end_example() {
        let raw = RawStruct::new("Packet")
            .field(field("n", "u8"))
            .field(field("a", "u16"))
            .field(field("b", "u16"))
            .field(field("c", "Vec<u8>").with_len("n"));
        let src = RustRenderer::new().render_impl(&unit(raw, &NamedTypes::new()));

        assert!(src.contains("pub const WIRE_FIXED_SIZE: usize = 5;"));
        assert!(src.contains("::std::io::Read::read_exact(r, &mut buf[..5])?;"));
        assert!(src.contains("let f_a: u16 = u16::from(buf[1]) | u16::from(buf[2]) << 8;"));
        assert!(src.contains("let len_c: usize = ::std::option::Option::Some(u64::from(f_n))"));
        assert!(src.contains("::std::result::Result::Ok(Self { n: f_n, a: f_a, b: f_b, c: f_c })"));
        assert!(src.contains("if self.c.len() != len_c {"));
        assert!(src.contains("::std::vec::Vec::with_capacity(5usize.saturating_add(len_c.saturating_mul(1)))"));
        assert!(src.contains("buf.extend_from_slice(&[v as u8, (v >> 8) as u8]);"));
    }

    #[test]
    fn test_custom_names_and_keywords() {
        let raw = RawStruct::new("Frame").field(field("type", "u8"));
        let renderer = RustRenderer::new().with_fn_names("load_from", "save_to");
        let u = unit(raw, &NamedTypes::new());
        let src = renderer.render_unit(&u, true);
        assert!(src.contains("pub r#type: u8,"));
        assert!(src.contains("pub fn load_from<R"));
        assert!(src.contains("pub fn save_to<W"));
        assert!(src.contains("Self { r#type: f_type }"));
        assert!(src.contains("let v: u8 = self.r#type;"));
    }

    #[test]
    fn test_counted_read_grows_in_chunks() {
        let raw = RawStruct::new("Frame")
            .field(field("n", "u32"))
            .field(field("c", "Vec<u64>").with_len("n"));
        let src = RustRenderer::new().render_impl(&unit(raw, &NamedTypes::new()));
        assert!(src.contains("let nbytes_c = len_c.checked_mul(8)"));
        assert!(src.contains(&format!(
            "let end = nbytes_c.min(filled.saturating_add({READ_CHUNK}));"
        )));
        assert!(src.contains("::std::io::Read::read_exact(r, &mut buf[filled..end])?;"));
        assert!(!src.contains("buf.resize(nbytes_c"));
    }

    #[test]
    fn test_empty_array_needs_no_scratch() {
        let raw = RawStruct::new("Pad").field(field("p", "[u8; 0]"));
        let src = RustRenderer::new().render_impl(&unit(raw, &NamedTypes::new()));
        assert!(src.contains("(_r: &mut R)"));
        assert!(!src.contains("let mut buf: ::std::vec::Vec<u8> = ::std::vec!["));
        assert!(src.contains("let f_p: [u8; 0] = [::core::default::Default::default(); 0];"));
        assert!(!src.contains("f_p.iter_mut()"));
    }

    #[test]
    fn test_render_alias() {
        assert_eq!(
            RustRenderer::new().render_alias("Celsius", BasicKind::F32),
            "#[allow(dead_code)]\npub type Celsius = f32;\n"
        );
    }

    #[test]
    fn test_empty_struct_has_unused_reader() {
        let src = RustRenderer::new().render_impl(&unit(RawStruct::new("Unit"), &NamedTypes::new()));
        assert!(src.contains("(_r: &mut R)"));
        assert!(src.contains("::std::result::Result::Ok(Self {})"));
        assert!(src.contains("let buf: ::std::vec::Vec<u8> = ::std::vec::Vec::with_capacity(0usize);"));
    }

    #[test]
    fn test_struct_def_derives() {
        let aliases = NamedTypes::new().with("Celsius", "f32");
        let raw = RawStruct::new("Reading")
            .field(field("samples", "[Celsius; 3]"));
        let src = RustRenderer::new()
            .with_derives(["Debug"])
            .render_struct_def(&unit(raw, &aliases));
        assert_eq!(
            src,
            "#[derive(Debug)]\npub struct Reading {\n    pub samples: [Celsius; 3],\n}\n"
        );
    }
}
