//! Go type expressions: a tokenizer and a small syntax tree over it.
//!
//! Only the type grammar is covered. Every named reference keeps the byte
//! span it occupies in the original text, so callers can rewrite exactly
//! those spans and leave everything else untouched.

use sr_core::naming::is_exported;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;

/// Predeclared Go types. They never need an import or relocation.
const BUILTINS: &[&str] = &[
    "any",
    "bool",
    "byte",
    "comparable",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSyntaxError {
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for TypeSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for TypeSyntaxError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tok {
    Ident(String),
    /// Number, string, raw string or rune literal, as written.
    Lit(String),
    Punct(char),
    Ellipsis,
    Arrow,
    /// Explicit `;` or one inserted at a line break.
    Semi,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub tok: Tok,
    pub span: Range<usize>,
}

/// Split type text into tokens, inserting semicolons at line ends the way
/// the Go scanner does.
pub fn tokenize(text: &str) -> Result<Vec<Token>, TypeSyntaxError> {
    let bytes = text.as_bytes();
    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;

    let needs_semi = |tokens: &[Token]| {
        matches!(
            tokens.last().map(|t| &t.tok),
            Some(Tok::Ident(_) | Tok::Lit(_) | Tok::Punct(')' | ']' | '}'))
        )
    };

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b'\n' => {
                if needs_semi(&tokens) {
                    tokens.push(Token {
                        tok: Tok::Semi,
                        span: i..i + 1,
                    });
                }
                i += 1;
            }
            b' ' | b'\t' | b'\r' => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = text[i + 2..].find("*/").ok_or_else(|| TypeSyntaxError {
                    offset: i,
                    message: "unterminated comment".into(),
                })?;
                i += end + 4;
            }
            b'"' | b'`' | b'\'' => {
                let start = i;
                i += 1;
                loop {
                    match bytes.get(i) {
                        None => {
                            return Err(TypeSyntaxError {
                                offset: start,
                                message: "unterminated literal".into(),
                            });
                        }
                        Some(b'\\') if c != b'`' => i += 2,
                        Some(&b) if b == c => {
                            i += 1;
                            break;
                        }
                        Some(_) => i += 1,
                    }
                }
                tokens.push(Token {
                    tok: Tok::Lit(text[start..i].to_string()),
                    span: start..i,
                });
            }
            b'.' if text[i..].starts_with("...") => {
                tokens.push(Token {
                    tok: Tok::Ellipsis,
                    span: i..i + 3,
                });
                i += 3;
            }
            b'<' if bytes.get(i + 1) == Some(&b'-') => {
                tokens.push(Token {
                    tok: Tok::Arrow,
                    span: i..i + 2,
                });
                i += 2;
            }
            b'0'..=b'9' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'_' | b'.')) {
                    i += 1;
                }
                tokens.push(Token {
                    tok: Tok::Lit(text[start..i].to_string()),
                    span: start..i,
                });
            }
            _ if c == b'_' || c.is_ascii_alphabetic() || c >= 0x80 => {
                let start = i;
                let rest = &text[i..];
                let len = rest
                    .char_indices()
                    .find(|(_, ch)| !(ch.is_alphanumeric() || *ch == '_'))
                    .map_or(rest.len(), |(n, _)| n);
                if len == 0 {
                    return Err(TypeSyntaxError {
                        offset: i,
                        message: "unexpected character".into(),
                    });
                }
                i += len;
                tokens.push(Token {
                    tok: Tok::Ident(text[start..i].to_string()),
                    span: start..i,
                });
            }
            b';' => {
                tokens.push(Token {
                    tok: Tok::Semi,
                    span: i..i + 1,
                });
                i += 1;
            }
            b'*' | b'[' | b']' | b'(' | b')' | b'{' | b'}' | b',' | b'.' | b'|' | b'~' | b'='
            | b'+' | b'-' | b'/' | b'%' | b'&' | b'^' | b'!' | b'<' | b'>' | b':' => {
                tokens.push(Token {
                    tok: Tok::Punct(char::from(c)),
                    span: i..i + 1,
                });
                i += 1;
            }
            _ => {
                return Err(TypeSyntaxError {
                    offset: i,
                    message: format!("unexpected character `{}`", char::from(c)),
                });
            }
        }
    }
    Ok(tokens)
}

/// A reference to a named type, e.g. `model.User` or `Item`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Package alias for qualified references.
    pub scope: Option<String>,
    pub name: String,
    /// Span of `scope.name` in the parsed text.
    pub span: Range<usize>,
}

impl TypeRef {
    /// Qualified references and exported bare names may need an import or
    /// relocation; lower-case bare names and builtins never do.
    pub fn is_candidate(&self) -> bool {
        self.scope.is_some() || (is_exported(&self.name) && !is_builtin(&self.name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub names: Vec<String>,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FuncType {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    /// Empty for embedded fields.
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceElem {
    Method { name: String, signature: FuncType },
    Embedded(TypeExpr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Builtin(String),
    Named {
        reference: TypeRef,
        args: Vec<TypeExpr>,
    },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array {
        len: String,
        elem: Box<TypeExpr>,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<TypeExpr>,
    },
    Variadic(Box<TypeExpr>),
    Func(FuncType),
    Struct(Vec<StructField>),
    Interface(Vec<InterfaceElem>),
    /// Constraint union inside an interface, `~` markers dropped.
    Union(Vec<TypeExpr>),
    Paren(Box<TypeExpr>),
}

impl TypeExpr {
    /// Every named reference, in source order.
    pub fn references(&self) -> Vec<&TypeRef> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    /// References that may need an import or relocation.
    pub fn candidates(&self) -> Vec<&TypeRef> {
        self.references()
            .into_iter()
            .filter(|r| r.is_candidate())
            .collect()
    }

    fn collect_refs<'a>(&'a self, out: &mut Vec<&'a TypeRef>) {
        match self {
            Self::Builtin(_) => {}
            Self::Named { reference, args } => {
                out.push(reference);
                for arg in args {
                    arg.collect_refs(out);
                }
            }
            Self::Pointer(inner)
            | Self::Slice(inner)
            | Self::Variadic(inner)
            | Self::Paren(inner)
            | Self::Array { elem: inner, .. }
            | Self::Chan { elem: inner, .. } => inner.collect_refs(out),
            Self::Map { key, value } => {
                key.collect_refs(out);
                value.collect_refs(out);
            }
            Self::Func(func) => func.collect_refs(out),
            Self::Struct(fields) => {
                for field in fields {
                    field.ty.collect_refs(out);
                }
            }
            Self::Interface(elems) => {
                for elem in elems {
                    match elem {
                        InterfaceElem::Method { signature, .. } => signature.collect_refs(out),
                        InterfaceElem::Embedded(ty) => ty.collect_refs(out),
                    }
                }
            }
            Self::Union(terms) => {
                for term in terms {
                    term.collect_refs(out);
                }
            }
        }
    }
}

impl FuncType {
    fn collect_refs<'a>(&'a self, out: &mut Vec<&'a TypeRef>) {
        for p in self.params.iter().chain(&self.results) {
            p.ty.collect_refs(out);
        }
    }
}

/// Whether a type expression references anything that may need an import or
/// relocation. Unparsable text counts as custom so the resolver reports it.
pub fn has_custom_type(text: &str) -> bool {
    parse_type(text).map_or(true, |ty| !ty.candidates().is_empty())
}

/// Package qualifiers used anywhere in `text`, e.g. `time` for `time.Time`.
///
/// Works on whole Go declarations and function bodies as well as on type
/// expressions, since it only looks at `ident . ident` token runs.
pub fn qualifiers(text: &str) -> Result<BTreeSet<String>, TypeSyntaxError> {
    let tokens = tokenize(text)?;
    let mut out = BTreeSet::new();
    for (i, window) in tokens.windows(3).enumerate() {
        if let [
            Token {
                tok: Tok::Ident(scope),
                ..
            },
            Token {
                tok: Tok::Punct('.'),
                ..
            },
            Token {
                tok: Tok::Ident(_), ..
            },
        ] = window
        {
            let after_dot = i > 0 && tokens[i - 1].tok == Tok::Punct('.');
            if !after_dot {
                out.insert(scope.clone());
            }
        }
    }
    Ok(out)
}

/// Parse a complete Go type expression.
pub fn parse_type(text: &str) -> Result<TypeExpr, TypeSyntaxError> {
    let mut parser = Parser {
        text,
        tokens: tokenize(text)?,
        pos: 0,
    };
    parser.skip_semis();
    let ty = parser.parse_type()?;
    parser.skip_semis();
    if parser.pos < parser.tokens.len() {
        return Err(parser.error("unexpected token after type"));
    }
    Ok(ty)
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + n).map(|t| &t.tok)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn is_punct(&self, c: char) -> bool {
        self.peek() == Some(&Tok::Punct(c))
    }

    fn skip_semis(&mut self) {
        while self.peek() == Some(&Tok::Semi) {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> TypeSyntaxError {
        let offset = self
            .tokens
            .get(self.pos)
            .map_or(self.text.len(), |t| t.span.start);
        TypeSyntaxError {
            offset,
            message: message.to_string(),
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<Token, TypeSyntaxError> {
        if self.is_punct(c) {
            if let Some(tok) = self.bump() {
                return Ok(tok);
            }
        }
        Err(self.error(&format!("expected `{c}`")))
    }

    /// Whether the next token can begin a type.
    fn starts_type(&self) -> bool {
        matches!(
            self.peek(),
            Some(Tok::Ident(_) | Tok::Punct('*' | '[' | '(') | Tok::Arrow)
        )
    }

    fn parse_type(&mut self) -> Result<TypeExpr, TypeSyntaxError> {
        let Some(tok) = self.bump() else {
            return Err(self.error("expected type"));
        };
        match tok.tok {
            Tok::Punct('*') => Ok(TypeExpr::Pointer(Box::new(self.parse_type()?))),
            Tok::Punct('[') => {
                if self.is_punct(']') {
                    self.pos += 1;
                    return Ok(TypeExpr::Slice(Box::new(self.parse_type()?)));
                }
                let start = tok.span.end;
                let mut depth = 0usize;
                let end = loop {
                    let Some(t) = self.bump() else {
                        return Err(self.error("unterminated array length"));
                    };
                    match t.tok {
                        Tok::Punct('[') => depth += 1,
                        Tok::Punct(']') if depth == 0 => break t.span.start,
                        Tok::Punct(']') => depth -= 1,
                        _ => {}
                    }
                };
                let len = self.text[start..end].trim().to_string();
                Ok(TypeExpr::Array {
                    len,
                    elem: Box::new(self.parse_type()?),
                })
            }
            Tok::Punct('(') => {
                let inner = self.parse_type()?;
                self.expect_punct(')')?;
                Ok(TypeExpr::Paren(Box::new(inner)))
            }
            Tok::Ellipsis => Ok(TypeExpr::Variadic(Box::new(self.parse_type()?))),
            Tok::Arrow => {
                match self.bump() {
                    Some(Token {
                        tok: Tok::Ident(kw),
                        ..
                    }) if kw == "chan" => {}
                    _ => return Err(self.error("expected `chan` after `<-`")),
                }
                Ok(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(self.parse_type()?),
                })
            }
            Tok::Ident(ref name) => match name.as_str() {
                "map" => {
                    self.expect_punct('[')?;
                    let key = self.parse_type()?;
                    self.expect_punct(']')?;
                    let value = self.parse_type()?;
                    Ok(TypeExpr::Map {
                        key: Box::new(key),
                        value: Box::new(value),
                    })
                }
                "chan" => {
                    let dir = if self.peek() == Some(&Tok::Arrow) {
                        self.pos += 1;
                        ChanDir::Send
                    } else {
                        ChanDir::Both
                    };
                    Ok(TypeExpr::Chan {
                        dir,
                        elem: Box::new(self.parse_type()?),
                    })
                }
                "func" => Ok(TypeExpr::Func(self.parse_signature()?)),
                "struct" => Ok(TypeExpr::Struct(self.parse_struct_body()?)),
                "interface" => Ok(TypeExpr::Interface(self.parse_interface_body()?)),
                _ => self.parse_named(&tok),
            },
            _ => {
                self.pos -= 1;
                Err(self.error("expected type"))
            }
        }
    }

    fn parse_named(&mut self, first: &Token) -> Result<TypeExpr, TypeSyntaxError> {
        let Tok::Ident(first_name) = &first.tok else {
            return Err(self.error("expected type name"));
        };
        let start = first.span.start;
        let mut end = first.span.end;
        let mut scope = None;
        let mut name = first_name.clone();
        if self.is_punct('.')
            && let Some(Tok::Ident(second)) = self.peek_at(1)
        {
            scope = Some(name);
            name = second.clone();
            end = self.tokens[self.pos + 1].span.end;
            self.pos += 2;
        }

        let mut args = Vec::new();
        if self.is_punct('[') && self.peek_at(1) != Some(&Tok::Punct(']')) {
            self.pos += 1;
            loop {
                args.push(self.parse_type()?);
                if self.is_punct(',') {
                    self.pos += 1;
                    if self.is_punct(']') {
                        self.pos += 1;
                        break;
                    }
                    continue;
                }
                self.expect_punct(']')?;
                break;
            }
        }

        if scope.is_none() && args.is_empty() && is_builtin(&name) {
            return Ok(TypeExpr::Builtin(name));
        }
        Ok(TypeExpr::Named {
            reference: TypeRef {
                scope,
                name,
                span: start..end,
            },
            args,
        })
    }

    fn parse_signature(&mut self) -> Result<FuncType, TypeSyntaxError> {
        self.expect_punct('(')?;
        let params = self.parse_params()?;
        let results = if self.is_punct('(') {
            self.pos += 1;
            self.parse_params()?
        } else if self.starts_type() {
            vec![Param {
                names: Vec::new(),
                ty: self.parse_type()?,
            }]
        } else {
            Vec::new()
        };
        Ok(FuncType { params, results })
    }

    /// Parameter list after the opening parenthesis, through the closing one.
    ///
    /// `(a, b int)` groups names; `(int, string)` is all types. A lone
    /// identifier is a name only when some entry in the list has both.
    fn parse_params(&mut self) -> Result<Vec<Param>, TypeSyntaxError> {
        enum Entry {
            Lone(Token),
            Named(String, TypeExpr),
            Type(TypeExpr),
        }

        let mut entries = Vec::new();
        loop {
            self.skip_semis();
            if self.is_punct(')') {
                self.pos += 1;
                break;
            }
            let entry = match (self.peek(), self.peek_at(1)) {
                (Some(Tok::Ident(_)), Some(Tok::Punct(',' | ')'))) => {
                    let tok = self.bump().ok_or_else(|| self.error("expected parameter"))?;
                    Entry::Lone(tok)
                }
                (Some(Tok::Ident(name)), Some(next))
                    if !matches!(next, Tok::Punct('.'))
                        && !is_type_keyword(name)
                        && (matches!(
                            next,
                            Tok::Ident(_) | Tok::Punct('*' | '[' | '(') | Tok::Arrow | Tok::Ellipsis
                        )) =>
                {
                    let name = name.clone();
                    self.pos += 1;
                    Entry::Named(name, self.parse_type()?)
                }
                _ => Entry::Type(self.parse_type()?),
            };
            entries.push(entry);
            self.skip_semis();
            if self.is_punct(',') {
                self.pos += 1;
            } else if !self.is_punct(')') {
                return Err(self.error("expected `,` or `)`"));
            }
        }

        let has_names = entries.iter().any(|e| matches!(e, Entry::Named(..)));
        let mut params = Vec::new();
        let mut pending = Vec::new();
        for entry in entries {
            match entry {
                Entry::Lone(tok) if has_names => {
                    if let Tok::Ident(name) = tok.tok {
                        pending.push(name);
                    }
                }
                Entry::Lone(tok) => {
                    let ty = self.parse_named(&tok)?;
                    params.push(Param {
                        names: Vec::new(),
                        ty,
                    });
                }
                Entry::Named(name, ty) => {
                    pending.push(name);
                    params.push(Param {
                        names: std::mem::take(&mut pending),
                        ty,
                    });
                }
                Entry::Type(ty) => params.push(Param {
                    names: Vec::new(),
                    ty,
                }),
            }
        }
        if !pending.is_empty() {
            return Err(self.error("parameter names without a type"));
        }
        Ok(params)
    }

    fn parse_struct_body(&mut self) -> Result<Vec<StructField>, TypeSyntaxError> {
        self.expect_punct('{')?;
        let mut fields = Vec::new();
        loop {
            self.skip_semis();
            if self.is_punct('}') {
                self.pos += 1;
                break;
            }
            let mut names = Vec::new();
            if let Some(Tok::Ident(first)) = self.peek() {
                let first = first.clone();
                match self.peek_at(1) {
                    Some(Tok::Punct(',')) => {
                        names.push(first);
                        self.pos += 1;
                        while self.is_punct(',') {
                            self.pos += 1;
                            match self.bump() {
                                Some(Token {
                                    tok: Tok::Ident(n), ..
                                }) => names.push(n),
                                _ => return Err(self.error("expected field name")),
                            }
                        }
                    }
                    Some(Tok::Ident(_) | Tok::Punct('*' | '[' | '(') | Tok::Arrow)
                        if !is_type_keyword(&first) =>
                    {
                        names.push(first);
                        self.pos += 1;
                    }
                    _ => {}
                }
            }
            let ty = self.parse_type()?;
            let tag = match self.peek() {
                Some(Tok::Lit(lit)) => {
                    let lit = lit.clone();
                    self.pos += 1;
                    Some(lit)
                }
                _ => None,
            };
            fields.push(StructField { names, ty, tag });
            if !matches!(self.peek(), Some(Tok::Semi | Tok::Punct('}'))) {
                return Err(self.error("expected `;` or `}` after field"));
            }
        }
        Ok(fields)
    }

    fn parse_interface_body(&mut self) -> Result<Vec<InterfaceElem>, TypeSyntaxError> {
        self.expect_punct('{')?;
        let mut elems = Vec::new();
        loop {
            self.skip_semis();
            if self.is_punct('}') {
                self.pos += 1;
                break;
            }
            if let (Some(Tok::Ident(name)), Some(Tok::Punct('('))) = (self.peek(), self.peek_at(1))
            {
                let name = name.clone();
                self.pos += 1;
                let signature = self.parse_signature()?;
                elems.push(InterfaceElem::Method { name, signature });
            } else {
                let mut terms = vec![self.parse_term()?];
                while self.is_punct('|') {
                    self.pos += 1;
                    terms.push(self.parse_term()?);
                }
                let ty = if terms.len() == 1 {
                    terms.remove(0)
                } else {
                    TypeExpr::Union(terms)
                };
                elems.push(InterfaceElem::Embedded(ty));
            }
            if !matches!(self.peek(), Some(Tok::Semi | Tok::Punct('}'))) {
                return Err(self.error("expected `;` or `}` in interface"));
            }
        }
        Ok(elems)
    }

    fn parse_term(&mut self) -> Result<TypeExpr, TypeSyntaxError> {
        if self.is_punct('~') {
            self.pos += 1;
        }
        self.parse_type()
    }
}

fn is_type_keyword(name: &str) -> bool {
    matches!(name, "map" | "chan" | "func" | "struct" | "interface")
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(name) => f.write_str(name),
            Self::Named { reference, args } => {
                if let Some(scope) = &reference.scope {
                    write!(f, "{scope}.")?;
                }
                f.write_str(&reference.name)?;
                if !args.is_empty() {
                    f.write_str("[")?;
                    write_list(f, args)?;
                    f.write_str("]")?;
                }
                Ok(())
            }
            Self::Pointer(inner) => write!(f, "*{inner}"),
            Self::Slice(inner) => write!(f, "[]{inner}"),
            Self::Array { len, elem } => write!(f, "[{len}]{elem}"),
            Self::Map { key, value } => write!(f, "map[{key}]{value}"),
            Self::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {elem}"),
                ChanDir::Send => write!(f, "chan<- {elem}"),
                ChanDir::Recv => write!(f, "<-chan {elem}"),
            },
            Self::Variadic(inner) => write!(f, "...{inner}"),
            Self::Func(func) => write!(f, "func{func}"),
            Self::Struct(fields) => {
                if fields.is_empty() {
                    return f.write_str("struct{}");
                }
                f.write_str("struct { ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if !field.names.is_empty() {
                        write!(f, "{} ", field.names.join(", "))?;
                    }
                    write!(f, "{}", field.ty)?;
                    if let Some(tag) = &field.tag {
                        write!(f, " {tag}")?;
                    }
                }
                f.write_str(" }")
            }
            Self::Interface(elems) => {
                if elems.is_empty() {
                    return f.write_str("interface{}");
                }
                f.write_str("interface { ")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    match elem {
                        InterfaceElem::Method { name, signature } => write!(f, "{name}{signature}")?,
                        InterfaceElem::Embedded(ty) => write!(f, "{ty}")?,
                    }
                }
                f.write_str(" }")
            }
            Self::Union(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{term}")?;
                }
                Ok(())
            }
            Self::Paren(inner) => write!(f, "({inner})"),
        }
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_params(f, &self.params)?;
        f.write_str(")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] if single.names.is_empty() => write!(f, " {}", single.ty),
            results => {
                f.write_str(" (")?;
                write_params(f, results)?;
                f.write_str(")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeExpr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[Param]) -> fmt::Result {
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        if !p.names.is_empty() {
            write!(f, "{} ", p.names.join(", "))?;
        }
        write!(f, "{}", p.ty)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(text: &str) -> Vec<String> {
        parse_type(text)
            .unwrap()
            .candidates()
            .into_iter()
            .map(|r| text[r.span.clone()].to_string())
            .collect()
    }

    #[test]
    fn test_builtins_have_no_candidates() {
        assert!(refs("map[string]int").is_empty());
        assert!(refs("[]*[4]byte").is_empty());
        assert!(refs("interface{}").is_empty());
        assert!(refs("func(ctx int, s ...string) (bool, error)").is_empty());
        assert!(!has_custom_type("chan<- []rune"));
    }

    #[test]
    fn test_lowercase_bare_names_are_not_candidates() {
        let ty = parse_type("[]item").unwrap();
        assert_eq!(ty.references().len(), 1);
        assert!(ty.candidates().is_empty());
    }

    #[test]
    fn test_compound_references_keep_spans() {
        assert_eq!(
            refs("map[model1.A]*model2.B"),
            vec!["model1.A".to_string(), "model2.B".to_string()]
        );
        assert_eq!(refs("[]Item"), vec!["Item".to_string()]);
        assert_eq!(refs("...model.Item"), vec!["model.Item".to_string()]);
        assert_eq!(
            refs("func(ctx context.Context, a, b User) error"),
            vec!["context.Context".to_string(), "User".to_string()]
        );
    }

    #[test]
    fn test_prefix_names_stay_separate() {
        let text = "map[Foo]FooBar";
        let ty = parse_type(text).unwrap();
        let names: Vec<&str> = ty.candidates().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Foo", "FooBar"]);
    }

    #[test]
    fn test_anonymous_struct_and_generics() {
        let text = "struct {\n\tName string `json:\"name\"`\n\tItems []model.Item\n\tmodel.Base\n}";
        assert_eq!(
            refs(text),
            vec!["model.Item".to_string(), "model.Base".to_string()]
        );
        assert_eq!(
            refs("Page[model.User, int]"),
            vec!["Page".to_string(), "model.User".to_string()]
        );
    }

    #[test]
    fn test_display_is_canonical() {
        let ty = parse_type("map[ string ]  []* model.User").unwrap();
        assert_eq!(ty.to_string(), "map[string][]*model.User");
        let ty = parse_type("func(a, b int) (x string, err error)").unwrap();
        assert_eq!(ty.to_string(), "func(a, b int) (x string, err error)");
        let ty = parse_type("<-chan struct{}").unwrap();
        assert_eq!(ty.to_string(), "<-chan struct{}");
    }

    #[test]
    fn test_invalid_type_reports_offset() {
        let err = parse_type("map[string").unwrap_err();
        assert_eq!(err.offset, 10);
        assert!(parse_type("[]int extra").is_err());
        assert!(has_custom_type("map[string"));
    }

    #[test]
    fn test_qualifiers() {
        let q = qualifiers("type A struct {\n\tT time.Time\n\tU m2.User\n}").unwrap();
        assert_eq!(
            q.into_iter().collect::<Vec<_>>(),
            vec!["m2".to_string(), "time".to_string()]
        );
    }
}
