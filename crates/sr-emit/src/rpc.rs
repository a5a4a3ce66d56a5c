//! RPC method conventions shared by every emitter.
//!
//! A remotely callable method takes `context.Context` first and returns
//! `error` last. On the wire, the remaining parameters are `p1..pN` and the
//! remaining results `r1..rN`.

use sr_core::naming::first_upper;
use sr_core::writer::CodeWriter;
use sr_parser::{Field, Function};

pub const CONTEXT_TYPE: &str = "context.Context";
pub const ERROR_TYPE: &str = "error";

/// A method that follows the RPC conventions.
#[derive(Debug, Clone, Copy)]
pub struct RpcMethod<'a> {
    pub function: &'a Function,
    /// Parameters after the context.
    pub params: &'a [Field],
    /// Results before the error.
    pub results: &'a [Field],
}

impl<'a> RpcMethod<'a> {
    /// Check `function`, returning the reason it does not qualify.
    pub fn check(function: &'a Function) -> Result<Self, String> {
        match function.params.first() {
            Some(first) if first.ty == CONTEXT_TYPE => {}
            _ => {
                return Err(format!(
                    "method {} must take {CONTEXT_TYPE} as its first parameter",
                    function.name
                ));
            }
        }
        let Some((last, results)) = function.results.split_last() else {
            return Err(format!("method {} must return {ERROR_TYPE}", function.name));
        };
        if last.ty != ERROR_TYPE {
            return Err(format!(
                "method {} must return {ERROR_TYPE} as its last result",
                function.name
            ));
        }
        Ok(Self {
            function,
            params: &function.params[1..],
            results,
        })
    }

    pub fn name(&self) -> &'a str {
        &self.function.name
    }

    pub fn has_variadic(&self) -> bool {
        self.params.last().is_some_and(Field::is_variadic)
    }
}

/// Wire name of the `i`-th parameter after the context, 0-based.
pub fn param_name(i: usize) -> String {
    format!("p{}", i + 1)
}

/// Wire name of the `i`-th result before the error, 0-based.
pub fn result_name(i: usize) -> String {
    format!("r{}", i + 1)
}

/// Struct field type for a parameter: variadics travel as slices.
pub fn wire_type(rendered: &str) -> String {
    match rendered.strip_prefix("...") {
        Some(elem) => format!("[]{elem}"),
        None => rendered.to_string(),
    }
}

/// `type <name> struct { P1 T `json:"p1"` ... }` for positional values.
///
/// `types` holds the rendered types in order; `name_of` gives the wire name
/// for a position.
pub fn write_wire_struct(
    w: &mut CodeWriter,
    name: &str,
    types: &[String],
    name_of: fn(usize) -> String,
) {
    w.writeln(&format!("type {name} struct {{")).indent();
    for (i, ty) in types.iter().enumerate() {
        let key = name_of(i);
        w.writeln(&format!(
            "{} {} `json:\"{key}\"`",
            first_upper(&key),
            wire_type(ty)
        ));
    }
    w.dedent().writeln("}");
}

/// `if err != nil { return }`
pub fn write_return_on_error(w: &mut CodeWriter) {
    w.writeln("if err != nil {")
        .indent()
        .writeln("return")
        .dedent()
        .writeln("}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use sr_core::SourcePos;
    use sr_parser::Tag;

    fn field(name: &str, ty: &str) -> Field {
        Field {
            name: name.into(),
            ty: ty.into(),
            ty_range: 0..ty.len(),
            pos: SourcePos::new("x.go", 1, 1),
            tag: Tag::default(),
            signature: None,
        }
    }

    fn function(params: Vec<Field>, results: Vec<Field>) -> Function {
        Function {
            name: "Get".into(),
            pos: SourcePos::new("x.go", 1, 1),
            receiver: None,
            params,
            results,
        }
    }

    #[test]
    fn test_check_accepts_conventional_method() {
        let f = function(
            vec![field("ctx", "context.Context"), field("ids", "...int")],
            vec![field("", "string"), field("", "error")],
        );
        let m = RpcMethod::check(&f).unwrap();
        assert_eq!(m.params.len(), 1);
        assert_eq!(m.results.len(), 1);
        assert!(m.has_variadic());
    }

    #[test]
    fn test_check_rejects_missing_context_or_error() {
        let no_ctx = function(vec![field("id", "int")], vec![field("", "error")]);
        assert!(RpcMethod::check(&no_ctx).unwrap_err().contains("first parameter"));
        let no_err = function(vec![field("ctx", "context.Context")], vec![field("", "int")]);
        assert!(RpcMethod::check(&no_err).unwrap_err().contains("last result"));
        let nothing = function(vec![field("ctx", "context.Context")], vec![]);
        assert!(RpcMethod::check(&nothing).is_err());
    }

    #[test]
    fn test_wire_struct() {
        let mut w = CodeWriter::new();
        write_wire_struct(
            &mut w,
            "userGetRequest",
            &["int".to_string(), "...string".to_string()],
            param_name,
        );
        assert_eq!(
            w.finish(),
            "type userGetRequest struct {\n\tP1 int `json:\"p1\"`\n\tP2 []string `json:\"p2\"`\n}\n"
        );
    }
}
