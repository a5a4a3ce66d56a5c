//! Helper metadata: built from declarations and written as Go literals that
//! the runtime serves through `Helper.list`.

use crate::field::FieldResolver;
use crate::rpc::param_name;
use sr_core::Result;
use sr_core::meta::{FieldMeta, FunctionMeta, ObjectMeta, TypeMeta};
use sr_core::naming::first_lower;
use sr_core::writer::{CodeWriter, go_string_literal};
use sr_parser::{Function, SourceFile};

/// Metadata for one RPC object. Every method comes with the file it is
/// declared in, since methods of one struct may span files.
pub fn object_meta(
    fields: &mut FieldResolver<'_>,
    name: &str,
    kind: &str,
    methods: &[(&SourceFile, &Function)],
) -> Result<ObjectMeta> {
    let mut functions = Vec::with_capacity(methods.len());
    for (file, function) in methods {
        let mut parameters = Vec::with_capacity(function.params.len());
        for (i, param) in function.params.iter().enumerate() {
            let name = match (i, param.name.as_str()) {
                (_, n) if !n.is_empty() && n != "_" => n.to_string(),
                (0, _) => "ctx".to_string(),
                (i, _) => param_name(i - 1),
            };
            parameters.push(fields.field_meta(file, &name, param)?);
        }
        let mut results = Vec::with_capacity(function.results.len());
        for result in &function.results {
            let name = if result.name == "_" { "" } else { result.name.as_str() };
            results.push(fields.field_meta(file, name, result)?);
        }
        functions.push(FunctionMeta {
            name: function.name.clone(),
            parameters,
            results,
        });
    }
    Ok(ObjectMeta {
        name: name.to_string(),
        kind: kind.to_string(),
        functions,
    })
}

/// Name of the generated helper variable for an object.
pub fn helper_var(object: &str) -> String {
    format!("{}Helper", first_lower(object))
}

/// `var <object>Helper = meta.ObjectMeta{...}`
pub fn write_helper(w: &mut CodeWriter, object: &ObjectMeta) {
    w.writeln(&format!("var {} = meta.ObjectMeta{{", helper_var(&object.name)))
        .indent();
    w.writeln(&format!("Name: {},", go_string_literal(&object.name)));
    w.writeln(&format!("Kind: {},", go_string_literal(&object.kind)));
    w.writeln("Functions: []*meta.FunctionMeta{").indent();
    for function in &object.functions {
        w.writeln("{").indent();
        w.writeln(&format!("Name: {},", go_string_literal(&function.name)));
        write_fields(w, "Parameters", &function.parameters);
        write_fields(w, "Results", &function.results);
        w.dedent().writeln("},");
    }
    w.dedent().writeln("},");
    w.dedent().writeln("}");
}

fn write_fields(w: &mut CodeWriter, key: &str, fields: &[FieldMeta]) {
    if fields.is_empty() {
        return;
    }
    w.writeln(&format!("{key}: []*meta.FieldMeta{{")).indent();
    for field in fields {
        w.writeln("{").indent();
        w.writeln(&format!("Name: {},", go_string_literal(&field.name)));
        w.writeln(&format!("Type: {},", go_string_literal(&field.ty)));
        if !field.types.is_empty() {
            w.writeln("Types: []*meta.TypeMeta{").indent();
            for ty in &field.types {
                write_type(w, ty);
            }
            w.dedent().writeln("},");
        }
        w.dedent().writeln("},");
    }
    w.dedent().writeln("},");
}

fn write_type(w: &mut CodeWriter, ty: &TypeMeta) {
    w.writeln("{").indent();
    w.writeln(&format!("Id: {},", go_string_literal(&ty.id)));
    w.writeln(&format!("Name: {},", go_string_literal(&ty.name)));
    w.writeln(&format!("From: {},", go_string_literal(&ty.from)));
    if let Some(code) = ty.code() {
        w.writeln(&format!("Code: {},", go_string_literal(code)));
    }
    if let Some(import) = ty.import() {
        w.writeln("Import: &meta.ImportMeta{").indent();
        w.writeln(&format!("Path: {},", go_string_literal(&import.path)));
        w.writeln(&format!("Alias: {},", go_string_literal(&import.alias)));
        w.dedent().writeln("},");
    }
    w.dedent().writeln("},");
}

/// Go signature text of a helper function, e.g. `Get(ctx context.Context,
/// id int) (*model.User, error)`. `render` turns a field into its type.
pub fn signature_text(
    function: &FunctionMeta,
    mut render: impl FnMut(&FieldMeta) -> Result<String>,
) -> Result<String> {
    let params = parameters_text(function, &mut render)?;

    let named = function.results.iter().all(|r| !r.name.is_empty());
    let mut results = Vec::with_capacity(function.results.len());
    for r in &function.results {
        let ty = render(r)?;
        results.push(if named { format!("{} {ty}", r.name) } else { ty });
    }
    let results = match results.as_slice() {
        [] => String::new(),
        [single] if !named => format!(" {single}"),
        _ => format!(" ({})", results.join(", ")),
    };
    Ok(format!("{}({params}){results}", function.name))
}

/// Named parameter list without parentheses. Unnamed parameters get the
/// positional names the generated code uses.
pub fn parameters_text(
    function: &FunctionMeta,
    mut render: impl FnMut(&FieldMeta) -> Result<String>,
) -> Result<String> {
    let mut params = Vec::with_capacity(function.parameters.len());
    for (i, p) in function.parameters.iter().enumerate() {
        let name = match (i, p.name.as_str()) {
            (_, n) if !n.is_empty() => n.to_string(),
            (0, _) => "ctx".to_string(),
            (i, _) => param_name(i - 1),
        };
        params.push(format!("{name} {}", render(p)?));
    }
    Ok(params.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, ty: &str) -> FieldMeta {
        FieldMeta {
            name: name.into(),
            ty: ty.into(),
            types: Vec::new(),
        }
    }

    #[test]
    fn test_signature_text() {
        let f = FunctionMeta {
            name: "Get".into(),
            parameters: vec![field("ctx", "context.Context"), field("id", "int")],
            results: vec![field("r1", "string"), field("err", "error")],
        };
        let text = signature_text(&f, |p| Ok(p.ty.clone())).unwrap();
        assert_eq!(
            text,
            "Get(ctx context.Context, id int) (r1 string, err error)"
        );

        let g = FunctionMeta {
            name: "Ping".into(),
            parameters: vec![field("", "context.Context")],
            results: vec![field("", "error")],
        };
        assert_eq!(
            signature_text(&g, |p| Ok(p.ty.clone())).unwrap(),
            "Ping(ctx context.Context) error"
        );
    }

    #[test]
    fn test_write_helper_literal() {
        let object = ObjectMeta {
            name: "User".into(),
            kind: "slot".into(),
            functions: vec![FunctionMeta {
                name: "Ping".into(),
                parameters: vec![field("ctx", "{{c1}}")],
                results: vec![],
            }],
        };
        let mut w = CodeWriter::new();
        write_helper(&mut w, &object);
        let out = w.finish();
        assert!(out.starts_with("var userHelper = meta.ObjectMeta{\n\tName: \"User\",\n"));
        assert!(out.contains("\t\t\tParameters: []*meta.FieldMeta{\n"));
        assert!(out.contains("Type: \"{{c1}}\","));
        assert!(!out.contains("Results"));
        assert!(out.ends_with("\t},\n}\n"));
    }
}
