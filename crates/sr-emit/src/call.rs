//! `gen call`: client stubs for the objects of remote targets.
//!
//! Every `internal/srpc/service/<target>` directory declares the remote
//! objects it uses as `I*` interfaces in `*.call.go` files. The stubs go to
//! `generate.go` in the same directory.

use crate::context::GenContext;
use crate::field::FieldResolver;
use crate::imports::{ImportSet, go_file};
use crate::rpc::{RpcMethod, param_name, result_name, write_return_on_error, write_wire_struct};
use crate::scan::{declaration_files, dir_name, object_of_interface, rpc_interfaces};
use sr_core::generated::Staging;
use sr_core::naming::{first_lower, first_upper, last_segment};
use sr_core::writer::{CodeWriter, go_string_literal};
use sr_core::{GenError, Result};
use sr_parser::extract::sub_dirs;
use sr_parser::{InterfaceType, SourceFile};
use std::path::Path;

pub const CALL_SUFFIX: &str = ".call.go";
const OUTPUT_FILE: &str = "generate.go";

pub fn generate_call(ctx: &GenContext, staging: &mut Staging) -> Result<()> {
    for dir in sub_dirs(&ctx.project.services_dir())? {
        generate_target(ctx, &dir, staging)?;
    }
    Ok(())
}

fn generate_target(ctx: &GenContext, dir: &Path, staging: &mut Staging) -> Result<()> {
    let Some(target) = dir_name(dir) else {
        tracing::warn!(dir = %dir.display(), "service directory is not a Go package name, skipped");
        return Ok(());
    };
    let out = dir.join(OUTPUT_FILE);
    staging.own_file(&out);

    let files = declaration_files(dir, |name| name.ends_with(CALL_SUFFIX))?;
    let interfaces = rpc_interfaces(&files);
    if interfaces.is_empty() {
        return Ok(());
    }

    let package = ctx.project.service_package(&target);
    let mut fields = FieldResolver::new(ctx, package.as_str());
    let mut imports = ImportSet::new();
    imports.add_path("context");
    imports.add_path("encoding/json");
    imports.add_path(&ctx.config.runtime.srpc_import);
    imports.add_path(&ctx.project.service_import());

    let request = Request {
        mark: "srpc.CallMark",
        target: &target,
        results: true,
    };
    let mut body = CodeWriter::new();
    for (file, it) in interfaces {
        write_client(&mut body, &mut fields, &mut imports, file, it, &request)?;
    }
    let body = body.finish();
    imports.retain_used(&body);
    tracing::debug!(remote = %target, "generated call stubs");
    staging.add(out, go_file(last_segment(&package), &imports, &body));
    Ok(())
}

/// How a client stub addresses its remote side.
pub(crate) struct Request<'a> {
    /// `srpc.CallMark` or `srpc.EmitMark`.
    pub mark: &'a str,
    pub target: &'a str,
    /// Whether methods may return values besides the error.
    pub results: bool,
}

/// Client struct, instance and one stub per method for interface `it`.
pub(crate) fn write_client(
    w: &mut CodeWriter,
    fields: &mut FieldResolver<'_>,
    imports: &mut ImportSet,
    file: &SourceFile,
    it: &InterfaceType,
    request: &Request<'_>,
) -> Result<()> {
    let object = object_of_interface(&it.name)
        .ok_or_else(|| GenError::declaration(&it.pos, "interface name must start with I"))?;
    let client = format!("c{object}");
    w.writeln(&format!("type {client} struct{{}}"));
    w.empty_line();
    w.writeln(&format!("var {object} {} = &{client}{{}}", it.name));

    for function in &it.methods {
        let method = RpcMethod::check(function)
            .map_err(|reason| GenError::declaration(&function.pos, reason))?;
        if !request.results && !method.results.is_empty() {
            return Err(GenError::declaration(
                &function.pos,
                format!("signal method {} can only return error", function.name),
            ));
        }
        for field in function.fields() {
            fields.resolve(file, field)?;
            fields.collect_imports(field, imports)?;
        }
        let params = rendered(fields, method.params);
        let results = rendered(fields, method.results);

        let response = format!("{}{}Response", first_lower(object), method.name());
        w.empty_line();
        if !results.is_empty() {
            write_wire_struct(w, &response, &results, result_name);
            w.empty_line();
        }

        let mut signature = format!("func (c *{client}) {}(ctx context.Context", method.name());
        for (i, ty) in params.iter().enumerate() {
            signature.push_str(&format!(", {} {ty}", param_name(i)));
        }
        signature.push_str(") (");
        for (i, ty) in results.iter().enumerate() {
            signature.push_str(&format!("{} {ty}, ", result_name(i)));
        }
        signature.push_str("err error) {");
        w.writeln(&signature).indent();

        w.writeln("data, err := json.Marshal(map[string]interface{}{").indent();
        for i in 0..params.len() {
            let name = param_name(i);
            w.writeln(&format!("\"{name}\": {name},"));
        }
        w.dedent().writeln("})");
        write_return_on_error(w);

        let assign = if results.is_empty() { "_, err = " } else { "res, err := " };
        w.writeln(&format!("{assign}service.Srpc().Request(ctx, srpc.RequestData{{"))
            .indent();
        w.writeln(&format!("Mark:   {},", request.mark));
        w.writeln(&format!("Target: {},", go_string_literal(request.target)));
        w.writeln(&format!(
            "Action: {},",
            go_string_literal(&format!("{object}.{}", method.name()))
        ));
        w.writeln("Data:   data,");
        w.dedent().writeln("})");
        write_return_on_error(w);

        if !results.is_empty() {
            w.writeln(&format!("var rsp *{response}"));
            w.writeln("err = json.Unmarshal(res, &rsp)");
            write_return_on_error(w);
            for i in 0..results.len() {
                let name = result_name(i);
                w.writeln(&format!("{name} = rsp.{}", first_upper(&name)));
            }
        }
        w.writeln("return");
        w.dedent().writeln("}");
    }
    Ok(())
}

/// Rendered types of fields resolved earlier.
pub(crate) fn rendered(fields: &FieldResolver<'_>, list: &[sr_parser::Field]) -> Vec<String> {
    list.iter()
        .map(|f| fields.resolved_type(f).unwrap_or(f.ty.as_str()).to_string())
        .collect()
}
