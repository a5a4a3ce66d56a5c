//! `gen slot`: server-side controllers for the objects this service exposes.
//!
//! Logic packages under `internal/logic` mark structs with an embedded
//! `meta.Slot` (callable by other services) or `meta.Listen` with a
//! `target:"..."` tag (receives a target's signals). Each marked object gets
//! `internal/srpc/slot/<snake>.go`; `slot.go` merges all of them.

use crate::call::rendered;
use crate::context::GenContext;
use crate::field::FieldResolver;
use crate::helper::{helper_var, object_meta, write_helper};
use crate::imports::{ImportSet, go_file};
use crate::rpc::{RpcMethod, param_name, result_name, write_return_on_error, write_wire_struct};
use sr_core::generated::Staging;
use sr_core::meta::KIND_SLOT;
use sr_core::naming::{
    first_lower, first_upper, is_exported, last_segment, object_name, to_snake_case,
};
use sr_core::writer::{CodeWriter, go_string_literal};
use sr_core::{GenError, GenWarning, Result};
use sr_parser::extract::{go_files, sub_dirs};
use sr_parser::{BoundMethod, CombinedStruct, SourceFile, combine_structs, parse_file};

const MERGE_FILE: &str = "slot.go";

const MERGE_MAPS: &str = "// mergeMaps overwrites duplicate keys.
func mergeMaps(maps ...map[string]srpc.ControllerHandle) map[string]srpc.ControllerHandle {
	result := make(map[string]srpc.ControllerHandle)
	for _, m := range maps {
		for k, v := range m {
			result[k] = v
		}
	}
	return result
}
";

/// What a marked struct is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotRole {
    Slot,
    /// Handles signals raised by `target`.
    Listen { target: String },
}

pub fn generate_slot(ctx: &GenContext, staging: &mut Staging) -> Result<()> {
    let out_dir = ctx.project.slot_dir();
    staging.own_dir(&out_dir);
    let package = ctx.project.package_path(&out_dir)?;

    let mut controllers = Vec::new();
    let mut helpers = Vec::new();
    for dir in sub_dirs(&ctx.project.logic_dir())? {
        let files = go_files(&dir)?
            .iter()
            .map(|path| parse_file(path))
            .collect::<Result<Vec<SourceFile>>>()?;
        for combined in combine_structs(&files) {
            let Some(role) = slot_role(ctx, &combined)? else {
                continue;
            };
            let object = object_name(&combined.decl.name);
            let methods = rpc_methods(&combined);
            if methods.is_empty() {
                tracing::debug!(object = %object, "no exported RPC methods, skipped");
                continue;
            }

            let mut fields = FieldResolver::new(ctx, package.as_str());
            let content = object_file(ctx, &mut fields, &object, &role, &methods)?;
            let path = out_dir.join(format!("{}.go", to_snake_case(&object)));
            staging.add(path, content);

            controllers.push(format!("{}Controller", first_lower(&object)));
            if role == SlotRole::Slot {
                helpers.push(helper_var(&object));
            }
        }
    }

    let mut imports = ImportSet::new();
    imports.add_path(&ctx.config.runtime.srpc_import);
    imports.add_path(&ctx.config.runtime.meta_import);
    let mut body = CodeWriter::new();
    body.raw(MERGE_MAPS);
    body.empty_line();
    body.writeln("var Controllers = mergeMaps(").indent();
    for name in &controllers {
        body.writeln(&format!("{name},"));
    }
    body.dedent().writeln(")");
    body.empty_line();
    body.writeln("var Helpers = []meta.ObjectMeta{").indent();
    for name in &helpers {
        body.writeln(&format!("{name},"));
    }
    body.dedent().writeln("}");
    tracing::debug!(objects = controllers.len(), "generated slot controllers");
    staging.add(
        out_dir.join(MERGE_FILE),
        go_file(last_segment(&package), &imports, &body.finish()),
    );
    Ok(())
}

/// Role of a struct, from an embedded `Slot` or `Listen` of the runtime's
/// meta package. A `Listen` without a target tag is an error.
pub fn slot_role(ctx: &GenContext, st: &CombinedStruct<'_>) -> Result<Option<SlotRole>> {
    for field in st.decl.fields.iter().filter(|f| f.is_embedded()) {
        let Some((scope, marker)) = field.ty.split_once('.') else {
            continue;
        };
        let from_runtime = st
            .file
            .lookup_import(scope)
            .is_some_and(|imp| imp.path == ctx.config.runtime.meta_import);
        if !from_runtime {
            continue;
        }
        match marker {
            "Slot" => return Ok(Some(SlotRole::Slot)),
            "Listen" => {
                let target = field.tag.get("target");
                if target.is_empty() {
                    return Err(GenError::declaration(
                        &field.pos,
                        format!("listen struct {} does not set a target tag", st.decl.name),
                    ));
                }
                return Ok(Some(SlotRole::Listen { target }));
            }
            _ => {}
        }
    }
    Ok(None)
}

/// Exported methods following the RPC conventions. Others are skipped with
/// a warning.
fn rpc_methods<'a>(st: &CombinedStruct<'a>) -> Vec<(BoundMethod<'a>, RpcMethod<'a>)> {
    let mut out = Vec::new();
    for bound in &st.methods {
        if !is_exported(&bound.function.name) {
            continue;
        }
        match RpcMethod::check(bound.function) {
            Ok(method) => out.push((*bound, method)),
            Err(reason) => GenWarning::SkippedMethod {
                pos: bound.function.pos.clone(),
                reason: format!("{reason}, skipped"),
            }
            .report(),
        }
    }
    out
}

fn object_file(
    ctx: &GenContext,
    fields: &mut FieldResolver<'_>,
    object: &str,
    role: &SlotRole,
    methods: &[(BoundMethod<'_>, RpcMethod<'_>)],
) -> Result<String> {
    let mut imports = ImportSet::new();
    imports.add_path("context");
    imports.add_path("encoding/json");
    imports.add_path(&ctx.config.runtime.srpc_import);
    imports.add_path(&ctx.config.runtime.meta_import);
    imports.add_path(&ctx.project.service_import());

    let mut rendered_methods = Vec::with_capacity(methods.len());
    for (bound, method) in methods {
        for field in bound.function.fields() {
            fields.resolve(bound.file, field)?;
            fields.collect_imports(field, &mut imports)?;
        }
        rendered_methods.push((
            method,
            rendered(fields, method.params),
            rendered(fields, method.results),
        ));
    }

    let lower = first_lower(object);
    let mut w = CodeWriter::new();
    for (method, params, _) in &rendered_methods {
        if !params.is_empty() {
            let request = format!("{lower}{}Request", method.name());
            write_wire_struct(&mut w, &request, params, param_name);
            w.empty_line();
        }
    }

    w.writeln(&format!(
        "var {lower}Controller = map[string]srpc.ControllerHandle{{"
    ))
    .indent();
    for (method, params, results) in &rendered_methods {
        let action = match role {
            SlotRole::Slot => format!("{object}.{}", method.name()),
            SlotRole::Listen { target } => format!("{target}@{object}.{}", method.name()),
        };
        w.writeln(&format!(
            "{}: func(ctx context.Context, req []byte) (res interface{{}}, err error) {{",
            go_string_literal(&action)
        ))
        .indent();
        if !params.is_empty() {
            w.writeln(&format!("var params *{lower}{}Request", method.name()));
            w.writeln("err = json.Unmarshal(req, &params)");
            write_return_on_error(&mut w);
        }

        let mut call = String::new();
        for i in 0..results.len() {
            call.push_str(&format!("{}, ", result_name(i)));
        }
        call.push_str(if results.is_empty() { "err = " } else { "err := " });
        call.push_str(&format!("service.{object}().{}(ctx", method.name()));
        for i in 0..params.len() {
            call.push_str(&format!(", params.{}", first_upper(&param_name(i))));
        }
        if method.has_variadic() {
            call.push_str("...");
        }
        call.push(')');
        w.writeln(&call);
        write_return_on_error(&mut w);

        w.writeln("res = map[string]interface{}{").indent();
        for i in 0..results.len() {
            let name = result_name(i);
            w.writeln(&format!("\"{name}\": {name},"));
        }
        w.dedent().writeln("}");
        w.writeln("return");
        w.dedent().writeln("},");
    }
    w.dedent().writeln("}");

    if *role == SlotRole::Slot {
        let files: Vec<_> = methods
            .iter()
            .map(|(bound, _)| (bound.file, bound.function))
            .collect();
        let meta = object_meta(fields, object, KIND_SLOT, &files)?;
        w.empty_line();
        write_helper(&mut w, &meta);
    }

    let body = w.finish();
    imports.retain_used(&body);
    Ok(go_file(
        last_segment(fields.target_package()),
        &imports,
        &body,
    ))
}
