//! `gen listen`: listener registries for the signals of remote targets.
//!
//! A target's `*.listen.go` files declare `I*` interfaces whose methods look
//! like `OnBoom(fun func(ctx context.Context, x int) error)`. For each one a
//! `listen` subpackage gets a registry that stores callbacks and fans every
//! incoming signal out to them.

use crate::context::GenContext;
use crate::field::FieldResolver;
use crate::imports::{ImportSet, go_file};
use crate::rpc::{CONTEXT_TYPE, ERROR_TYPE, param_name, write_return_on_error, write_wire_struct};
use crate::scan::{declaration_files, dir_name, object_of_interface, rpc_interfaces};
use sr_core::generated::Staging;
use sr_core::naming::{first_lower, to_snake_case};
use sr_core::writer::{CodeWriter, go_string_literal};
use sr_core::{GenError, Result};
use sr_parser::extract::sub_dirs;
use sr_parser::{Field, Function, InterfaceType, SourceFile};
use std::path::Path;

pub const LISTEN_SUFFIX: &str = ".listen.go";
const LISTEN_DIR: &str = "listen";
const REGISTRY_FILE: &str = "listen.go";
const REGISTRAR_PREFIX: &str = "On";

/// One `OnX` registrar, validated.
struct Registrar<'a> {
    /// Signal name, `X`.
    signal: &'a str,
    /// Callback parameters after the context.
    params: &'a [Field],
}

impl<'a> Registrar<'a> {
    fn check(function: &'a Function) -> Result<Self> {
        let invalid = |pos, message: &str| GenError::declaration(pos, message.to_string());
        let signal = function
            .name
            .strip_prefix(REGISTRAR_PREFIX)
            .filter(|rest| !rest.is_empty())
            .ok_or_else(|| invalid(&function.pos, "listen method name must start with On"))?;
        let [callback] = function.params.as_slice() else {
            return Err(invalid(&function.pos, "listen method must take exactly one callback"));
        };
        if !function.results.is_empty() {
            return Err(invalid(&function.pos, "listen method must not return values"));
        }
        let signature = callback
            .signature
            .as_ref()
            .ok_or_else(|| invalid(&callback.pos, "listen callback must be a function type"))?;
        match signature.params.first() {
            Some(first) if first.ty == CONTEXT_TYPE => {}
            _ => {
                return Err(invalid(
                    &signature.pos,
                    "listen callback must take context.Context first",
                ));
            }
        }
        match signature.results.as_slice() {
            [only] if only.ty == ERROR_TYPE => {}
            _ => {
                return Err(invalid(
                    &signature.pos,
                    "listen callback must return only error",
                ));
            }
        }
        Ok(Self {
            signal,
            params: &signature.params[1..],
        })
    }

    fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(Field::is_variadic)
    }
}

pub fn generate_listen(ctx: &GenContext, staging: &mut Staging) -> Result<()> {
    let mut listened = Vec::new();
    for dir in sub_dirs(&ctx.project.services_dir())? {
        let Some(target) = dir_name(&dir) else {
            continue;
        };
        if generate_target(ctx, &dir, &target, staging)? {
            listened.push(target);
        }
    }

    let registry = ctx.project.srpc_dir().join(REGISTRY_FILE);
    staging.own_file(&registry);
    let mut body = CodeWriter::new();
    if !listened.is_empty() {
        body.writeln("import (").indent();
        for target in &listened {
            let path = format!("{}/{LISTEN_DIR}", ctx.project.service_package(target));
            body.writeln(&format!("_ {}", go_string_literal(&path)));
        }
        body.dedent().writeln(")");
    }
    staging.add(registry, go_file("srpc", &ImportSet::new(), &body.finish()));
    Ok(())
}

/// Stage one target's listeners. Returns whether it has any.
fn generate_target(ctx: &GenContext, dir: &Path, target: &str, staging: &mut Staging) -> Result<bool> {
    let out_dir = dir.join(LISTEN_DIR);
    staging.own_dir(&out_dir);

    let files = declaration_files(dir, |name| name.ends_with(LISTEN_SUFFIX))?;
    let interfaces = rpc_interfaces(&files);
    if interfaces.is_empty() {
        return Ok(false);
    }

    let target_package = ctx.project.service_package(target);
    let package = format!("{target_package}/{LISTEN_DIR}");
    for (file, it) in interfaces {
        let object = object_of_interface(&it.name).unwrap_or(&it.name);
        let mut fields = FieldResolver::new(ctx, package.as_str());
        let content = listener_file(ctx, &mut fields, target, &target_package, file, it)?;
        staging.add(out_dir.join(format!("{}.go", to_snake_case(object))), content);
    }
    tracing::debug!(remote = %target, "generated listeners");
    Ok(true)
}

fn listener_file(
    ctx: &GenContext,
    fields: &mut FieldResolver<'_>,
    target: &str,
    target_package: &str,
    file: &SourceFile,
    it: &InterfaceType,
) -> Result<String> {
    let object = object_of_interface(&it.name).unwrap_or(&it.name);
    let registrars = it
        .methods
        .iter()
        .map(Registrar::check)
        .collect::<Result<Vec<_>>>()?;

    let mut imports = ImportSet::new();
    imports.add_path("context");
    imports.add_path("encoding/json");
    imports.add_path(&ctx.config.runtime.garray_import);
    imports.add_path(&ctx.project.manager_import());
    imports.add(target, target_package);

    let mut types = Vec::with_capacity(registrars.len());
    for registrar in &registrars {
        let mut rendered = Vec::with_capacity(registrar.params.len());
        for param in registrar.params {
            rendered.push(fields.resolve(file, param)?.to_string());
            fields.collect_imports(param, &mut imports)?;
        }
        types.push(rendered);
    }

    let lower = first_lower(object);
    let listener = format!("l{object}");
    let action = |signal: &str| format!("{target}@{object}.{signal}");
    let funcs = |signal: &str| format!("{lower}{signal}Funcs");
    let mut w = CodeWriter::new();

    w.writeln("func init() {").indent();
    for registrar in &registrars {
        w.writeln(&format!(
            "manager.AddListenName({})",
            go_string_literal(&action(registrar.signal))
        ));
    }
    w.empty_line();
    w.writeln(&format!("listen := &{listener}{{}}"));
    w.writeln(&format!("{target}.Register{object}(listen)"));
    for (registrar, params) in registrars.iter().zip(&types) {
        w.writeln(&format!(
            "manager.AddController({}, func(ctx context.Context, req []byte) (res interface{{}}, err error) {{",
            go_string_literal(&action(registrar.signal))
        ))
        .indent();
        if !params.is_empty() {
            w.writeln(&format!("var params *{lower}{}Request", registrar.signal));
            w.writeln("err = json.Unmarshal(req, &params)");
            write_return_on_error(&mut w);
        }
        let mut call = format!("err = listen.{}(ctx", first_lower(registrar.signal));
        for i in 0..params.len() {
            call.push_str(&format!(", params.P{}", i + 1));
        }
        if registrar.is_variadic() {
            call.push_str("...");
        }
        call.push(')');
        w.writeln(&call);
        write_return_on_error(&mut w);
        w.writeln("res = map[string]interface{}{}");
        w.writeln("return");
        w.dedent().writeln("})");
    }
    w.dedent().writeln("}");

    for (registrar, params) in registrars.iter().zip(&types) {
        if !params.is_empty() {
            w.empty_line();
            let request = format!("{lower}{}Request", registrar.signal);
            write_wire_struct(&mut w, &request, params, param_name);
        }
    }

    w.empty_line();
    for registrar in &registrars {
        w.writeln(&format!("var {} = garray.New(true)", funcs(registrar.signal)));
    }
    w.empty_line();
    w.writeln(&format!("type {listener} struct{{}}"));

    for (registrar, params) in registrars.iter().zip(&types) {
        let named = named_params(params);
        let callback = format!("func({}) error", named.join(", "));

        w.empty_line();
        w.writeln(&format!(
            "func (l *{listener}) {REGISTRAR_PREFIX}{}(fun {callback}) {{",
            registrar.signal
        ))
        .indent();
        w.writeln(&format!("{}.Append(fun)", funcs(registrar.signal)));
        w.dedent().writeln("}");
    }

    for (registrar, params) in registrars.iter().zip(&types) {
        let named = named_params(params);
        let mut bare = vec![CONTEXT_TYPE.to_string()];
        bare.extend(params.iter().cloned());
        let mut args = vec!["ctx".to_string()];
        args.extend((0..params.len()).map(param_name));
        if registrar.is_variadic()
            && let Some(last) = args.last_mut()
        {
            last.push_str("...");
        }
        let array = funcs(registrar.signal);

        w.empty_line();
        w.writeln(&format!(
            "func (l *{listener}) {}({}) (err error) {{",
            first_lower(registrar.signal),
            named.join(", ")
        ))
        .indent();
        w.writeln(&format!("if {array}.Len() == 0 {{"))
            .indent()
            .writeln("return")
            .dedent()
            .writeln("}");
        w.writeln(&format!("{array}.RLockFunc(func(array []interface{{}}) {{"))
            .indent();
        w.writeln("for _, v := range array {").indent();
        w.writeln(&format!("fun := v.(func({}) error)", bare.join(", ")));
        w.writeln(&format!("err = fun({})", args.join(", ")));
        write_return_on_error(&mut w);
        w.dedent().writeln("}");
        w.dedent().writeln("})");
        w.writeln("return");
        w.dedent().writeln("}");
    }

    let body = w.finish();
    imports.retain_used(&body);
    Ok(go_file(LISTEN_DIR, &imports, &body))
}

/// `ctx context.Context, p1 T1, ...` for rendered callback parameter types.
fn named_params(types: &[String]) -> Vec<String> {
    let mut out = vec![format!("ctx {CONTEXT_TYPE}")];
    out.extend(
        types
            .iter()
            .enumerate()
            .map(|(i, ty)| format!("{} {ty}", param_name(i))),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_params() {
        let types = vec!["int".to_string(), "...string".to_string()];
        assert_eq!(
            named_params(&types),
            vec!["ctx context.Context", "p1 int", "p2 ...string"]
        );
    }
}
