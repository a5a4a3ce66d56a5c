//! Materializing helper metadata fetched from a remote service.
//!
//! `sr get` turns a target's slot or signal metadata into local declaration
//! files under `internal/srpc/service/<target>`, which `gen call` and
//! `gen listen` then read like hand-written ones. Relocated types land in
//! that directory's `model.go`, merged with whatever earlier fetches put
//! there.

use crate::call::CALL_SUFFIX;
use crate::context::GenContext;
use crate::helper::{parameters_text, signature_text};
use crate::imports::{ImportSet, go_file};
use crate::listen::LISTEN_SUFFIX;
use crate::template::substitute;
use sr_core::generated::{Staging, is_generated};
use sr_core::meta::{FieldMeta, ImportMeta, ObjectMeta, TypeSource};
use sr_core::naming::{last_segment, to_snake_case};
use sr_core::writer::{CodeWriter, go_string_literal};
use sr_core::{GenError, Result};
use sr_parser::{PackageModel, parse_file};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

pub const MODEL_FILE: &str = "model.go";

/// Declarations relocated into one target package, plus the imports their
/// code may need.
#[derive(Debug, Default)]
struct Fetched {
    /// Type name to (descriptor id, rendered declaration).
    types: BTreeMap<String, (String, String)>,
    imports: Vec<ImportMeta>,
}

impl Fetched {
    fn collect(&mut self, object: &ObjectMeta, package: &str) -> Result<()> {
        for field in fields_of(object) {
            for ty in &field.types {
                match &ty.source {
                    TypeSource::Relocated { code } => {
                        let code = substitute(code, &field.types, package)?;
                        if let Some((id, _)) = self.types.get(&ty.name)
                            && *id != ty.id
                        {
                            tracing::warn!(
                                name = %ty.name,
                                package,
                                "two fetched types share a name, keeping the last"
                            );
                        }
                        self.types.insert(ty.name.clone(), (ty.id.clone(), code));
                    }
                    TypeSource::Imported(import) => self.imports.push(import.clone()),
                }
            }
        }
        Ok(())
    }
}

fn fields_of(object: &ObjectMeta) -> impl Iterator<Item = &FieldMeta> {
    object
        .functions
        .iter()
        .flat_map(|f| f.parameters.iter().chain(&f.results))
}

/// Copy of `object` with every relocated descriptor moved into `package`.
fn relocated(object: &ObjectMeta, package: &str) -> ObjectMeta {
    let mut object = object.clone();
    for function in &mut object.functions {
        for field in function.parameters.iter_mut().chain(&mut function.results) {
            for ty in &mut field.types {
                ty.relocate_to(package);
            }
        }
    }
    object
}

/// Imports of the descriptors a declaration file refers to.
fn declaration_imports(object: &ObjectMeta) -> ImportSet {
    let mut imports = ImportSet::new();
    for field in fields_of(object) {
        for import in field.types.iter().filter_map(|t| t.import()) {
            imports.add_meta(import);
        }
    }
    imports
}

/// Stage `<snake>.call.go` for each slot object plus the merged `model.go`.
pub fn materialize_call(ctx: &GenContext, target: &str, objects: &[ObjectMeta]) -> Result<Staging> {
    let package = ctx.project.service_package(target);
    let dir = ctx.project.service_dir(target);
    let mut staging = Staging::new();
    let mut fetched = Fetched::default();

    for object in objects {
        let object = relocated(object, &package);
        let mut w = CodeWriter::new();
        w.writeln(&format!("type I{} interface {{", object.name)).indent();
        for function in &object.functions {
            let signature =
                signature_text(function, |field| substitute(&field.ty, &field.types, &package))?;
            w.writeln(&signature);
        }
        w.dedent().writeln("}");

        let body = w.finish();
        let mut imports = declaration_imports(&object);
        imports.retain_used(&body);
        fetched.collect(&object, &package)?;

        let path = dir.join(format!("{}{CALL_SUFFIX}", to_snake_case(&object.name)));
        staging.add(path, go_file(last_segment(&package), &imports, &body));
        tracing::info!(remote = %target, object = %object.name, "fetched call declaration");
    }

    staging.add(dir.join(MODEL_FILE), merge_model(&dir, &package, fetched)?);
    Ok(staging)
}

/// Stage `<snake>.listen.go` for one signal object plus the merged
/// `model.go`.
pub fn materialize_listen(ctx: &GenContext, target: &str, object: &ObjectMeta) -> Result<Staging> {
    let package = ctx.project.service_package(target);
    let dir = ctx.project.service_dir(target);
    let object = relocated(object, &package);
    let name = &object.name;
    let local = format!("local{name}");

    let mut w = CodeWriter::new();
    w.writeln(&format!("type I{name} interface {{")).indent();
    for function in &object.functions {
        let params =
            parameters_text(function, |field| substitute(&field.ty, &field.types, &package))?;
        w.writeln(&format!("On{}(fun func({params}) error)", function.name));
    }
    w.dedent().writeln("}");
    w.empty_line();
    w.writeln(&format!("var {local} I{name}"));
    w.empty_line();
    w.writeln(&format!("func {name}() I{name} {{")).indent();
    w.writeln(&format!("if {local} == nil {{")).indent();
    w.writeln(&format!(
        "panic({})",
        go_string_literal(&format!(
            "implement not found for interface I{name}, forgot register?"
        ))
    ));
    w.dedent().writeln("}");
    w.writeln(&format!("return {local}"));
    w.dedent().writeln("}");
    w.empty_line();
    w.writeln(&format!("func Register{name}(i I{name}) {{")).indent();
    w.writeln(&format!("{local} = i"));
    w.dedent().writeln("}");

    let body = w.finish();
    let mut imports = declaration_imports(&object);
    imports.retain_used(&body);
    let mut fetched = Fetched::default();
    fetched.collect(&object, &package)?;

    let mut staging = Staging::new();
    let path = dir.join(format!("{}{LISTEN_SUFFIX}", to_snake_case(name)));
    staging.add(path, go_file(last_segment(&package), &imports, &body));
    staging.add(dir.join(MODEL_FILE), merge_model(&dir, &package, fetched)?);
    tracing::info!(remote = %target, object = %name, "fetched listen declaration");
    Ok(staging)
}

/// Render `model.go`: the types already there, overridden by name with the
/// fetched ones, sorted by name.
fn merge_model(dir: &Path, package: &str, fetched: Fetched) -> Result<String> {
    let path = dir.join(MODEL_FILE);
    let mut model = PackageModel::default();
    if path.exists() {
        let file = parse_file(&path)?;
        if !is_generated(&file.source) {
            return Err(GenError::WouldOverwrite(path));
        }
        model.add_file(Arc::new(file));
    }

    let mut types: BTreeMap<String, String> = model
        .types
        .into_iter()
        .map(|(name, ty)| (name, ty.content))
        .collect();
    types.extend(fetched.types.into_iter().map(|(name, (_, code))| (name, code)));

    let mut imports = ImportSet::new();
    for (alias, path) in &model.imports {
        imports.add(alias, path);
    }
    for import in &fetched.imports {
        imports.add_meta(import);
    }
    let body = types.into_values().collect::<Vec<_>>().join("\n\n");
    imports.retain_used(&body);
    Ok(go_file(last_segment(package), &imports, &body))
}

/// `ols` lines: `[kind] Name`.
pub fn object_listing(objects: &[ObjectMeta]) -> Vec<String> {
    objects
        .iter()
        .map(|o| format!("[{}] {}", o.kind, o.name))
        .collect()
}

/// `fls` lines: one signature per function, types named the way the
/// declaring service names them.
pub fn function_listing(object: &ObjectMeta) -> Result<Vec<String>> {
    object
        .functions
        .iter()
        .map(|f| signature_text(f, |field| substitute(&field.ty, &field.types, "")))
        .collect()
}
