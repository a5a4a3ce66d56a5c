//! `gen signal`: emit stubs and helper metadata for the signals this
//! service raises, declared as `I*` interfaces in `internal/srpc/signal`.

use crate::call::{Request, write_client};
use crate::context::GenContext;
use crate::field::FieldResolver;
use crate::helper::{helper_var, object_meta, write_helper};
use crate::imports::{ImportSet, go_file};
use crate::scan::{declaration_files, object_of_interface, rpc_interfaces};
use sr_core::Result;
use sr_core::generated::Staging;
use sr_core::meta::KIND_SIGNAL;
use sr_core::naming::last_segment;
use sr_core::writer::CodeWriter;

const OUTPUT_FILE: &str = "generate.go";

pub fn generate_signal(ctx: &GenContext, staging: &mut Staging) -> Result<()> {
    let dir = ctx.project.signal_dir();
    let out = dir.join(OUTPUT_FILE);
    staging.own_file(&out);

    let files = declaration_files(&dir, |name| name != OUTPUT_FILE)?;
    let interfaces = rpc_interfaces(&files);
    if interfaces.is_empty() {
        return Ok(());
    }

    let package = ctx.project.package_path(&dir)?;
    let mut fields = FieldResolver::new(ctx, package.as_str());
    let mut imports = ImportSet::new();
    imports.add_path("context");
    imports.add_path("encoding/json");
    imports.add_path(&ctx.config.runtime.srpc_import);
    imports.add_path(&ctx.config.runtime.meta_import);
    imports.add_path(&ctx.project.service_import());

    let request = Request {
        mark: "srpc.EmitMark",
        target: ctx.service_name(),
        results: false,
    };
    let mut body = CodeWriter::new();
    let mut helpers = Vec::with_capacity(interfaces.len());
    for (file, it) in &interfaces {
        write_client(&mut body, &mut fields, &mut imports, file, it, &request)?;
        body.empty_line();
        let object = object_of_interface(&it.name).unwrap_or(&it.name);
        let methods: Vec<_> = it.methods.iter().map(|m| (*file, m)).collect();
        let meta = object_meta(&mut fields, object, KIND_SIGNAL, &methods)?;
        write_helper(&mut body, &meta);
        helpers.push(helper_var(object));
    }

    body.empty_line();
    body.writeln("var Helpers = []meta.ObjectMeta{").indent();
    for helper in &helpers {
        body.writeln(&format!("{helper},"));
    }
    body.dedent().writeln("}");

    let body = body.finish();
    imports.retain_used(&body);
    tracing::debug!(signals = helpers.len(), "generated signal stubs");
    staging.add(out, go_file(last_segment(&package), &imports, &body));
    Ok(())
}
