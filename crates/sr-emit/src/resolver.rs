//! Type resolution: turns a type expression written in some Go file into a
//! [`Template`] plus the descriptors its references need.
//!
//! Project-local types are captured as `type ...` declarations so generated
//! code can carry its own copy; types of other modules keep their import.
//! Struct fields of captured declarations are resolved in turn, so a whole
//! type graph is collected from a single expression. Each (package, name)
//! pair is resolved once per resolver, which also terminates cycles.

use crate::context::GenContext;
use crate::template::Template;
use crate::typeexpr::{has_custom_type, parse_type};
use sha2::{Digest, Sha256};
use sr_core::meta::{ImportMeta, TypeMeta, TypeSource};
use sr_core::naming::last_segment;
use sr_core::{GenError, GenWarning, Result, SourcePos};
use sr_parser::SourceFile;
use std::collections::HashMap;

/// Stable descriptor id for a type, so regenerated helpers do not churn.
pub fn type_id(package: &str, name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(package.as_bytes());
    hasher.update(b"@");
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())[..12].to_string()
}

pub struct TypeResolver<'c> {
    ctx: &'c GenContext,
    types: Vec<TypeMeta>,
    /// `package@name` to position in `types`.
    index: HashMap<String, usize>,
    warnings: Vec<GenWarning>,
}

impl<'c> TypeResolver<'c> {
    pub fn new(ctx: &'c GenContext) -> Self {
        Self {
            ctx,
            types: Vec::new(),
            index: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Resolve `expr`, written in `file` at `pos`.
    ///
    /// Expressions without custom types come back as literals and add no
    /// descriptors.
    pub fn resolve(&mut self, file: &SourceFile, expr: &str, pos: &SourcePos) -> Result<Template> {
        self.resolve_scoped(file, expr, pos, &[])
    }

    /// Like [`resolve`](Self::resolve), with `type_params` in scope: bare
    /// references to them stay as written.
    fn resolve_scoped(
        &mut self,
        file: &SourceFile,
        expr: &str,
        pos: &SourcePos,
        type_params: &[String],
    ) -> Result<Template> {
        let tree = parse_type(expr).map_err(|e| GenError::InvalidType {
            pos: pos.clone(),
            expr: expr.to_string(),
            message: e.to_string(),
        })?;
        let candidates: Vec<_> = tree
            .candidates()
            .into_iter()
            .filter(|r| r.scope.is_some() || !type_params.contains(&r.name))
            .collect();
        if candidates.is_empty() {
            return Ok(Template::literal(expr));
        }

        let mut edits = Vec::with_capacity(candidates.len());
        for reference in candidates {
            let (package, alias) = match &reference.scope {
                Some(scope) => {
                    let import = file
                        .lookup_import(scope)
                        .filter(|imp| imp.is_referable())
                        .ok_or_else(|| GenError::UnresolvedScope {
                            pos: pos.clone(),
                            scope: scope.clone(),
                        })?;
                    (import.path.clone(), import.name.clone())
                }
                None => (self.ctx.project.package_path_of_file(&file.path)?, None),
            };
            let id = self.resolve_named(&package, alias.as_deref(), &reference.name, pos)?;
            edits.push((reference.span.clone(), Template::reference(id)));
        }
        Ok(Template::splice(expr, edits))
    }

    fn resolve_named(
        &mut self,
        package: &str,
        alias: Option<&str>,
        name: &str,
        pos: &SourcePos,
    ) -> Result<String> {
        let key = format!("{package}@{name}");
        if let Some(&i) = self.index.get(&key) {
            return Ok(self.types[i].id.clone());
        }
        let id = type_id(package, name);

        if !self.ctx.project.is_project_package(package) {
            tracing::trace!(package, name, "foreign type");
            self.register(
                key,
                TypeMeta {
                    id: id.clone(),
                    name: name.to_string(),
                    from: package.to_string(),
                    source: TypeSource::Imported(ImportMeta::new(package, alias)),
                },
            );
            return Ok(id);
        }

        let not_found = || GenError::TypeNotFound {
            pos: pos.clone(),
            package: package.to_string(),
            name: name.to_string(),
        };
        let dir = self.ctx.project.package_dir(package).ok_or_else(not_found)?;
        let model = self.ctx.cache.load(&dir)?;
        let model_type = model.get_type(name).ok_or_else(not_found)?;

        if self.expects_model_package(package) {
            let warning = GenWarning::NamingConvention {
                package: package.to_string(),
                name: name.to_string(),
            };
            warning.report();
            self.warnings.push(warning);
        }

        // Registered before descending so self and mutual references stop here.
        let at = self.register(
            key,
            TypeMeta {
                id: id.clone(),
                name: name.to_string(),
                from: package.to_string(),
                source: TypeSource::Relocated {
                    code: model_type.content.clone(),
                },
            },
        );

        let mut edits = Vec::new();
        for field in &model_type.fields {
            if !has_custom_type(&field.ty) {
                continue;
            }
            let template = self.resolve_scoped(
                &model_type.file,
                &field.ty,
                &field.pos,
                &model_type.type_params,
            )?;
            edits.push((field.range.clone(), template));
        }
        if !edits.is_empty() {
            let code = Template::splice(&model_type.content, edits).to_string();
            self.types[at].source = TypeSource::Relocated { code };
        }
        tracing::debug!(package, name, id = %id, "relocated type");
        Ok(id)
    }

    /// Local types outside the model package get relocated with a warning.
    /// Service packages hold copies that were relocated already.
    fn expects_model_package(&self, package: &str) -> bool {
        let services = self.ctx.project.service_package("");
        last_segment(package) != self.ctx.config.project.model_package
            && !package.starts_with(&services)
    }

    fn register(&mut self, key: String, meta: TypeMeta) -> usize {
        self.types.push(meta);
        let at = self.types.len() - 1;
        self.index.insert(key, at);
        at
    }

    /// Every descriptor found so far, in discovery order.
    pub fn types(&self) -> &[TypeMeta] {
        &self.types
    }

    pub fn get(&self, id: &str) -> Option<&TypeMeta> {
        self.types.iter().find(|t| t.id == id)
    }

    /// Descriptors `template` needs, transitively.
    pub fn closure(&self, template: &Template) -> Result<Vec<TypeMeta>> {
        template.closure(&self.types)
    }

    pub fn warnings(&self) -> &[GenWarning] {
        &self.warnings
    }

    pub fn into_types(self) -> Vec<TypeMeta> {
        self.types
    }
}
