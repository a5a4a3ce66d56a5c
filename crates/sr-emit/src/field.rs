//! Per-field resolution for one output package.
//!
//! Emitters ask for the same field's type in several places (signature,
//! request struct, helper metadata). Each field is resolved once and its
//! rendered type reused, so every occurrence is byte-identical.

use crate::context::GenContext;
use crate::imports::ImportSet;
use crate::resolver::TypeResolver;
use crate::template::Template;
use crate::typeexpr::has_custom_type;
use sr_core::meta::{FieldMeta, TypeMeta, TypeSource};
use sr_core::naming::last_segment;
use sr_core::{GenError, GenWarning, Result};
use sr_parser::{Field, SourceFile};
use std::collections::HashMap;
use std::path::PathBuf;

/// Field identity: declaring position plus type text.
type FieldKey = (PathBuf, usize, usize, String);

fn key(field: &Field) -> FieldKey {
    (
        field.pos.file.clone(),
        field.pos.line,
        field.pos.column,
        field.ty.clone(),
    )
}

#[derive(Debug, Clone)]
struct ResolvedField {
    template: Template,
    rendered: String,
}

pub struct FieldResolver<'c> {
    resolver: TypeResolver<'c>,
    target_package: String,
    fields: HashMap<FieldKey, ResolvedField>,
}

impl<'c> FieldResolver<'c> {
    /// Resolver for code generated into `target_package`.
    pub fn new(ctx: &'c GenContext, target_package: impl Into<String>) -> Self {
        Self {
            resolver: TypeResolver::new(ctx),
            target_package: target_package.into(),
            fields: HashMap::new(),
        }
    }

    pub fn target_package(&self) -> &str {
        &self.target_package
    }

    /// Resolve `field`, declared in `file`, and return its rendered type.
    pub fn resolve(&mut self, file: &SourceFile, field: &Field) -> Result<&str> {
        let key = key(field);
        if !self.fields.contains_key(&key) {
            let template = if has_custom_type(&field.ty) {
                self.resolver.resolve(file, &field.ty, &field.pos)?
            } else {
                Template::literal(&field.ty)
            };
            let rendered = template.substitute(self.resolver.types(), &self.target_package)?;
            self.fields
                .insert(key.clone(), ResolvedField { template, rendered });
        }
        Ok(&self.fields[&key].rendered)
    }

    /// Rendered type of a field resolved earlier.
    pub fn resolved_type(&self, field: &Field) -> Option<&str> {
        self.fields.get(&key(field)).map(|f| f.rendered.as_str())
    }

    pub fn template(&self, field: &Field) -> Option<&Template> {
        self.fields.get(&key(field)).map(|f| &f.template)
    }

    /// Every descriptor a resolved field needs, transitively.
    pub fn field_types(&self, field: &Field) -> Result<Vec<TypeMeta>> {
        match self.template(field) {
            Some(template) => self.resolver.closure(template),
            None => Ok(Vec::new()),
        }
    }

    /// Add the imports the rendered type of `field` needs.
    pub fn collect_imports(&self, field: &Field, imports: &mut ImportSet) -> Result<()> {
        let Some(template) = self.template(field) else {
            return Ok(());
        };
        for id in template.ids() {
            let meta = self
                .resolver
                .get(id)
                .ok_or_else(|| GenError::UnknownPlaceholder(id.to_string()))?;
            match &meta.source {
                TypeSource::Imported(import) => imports.add_meta(import),
                TypeSource::Relocated { .. } if meta.from != self.target_package => {
                    imports.add(last_segment(&meta.from), &meta.from);
                }
                TypeSource::Relocated { .. } => {}
            }
        }
        Ok(())
    }

    /// Helper metadata for `field`, named `name`.
    pub fn field_meta(&mut self, file: &SourceFile, name: &str, field: &Field) -> Result<FieldMeta> {
        self.resolve(file, field)?;
        let ty = self
            .template(field)
            .map(ToString::to_string)
            .unwrap_or_else(|| field.ty.clone());
        Ok(FieldMeta {
            name: name.to_string(),
            ty,
            types: self.field_types(field)?,
        })
    }

    pub fn warnings(&self) -> &[GenWarning] {
        self.resolver.warnings()
    }
}
