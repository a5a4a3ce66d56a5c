//! Package models: every type a Go package declares, as relocatable source.

use crate::decl::{Field, SourceFile, TypeParam, type_param_names};
use crate::extract::{go_files, parse_file};
use sr_core::{GenError, Result, SourcePos};
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

const TYPE_KEYWORD: &str = "type ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Struct,
    Interface,
    Other,
}

/// A type-expression slot inside a declaration: a struct field, an interface
/// method parameter or result, or the right-hand side of a named type.
#[derive(Debug, Clone)]
pub struct ModelField {
    pub name: String,
    pub ty: String,
    /// Byte range of `ty` inside [`ModelType::content`].
    pub range: Range<usize>,
    pub pos: SourcePos,
}

#[derive(Debug, Clone)]
pub struct ModelType {
    pub name: String,
    pub kind: TypeKind,
    /// Standalone declaration, always starting with `type `.
    pub content: String,
    pub fields: Vec<ModelField>,
    /// Type parameter names. Inside the declaration they shadow package
    /// types of the same name.
    pub type_params: Vec<String>,
    /// The declaring file, for import lookups while resolving `fields`.
    pub file: Arc<SourceFile>,
}

/// All types of one package directory.
#[derive(Debug, Clone, Default)]
pub struct PackageModel {
    pub dir: PathBuf,
    pub types: BTreeMap<String, ModelType>,
    /// Referable imports across the package's files, alias to path.
    pub imports: BTreeMap<String, String>,
    pub files: Vec<Arc<SourceFile>>,
}

impl PackageModel {
    /// Parse every `.go` file directly in `dir`.
    ///
    /// Any file failing to parse fails the whole model.
    pub fn parse_dir(dir: &Path) -> Result<Self> {
        let mut model = Self {
            dir: dir.to_path_buf(),
            ..Self::default()
        };
        for path in go_files(dir)? {
            model.add_file(Arc::new(parse_file(&path)?));
        }
        tracing::debug!(
            dir = %dir.display(),
            types = model.types.len(),
            files = model.files.len(),
            "parsed package model"
        );
        Ok(model)
    }

    /// Record a file's types and imports. Earlier declarations win.
    pub fn add_file(&mut self, file: Arc<SourceFile>) {
        for imp in file.imports.iter().filter(|i| i.is_referable()) {
            self.imports
                .entry(imp.export.clone())
                .or_insert_with(|| imp.path.clone());
        }

        for st in &file.structs {
            let mut fields = constraints(&st.type_params);
            fields.extend(&st.fields);
            let decl = Decl {
                name: &st.name,
                kind: TypeKind::Struct,
                range: st.range.clone(),
                type_params: &st.type_params,
            };
            self.insert(&file, decl, &fields);
        }
        for it in &file.interfaces {
            let mut fields = constraints(&it.type_params);
            fields.extend(&it.embeds);
            fields.extend(it.methods.iter().flat_map(|m| m.fields()));
            let decl = Decl {
                name: &it.name,
                kind: TypeKind::Interface,
                range: it.range.clone(),
                type_params: &it.type_params,
            };
            self.insert(&file, decl, &fields);
        }
        for nt in &file.named_types {
            let mut fields = constraints(&nt.type_params);
            fields.push(&nt.underlying);
            let decl = Decl {
                name: &nt.name,
                kind: TypeKind::Other,
                range: nt.range.clone(),
                type_params: &nt.type_params,
            };
            self.insert(&file, decl, &fields);
        }
        self.files.push(file);
    }

    fn insert(&mut self, file: &Arc<SourceFile>, decl: Decl<'_>, fields: &[&Field]) {
        let Decl {
            name,
            kind,
            range,
            type_params,
        } = decl;
        if self.types.contains_key(name) {
            return;
        }
        let start = range.start;
        let content = format!("{TYPE_KEYWORD}{}", &file.source[range]);
        let fields = fields
            .iter()
            .map(|f| ModelField {
                name: f.name.clone(),
                ty: f.ty.clone(),
                range: (f.ty_range.start - start + TYPE_KEYWORD.len())
                    ..(f.ty_range.end - start + TYPE_KEYWORD.len()),
                pos: f.pos.clone(),
            })
            .collect();
        self.types.insert(
            name.to_string(),
            ModelType {
                name: name.to_string(),
                kind,
                content,
                fields,
                type_params: type_param_names(type_params).map(str::to_string).collect(),
                file: Arc::clone(file),
            },
        );
    }

    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn get_type(&self, name: &str) -> Option<&ModelType> {
        self.types.get(name)
    }
}

/// A type declaration about to enter the model.
struct Decl<'a> {
    name: &'a str,
    kind: TypeKind,
    range: Range<usize>,
    type_params: &'a [TypeParam],
}

/// Constraint terms of a type parameter list, in source order.
fn constraints(params: &[TypeParam]) -> Vec<&Field> {
    params.iter().flat_map(|p| &p.constraint).collect()
}

/// Memoizes package models per normalized directory.
///
/// Owned by the generation context rather than global, so tests stay isolated
/// and a long-lived host can invalidate entries when files change.
#[derive(Debug, Default)]
pub struct PackageModelCache {
    entries: Mutex<HashMap<String, Arc<PackageModel>>>,
}

impl PackageModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Model of the package in `dir`, parsing it on first use.
    pub fn load(&self, dir: &Path) -> Result<Arc<PackageModel>> {
        let key = normalize_key(dir)?;
        if let Some(model) = self.lock().get(&key) {
            tracing::trace!(dir = %key, "package model cache hit");
            return Ok(Arc::clone(model));
        }

        let model = Arc::new(PackageModel::parse_dir(dir)?);
        Ok(Arc::clone(self.lock().entry(key).or_insert(model)))
    }

    /// Forget one directory's model.
    pub fn invalidate(&self, dir: &Path) -> Result<bool> {
        let key = normalize_key(dir)?;
        Ok(self.lock().remove(&key).is_some())
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<PackageModel>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cache key for a directory: absolute, `/`-separated, without duplicate or
/// trailing slashes, case-folded where the file system ignores case.
pub fn normalize_key(dir: &Path) -> Result<String> {
    let abs = std::path::absolute(dir).map_err(|e| GenError::io(dir, e))?;
    let raw = abs.to_string_lossy().replace('\\', "/");
    let mut key = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '/' && key.ends_with('/') {
            continue;
        }
        key.push(c);
    }
    while key.len() > 1 && key.ends_with('/') {
        key.pop();
    }
    if cfg!(any(windows, target_os = "macos")) {
        key = key.to_lowercase();
    }
    Ok(key)
}
