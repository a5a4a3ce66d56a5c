//! Walk a tree-sitter Go syntax tree into [`SourceFile`] declarations.

use crate::decl::{
    Field, Function, Import, InterfaceType, NamedType, Signature, SourceFile, StructType, Tag,
    TypeParam,
};
use crate::treesitter::{parse_go, text};
use sr_core::{GenError, Result, SourcePos};
use std::path::{Path, PathBuf};
use tree_sitter::Node;
use walkdir::WalkDir;

/// Read and extract a Go file.
pub fn parse_file(path: &Path) -> Result<SourceFile> {
    let source = std::fs::read_to_string(path).map_err(|e| GenError::io(path, e))?;
    parse_source(path, source)
}

/// Extract declarations from Go source held in memory.
pub fn parse_source(path: &Path, source: String) -> Result<SourceFile> {
    let tree = parse_go(path, &source)?;
    let ex = Extractor {
        path,
        source: &source,
    };

    let mut package = String::new();
    let mut imports = Vec::new();
    let mut decls = TypeDecls::default();
    let mut functions = Vec::new();

    let root = tree.root_node();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "package_clause" => {
                let mut c = child.walk();
                if let Some(id) = child
                    .named_children(&mut c)
                    .find(|n| n.kind() == "package_identifier")
                {
                    package = text(&id, &source).to_string();
                }
            }
            "import_declaration" => ex.import_declaration(child, &mut imports),
            "type_declaration" => ex.type_declaration(child, &mut decls),
            "function_declaration" | "method_declaration" => {
                if let Some(f) = ex.function(child) {
                    functions.push(f);
                }
            }
            _ => {}
        }
    }

    tracing::trace!(
        path = %path.display(),
        structs = decls.structs.len(),
        interfaces = decls.interfaces.len(),
        functions = functions.len(),
        "extracted"
    );

    Ok(SourceFile {
        path: path.to_path_buf(),
        package,
        source,
        imports,
        interfaces: decls.interfaces,
        structs: decls.structs,
        functions,
        named_types: decls.named,
    })
}

#[derive(Default)]
struct TypeDecls {
    structs: Vec<StructType>,
    interfaces: Vec<InterfaceType>,
    named: Vec<NamedType>,
}

struct Extractor<'a> {
    path: &'a Path,
    source: &'a str,
}

impl Extractor<'_> {
    fn pos(&self, node: &Node<'_>) -> SourcePos {
        let p = node.start_position();
        SourcePos::new(self.path, p.row + 1, p.column + 1)
    }

    fn import_declaration(&self, node: Node<'_>, out: &mut Vec<Import>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => out.extend(self.import_spec(child)),
                "import_spec_list" => {
                    let mut c = child.walk();
                    for spec in child.named_children(&mut c) {
                        if spec.kind() == "import_spec" {
                            out.extend(self.import_spec(spec));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn import_spec(&self, node: Node<'_>) -> Option<Import> {
        let path_node = node.child_by_field_name("path")?;
        let path = text(&path_node, self.source).trim_matches(|c| c == '"' || c == '`');
        let name = node
            .child_by_field_name("name")
            .map(|n| text(&n, self.source).to_string());
        Some(Import::new(name, path, self.pos(&node)))
    }

    fn type_declaration(&self, node: Node<'_>, out: &mut TypeDecls) {
        let mut cursor = node.walk();
        for spec in node.named_children(&mut cursor) {
            let is_alias = match spec.kind() {
                "type_spec" => false,
                "type_alias" => true,
                _ => continue,
            };
            let (Some(name_node), Some(ty)) = (
                spec.child_by_field_name("name"),
                spec.child_by_field_name("type"),
            ) else {
                continue;
            };
            let name = text(&name_node, self.source).to_string();
            let pos = self.pos(&name_node);
            let range = spec.byte_range();
            let type_params = self.type_params(spec.child_by_field_name("type_parameters"));
            match ty.kind() {
                "struct_type" => out.structs.push(StructType {
                    name,
                    pos,
                    range,
                    type_params,
                    fields: self.struct_fields(ty),
                }),
                "interface_type" => {
                    let (methods, embeds) = self.interface_elems(ty);
                    out.interfaces.push(InterfaceType {
                        name,
                        pos,
                        range,
                        type_params,
                        methods,
                        embeds,
                    });
                }
                _ => out.named.push(NamedType {
                    name,
                    pos,
                    range,
                    type_params,
                    underlying: self.unnamed_field(ty),
                    is_alias,
                }),
            }
        }
    }

    fn struct_fields(&self, node: Node<'_>) -> Vec<Field> {
        let mut fields = Vec::new();
        let mut cursor = node.walk();
        let Some(list) = node
            .named_children(&mut cursor)
            .find(|n| n.kind() == "field_declaration_list")
        else {
            return fields;
        };
        let mut c = list.walk();
        for decl in list.named_children(&mut c) {
            if decl.kind() != "field_declaration" {
                continue;
            }
            let Some(ty) = decl.child_by_field_name("type") else {
                continue;
            };
            let tag = decl
                .child_by_field_name("tag")
                .map(|t| Tag(text(&t, self.source).to_string()))
                .unwrap_or_default();
            let mut nc = decl.walk();
            let names: Vec<Node<'_>> = decl.children_by_field_name("name", &mut nc).collect();
            if names.is_empty() {
                // Embedded: the type span includes a leading `*`.
                let ty_range = decl.start_byte()..ty.end_byte();
                fields.push(Field {
                    name: String::new(),
                    ty: self.source[ty_range.clone()].to_string(),
                    ty_range,
                    pos: self.pos(&decl),
                    tag,
                    signature: None,
                });
                continue;
            }
            for name in names {
                fields.push(Field {
                    name: text(&name, self.source).to_string(),
                    tag: tag.clone(),
                    pos: self.pos(&name),
                    ..self.unnamed_field(ty)
                });
            }
        }
        fields
    }

    /// `[K comparable, V any]` → one [`TypeParam`] per declaration.
    fn type_params(&self, list: Option<Node<'_>>) -> Vec<TypeParam> {
        let Some(list) = list else {
            return Vec::new();
        };
        let mut params = Vec::new();
        let mut cursor = list.walk();
        for decl in list.named_children(&mut cursor) {
            if decl.kind() != "type_parameter_declaration" {
                continue;
            }
            let mut nc = decl.walk();
            let names = decl
                .children_by_field_name("name", &mut nc)
                .map(|n| text(&n, self.source).to_string())
                .collect();
            let constraint = decl
                .child_by_field_name("type")
                .map(|c| self.type_terms(c))
                .unwrap_or_default();
            params.push(TypeParam { names, constraint });
        }
        params
    }

    /// Terms of a type set such as `~int | Base`, each as an unnamed field.
    fn type_terms(&self, node: Node<'_>) -> Vec<Field> {
        let mut terms = Vec::new();
        let mut cursor = node.walk();
        for term in node.named_children(&mut cursor) {
            let ty = match term.kind() {
                "comment" => continue,
                "negated_type" => {
                    let mut c = term.walk();
                    let Some(inner) = term.named_children(&mut c).next() else {
                        continue;
                    };
                    inner
                }
                _ => term,
            };
            terms.push(self.unnamed_field(ty));
        }
        terms
    }

    /// Methods and embedded terms of an interface body.
    fn interface_elems(&self, node: Node<'_>) -> (Vec<Function>, Vec<Field>) {
        let mut methods = Vec::new();
        let mut embeds = Vec::new();
        let mut cursor = node.walk();
        for elem in node.named_children(&mut cursor) {
            if elem.kind() == "type_elem" {
                embeds.extend(self.type_terms(elem));
                continue;
            }
            if !matches!(elem.kind(), "method_elem" | "method_spec") {
                continue;
            }
            let Some(name) = elem.child_by_field_name("name") else {
                continue;
            };
            methods.push(Function {
                name: text(&name, self.source).to_string(),
                pos: self.pos(&name),
                receiver: None,
                params: self.parameters(elem.child_by_field_name("parameters")),
                results: self.results(elem.child_by_field_name("result")),
            });
        }
        (methods, embeds)
    }

    fn function(&self, node: Node<'_>) -> Option<Function> {
        let name = node.child_by_field_name("name")?;
        let receiver = node
            .child_by_field_name("receiver")
            .and_then(|r| self.receiver_type(r));
        Some(Function {
            name: text(&name, self.source).to_string(),
            pos: self.pos(&name),
            receiver,
            params: self.parameters(node.child_by_field_name("parameters")),
            results: self.results(node.child_by_field_name("result")),
        })
    }

    /// `(s *sUser)` → `sUser`, `(l List[T])` → `List`.
    fn receiver_type(&self, list: Node<'_>) -> Option<String> {
        let mut cursor = list.walk();
        let decl = list
            .named_children(&mut cursor)
            .find(|n| n.kind() == "parameter_declaration")?;
        let ty = decl.child_by_field_name("type")?;
        let raw = text(&ty, self.source).trim_start_matches('*').trim();
        let name = raw.split('[').next().unwrap_or(raw).trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    fn parameters(&self, list: Option<Node<'_>>) -> Vec<Field> {
        let Some(list) = list else {
            return Vec::new();
        };
        let mut fields = Vec::new();
        let mut cursor = list.walk();
        for decl in list.named_children(&mut cursor) {
            match decl.kind() {
                "parameter_declaration" => {
                    let Some(ty) = decl.child_by_field_name("type") else {
                        continue;
                    };
                    let mut nc = decl.walk();
                    let names: Vec<Node<'_>> =
                        decl.children_by_field_name("name", &mut nc).collect();
                    if names.is_empty() {
                        fields.push(self.unnamed_field(ty));
                    }
                    for name in names {
                        fields.push(Field {
                            name: text(&name, self.source).to_string(),
                            pos: self.pos(&name),
                            ..self.unnamed_field(ty)
                        });
                    }
                }
                "variadic_parameter_declaration" => {
                    let Some(ty) = decl.child_by_field_name("type") else {
                        continue;
                    };
                    let mut tc = decl.walk();
                    let start = decl
                        .children(&mut tc)
                        .find(|n| n.kind() == "...")
                        .map_or(ty.start_byte(), |n| n.start_byte());
                    let name = decl.child_by_field_name("name");
                    fields.push(Field {
                        name: name
                            .map(|n| text(&n, self.source).to_string())
                            .unwrap_or_default(),
                        ty: format!("...{}", text(&ty, self.source)),
                        ty_range: start..ty.end_byte(),
                        pos: self.pos(&name.unwrap_or(decl)),
                        tag: Tag::default(),
                        signature: self.signature(ty),
                    });
                }
                _ => {}
            }
        }
        fields
    }

    fn results(&self, result: Option<Node<'_>>) -> Vec<Field> {
        match result {
            None => Vec::new(),
            Some(node) if node.kind() == "parameter_list" => self.parameters(Some(node)),
            Some(node) => vec![self.unnamed_field(node)],
        }
    }

    fn unnamed_field(&self, ty: Node<'_>) -> Field {
        Field {
            name: String::new(),
            ty: text(&ty, self.source).to_string(),
            ty_range: ty.byte_range(),
            pos: self.pos(&ty),
            tag: Tag::default(),
            signature: self.signature(ty),
        }
    }

    fn signature(&self, ty: Node<'_>) -> Option<Signature> {
        if ty.kind() != "func_type" {
            return None;
        }
        Some(Signature {
            pos: self.pos(&ty),
            params: self.parameters(ty.child_by_field_name("parameters")),
            results: self.results(ty.child_by_field_name("result")),
        })
    }
}

/// A struct joined with the methods declared on it across its package.
#[derive(Debug, Clone)]
pub struct CombinedStruct<'a> {
    pub file: &'a SourceFile,
    pub decl: &'a StructType,
    pub methods: Vec<BoundMethod<'a>>,
}

/// A method together with the file it is declared in, whose imports apply
/// to its parameter types.
#[derive(Debug, Clone, Copy)]
pub struct BoundMethod<'a> {
    pub file: &'a SourceFile,
    pub function: &'a Function,
}

/// Attach every method of a package to its receiver struct.
pub fn combine_structs(files: &[SourceFile]) -> Vec<CombinedStruct<'_>> {
    let mut combined: Vec<CombinedStruct<'_>> = Vec::new();
    for file in files {
        for decl in &file.structs {
            if combined.iter().any(|c| c.decl.name == decl.name) {
                continue;
            }
            combined.push(CombinedStruct {
                file,
                decl,
                methods: Vec::new(),
            });
        }
    }
    for file in files {
        for function in &file.functions {
            let Some(receiver) = function.receiver.as_deref() else {
                continue;
            };
            if let Some(target) = combined.iter_mut().find(|c| c.decl.name == receiver) {
                target.methods.push(BoundMethod { file, function });
            }
        }
    }
    combined
}

/// `.go` files directly inside `dir`, sorted, test files excluded. A
/// missing `dir` has none.
pub fn go_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return Ok(files);
    }
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| GenError::io(dir, e.into()))?;
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_file()
            && name.ends_with(".go")
            && !name.ends_with("_test.go")
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Immediate subdirectories of `dir`, sorted. A missing `dir` has none.
pub fn sub_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| GenError::io(dir, e.into()))?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}
