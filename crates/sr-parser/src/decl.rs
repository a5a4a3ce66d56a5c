//! Declarations extracted from one Go source file.

use regex::Regex;
use sr_core::SourcePos;
use sr_core::naming::last_segment;
use std::ops::Range;
use std::path::PathBuf;

/// Everything the generator needs from a single `.go` file.
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    pub path: PathBuf,
    pub package: String,
    pub source: String,
    pub imports: Vec<Import>,
    pub interfaces: Vec<InterfaceType>,
    pub structs: Vec<StructType>,
    /// Free functions and methods, in source order.
    pub functions: Vec<Function>,
    /// `type X Y` and `type X = Y` where `Y` is neither a struct nor an interface.
    pub named_types: Vec<NamedType>,
}

impl SourceFile {
    /// Import a package alias refers to in this file.
    ///
    /// Absence is not an error: the caller decides whether a dotted name
    /// really was a package reference.
    pub fn lookup_import(&self, alias: &str) -> Option<&Import> {
        self.imports.iter().find(|imp| imp.export == alias)
    }

    pub fn interface(&self, name: &str) -> Option<&InterfaceType> {
        self.interfaces.iter().find(|it| it.name == name)
    }

    pub fn struct_type(&self, name: &str) -> Option<&StructType> {
        self.structs.iter().find(|st| st.name == name)
    }

    /// Methods declared with `name` (or `*name`) as receiver.
    pub fn methods_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Function> {
        self.functions
            .iter()
            .filter(move |f| f.receiver.as_deref() == Some(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Explicit alias, if any.
    pub name: Option<String>,
    pub path: String,
    /// Name the package is referenced by in this file.
    pub export: String,
    pub pos: SourcePos,
}

impl Import {
    pub fn new(name: Option<String>, path: impl Into<String>, pos: SourcePos) -> Self {
        let path = path.into();
        let export = name
            .clone()
            .unwrap_or_else(|| last_segment(&path).to_string());
        Self {
            name,
            path,
            export,
            pos,
        }
    }

    /// Blank (`_`) and dot imports bring no referable name into scope.
    pub fn is_referable(&self) -> bool {
        !matches!(self.name.as_deref(), Some("_" | "."))
    }
}

#[derive(Debug, Clone)]
pub struct InterfaceType {
    pub name: String,
    pub pos: SourcePos,
    /// Byte range of the type spec, from the name to the closing brace.
    pub range: Range<usize>,
    pub type_params: Vec<TypeParam>,
    pub methods: Vec<Function>,
    /// Embedded interfaces and type-set terms, one field per term with the
    /// `~` left out of its range.
    pub embeds: Vec<Field>,
}

#[derive(Debug, Clone)]
pub struct StructType {
    pub name: String,
    pub pos: SourcePos,
    pub range: Range<usize>,
    pub type_params: Vec<TypeParam>,
    pub fields: Vec<Field>,
}

impl StructType {
    /// Embedded field whose type text is exactly `ty`.
    pub fn embedded(&self, ty: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.is_embedded() && f.ty == ty)
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub pos: SourcePos,
    /// Receiver type name without pointer or type arguments, for methods.
    pub receiver: Option<String>,
    pub params: Vec<Field>,
    pub results: Vec<Field>,
}

impl Function {
    /// Parameters followed by results.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.params.iter().chain(self.results.iter())
    }
}

/// A struct field, parameter or result.
#[derive(Debug, Clone)]
pub struct Field {
    /// Empty for embedded fields and unnamed parameters.
    pub name: String,
    /// Type text as written. Variadic parameters keep their `...` prefix.
    pub ty: String,
    /// Byte range of `ty` in the file.
    pub ty_range: Range<usize>,
    pub pos: SourcePos,
    pub tag: Tag,
    /// Parameters and results when the type is a function type.
    pub signature: Option<Signature>,
}

impl Field {
    pub fn is_embedded(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_variadic(&self) -> bool {
        self.ty.starts_with("...")
    }
}

#[derive(Debug, Clone)]
pub struct Signature {
    pub pos: SourcePos,
    pub params: Vec<Field>,
    pub results: Vec<Field>,
}

/// One declaration of a type parameter list: `K, V any` in
/// `type Pair[K, V any] struct{...}`.
#[derive(Debug, Clone)]
pub struct TypeParam {
    pub names: Vec<String>,
    /// Terms of the constraint, like [`InterfaceType::embeds`].
    pub constraint: Vec<Field>,
}

/// Names of every type parameter in `params`.
pub fn type_param_names(params: &[TypeParam]) -> impl Iterator<Item = &str> {
    params.iter().flat_map(|p| p.names.iter().map(String::as_str))
}

/// `type X Y` or `type X = Y` for any other `Y`.
#[derive(Debug, Clone)]
pub struct NamedType {
    pub name: String,
    pub pos: SourcePos,
    pub range: Range<usize>,
    pub type_params: Vec<TypeParam>,
    /// The right-hand side type.
    pub underlying: Field,
    pub is_alias: bool,
}

/// Raw struct tag literal, including its quotes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag(pub String);

impl Tag {
    /// Value for `key`, or an empty string when the key is absent.
    pub fn get(&self, key: &str) -> String {
        let pattern = format!(r#"(?:^|[\s`]){}\s*:\s*"(.*?)""#, regex::escape(key));
        Regex::new(&pattern)
            .ok()
            .and_then(|re| re.captures(&self.0))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_get() {
        let tag = Tag(r#"`json:"name" target:"user"`"#.to_string());
        assert_eq!(tag.get("target"), "user");
        assert_eq!(tag.get("json"), "name");
        assert_eq!(tag.get("xml"), "");
        // A key that is only a suffix of another key does not match.
        assert_eq!(Tag(r#"`mytarget:"x"`"#.to_string()).get("target"), "");
    }

    #[test]
    fn test_import_export() {
        let pos = SourcePos::new("a.go", 3, 2);
        let plain = Import::new(None, "github.com/x/model", pos.clone());
        assert_eq!(plain.export, "model");
        let aliased = Import::new(Some("m".into()), "github.com/x/model", pos.clone());
        assert_eq!(aliased.export, "m");
        assert!(!Import::new(Some("_".into()), "embed", pos).is_referable());
    }
}
