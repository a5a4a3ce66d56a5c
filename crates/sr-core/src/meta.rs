//! Helper metadata: the runtime description of an RPC object that generated
//! code registers and that `ols`, `fls` and `get` read back from a service.
//!
//! Field names serialize in PascalCase to match the Go runtime's encoding.

use crate::naming::last_segment;
use serde::{Deserialize, Serialize};

/// Kind of an RPC object as reported by a service.
pub const KIND_SLOT: &str = "slot";
pub const KIND_SIGNAL: &str = "signal";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ObjectMeta {
    pub name: String,
    pub kind: String,
    pub functions: Vec<FunctionMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FunctionMeta {
    pub name: String,
    pub parameters: Vec<FieldMeta>,
    pub results: Vec<FieldMeta>,
}

/// One parameter or result.
///
/// `ty` is a type template in its `{{id}}` text form; `types` holds every
/// descriptor the template needs, transitively.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FieldMeta {
    pub name: String,
    #[serde(rename = "Type")]
    pub ty: String,
    pub types: Vec<TypeMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ImportMeta {
    pub path: String,
    pub alias: String,
}

impl ImportMeta {
    pub fn new(path: impl Into<String>, alias: Option<&str>) -> Self {
        Self {
            path: path.into(),
            alias: alias.unwrap_or_default().to_string(),
        }
    }

    /// Name the package is referenced by: the explicit alias or the last path segment.
    pub fn export(&self) -> &str {
        if self.alias.is_empty() {
            last_segment(&self.path)
        } else {
            &self.alias
        }
    }
}

/// How a resolved type reaches the generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSource {
    /// Project-local type whose declaration is copied into generated files.
    /// `code` is a `type ...` declaration in template text form.
    Relocated { code: String },
    /// Type from another module, referenced through a normal import.
    Imported(ImportMeta),
}

/// A resolved type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTypeMeta", into = "RawTypeMeta")]
pub struct TypeMeta {
    pub id: String,
    pub name: String,
    /// Declaring package path. For relocated types this is the package the
    /// declaration currently lives in.
    pub from: String,
    pub source: TypeSource,
}

impl TypeMeta {
    pub fn is_relocated(&self) -> bool {
        matches!(self.source, TypeSource::Relocated { .. })
    }

    pub fn code(&self) -> Option<&str> {
        match &self.source {
            TypeSource::Relocated { code } => Some(code),
            TypeSource::Imported(_) => None,
        }
    }

    pub fn import(&self) -> Option<&ImportMeta> {
        match &self.source {
            TypeSource::Relocated { .. } => None,
            TypeSource::Imported(import) => Some(import),
        }
    }

    /// Move a relocated type's home to `package`. Imported types keep their
    /// import, since another module still owns them.
    pub fn relocate_to(&mut self, package: &str) {
        if self.is_relocated() {
            self.from = package.to_string();
        }
    }
}

/// Wire form of [`TypeMeta`]: `Code` and `Import` are both optional there.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RawTypeMeta {
    id: String,
    name: String,
    from: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    import: Option<ImportMeta>,
}

impl TryFrom<RawTypeMeta> for TypeMeta {
    type Error = String;

    fn try_from(raw: RawTypeMeta) -> Result<Self, Self::Error> {
        let source = match (raw.code.is_empty(), raw.import) {
            (false, None) => TypeSource::Relocated { code: raw.code },
            (true, Some(import)) => TypeSource::Imported(import),
            (false, Some(_)) => {
                return Err(format!("type {} has both code and an import", raw.name));
            }
            (true, None) => {
                return Err(format!("type {} has neither code nor an import", raw.name));
            }
        };
        Ok(Self {
            id: raw.id,
            name: raw.name,
            from: raw.from,
            source,
        })
    }
}

impl From<TypeMeta> for RawTypeMeta {
    fn from(meta: TypeMeta) -> Self {
        let (code, import) = match meta.source {
            TypeSource::Relocated { code } => (code, None),
            TypeSource::Imported(import) => (String::new(), Some(import)),
        };
        Self {
            id: meta.id,
            name: meta.name,
            from: meta.from,
            code,
            import,
        }
    }
}

/// Filter sent with a `Helper.list` request. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperQuery {
    pub name: String,
    pub kind: String,
}

impl HelperQuery {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }

    pub fn matches(&self, object: &ObjectMeta) -> bool {
        (self.name.is_empty() || self.name == object.name)
            && (self.kind.is_empty() || self.kind == object.kind)
    }
}

/// Response body of `Helper.list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperList {
    pub list: Vec<ObjectMeta>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_meta_wire_shape() {
        let meta = TypeMeta {
            id: "a1".into(),
            name: "Time".into(),
            from: "time".into(),
            source: TypeSource::Imported(ImportMeta::new("time", None)),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["Name"], "Time");
        assert_eq!(json["Import"]["Path"], "time");
        assert!(json.get("Code").is_none());

        let back: TypeMeta = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_type_meta_rejects_ambiguous_source() {
        let both = r#"{"Id":"x","Name":"A","From":"m/a","Code":"type A int","Import":{"Path":"m/a","Alias":""}}"#;
        assert!(serde_json::from_str::<TypeMeta>(both).is_err());
        let neither = r#"{"Id":"x","Name":"A","From":"m/a"}"#;
        assert!(serde_json::from_str::<TypeMeta>(neither).is_err());
    }

    #[test]
    fn test_relocate_to_only_moves_relocated() {
        let mut local = TypeMeta {
            id: "1".into(),
            name: "User".into(),
            from: "demo/internal/model".into(),
            source: TypeSource::Relocated {
                code: "type User struct{}".into(),
            },
        };
        local.relocate_to("demo/internal/srpc/service/user");
        assert_eq!(local.from, "demo/internal/srpc/service/user");

        let mut foreign = TypeMeta {
            id: "2".into(),
            name: "Time".into(),
            from: "time".into(),
            source: TypeSource::Imported(ImportMeta::new("time", None)),
        };
        foreign.relocate_to("demo/x");
        assert_eq!(foreign.from, "time");
    }

    #[test]
    fn test_import_export_and_query() {
        assert_eq!(ImportMeta::new("github.com/a/b", None).export(), "b");
        assert_eq!(ImportMeta::new("github.com/a/b", Some("bb")).export(), "bb");

        let object = ObjectMeta {
            name: "User".into(),
            kind: KIND_SLOT.into(),
            functions: vec![],
        };
        assert!(HelperQuery::default().matches(&object));
        assert!(HelperQuery::new("User", "slot").matches(&object));
        assert!(!HelperQuery::new("", "signal").matches(&object));
    }
}
