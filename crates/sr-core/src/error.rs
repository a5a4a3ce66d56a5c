//! Error and warning taxonomy shared by the parser, resolver and emitters.
//!
//! Every error aborts the whole generation run. Warnings are reported through
//! `tracing` and generation continues.

use crate::pos::SourcePos;
use std::fmt;
use std::path::PathBuf;

pub type Result<T, E = GenError> = std::result::Result<T, E>;

/// Fatal generation errors.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// A Go file of a scanned package could not be parsed.
    #[error("{}: failed to parse package: {message}", .path.display())]
    PackageParse { path: PathBuf, message: String },

    /// A qualified type uses a package alias the file never imports.
    #[error("{pos}: not found type scope {scope}")]
    UnresolvedScope { pos: SourcePos, scope: String },

    /// A type name is missing from its declaring package.
    #[error("{pos}: package {package} not found type {name}")]
    TypeNotFound {
        pos: SourcePos,
        package: String,
        name: String,
    },

    /// A type expression the tokenizer could not make sense of.
    #[error("{pos}: invalid type expression `{expr}`: {message}")]
    InvalidType {
        pos: SourcePos,
        expr: String,
        message: String,
    },

    /// A declaration violating the RPC conventions (names, signatures, tags).
    #[error("{pos}: {message}")]
    InvalidDeclaration { pos: SourcePos, message: String },

    /// A template references a descriptor id that was never resolved.
    #[error("unknown type placeholder {{{{{0}}}}}")]
    UnknownPlaceholder(String),

    #[error("go.mod not found in {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("cannot read module name from {}", .0.display())]
    ManifestInvalid(PathBuf),

    #[error("{} is outside the project root", .0.display())]
    OutsideProject(PathBuf),

    /// Staging refused to replace a file without the generated header.
    #[error("refusing to overwrite hand-written file {}", .0.display())]
    WouldOverwrite(PathBuf),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl GenError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn declaration(pos: &SourcePos, message: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            pos: pos.clone(),
            message: message.into(),
        }
    }
}

/// Non-fatal findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenWarning {
    /// A relocated type lives outside the project's model package, so copies
    /// in other services may collide by name.
    NamingConvention { package: String, name: String },
    /// An exported method was left out of an RPC object.
    SkippedMethod { pos: SourcePos, reason: String },
    /// Two imports claimed the same alias; the first path was kept.
    ImportConflict {
        alias: String,
        kept: String,
        ignored: String,
    },
}

impl GenWarning {
    /// Log the warning through `tracing`.
    pub fn report(&self) {
        tracing::warn!("{}", self);
    }
}

impl fmt::Display for GenWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamingConvention { package, name } => write!(
                f,
                "type {package}.{name} is not placed under the project's model package, generated code may contain duplicate names"
            ),
            Self::SkippedMethod { pos, reason } => write!(f, "{pos}: {reason}"),
            Self::ImportConflict {
                alias,
                kept,
                ignored,
            } => write!(
                f,
                "package {alias} has different import paths {kept}, {ignored}"
            ),
        }
    }
}
