//! Go declaration extraction for the `sr` generator.
//!
//! [`extract`] turns a Go file into a [`decl::SourceFile`] through
//! tree-sitter; [`model`] aggregates a package directory into relocatable
//! type declarations and caches them.

pub mod decl;
pub mod extract;
pub mod model;
pub mod treesitter;

pub use decl::{
    Field, Function, Import, InterfaceType, SourceFile, StructType, Tag, TypeParam, type_param_names,
};
pub use extract::{BoundMethod, CombinedStruct, combine_structs, go_files, parse_file, parse_source};
pub use model::{ModelField, ModelType, PackageModel, PackageModelCache, TypeKind};
