//! Type resolution and Go code emission for the `sr` generator.
//!
//! [`resolver::TypeResolver`] turns type expressions found in declarations
//! into [`template::Template`]s whose named references point at type
//! descriptors. Project-local types are relocated: their declarations travel
//! with the descriptor and are re-rendered for whichever package the
//! generated code lives in. [`field::FieldResolver`] memoizes that per
//! field, and the emitters (`call`, `slot`, `signal`, `listen`) stage their
//! output through [`pipeline`]. [`remote`] materializes metadata fetched
//! from another service back into declarations.

pub mod call;
pub mod context;
pub mod field;
pub mod helper;
pub mod imports;
pub mod listen;
pub mod pipeline;
pub mod remote;
pub mod resolver;
pub mod rpc;
pub mod scan;
pub mod signal;
pub mod slot;
pub mod template;
pub mod typeexpr;

pub use context::GenContext;
pub use field::FieldResolver;
pub use pipeline::{GenKind, generate, run};
pub use remote::{function_listing, materialize_call, materialize_listen, object_listing};
pub use resolver::{TypeResolver, type_id};
pub use template::{Template, substitute};
