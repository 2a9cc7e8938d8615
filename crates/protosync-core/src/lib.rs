//! Protosync Core -- prototype inheritance resolution for game content.
//!
//! Upstream game content defines prototypes (entities, reagents, recipes,
//! technologies) as JSON-compatible records that may extend one or more
//! parent prototypes by id. This crate flattens those records:
//!
//! 1. [`merge::merge`] -- combine two records field by field with
//!    type-directed conflict rules (scalars replace, arrays concatenate,
//!    nested records merge recursively, `null` never clobbers).
//! 2. [`pool::Pool`] -- an immutable, id-indexed collection of candidate
//!    parent records.
//! 3. [`inherit::resolve`] -- walk a record's parent chain recursively,
//!    fold every ancestor into an accumulator (later parents win), then
//!    layer the record's own fields on top.
//!
//! Everything here is pure and synchronous: no I/O, no shared mutable
//! state. Resolving independent records against one shared [`pool::Pool`]
//! is safe from parallel workers.

pub mod inherit;
pub mod merge;
pub mod pool;

pub use inherit::{InheritError, ResolveOptions, resolve};
pub use merge::{MergeError, merge};
pub use pool::{Pool, PoolError};
