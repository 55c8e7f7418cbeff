//! # Update and lookup primitives
//!
//! Building blocks handed to the collection facade:
//!
//! -   [`Patch`]: a partial record where each field is either assigned
//!     ([`FieldUpdate::Set`]), removed ([`FieldUpdate::Unset`]) or left untouched
//!     ([`FieldUpdate::Keep`], or simply not mentioned).
//!
//! -   [`UpdateDocument`]: the driver-level `$set` / `$unset` document compiled
//!     from a [`Patch`], never carrying an empty operator group.
//!
//! -   [`OperatorUpdate`]: a typed builder for documents using arbitrary field
//!     update operators ([`UpdateOperator`]).
//!
//! -   [`FindOpts`] / [`UpdateOpts`]: driver-agnostic read and update options.

mod builder;
pub use builder::*;

mod operators;
pub use operators::*;

mod options;
pub use options::*;

mod patch;
pub use patch::*;
