//! # Facade Module
//!
//! Facades sit between the application and the document store driver. A facade
//! borrows a collection handle (it never owns one, so several facades can share
//! the same connection) and exposes record-level operations:
//!
//! * **Typed records:** callers work with their own `serde` types, conversion to
//!   and from BSON documents happens here.
//! * **Normalized results:** missing records are `None`, update and delete
//!   outcomes are plain booleans and counts. Store failures are propagated as
//!   they are, no retry is attempted.

mod facade_collection;
pub use facade_collection::*;

mod facade_error;
pub use facade_error::*;
