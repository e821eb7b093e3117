//! dom-patch: an operation-based patch engine for `serde_json::Value` trees.
//!
//! # Operations
//!
//! The six JSON Patch style operations are supported:
//! `add`, `remove`, `replace`, `copy`, `move`, `test`.
//!
//! Each operation applies in place, can be inverted given the document it
//! was applied to, and can have its `-` (end of array) markers rewritten
//! into concrete indices after the fact. A [`Patch`] applies a sequence of
//! operations under a [`PatchApplicationStrategy`] that decides what a
//! failure means.
//!
//! # Example
//!
//! ```
//! use dom_patch::{HaltOnFailure, Patch};
//! use serde_json::json;
//!
//! let mut patch = Patch::create_from_dom_representation(&json!([
//!     {"op": "add", "path": "/arr/-", "value": 3},
//! ]))
//! .unwrap();
//!
//! let mut doc = json!({"arr": [1, 2]});
//! patch.apply_and_denormalize(&mut doc, &mut HaltOnFailure).unwrap();
//! assert_eq!(doc, json!({"arr": [1, 2, 3]}));
//! assert_eq!(patch[0].destination_path().to_string(), "/arr/2");
//! ```

pub mod error;
pub mod operation;
mod apply;
mod inverse;
pub mod strategy;
pub mod patch;
pub mod codec;
pub mod cli;

pub use dom_path::{Path, PathEntry, PathError};
pub use error::{ErrorKind, OperationFailure, PatchError, PatchOutcome};
pub use operation::{PatchOperation, PatchOperationType, Payload};
pub use inverse::InverseOperations;
pub use strategy::{
    FailurePolicy, HaltOnFailure, IgnoreFailureAndContinue, PatchApplicationState,
    PatchApplicationStrategy,
};
pub use patch::{Patch, PatchResult};
pub use codec::json::{from_json, from_json_patch, to_json, to_json_patch};
