//! Core logic of the `dom-patch` command-line tool.
//!
//! The binary reads a document from stdin, takes the patch array as its
//! positional argument and prints either the patched document, the
//! denormalized patch (`--denormalize`) or the inverse patch (`--invert`).

use clap::Parser;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::codec::json::from_json_patch;
use crate::error::PatchError;
use crate::patch::Patch;
use crate::strategy::FailurePolicy;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Patch(#[from] PatchError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Command-line options of `dom-patch`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(
    name = "dom-patch",
    about = "Apply a JSON patch array to the document read from stdin"
)]
pub struct CliOptions {
    /// Keep applying after a failed operation and report the failures on
    /// stderr.
    #[arg(long = "continue")]
    pub keep_going: bool,

    /// Print the patch with `-` markers rewritten into concrete indices.
    #[arg(long, conflicts_with = "invert")]
    pub denormalize: bool,

    /// Print the patch that undoes this one instead of the result.
    #[arg(long)]
    pub invert: bool,

    /// The patch array as JSON text.
    #[arg(value_name = "PATCH")]
    pub patch: String,
}

impl CliOptions {
    pub fn policy(&self) -> FailurePolicy {
        if self.keep_going {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Halt
        }
    }
}

/// What `run` produced. `warnings` holds failures tolerated under
/// `--continue`.
#[derive(Debug, Clone, PartialEq)]
pub struct CliOutput {
    pub output: String,
    pub warnings: Option<PatchError>,
}

/// Apply, denormalize or invert the patch in `options` against `doc_json`.
pub fn run(options: &CliOptions, doc_json: &str) -> Result<CliOutput, CliError> {
    let mut doc: Value = serde_json::from_str(doc_json)?;
    let mut patch: Patch = from_json_patch(&serde_json::from_str(&options.patch)?)?;
    let mut policy = options.policy();

    if options.invert {
        let inverse = patch.get_inverse(&doc)?;
        return Ok(CliOutput { output: serde_json::to_string(&inverse)?, warnings: None });
    }

    let (outcome, output) = if options.denormalize {
        let outcome = patch.apply_and_denormalize(&mut doc, &mut policy);
        (outcome, serde_json::to_string(&patch)?)
    } else {
        let outcome = patch.apply_in_place(&mut doc, &mut policy);
        (outcome, serde_json::to_string(&doc)?)
    };

    match (outcome, policy) {
        (Ok(()), _) => Ok(CliOutput { output, warnings: None }),
        (Err(error), FailurePolicy::Continue) => {
            warn!(%error, "patch applied with failures");
            Ok(CliOutput { output, warnings: Some(error) })
        }
        (Err(error), FailurePolicy::Halt) => Err(error.into()),
    }
}
