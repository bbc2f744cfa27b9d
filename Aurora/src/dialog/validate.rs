//! Reference checks
//!
//! Every pointer must name an existing node of the other kind and every
//! start an existing entry.

use super::types::Dialog;
use crate::error::{Error, Result};

/// Check every start and pointer target.
///
/// # Errors
/// Returns the first dangling start or pointer, starts first, then
/// entries, then replies.
pub fn validate(dialog: &Dialog) -> Result<()> {
    match problems(dialog).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// All dangling references, in the order [`validate`] checks them.
#[must_use]
pub fn problems(dialog: &Dialog) -> Vec<Error> {
    let mut found = Vec::new();

    for (start, pointer) in dialog.starts.iter().enumerate() {
        if pointer.target as usize >= dialog.entries.len() {
            found.push(Error::DanglingStart {
                start,
                target: pointer.target,
                available: dialog.entries.len(),
            });
        }
    }

    for (owner, position, pointer) in dialog.pointers() {
        let available = dialog.nodes(owner.kind.other()).len();
        if pointer.target as usize >= available {
            found.push(Error::DanglingPointer {
                owner,
                pointer: position,
                target: pointer.target,
                available,
            });
        }
    }
    found
}
