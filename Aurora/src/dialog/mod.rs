//! Conversation (`.dlg`) documents
//!
//! A conversation is a GFF container with file type `DLG `. Its root holds
//! three lists: entries (NPC lines), replies (player lines) and start
//! pointers into the entries. Entries point at replies and replies at
//! entries. A pointer either owns its target or is a *link* to a node
//! owned elsewhere, which is how conversations loop back on themselves.
//!
//! # Usage
//!
//! ```no_run
//! use aurora::dialog::{self, export};
//!
//! let bytes = std::fs::read("path/to/conversation.dlg")?;
//! let dialog = dialog::decode(&bytes)?;
//! print!("{}", export::render_tree(&dialog));
//!
//! for step in dialog.traverse(0) {
//!     println!("{}{} terminal={:?}", "  ".repeat(step.depth), step.target, step.terminal);
//! }
//!
//! let out = dialog::encode(&dialog)?;
//! # let _ = out;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builder;
pub mod export;
mod parser;
mod traverse;
mod types;
mod validate;

pub use builder::dialog_to_tree;
pub use parser::dialog_from_tree;
pub use traverse::{DialogStats, Edge, Step, TerminalReason, Traversal, traverse};
pub use types::*;
pub use validate::{problems, validate};

use std::path::Path;

use crate::compat::{CompatibilityPolicy, EncodeReport, LayoutProfile, ReferencePolicy, encode_gff};
use crate::error::{Error, Result};
use crate::formats::gff::{GffFile, parse_gff_bytes, write_atomic};

/// File type tag of a conversation.
pub const DLG_FILE_TYPE: [u8; 4] = *b"DLG ";

/// Decode a conversation.
///
/// # Errors
/// Returns a structural error if the bytes are not a well-formed container,
/// or a semantic error if they do not describe a valid conversation.
pub fn decode(bytes: &[u8]) -> Result<Dialog> {
    dialog_from_file(&parse_gff_bytes(bytes)?)
}

/// Decode a conversation and detect the layout it was written with.
///
/// Pass the profile to [`ReferencePolicy::from_profile`] to re-encode in
/// the same layout.
///
/// # Errors
/// As [`decode`].
pub fn decode_with_layout(bytes: &[u8]) -> Result<(Dialog, LayoutProfile)> {
    let file = parse_gff_bytes(bytes)?;
    let dialog = dialog_from_file(&file)?;
    let profile = LayoutProfile::detect(&file)?;
    Ok((dialog, profile))
}

fn dialog_from_file(file: &GffFile) -> Result<Dialog> {
    if file.file_type != DLG_FILE_TYPE {
        return Err(Error::UnexpectedFileType {
            expected: String::from_utf8_lossy(&DLG_FILE_TYPE).into_owned(),
            found: String::from_utf8_lossy(&file.file_type).into_owned(),
        });
    }
    let dialog = dialog_from_tree(file.to_tree()?)?;
    validate(&dialog)?;
    Ok(dialog)
}

/// Encode a conversation with the provisional layout policy.
///
/// # Errors
/// Returns a semantic error for dangling pointers, or an encode error for
/// values the container cannot represent.
pub fn encode(dialog: &Dialog) -> Result<Vec<u8>> {
    Ok(encode_with(dialog, &ReferencePolicy::provisional())?.bytes)
}

/// Encode a conversation under an explicit layout policy.
///
/// # Errors
/// As [`encode`], plus [`Error::InvalidStructOrder`] for a policy that
/// produces an invalid struct order.
pub fn encode_with(dialog: &Dialog, policy: &dyn CompatibilityPolicy) -> Result<EncodeReport> {
    validate(dialog)?;
    encode_gff(&dialog_to_tree(dialog), DLG_FILE_TYPE, policy)
}

/// Read and decode a conversation file.
///
/// # Errors
/// Returns an error if the file cannot be read or decoded.
pub fn read_dialog<P: AsRef<Path>>(path: P) -> Result<Dialog> {
    decode(&std::fs::read(path)?)
}

/// Encode and write a conversation file.
///
/// The file is replaced atomically; on any error the destination is left
/// untouched.
///
/// # Errors
/// Returns an error if encoding or writing fails.
pub fn write_dialog<P: AsRef<Path>>(path: P, dialog: &Dialog) -> Result<()> {
    write_dialog_with(path, dialog, &ReferencePolicy::provisional()).map(|_| ())
}

/// [`write_dialog`] under an explicit layout policy.
///
/// # Errors
/// Returns an error if encoding or writing fails.
pub fn write_dialog_with<P: AsRef<Path>>(
    path: P,
    dialog: &Dialog,
    policy: &dyn CompatibilityPolicy,
) -> Result<EncodeReport> {
    let report = encode_with(dialog, policy)?;
    write_atomic(path.as_ref(), &report.bytes)?;
    Ok(report)
}
