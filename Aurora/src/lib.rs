//! # Aurora
//!
//! A pure-Rust library for the BioWare Aurora engine's GFF container and the
//! conversation (`.dlg`) documents built on it.
//!
//! ## Layers
//!
//! - **[`formats::gff`]** - the container codec: header, struct/field/label
//!   tables, the field-data blob and the two index tables
//! - **[`compat`]** - layout policies that decide struct numbering, type
//!   codes and value sharing when a tree is written back
//! - **[`dialog`]** - conversations: entries, replies, starts and pointers,
//!   with link-aware traversal and export
//!
//! ## Quick Start
//!
//! ```no_run
//! use aurora::dialog;
//!
//! let mut conversation = dialog::read_dialog("nw_guard.dlg")?;
//! conversation.entries[0].comment = "checked".to_string();
//! dialog::write_dialog("nw_guard.dlg", &conversation)?;
//! # Ok::<(), aurora::Error>(())
//! ```
//!
//! ### Matching the source layout
//!
//! ```no_run
//! use aurora::compat::ReferencePolicy;
//! use aurora::dialog;
//!
//! let bytes = std::fs::read("nw_guard.dlg")?;
//! let (conversation, profile) = dialog::decode_with_layout(&bytes)?;
//! let (policy, _warnings) = ReferencePolicy::from_profile(&profile);
//! let report = dialog::encode_with(&conversation, &policy)?;
//! assert_eq!(report.bytes, bytes);
//! # Ok::<(), aurora::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `aurora` command-line binary

pub mod compat;
pub mod dialog;
pub mod error;
pub mod formats;

// Re-exports for convenience
pub use error::{Error, ErrorKind, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::formats::gff::{FieldType, FieldValue, GffField, GffStruct, LocString, ResRef};

    pub use crate::compat::{CompatWarning, CompatibilityPolicy, LayoutProfile, ReferencePolicy};
    pub use crate::dialog::{Dialog, DialogNode, NodeKind, NodeRef, Pointer, StartPointer};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
