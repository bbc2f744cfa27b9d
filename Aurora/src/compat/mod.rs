//! Round-trip compatibility
//!
//! The container format leaves several layout decisions to the writer.
//! This module isolates them behind [`CompatibilityPolicy`] so the codec
//! stays deterministic and a layout can be tuned without touching it.
//!
//! ```no_run
//! use aurora::compat::{ReferencePolicy, StructOrdering, encode_gff};
//! use aurora::formats::gff::GffStruct;
//!
//! let root = GffStruct::root();
//! let policy = ReferencePolicy::provisional().with_ordering(StructOrdering::DepthFirst);
//! let report = encode_gff(&root, *b"GFF ", &policy)?;
//! assert!(report.warnings.is_empty());
//! # Ok::<(), aurora::Error>(())
//! ```

mod flat;
mod layout;
mod ordering;
mod policy;
mod profile;
mod type_codes;

pub use flat::{FlatStruct, FlatTree};
pub use layout::lay_out;
pub use ordering::StructOrdering;
pub use policy::{CompatWarning, CompatibilityPolicy, ReferencePolicy};
pub use profile::LayoutProfile;
pub use type_codes::{TypeCodeRule, rank_shapes};

use serde::Serialize;

use crate::error::Result;
use crate::formats::gff::{GffStruct, serialize_gff};

/// Encoded bytes along with anything the policy had to guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodeReport {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub warnings: Vec<CompatWarning>,
}

/// Encode a struct tree under a policy.
///
/// # Errors
/// Returns an encode error if the tree cannot be represented, or if the
/// policy produces an invalid struct order.
pub fn encode_gff(
    root: &GffStruct,
    file_type: [u8; 4],
    policy: &dyn CompatibilityPolicy,
) -> Result<EncodeReport> {
    let (file, warnings) = lay_out(root, file_type, policy)?;
    for warning in &warnings {
        tracing::warn!("{}: {warning}", policy.name());
    }
    let bytes = serialize_gff(&file)?;
    tracing::debug!(
        "Encoded {} structs, {} fields into {} bytes",
        file.structs.len(),
        file.fields.len(),
        bytes.len()
    );
    Ok(EncodeReport { bytes, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::gff::{FieldValue, decode_gff};

    fn without_type_codes(s: &GffStruct) -> GffStruct {
        let mut out = GffStruct::new(0);
        for field in &s.fields {
            let value = match &field.value {
                FieldValue::Struct(child) => {
                    FieldValue::Struct(Box::new(without_type_codes(child)))
                }
                FieldValue::List(items) => {
                    FieldValue::List(items.iter().map(without_type_codes).collect())
                }
                other => other.clone(),
            };
            out.push(field.label.clone(), value);
        }
        out
    }

    #[test]
    fn test_encode_decode_with_every_policy() {
        let root = flat::tests::sample_tree();
        for ordering in StructOrdering::ALL {
            for rule in TypeCodeRule::ALL {
                let policy = ReferencePolicy::provisional()
                    .with_ordering(ordering)
                    .with_type_codes(rule);
                let report = encode_gff(&root, *b"GFF ", &policy).unwrap();
                let decoded = decode_gff(&report.bytes).unwrap();
                assert_eq!(
                    without_type_codes(&decoded),
                    without_type_codes(&root),
                    "{ordering} / {rule}"
                );
            }
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let root = GffStruct::root().with("Name", FieldValue::String("Aribeth".into()));
        let policy = ReferencePolicy::provisional();
        let a = encode_gff(&root, *b"GFF ", &policy).unwrap();
        let b = encode_gff(&root, *b"GFF ", &policy).unwrap();
        assert_eq!(a, b);
    }
}
