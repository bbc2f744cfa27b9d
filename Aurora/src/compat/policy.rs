//! Compatibility policies
//!
//! A policy is every layout decision the wire format leaves open: struct
//! numbering, struct type codes, and whether identical out-of-line values
//! share storage. Readers accept any choice; byte-exact output against the
//! reference toolset needs the right one.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::flat::FlatTree;
use super::ordering::StructOrdering;
use super::profile::LayoutProfile;
use super::type_codes::TypeCodeRule;

/// Layout decisions for encoding a struct tree.
pub trait CompatibilityPolicy {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Flat ids in struct-index order. Must be a permutation of
    /// `0..tree.len()` starting with the root.
    fn struct_order(&self, tree: &FlatTree<'_>) -> Vec<usize>;

    /// Type codes indexed by flat id.
    fn type_codes(&self, tree: &FlatTree<'_>, warnings: &mut Vec<CompatWarning>) -> Vec<u32>;

    /// Whether byte-identical out-of-line values share one copy in the
    /// field-data section.
    fn dedup_values(&self) -> bool {
        false
    }

    /// Labels to place first in the label table, in this order. Labels the
    /// tree does not use are skipped; the rest follow in first-use order.
    fn label_order(&self) -> &[String] {
        &[]
    }
}

/// Something the encoder had to guess or correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompatWarning {
    /// More than one shape shares the top frequency; the smallest field
    /// count was given type code 0.
    TiedShapeFrequency {
        field_counts: Vec<u32>,
        chosen: u32,
    },
    /// A shape absent from the learned shape map was given a fresh code.
    NovelShape { field_count: u32, type_code: u32 },
    /// Every non-root type code was taken, so a novel shape shares code 0.
    TypeCodesExhausted { field_count: u32 },
    /// A non-root struct carried the reserved root type code.
    ReservedTypeCode { struct_id: usize },
    /// The root struct carried a type code other than the reserved one.
    RootTypeReplaced { found: u32 },
    /// Layout detection could not determine one aspect of the source file.
    Undetected {
        aspect: &'static str,
        fallback: String,
    },
}

impl fmt::Display for CompatWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TiedShapeFrequency { field_counts, chosen } => write!(
                f,
                "struct shapes {field_counts:?} are equally common; \
                 gave type code 0 to the {chosen}-field shape"
            ),
            Self::NovelShape { field_count, type_code } => write!(
                f,
                "no known type code for {field_count}-field structs; assigned {type_code}"
            ),
            Self::TypeCodesExhausted { field_count } => write!(
                f,
                "no free type code left for {field_count}-field structs; wrote 0"
            ),
            Self::ReservedTypeCode { struct_id } => {
                write!(f, "struct {struct_id} carried the root type code; wrote 0 instead")
            }
            Self::RootTypeReplaced { found } => {
                write!(f, "root struct carried type code {found:#x}; wrote 0xffffffff instead")
            }
            Self::Undetected { aspect, fallback } => {
                write!(f, "could not detect the source {aspect}; using {fallback}")
            }
        }
    }
}

/// The configurable policy behind every built-in layout.
///
/// `Default` is the provisional layout: breadth-first numbering, type codes
/// by shape frequency, no value sharing. It is serializable so a tuned
/// policy can be kept in a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferencePolicy {
    pub ordering: StructOrdering,
    pub type_codes: TypeCodeRule,
    pub dedup_values: bool,
    /// Learned field count → type code map, consulted by
    /// [`TypeCodeRule::ShapeFrequency`] before ranking.
    pub known_shapes: BTreeMap<u32, u32>,
    /// Learned label table order; empty means first-use order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub label_order: Vec<String>,
}

impl ReferencePolicy {
    #[must_use]
    pub fn provisional() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ordering(mut self, ordering: StructOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    #[must_use]
    pub fn with_type_codes(mut self, rule: TypeCodeRule) -> Self {
        self.type_codes = rule;
        self
    }

    #[must_use]
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup_values = dedup;
        self
    }

    /// Build a policy that reproduces a detected source layout.
    ///
    /// Aspects the profile could not pin down fall back to the provisional
    /// choice and are reported as warnings.
    #[must_use]
    pub fn from_profile(profile: &LayoutProfile) -> (Self, Vec<CompatWarning>) {
        let mut warnings = Vec::new();
        let mut policy = Self {
            dedup_values: profile.shared_values,
            label_order: profile.labels.clone(),
            ..Self::default()
        };

        match profile.ordering {
            Some(ordering) => policy.ordering = ordering,
            None => warnings.push(CompatWarning::Undetected {
                aspect: "struct ordering",
                fallback: policy.ordering.to_string(),
            }),
        }

        match profile.type_codes {
            Some(TypeCodeRule::ListPosition) => policy.type_codes = TypeCodeRule::ListPosition,
            _ if profile.consistent_shapes => {
                policy.type_codes = TypeCodeRule::ShapeFrequency;
                policy.known_shapes = profile.shape_codes.clone();
            }
            Some(rule) => policy.type_codes = rule,
            None => warnings.push(CompatWarning::Undetected {
                aspect: "type code rule",
                fallback: policy.type_codes.to_string(),
            }),
        }

        for warning in &warnings {
            tracing::warn!("{warning}");
        }
        (policy, warnings)
    }
}

impl CompatibilityPolicy for ReferencePolicy {
    fn name(&self) -> &str {
        "reference"
    }

    fn struct_order(&self, tree: &FlatTree<'_>) -> Vec<usize> {
        self.ordering.order(tree)
    }

    fn type_codes(&self, tree: &FlatTree<'_>, warnings: &mut Vec<CompatWarning>) -> Vec<u32> {
        self.type_codes.assign(tree, &self.known_shapes, warnings)
    }

    fn dedup_values(&self) -> bool {
        self.dedup_values
    }

    fn label_order(&self) -> &[String] {
        &self.label_order
    }
}
