use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use crate::compat::{CompatWarning, LayoutProfile, ReferencePolicy, StructOrdering, TypeCodeRule};
use crate::formats::gff::parse_gff_bytes;

pub mod dump;
pub mod info;
pub mod roundtrip;
pub mod structure;
pub mod tree;

/// Layout options shared by commands that encode
#[derive(Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Struct numbering: breadth-first, depth-first or top-level-first
    #[arg(long)]
    pub ordering: Option<StructOrdering>,

    /// Type-code rule: shape-frequency, list-position or preserve
    #[arg(long)]
    pub type_codes: Option<TypeCodeRule>,

    /// Share identical variable-length values in the field-data blob
    #[arg(long)]
    pub dedup: bool,

    /// Load the base policy from a JSON file
    #[arg(long, conflicts_with = "match_source")]
    pub policy: Option<PathBuf>,

    /// Derive the base policy from the input file's detected layout
    #[arg(long)]
    pub match_source: bool,
}

impl PolicyArgs {
    /// Build the policy for re-encoding `source`, the bytes of the input file.
    ///
    /// Explicit flags override whatever the base policy says.
    pub fn resolve(&self, source: &[u8]) -> anyhow::Result<(ReferencePolicy, Vec<CompatWarning>)> {
        let (mut policy, warnings) = if let Some(path) = &self.policy {
            (load_policy(path)?, Vec::new())
        } else if self.match_source {
            let profile = LayoutProfile::detect(&parse_gff_bytes(source)?)?;
            ReferencePolicy::from_profile(&profile)
        } else {
            (ReferencePolicy::provisional(), Vec::new())
        };

        if let Some(ordering) = self.ordering {
            policy = policy.with_ordering(ordering);
        }
        if let Some(rule) = self.type_codes {
            policy = policy.with_type_codes(rule);
        }
        if self.dedup {
            policy = policy.with_dedup(true);
        }
        Ok((policy, warnings))
    }
}

fn load_policy(path: &Path) -> anyhow::Result<ReferencePolicy> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| anyhow::anyhow!("Invalid policy file {}: {e}", path.display()))
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the header, section sizes and detected layout of a GFF file
    Info {
        /// GFF file
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dump the struct tree of a GFF file as JSON
    Dump {
        /// GFF file
        file: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a conversation as an indented outline
    Tree {
        /// Conversation file
        file: PathBuf,

        /// Also print node counts and depth
        #[arg(long)]
        stats: bool,
    },

    /// Export a conversation as a flow-chart JSON graph
    Structure {
        /// Conversation file
        file: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode and re-encode a conversation, reporting byte identity
    Roundtrip {
        /// Conversation file
        file: PathBuf,

        /// Write the re-encoded file here
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        policy: PolicyArgs,
    },
}

impl Commands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Info { file, json } => info::execute(file, *json),
            Commands::Dump { file, output } => dump::execute(file, output.as_deref()),
            Commands::Tree { file, stats } => tree::execute(file, *stats),
            Commands::Structure { file, output } => structure::execute(file, output.as_deref()),
            Commands::Roundtrip { file, output, policy } => {
                roundtrip::execute(file, output.as_deref(), policy)
            }
        }
    }
}

/// Write `text` to `output`, or stdout when no path is given.
pub(crate) fn emit(text: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            println!("Wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::{self, Dialog, DialogNode, Pointer, StartPointer};

    fn sample_bytes(policy: &ReferencePolicy) -> Vec<u8> {
        let mut dialog = Dialog::new();
        dialog.entries.push(DialogNode::with_text("Hello").pointing_to(Pointer::to(0)));
        dialog.entries.push(DialogNode::with_text("Bye"));
        dialog.replies.push(DialogNode::with_text("Hi").pointing_to(Pointer::to(1)));
        dialog.starts.push(StartPointer::new(0));
        dialog::encode_with(&dialog, policy).unwrap().bytes
    }

    #[test]
    fn test_default_args_give_provisional_policy() {
        let bytes = sample_bytes(&ReferencePolicy::provisional());
        let (policy, warnings) = PolicyArgs::default().resolve(&bytes).unwrap();
        assert_eq!(policy, ReferencePolicy::provisional());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_flags_override_matched_source() {
        let source = ReferencePolicy::provisional().with_ordering(StructOrdering::DepthFirst);
        let bytes = sample_bytes(&source);

        let args = PolicyArgs {
            match_source: true,
            ..PolicyArgs::default()
        };
        let (policy, _) = args.resolve(&bytes).unwrap();
        assert_eq!(policy.ordering, StructOrdering::DepthFirst);

        let args = PolicyArgs {
            match_source: true,
            type_codes: Some(TypeCodeRule::Preserve),
            dedup: true,
            ..PolicyArgs::default()
        };
        let (policy, _) = args.resolve(&bytes).unwrap();
        assert_eq!(policy.type_codes, TypeCodeRule::Preserve);
        assert!(policy.dedup_values);
    }

    #[test]
    fn test_policy_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, r#"{"ordering": "top-level-first", "dedup_values": true}"#).unwrap();

        let args = PolicyArgs {
            policy: Some(path),
            ..PolicyArgs::default()
        };
        let (policy, _) = args.resolve(&[]).unwrap();
        assert_eq!(policy.ordering, StructOrdering::TopLevelFirst);
        assert!(policy.dedup_values);
    }
}
