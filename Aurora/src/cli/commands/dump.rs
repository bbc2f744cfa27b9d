//! CLI command for dumping a GFF struct tree

use std::path::Path;

use crate::formats::gff::decode_gff;

pub fn execute(path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let root = decode_gff(&std::fs::read(path)?)?;
    let json = serde_json::to_string_pretty(&root)?;
    super::emit(&json, output)
}
