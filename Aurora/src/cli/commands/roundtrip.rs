//! CLI command for decode/re-encode checks

use std::path::Path;

use super::PolicyArgs;
use crate::compat::CompatibilityPolicy;
use crate::dialog;

pub fn execute(path: &Path, output: Option<&Path>, args: &PolicyArgs) -> anyhow::Result<()> {
    let source = std::fs::read(path)?;
    let (policy, mut warnings) = args.resolve(&source)?;
    let dialog = dialog::decode(&source)?;

    let report = match output {
        Some(out) => dialog::write_dialog_with(out, &dialog, &policy)?,
        None => dialog::encode_with(&dialog, &policy)?,
    };
    warnings.extend(report.warnings.iter().cloned());

    println!("Policy: {} ({}, {})", policy.name(), policy.ordering, policy.type_codes);
    println!("Input:  {} bytes", source.len());
    println!("Output: {} bytes", report.bytes.len());
    if report.bytes == source {
        println!("Byte-identical");
    } else {
        let first = source
            .iter()
            .zip(&report.bytes)
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| source.len().min(report.bytes.len()));
        println!("Differs from byte {first}");
    }
    for warning in &warnings {
        println!("warning: {warning}");
    }
    if let Some(out) = output {
        println!("Wrote {}", out.display());
    }
    Ok(())
}
