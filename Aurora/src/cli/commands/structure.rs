//! CLI command for flow-chart export

use std::path::Path;

use crate::dialog::{self, export};

pub fn execute(path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let dialog = dialog::read_dialog(path)?;
    let json = serde_json::to_string_pretty(&export::structure(&dialog))?;
    super::emit(&json, output)
}
