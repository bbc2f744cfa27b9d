//! CLI command for printing a conversation outline

use std::path::Path;

use crate::dialog::{self, export};

pub fn execute(path: &Path, stats: bool) -> anyhow::Result<()> {
    let dialog = dialog::read_dialog(path)?;
    print!("{}", export::render_tree(&dialog));

    if stats {
        let stats = dialog.stats();
        println!();
        println!(
            "{} entries, {} replies, {} starts",
            stats.entries, stats.replies, stats.starts
        );
        println!(
            "{} edges ({} links, {} dangling), max depth {}",
            stats.edges, stats.links, stats.dangling, stats.max_depth
        );
        let unreachable = dialog.unreachable();
        if !unreachable.is_empty() {
            let names: Vec<String> = unreachable.iter().map(ToString::to_string).collect();
            println!("Unreachable: {}", names.join(", "));
        }
    }
    Ok(())
}
