//! CLI command for inspecting GFF files

use std::path::Path;

use serde::Serialize;

use crate::compat::LayoutProfile;
use crate::formats::gff::{GffHeader, Section, parse_gff_bytes, read_header};

#[derive(Serialize)]
struct FileInfo {
    header: GffHeader,
    struct_count: usize,
    field_count: usize,
    layout: LayoutProfile,
}

const SECTIONS: [Section; 6] = [
    Section::Structs,
    Section::Fields,
    Section::Labels,
    Section::FieldData,
    Section::FieldIndices,
    Section::ListIndices,
];

pub fn execute(path: &Path, json: bool) -> anyhow::Result<()> {
    let bytes = std::fs::read(path)?;
    let header = read_header(&bytes)?;
    let file = parse_gff_bytes(&bytes)?;
    let tree = file.to_tree()?;
    let info = FileInfo {
        header,
        struct_count: tree.struct_count(),
        field_count: tree.field_count(),
        layout: LayoutProfile::detect(&file)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", path.display());
    println!(
        "Type: {:?}  Version: {}",
        info.header.file_type_str(),
        String::from_utf8_lossy(&info.header.version)
    );
    println!("Size: {} bytes", bytes.len());
    println!();
    println!("{:<12} {:>10} {:>10} {:>10}", "Section", "Offset", "Count", "Bytes");
    for section in SECTIONS {
        let span = info.header.span(section);
        println!(
            "{:<12} {:>10} {:>10} {:>10}",
            section.name(),
            span.offset,
            span.count,
            span.byte_len(section)
        );
    }
    println!();
    println!("Tree: {} structs, {} fields", info.struct_count, info.field_count);

    let layout = &info.layout;
    println!(
        "Ordering: {}",
        layout.ordering.map_or_else(|| "unknown".to_string(), |o| o.to_string())
    );
    println!(
        "Type codes: {}",
        layout.type_codes.map_or_else(|| "unknown".to_string(), |r| r.to_string())
    );
    if !layout.shape_codes.is_empty() {
        let shapes: Vec<String> = layout
            .shape_codes
            .iter()
            .map(|(fields, code)| format!("{fields}->{code}"))
            .collect();
        println!("Shape codes: {}", shapes.join(", "));
    }
    println!("Shared values: {}", if layout.shared_values { "yes" } else { "no" });

    Ok(())
}
