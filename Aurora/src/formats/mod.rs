//! File format handlers for Aurora engine formats

pub mod gff;

// Re-export main document types
pub use gff::{GffFile, GffStruct, decode_gff, parse_gff_bytes, read_gff, write_gff};
