use std::path::Path;

use crate::FileFormat;

/// Auto-detect file format from content
pub fn detect_format(content: &str) -> FileFormat {
    let trimmed = content.trim_start();

    if trimmed.starts_with("LOCUS") {
        FileFormat::GenBank
    } else if trimmed.starts_with('>') {
        FileFormat::Fasta
    } else {
        FileFormat::Unknown
    }
}

/// Detect format from file extension
pub fn detect_format_from_extension(path: &Path) -> FileFormat {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "gb" | "gbk" | "genbank" => FileFormat::GenBank,
        "fasta" | "fa" | "fna" | "fsa" => FileFormat::Fasta,
        _ => FileFormat::Unknown,
    }
}

/// Genome files picked up from an input directory: `.fasta`, `.fa` and `.fna`.
pub fn is_sequence_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("fasta" | "fa" | "fna")
    )
}
