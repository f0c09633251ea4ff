pub mod detect;
pub mod fasta;
pub mod genbank;
pub mod kmers;
pub mod primers;
pub mod report;

use std::fmt::Display;
use std::path::Path;

use camplicon_core::Sequence;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Unexpected end of input")]
    UnexpectedEnd,
    #[error("Invalid location: {0}")]
    InvalidLocation(String),
    #[error("Line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Attach the offending input, usually a file path.
    pub fn at(self, input: impl Display) -> camplicon_core::Error {
        camplicon_core::Error::malformed(input.to_string(), self.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    GenBank,
    Fasta,
    Unknown,
}

/// Parse a file based on detected format
pub fn parse_file(content: &str) -> Result<Vec<Sequence>, ParseError> {
    match detect::detect_format(content) {
        FileFormat::GenBank => genbank::parse_all(content),
        FileFormat::Fasta => fasta::parse(content),
        FileFormat::Unknown => Err(ParseError::InvalidFormat(
            "Unsupported or unrecognized file format".to_string(),
        )),
    }
}

/// Read every record of a FASTA or GenBank file.
pub fn read_sequences(path: &Path) -> camplicon_core::Result<Vec<Sequence>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ParseError::from(e).at(path.display()))?;
    parse_file(&content).map_err(|e| e.at(path.display()))
}
