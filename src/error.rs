use std::io;

use thiserror::Error;

/// Errors that abort a missingness injection run.
#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("missing sample header: {0}")]
    MissingHeader(#[from] MissingHeaderKind),
    #[error("line {line}: expected {expected} tab-separated columns, found {found}")]
    MalformedRecord {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("invalid missingness model: {0}")]
    InvalidModel(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MissingHeaderKind {
    #[error("no #CHROM line found before line {line}")]
    NoColumnLine { line: u64 },
    #[error("#CHROM line at line {line} declares no samples")]
    NoSamples { line: u64 },
}
