use std::path::Path;

use bytes::Bytes;
use thiserror::Error;

use crate::models::resume::ResumeFile;

/// Largest accepted resume, 10 MiB.
pub const MAX_RESUME_BYTES: u64 = 10 * 1024 * 1024;

const ACCEPTED_EXTENSION: &str = "pdf";

/// A file as dropped or posted by the user, before any checks.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileRejection {
    #[error("No file provided")]
    NoFile,

    #[error("Only one file can be uploaded at a time")]
    MultipleFiles,

    #[error("Invalid file type. Only PDF files are allowed")]
    WrongType,

    #[error("File size must be less than 10MB")]
    TooLarge,

    #[error("File is empty")]
    Empty,
}

/// Accepts exactly one non-empty `.pdf` file of at most `MAX_RESUME_BYTES`.
///
/// Checks run in order: count, type, size. A wrong-type file is reported as
/// such even when it is also too large.
pub fn validate_candidates(mut candidates: Vec<CandidateFile>) -> Result<ResumeFile, FileRejection> {
    let candidate = match candidates.len() {
        0 => return Err(FileRejection::NoFile),
        1 => candidates.remove(0),
        _ => return Err(FileRejection::MultipleFiles),
    };

    if !has_pdf_extension(&candidate.file_name) {
        return Err(FileRejection::WrongType);
    }

    let size = candidate.bytes.len() as u64;
    if size > MAX_RESUME_BYTES {
        return Err(FileRejection::TooLarge);
    }
    if size == 0 {
        return Err(FileRejection::Empty);
    }

    Ok(ResumeFile::new(candidate.file_name, candidate.bytes))
}

/// Rejection for a file that was cut off at the ceiling before it was fully
/// read. The type check still comes first.
pub fn reject_oversized(file_name: &str) -> FileRejection {
    if has_pdf_extension(file_name) {
        FileRejection::TooLarge
    } else {
        FileRejection::WrongType
    }
}

fn has_pdf_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ACCEPTED_EXTENSION))
}
