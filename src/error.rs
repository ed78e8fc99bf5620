//! Top-level error type returned from the public API. Modeled on the
//! teacher's manual-enum-with-`From`-impls style rather than a derive
//! macro: there's no `thiserror`/`anyhow` in this codebase.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::errors::Diagnostics;
use crate::preassembler::PreError;

#[derive(Debug)]
pub enum AssembleError {
    Io { path: PathBuf, source: io::Error },
    Preprocess(PreError),
    Diagnostics(Diagnostics),
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssembleError::Io { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            AssembleError::Preprocess(e) => write!(f, "{}", e),
            AssembleError::Diagnostics(diags) => {
                write!(f, "{} error(s) found", diags.iter().filter(|d| d.severity == crate::errors::Severity::Error).count())
            }
        }
    }
}

impl std::error::Error for AssembleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssembleError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<PreError> for AssembleError {
    fn from(e: PreError) -> Self {
        AssembleError::Preprocess(e)
    }
}
