use std::{io, path::PathBuf};

use thiserror::Error;

/// An error which aborts compilation.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("cannot open output file '{}'", path.display())]
    OutputUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write output")]
    Write(#[from] io::Error),
}
