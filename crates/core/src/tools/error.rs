use std::{io, time::Duration};

use thiserror::Error;

/// Errors from invoking one of the external tools (the frame extractor or the
/// tag rewriter)
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("Could not start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },
    #[error("{tool} did not finish within {timeout:.0?}")]
    Timeout { tool: String, timeout: Duration },
    #[error("{tool} exited with {status}: {stderr}")]
    Exit {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("{tool} produced unusable output: {reason}")]
    Output { tool: String, reason: String },
}
