// One error type for the whole viewer.
// Every variant states *where* things went wrong.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(#[from] clap::Error), // Command line could not be tokenised (e.g. no ROM path)

    #[error("Failed to load ROM {}: {reason}", path.display())]
    RomLoad { path: PathBuf, reason: String },

    #[error("Failed to load layer {id}: {reason}")]
    InvalidLayer { id: u16, reason: String },

    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the window failed

    #[error("Window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed

    #[error("Dump write error for {}: {reason}", path.display())]
    DumpWrite { path: PathBuf, reason: String },
}
