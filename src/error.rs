//! Error types for the composer core.
//!
//! Geometry problems (a note placed off the canvas, a resize below the
//! minimum width) are never errors: they are clamped or ignored where they
//! happen. What remains here are configuration faults and the one invariant
//! violation the editor can hit at runtime.

use crate::sheet::Instrument;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the composer core and its configuration.
#[derive(Debug, Error)]
pub enum ComposerError {
    /// A channel lookup for an instrument the channel map never registered.
    ///
    /// The instrument selector and the channel map have drifted apart; this
    /// is a programming error and is reported to the top-level handler.
    #[error("no such instrument in the channel map: {0}")]
    UnknownInstrument(Instrument),

    /// An instrument name that does not match any known instrument.
    #[error("unknown instrument name: {0:?}")]
    UnknownInstrumentName(String),

    /// A channel table that is not a bijection onto channels 0-7.
    #[error("invalid channel table: {0}")]
    InvalidChannelTable(String),

    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`crate::config::Config`].
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience alias used across the core.
pub type Result<T> = std::result::Result<T, ComposerError>;
