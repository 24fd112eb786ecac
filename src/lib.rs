//! pianoroll - A pointer-driven piano-roll composer.
//!
//! This library provides the note model, the editing state machine, the
//! score builder, and the playback and terminal plumbing around them.

pub mod app;
pub mod audio;
pub mod config;
pub mod editor;
pub mod error;
pub mod sheet;
pub mod transport;
pub mod ui;

// Re-export commonly used types
pub use app::App;
pub use audio::{MutedBackend, PlaybackBackend, SynthEngine};
pub use config::Config;
pub use editor::{CanvasEvent, Editor, InteractionState, PlaybackAction, PointerEvent};
pub use error::{ComposerError, Result};
pub use sheet::{ChannelMap, Composition, Instrument, Note, NoteId, ResizeEdge, Score};
pub use transport::{ProgressLine, Transport};
