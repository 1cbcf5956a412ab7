// src/enex/mod.rs
//! Reading notes out of Evernote export (ENEX) files.
//!
//! An export is read lazily: notes are decoded one at a time as the
//! iterator advances, so a large notebook never sits in memory at once.
//! Opening the file again restarts the sequence.

mod reader;

pub use reader::{count_notes, iter_notes, NoteReader};
