//! Note writers
//!
//! - [`capture`]: volatile inbox captures, local notes and journal entries
//! - [`knowledge`]: validated stable knowledge notes
//! - [`promote`]: local note to knowledge promotion

pub mod capture;
pub mod knowledge;
pub mod promote;

pub use capture::{capture_inbox, write_journal_entry, write_local_note, JournalEntry, NoteEntry};
pub use knowledge::{write_knowledge_note, KnowledgeEntry, KnowledgeNote};
pub use promote::{
    promote_local_note, promote_local_note_with, HeuristicLocalNoteFormat, LocalNoteFormat,
    PromoteRequest, Promotion,
};
