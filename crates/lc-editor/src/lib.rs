pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod generate;
pub mod history;
pub mod input;
pub mod library;
pub mod magic;
pub mod session;
pub mod shortcuts;
pub mod tools;

pub use config::{BackendConfig, EditorConfig};
pub use dispatch::{Command, Effect, dispatch};
pub use error::{EditorError, Notice, Severity};
pub use generate::{GenerateError, GenerationKind, Generator, Ticket};
pub use history::{History, HistoryEntry};
pub use library::{KeyValueStore, Library, LibraryError, MemoryStore};
pub use session::{Editor, SelectionState};
pub use tools::ToolKind;
