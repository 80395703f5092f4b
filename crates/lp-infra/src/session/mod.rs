mod file_session;

pub use file_session::{FileSessionStore, DEFAULT_SESSION_FILE};
