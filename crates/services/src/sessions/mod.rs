//! Session lifecycle: start, answer, end, and crash recovery.

mod manager;

pub use manager::SessionManager;
