//! Process supervision for worker sessions.
//!
//! The registry maps session ids to live child handles so an external
//! actor can request early termination out of band; the drain keeps the
//! child's output pipes empty while the controller blocks on exit.

mod drain;
mod registry;

// Re-export public API
pub use drain::OutputDrain;
pub use registry::{JobProcess, ProcessRegistry};
