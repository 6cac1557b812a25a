//! Optional passes over a finished leaf sequence. Neither touches mapper state.

pub mod redact;
pub mod replace;

pub use redact::{redact, Redactor};
pub use replace::Replacer;
