//! Diagnostic system for error reporting.
//!
//! - Error codes for searchability
//! - Clear messages (what went wrong)
//! - Primary span (where it went wrong)
//! - Context labels (why it's wrong)
//!
//! Diagnostics are accumulated in a [`DiagnosticSink`], never thrown as
//! control flow: a failed sub-expression reports once and typing
//! continues, so one run surfaces every independent problem.

mod diagnostic;
mod error_code;
mod sink;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use sink::{DiagnosticSink, SinkConfig};
