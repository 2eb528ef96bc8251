//! Test doubles for knfn.
//!
//! - [`FakeServingClient`]: an in-memory serving platform with optimistic
//!   concurrency, failure injection and a journal of every call
//! - [`SharedBuffer`]: a cloneable writer for capturing deploy output

mod fake;
mod output;

pub use fake::{Call, FakeServingClient, ReadinessScript};
pub use output::SharedBuffer;
