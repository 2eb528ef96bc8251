//! # knfn-naming
//!
//! Maps arbitrary function names onto names the serving platform accepts.
//!
//! ## Rules
//!
//! Service names must be DNS-1035 labels:
//! - lowercase ASCII letters, digits and `-`
//! - start with a letter, end with a letter or digit
//! - at most 63 characters
//!
//! Function names are frequently domain names (`www.my-domain.com`), which
//! contain dots. Sanitization escapes them so that distinct inputs stay
//! distinct:
//!
//! - `-` becomes `--`
//! - `.` becomes `-`
//!
//! `www.my-domain.com` therefore deploys as `www-my--domain-com`.
//! Names that are already valid labels are kept as they are, which makes
//! sanitization idempotent.

mod error;
mod name;

pub use error::NamingError;
pub use name::{ServiceName, MAX_NAME_LEN};
