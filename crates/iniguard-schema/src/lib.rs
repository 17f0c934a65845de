//! Regex schema model and validator for flat INI configuration.
//!
//! A schema is itself an INI file: each section header is a regular
//! expression for section names, each key under it is a regular expression
//! for option names, and each value is a regular expression the option's
//! value must match. Every pattern is compiled once, at load time, and
//! matched against the WHOLE candidate string.
//!
//! Resolution is two-stage and order-sensitive: the first section pattern
//! that matches a section name owns it, and only that pattern's options are
//! consulted. A later, more general section pattern never rescues an option
//! the earlier one does not declare.

mod error;
mod matcher;
mod schema;
mod validate;

pub use error::{InvalidConfigError, PatternKind, SchemaError, Violation};
pub use matcher::{first_match, Pattern};
pub use schema::{OptionRule, Schema, SectionRule};

/// Section name that is never accepted in a configuration.
///
/// Typical INI readers treat `[DEFAULT]` as a fallback for every other
/// section. That mechanism does not exist here, so the name is reserved.
pub const RESERVED_SECTION: &str = "DEFAULT";
