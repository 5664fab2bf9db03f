use std::fmt;

use crate::selector::Parts;

/// Error type for a dump run, separating failures by the stage that raised them.
///
/// A dump either completes or fails fatally (§7): there is no partial dump and
/// no local recovery, so keeping the kinds distinct lets callers report the
/// offending path accurately without string matching.
#[derive(Debug, Clone)]
pub enum DumpError {
    /// Malformed config spec: more than one `rest: true` entry, an empty
    /// selector, or a selector that fails to parse.
    Config(ConfigError),
    /// Traversal through a non-object while resolving a Parts path, or an
    /// attempt to set a property on a primitive.
    Structure { parts: Parts, message: String },
    /// The serializer was asked to do something it cannot: construct a new
    /// object with no Parts to reference it by, serialize a non-user-defined
    /// function, or encountered an unknown primitive kind.
    Serializer { parts: Option<Parts>, message: String },
    /// A reference to an object whose claimed file is earlier than the
    /// current file, and which was not declared there.
    Ordering { parts: Parts, claimed_file: usize, current_file: usize },
}

#[derive(Debug, Clone)]
pub enum ConfigError {
    MultipleRestEntries,
    EmptyParts,
    MalformedSelector(String),
}

impl fmt::Display for DumpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::Structure { parts, message } => {
                write!(f, "structure error at {}: {message}", parts.display())
            }
            Self::Serializer { parts: Some(parts), message } => {
                write!(f, "serializer error at {}: {message}", parts.display())
            }
            Self::Serializer { parts: None, message } => write!(f, "serializer error: {message}"),
            Self::Ordering { parts, claimed_file, current_file } => write!(
                f,
                "ordering error: {} claimed by file {claimed_file} but referenced from file {current_file} \
                 before being declared there",
                parts.display()
            ),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultipleRestEntries => write!(f, "at most one SpecEntry may set rest: true"),
            Self::EmptyParts => write!(f, "a selector must name at least one part"),
            Self::MalformedSelector(selector) => write!(f, "malformed selector: {selector:?}"),
        }
    }
}

impl std::error::Error for DumpError {}
impl std::error::Error for ConfigError {}

impl From<ConfigError> for DumpError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}
