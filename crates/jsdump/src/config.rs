//! The config tree: a trie of Parts paths to `(file index, Do directive)`,
//! built in one pass over the user-supplied spec (§4.2).

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, selector::Parts};

/// Depth directive. Totally ordered: `PRUNE < SKIP < DECL < SET < RECURSE` (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Do {
    /// Exclude this binding and anything reachable only through it.
    Prune = 1,
    /// Defer to the rest file.
    Skip = 2,
    /// Ensure the binding exists (as `undefined` if a property) — forward declaration.
    Decl = 3,
    /// Ensure the binding holds its final value; property attributes finalized.
    Set = 4,
    /// SET, then recursively bring every own-property and intrinsic value to RECURSE.
    Recurse = 5,
}

impl Do {
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        std::cmp::max(self, other)
    }
}

/// One content entry in a `SpecEntry`, after string-shorthand normalization.
#[derive(Debug, Clone)]
pub struct ContentEntry {
    pub path: Parts,
    pub todo: Do,
    /// Permits deferred out-of-order RECURSE emission without forward-declared placeholders.
    pub reorder: bool,
}

/// Wire form of a content entry: either a bare selector string (shorthand for
/// `{path, do: RECURSE, reorder: false}`) or the explicit object form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentEntrySpec {
    Shorthand(String),
    Explicit {
        path: String,
        #[serde(rename = "do")]
        todo: Do,
        #[serde(default)]
        reorder: bool,
    },
}

/// One output file's worth of declared content, in the order the user wrote it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecEntry {
    pub filename: String,
    #[serde(default)]
    pub contents: Vec<ContentEntrySpec>,
    #[serde(default)]
    pub rest: bool,
}

/// A node in the config trie, keyed by one path component.
#[derive(Debug, Default)]
struct ConfigNode {
    children: AHashMap<String, ConfigNode>,
    /// The file that "claims" the path ending at this node, if any.
    first_file_no: Option<usize>,
    /// The directive for the path ending at this node, if it is a declared leaf.
    entry: Option<(usize, Do, bool)>,
}

/// Trie of Parts paths to `(file index, directives)`, plus the file list itself.
#[derive(Debug)]
pub struct Config {
    pub files: Vec<String>,
    default_file_no: Option<usize>,
    root: ConfigNode,
    /// Each file's declared top-level content entries, in declared order.
    per_file: Vec<Vec<ContentEntry>>,
}

impl Config {
    /// Builds a `Config` from an ordered sequence of spec entries (§4.2).
    ///
    /// # Errors
    /// `ConfigError::MultipleRestEntries` if more than one entry sets
    /// `rest: true`; `ConfigError::EmptyParts`/`MalformedSelector` if any
    /// content path fails to parse.
    pub fn build(spec: &[SpecEntry]) -> Result<Self, ConfigError> {
        let mut files = Vec::with_capacity(spec.len());
        let mut default_file_no = None;
        let mut root = ConfigNode::default();
        let mut per_file = Vec::with_capacity(spec.len());

        for (file_no, entry) in spec.iter().enumerate() {
            files.push(entry.filename.clone());
            if entry.rest {
                if default_file_no.is_some() {
                    return Err(ConfigError::MultipleRestEntries);
                }
                default_file_no = Some(file_no);
            }
            let mut entries = Vec::with_capacity(entry.contents.len());
            for content in &entry.contents {
                let normalized = normalize(content)?;
                insert(&mut root, file_no, &normalized);
                entries.push(normalized);
            }
            per_file.push(entries);
        }

        Ok(Self { files, default_file_no, root, per_file })
    }

    /// A file's declared top-level content entries, in declared order.
    #[must_use]
    pub fn entries(&self, file_no: usize) -> &[ContentEntry] {
        &self.per_file[file_no]
    }

    /// Which file claims this path: the entry's own file if declared there,
    /// else the closest ancestor's claim, else the rest file.
    #[must_use]
    pub fn claiming_file(&self, path: &Parts) -> Option<usize> {
        let mut node = &self.root;
        let mut claim = node.first_file_no;
        for part in path.as_slice() {
            let Some(child) = node.children.get(part) else {
                return claim.or(self.default_file_no);
            };
            node = child;
            if node.first_file_no.is_some() {
                claim = node.first_file_no;
            }
        }
        claim.or(self.default_file_no)
    }

    /// The directive declared for this exact path, if any.
    #[must_use]
    pub fn directive(&self, path: &Parts) -> Option<(usize, Do, bool)> {
        let mut node = &self.root;
        for part in path.as_slice() {
            node = node.children.get(part)?;
        }
        node.entry
    }

    #[must_use]
    pub fn default_file_no(&self) -> Option<usize> {
        self.default_file_no
    }
}

fn normalize(spec: &ContentEntrySpec) -> Result<ContentEntry, ConfigError> {
    match spec {
        ContentEntrySpec::Shorthand(selector) => {
            Ok(ContentEntry { path: Parts::to_parts(selector)?, todo: Do::Recurse, reorder: false })
        }
        ContentEntrySpec::Explicit { path, todo, reorder } => {
            Ok(ContentEntry { path: Parts::to_parts(path)?, todo: *todo, reorder: *reorder })
        }
    }
}

fn insert(root: &mut ConfigNode, file_no: usize, content: &ContentEntry) {
    let mut node = root;
    for part in content.path.as_slice() {
        node = node.children.entry(part.clone()).or_default();
        if node.first_file_no.is_none() {
            node.first_file_no = Some(file_no);
        }
    }
    node.entry = Some((file_no, content.todo, content.reorder));
}
