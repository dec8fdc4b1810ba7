//! Hashing protocol for directory trees
//!
//! A directory's digest is the digest of its descriptor: one entry string per
//! accepted child, each entry a sorted, `\0`-joined list of `key:value`
//! properties, and the entries themselves sorted and joined by `\0\0`.
//! Subdirectories contribute `dirhash:<digest>`, files `data:<digest>` when
//! content is selected; `name` and `is_link` are added when selected.

use crate::algorithm::HasherFactory;
use crate::error::{DirhashError, Result};
use crate::tree::path::RecursionPath;
use crate::tree::walker::{CyclicLinkedDir, Node};
use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;

/// Default read size for file content hashing (1 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

const PROPERTY_SEPARATOR: &str = "\0";
const ENTRY_SEPARATOR: &str = "\0\0";
const DIRHASH_KEY: &str = "dirhash";

/// Entry properties a directory descriptor can include
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryProperty {
    Name,
    Data,
    IsLink,
}

impl EntryProperty {
    pub const ALL: [EntryProperty; 3] = [EntryProperty::Name, EntryProperty::Data, EntryProperty::IsLink];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryProperty::Name => "name",
            EntryProperty::Data => "data",
            EntryProperty::IsLink => "is_link",
        }
    }
}

impl fmt::Display for EntryProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryProperty {
    type Err = DirhashError;

    fn from_str(s: &str) -> Result<Self> {
        EntryProperty::ALL
            .iter()
            .copied()
            .find(|property| property.as_str() == s.trim())
            .ok_or_else(|| {
                DirhashError::InvalidEntryProperties(format!(
                    "entry property {:?} not supported (expected one of name, data, is_link)",
                    s
                ))
            })
    }
}

/// What to do when a symlink points back into the current branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclicLinkPolicy {
    #[default]
    Raise,
    /// Hash the relative path from the link to its target instead of descending
    HashReference,
}

/// A visited entry paired with its digest
#[derive(Debug, Clone)]
pub struct HashedEntry {
    pub path: RecursionPath,
    pub digest: String,
}

/// Immutable hashing protocol configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protocol {
    entry_properties: BTreeSet<EntryProperty>,
    cyclic_links: CyclicLinkPolicy,
}

impl Default for Protocol {
    fn default() -> Self {
        Self {
            entry_properties: [EntryProperty::Name, EntryProperty::Data].into_iter().collect(),
            cyclic_links: CyclicLinkPolicy::Raise,
        }
    }
}

impl Protocol {
    /// At least one of `name` and `data` must be selected.
    pub fn new<I>(entry_properties: I, allow_cyclic_links: bool) -> Result<Self>
    where
        I: IntoIterator<Item = EntryProperty>,
    {
        let entry_properties: BTreeSet<_> = entry_properties.into_iter().collect();
        if !entry_properties.contains(&EntryProperty::Name)
            && !entry_properties.contains(&EntryProperty::Data)
        {
            return Err(DirhashError::InvalidEntryProperties(
                "at least one of entry properties `name` and `data` must be used".to_string(),
            ));
        }
        let cyclic_links = if allow_cyclic_links {
            CyclicLinkPolicy::HashReference
        } else {
            CyclicLinkPolicy::Raise
        };
        Ok(Self {
            entry_properties,
            cyclic_links,
        })
    }

    /// Build a protocol from property names such as `["name", "data"]`.
    pub fn parse<I, S>(entry_properties: I, allow_cyclic_links: bool) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let properties = entry_properties
            .into_iter()
            .map(|name| name.as_ref().parse::<EntryProperty>())
            .collect::<Result<Vec<_>>>()?;
        Self::new(properties, allow_cyclic_links)
    }

    pub fn entry_properties(&self) -> impl Iterator<Item = EntryProperty> + '_ {
        self.entry_properties.iter().copied()
    }

    pub fn includes(&self, property: EntryProperty) -> bool {
        self.entry_properties.contains(&property)
    }

    pub fn cyclic_links(&self) -> CyclicLinkPolicy {
        self.cyclic_links
    }

    pub fn allow_cyclic_links(&self) -> bool {
        self.cyclic_links == CyclicLinkPolicy::HashReference
    }

    /// Canonical descriptor of a visited directory node
    pub fn descriptor(&self, node: &Node<HashedEntry, HashedEntry>) -> String {
        match node {
            Node::Dir(dir) => {
                let mut entries: Vec<String> = dir
                    .directories
                    .iter()
                    .map(|entry| self.entry_descriptor(entry, true))
                    .chain(dir.files.iter().map(|entry| self.entry_descriptor(entry, false)))
                    .collect();
                entries.sort();
                entries.join(ENTRY_SEPARATOR)
            }
            Node::Linked(_) => String::new(),
            Node::Cyclic(cyclic) => cyclic_descriptor(cyclic),
        }
    }

    fn entry_descriptor(&self, entry: &HashedEntry, is_dir: bool) -> String {
        let mut properties = Vec::with_capacity(3);
        if is_dir {
            properties.push(format!("{}:{}", DIRHASH_KEY, entry.digest));
        } else if self.includes(EntryProperty::Data) {
            properties.push(format!("{}:{}", EntryProperty::Data, entry.digest));
        }
        if self.includes(EntryProperty::Name) {
            properties.push(format!("{}:{}", EntryProperty::Name, entry.path.name()));
        }
        if self.includes(EntryProperty::IsLink) {
            let is_link = if entry.path.is_symlink() { "True" } else { "False" };
            properties.push(format!("{}:{}", EntryProperty::IsLink, is_link));
        }
        properties.sort();
        properties.join(PROPERTY_SEPARATOR)
    }
}

/// Relative path from the link location to the directory it points back to
pub fn cyclic_descriptor(cyclic: &CyclicLinkedDir) -> String {
    relative_path(cyclic.path.relative(), cyclic.target_path.relative())
}

/// `/`-separated relative path from `from` to `to`, both relative to the same root.
/// The root is the empty path; identical paths give `.`.
fn relative_path(from: &str, to: &str) -> String {
    let from: Vec<&str> = from.split('/').filter(|c| !c.is_empty()).collect();
    let to: Vec<&str> = to.split('/').filter(|c| !c.is_empty()).collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let parts: Vec<&str> = std::iter::repeat("..")
        .take(from.len() - common)
        .chain(to[common..].iter().copied())
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Digest of a descriptor string with a fresh hasher
pub fn hash_descriptor(factory: &dyn HasherFactory, descriptor: &str) -> String {
    let mut hasher = factory.create();
    hasher.update(descriptor.as_bytes());
    hasher.finalize_hex()
}

/// Stream a file's content through a fresh hasher, `chunk_size` bytes at a time.
pub fn hash_file(path: &Path, factory: &dyn HasherFactory, chunk_size: usize) -> Result<String> {
    let mut file = File::open(path).map_err(|e| DirhashError::io(path, e))?;
    let mut hasher = factory.create();
    let mut buffer = vec![0u8; chunk_size.max(1)];
    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(DirhashError::io(path, e)),
        };
        hasher.update(&buffer[..read]);
    }
    Ok(hasher.finalize_hex())
}
