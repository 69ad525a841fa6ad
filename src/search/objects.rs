//! API symbol lookup by dotted path.
//!
//! A query such as `bare_script.fetch` splits at the last separator into a module
//! part and a name part. The name part must equal or prefix the object's name;
//! the module part, when present, must equal or prefix the object's module.
//! Matching is case-insensitive.

use super::index::{Document, IndexStore, ObjectEntry, ObjectType};
use serde::Serialize;

/// Separator between module path and object name.
pub const OBJECT_PATH_SEPARATOR: char = '.';

/// A parsed object query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectQuery {
    /// Lower-cased module part; empty matches any module
    pub module: String,
    /// Lower-cased name part
    pub name: String,
}

impl ObjectQuery {
    /// Split a dotted path at its last separator.
    pub fn parse(query: &str) -> Self {
        let query = query.trim();
        let (module, name) = query
            .rsplit_once(OBJECT_PATH_SEPARATOR)
            .unwrap_or(("", query));

        Self {
            module: module.trim().to_lowercase(),
            name: name.trim().to_lowercase(),
        }
    }
}

/// How well the query matched, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NameMatch {
    /// The full name (and module, when given) matched exactly
    Exact,
    Prefix,
}

/// An object entry that satisfied a lookup.
#[derive(Debug, Clone, Copy)]
pub struct ObjectMatch<'a> {
    pub entry: &'a ObjectEntry,
    pub object_type: Option<&'a ObjectType>,
    pub document: &'a Document,
    pub kind: NameMatch,
}

impl ObjectMatch<'_> {
    pub fn full_name(&self) -> String {
        self.entry.full_name()
    }

    /// Display label of the object type, e.g. `Python function`.
    pub fn type_label(&self) -> &str {
        self.object_type.map_or("object", |t| t.label.as_str())
    }

    pub fn is_exact(&self) -> bool {
        self.kind == NameMatch::Exact
    }
}

/// Unordered candidates for already-normalized query parts.
pub(crate) fn candidates<'a>(
    index: &'a IndexStore,
    module_query: &str,
    name_query: &str,
) -> Vec<ObjectMatch<'a>> {
    index
        .objects()
        .iter()
        .filter_map(|entry| {
            if !entry.name_key.starts_with(name_query) {
                return None;
            }
            if !module_query.is_empty() && !entry.module_key.starts_with(module_query) {
                return None;
            }

            let exact = entry.name_key == name_query
                && (module_query.is_empty() || entry.module_key == module_query);
            let document = index.document(entry.doc)?;

            Some(ObjectMatch {
                entry,
                object_type: index.object_type(entry.type_code),
                document,
                kind: if exact {
                    NameMatch::Exact
                } else {
                    NameMatch::Prefix
                },
            })
        })
        .collect()
}

/// Find objects for a dotted query: exact matches first, then prefix matches,
/// each ordered by module path and then document.
///
/// A query with no name part (empty, or ending in the separator) matches nothing.
pub fn match_objects<'a>(query: &str, index: &'a IndexStore) -> Vec<ObjectMatch<'a>> {
    let query = ObjectQuery::parse(query);
    if query.name.is_empty() {
        return Vec::new();
    }

    let mut matches = index.lookup_objects(&query.module, &query.name);
    matches.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then_with(|| a.entry.module_key.cmp(&b.entry.module_key))
            .then_with(|| a.entry.module.cmp(&b.entry.module))
            .then(a.entry.doc.cmp(&b.entry.doc))
            .then_with(|| a.entry.name.cmp(&b.entry.name))
    });

    tracing::debug!(
        "Object lookup '{}.{}': {} matches",
        query.module,
        query.name,
        matches.len()
    );
    matches
}
