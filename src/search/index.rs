//! Immutable in-memory representation of a Sphinx `searchindex.js`.
//!
//! The raw artifact is normalized once at load time: term keys are lower-cased,
//! the "single document or list" posting shape is collapsed into a uniform
//! `Vec<Posting>`, object anchors are resolved, and every document reference is
//! range-checked. After [`IndexStore::load`] returns, the store is read-only and
//! can be shared behind an `Arc` by any number of concurrent queries.

use crate::error::{IndexError, IndexFormatError, IndexIntegrityError};
use crate::search::objects::{self, ObjectMatch};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::{Bound, RangeInclusive};
use xxhash_rust::xxh3::xxh3_64;

/// Sphinx environment versions whose index layout this loader understands.
pub const SUPPORTED_ENV_VERSIONS: RangeInclusive<u32> = 56..=70;

/// JavaScript wrapper Sphinx emits around the JSON payload.
const WRAPPER_PREFIX: &str = "Search.setIndex(";

/// One page of the documentation corpus. Identified by its position in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Stable logical name (e.g. `errors`)
    pub docname: String,
    /// Source path relative to the documentation root (e.g. `errors.rst`)
    pub filename: String,
    /// Display title
    pub title: String,
}

/// Where a term occurs within a document, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MatchLocation {
    BodyLater,
    BodyFirst,
    Title,
}

impl MatchLocation {
    /// Decode the integer weight code stored in the index.
    pub const fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Title),
            1 => Some(Self::BodyFirst),
            2 => Some(Self::BodyLater),
            _ => None,
        }
    }
}

/// A single (document, location) hit for a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc: usize,
    pub location: MatchLocation,
}

/// Ordered term table supporting exact lookups and prefix range scans.
#[derive(Debug, Clone, Default)]
pub struct TermTable {
    entries: BTreeMap<String, Vec<Posting>>,
}

impl TermTable {
    /// Postings for an exact key, or `None` if the key is absent.
    ///
    /// A present key may still have no postings (Sphinx emits `"term": []`).
    pub fn get(&self, term: &str) -> Option<&[Posting]> {
        self.entries.get(term).map(Vec::as_slice)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.entries.contains_key(term)
    }

    /// All keys beginning with `stem`, in lexical order.
    pub fn prefix<'a, 's>(
        &'a self,
        stem: &'s str,
    ) -> impl Iterator<Item = (&'a str, &'a [Posting])> + use<'a, 's> {
        self.entries
            .range::<str, _>((Bound::Included(stem), Bound::Unbounded))
            .take_while(move |(key, _)| key.starts_with(stem))
            .map(|(key, postings)| (key.as_str(), postings.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn build(
        table: &'static str,
        raw: HashMap<String, RawPosting>,
        default_location: MatchLocation,
        doc_count: usize,
    ) -> Result<Self, IndexError> {
        let mut entries: BTreeMap<String, Vec<Posting>> = BTreeMap::new();

        for (key, posting) in raw {
            let mut postings = Vec::new();
            for entry in posting.into_entries() {
                let (doc, location) = match entry {
                    RawPostingEntry::Doc(doc) => (doc, default_location),
                    RawPostingEntry::Weighted(doc, code) => {
                        let location = MatchLocation::from_code(code).ok_or_else(|| {
                            IndexFormatError::WeightCode {
                                term: key.clone(),
                                code,
                            }
                        })?;
                        (doc, location)
                    }
                };
                check_doc(table, &key, doc, doc_count)?;
                postings.push(Posting { doc, location });
            }

            let normalized = key.to_lowercase();
            if normalized.is_empty() {
                // Sphinx emits an empty key for punctuation-only tokens; nothing can query it
                tracing::trace!("Skipping empty key in `{}`", table);
                continue;
            }

            // `The` and `the` collapse into one key
            entries.entry(normalized).or_default().extend(postings);
        }

        // One posting per document, keeping its strongest location
        for postings in entries.values_mut() {
            postings.sort_by(|a, b| a.doc.cmp(&b.doc).then(b.location.cmp(&a.location)));
            postings.dedup_by_key(|posting| posting.doc);
        }

        Ok(Self { entries })
    }
}

/// Human-readable description of an object type code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectType {
    /// Domain name, e.g. `py`
    pub domain: String,
    /// Role within the domain, e.g. `function`
    pub role: String,
    /// Display label, e.g. `Python function`
    pub label: String,
}

/// Search priority Sphinx assigns to each object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectPriority {
    Important,
    Default,
    Unimportant,
    Hidden,
}

impl ObjectPriority {
    const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Important),
            1 => Some(Self::Default),
            2 => Some(Self::Unimportant),
            -1 => Some(Self::Hidden),
            _ => None,
        }
    }
}

/// One API symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Owning module path (may be empty for top-level objects)
    pub module: String,
    pub name: String,
    /// In-page fragment identifier, already resolved
    pub anchor: String,
    pub type_code: u32,
    pub priority: ObjectPriority,
    pub doc: usize,
    pub(crate) module_key: String,
    pub(crate) name_key: String,
}

impl ObjectEntry {
    /// Dotted path including the module, e.g. `bare_script.fetch_http`.
    pub fn full_name(&self) -> String {
        if self.module.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.module, self.name)
        }
    }
}

/// A section heading and the in-page location it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub doc: usize,
    /// `None` means the top of the page
    pub anchor: Option<String>,
}

/// Provenance tags recorded at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvMetadata {
    pub sphinx_version: u32,
    /// Domain extensions present in the build (`python`, `std`, ...)
    pub domains: Vec<String>,
    /// xxh3 hash of the raw artifact
    pub fingerprint: u64,
}

/// Summary of a loaded index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    pub documents: usize,
    pub terms: usize,
    pub title_terms: usize,
    pub objects: usize,
    pub sections: usize,
    pub sphinx_version: u32,
    pub domains: Vec<String>,
    pub fingerprint: String,
}

/// The loaded, immutable search index.
#[derive(Debug, Clone)]
pub struct IndexStore {
    documents: Vec<Document>,
    terms: TermTable,
    title_terms: TermTable,
    /// Sorted by (module, name, doc)
    objects: Vec<ObjectEntry>,
    object_types: BTreeMap<u32, ObjectType>,
    /// Sorted by (doc, title)
    sections: Vec<Section>,
    env: EnvMetadata,
}

impl IndexStore {
    /// Parse and validate a raw index artifact.
    ///
    /// Accepts either a bare JSON object or the `Search.setIndex(...)` wrapper.
    /// Fails fast on any schema mismatch or dangling document reference.
    pub fn load(raw: &str) -> Result<Self, IndexError> {
        let start = std::time::Instant::now();

        let payload = strip_wrapper(raw)?;
        let parsed: RawIndex =
            serde_json::from_str(payload).map_err(|e| IndexFormatError::Json(e.to_string()))?;

        let env = read_env(parsed.envversion, xxh3_64(raw.as_bytes()))?;
        let documents = build_documents(parsed.docnames, parsed.filenames, parsed.titles)?;
        let doc_count = documents.len();

        let terms = TermTable::build("terms", parsed.terms, MatchLocation::BodyLater, doc_count)?;
        let title_terms = TermTable::build(
            "titleterms",
            parsed.titleterms,
            MatchLocation::Title,
            doc_count,
        )?;
        let object_types = build_object_types(parsed.objtypes, parsed.objnames)?;
        let objects = build_objects(parsed.objects, &object_types, doc_count)?;
        let sections = build_sections(parsed.alltitles, doc_count)?;

        let index = Self {
            documents,
            terms,
            title_terms,
            objects,
            object_types,
            sections,
            env,
        };

        tracing::info!(
            "Loaded search index: {} documents, {} terms, {} title terms, {} objects in {:?}",
            index.document_count(),
            index.terms.len(),
            index.title_terms.len(),
            index.objects.len(),
            start.elapsed()
        );

        Ok(index)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn document(&self, doc: usize) -> Option<&Document> {
        self.documents.get(doc)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Body-term postings for an exact (normalized) key.
    pub fn lookup_term(&self, term: &str) -> &[Posting] {
        self.terms.get(term).unwrap_or_default()
    }

    /// Title-term postings for an exact (normalized) key.
    pub fn lookup_title_term(&self, term: &str) -> &[Posting] {
        self.title_terms.get(term).unwrap_or_default()
    }

    pub fn terms(&self) -> &TermTable {
        &self.terms
    }

    pub fn title_terms(&self) -> &TermTable {
        &self.title_terms
    }

    /// Keys from either table that begin with `stem`, sorted and deduplicated.
    pub fn prefix_terms<'a>(&'a self, stem: &str) -> Vec<&'a str> {
        let mut keys: Vec<&str> = self
            .title_terms
            .prefix(stem)
            .chain(self.terms.prefix(stem))
            .map(|(key, _)| key)
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// Objects whose name matches `name_query` and whose module matches
    /// `module_query` (empty matches any module). Unranked.
    pub fn lookup_objects(&self, module_query: &str, name_query: &str) -> Vec<ObjectMatch<'_>> {
        objects::candidates(self, module_query, name_query)
    }

    pub fn objects(&self) -> &[ObjectEntry] {
        &self.objects
    }

    pub fn object_type(&self, code: u32) -> Option<&ObjectType> {
        self.object_types.get(&code)
    }

    /// Section headings of one document, ordered by title.
    pub fn sections_for(&self, doc: usize) -> &[Section] {
        let start = self.sections.partition_point(|s| s.doc < doc);
        let end = self.sections.partition_point(|s| s.doc <= doc);
        &self.sections[start..end]
    }

    pub fn env(&self) -> &EnvMetadata {
        &self.env
    }

    pub fn info(&self) -> IndexInfo {
        IndexInfo {
            documents: self.documents.len(),
            terms: self.terms.len(),
            title_terms: self.title_terms.len(),
            objects: self.objects.len(),
            sections: self.sections.len(),
            sphinx_version: self.env.sphinx_version,
            domains: self.env.domains.clone(),
            fingerprint: format!("{:016x}", self.env.fingerprint),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawIndex {
    docnames: Vec<String>,
    filenames: Vec<String>,
    titles: Vec<String>,
    terms: HashMap<String, RawPosting>,
    titleterms: HashMap<String, RawPosting>,
    #[serde(default)]
    objects: HashMap<String, Vec<RawObject>>,
    #[serde(default)]
    objtypes: HashMap<String, String>,
    #[serde(default)]
    objnames: HashMap<String, (String, String, String)>,
    #[serde(default)]
    alltitles: HashMap<String, Vec<(usize, Option<String>)>>,
    envversion: Option<HashMap<String, u32>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPosting {
    Single(usize),
    Many(Vec<RawPostingEntry>),
}

impl RawPosting {
    fn into_entries(self) -> Vec<RawPostingEntry> {
        match self {
            Self::Single(doc) => vec![RawPostingEntry::Doc(doc)],
            Self::Many(entries) => entries,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPostingEntry {
    Doc(usize),
    Weighted(usize, u64),
}

/// `[docIndex, typeCode, priority, anchor, name]`
type RawObject = (usize, u32, i64, String, String);

fn strip_wrapper(raw: &str) -> Result<&str, IndexFormatError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed);
    }

    let inner = trimmed
        .strip_prefix(WRAPPER_PREFIX)
        .ok_or(IndexFormatError::Wrapper)?;
    let inner = inner.trim_end();
    let inner = inner.strip_suffix(';').unwrap_or(inner).trim_end();
    inner.strip_suffix(')').ok_or(IndexFormatError::Wrapper)
}

fn read_env(
    envversion: Option<HashMap<String, u32>>,
    fingerprint: u64,
) -> Result<EnvMetadata, IndexFormatError> {
    let envversion = envversion.ok_or(IndexFormatError::MissingField("envversion"))?;
    let sphinx_version = *envversion
        .get("sphinx")
        .ok_or(IndexFormatError::MissingField("envversion.sphinx"))?;

    if !SUPPORTED_ENV_VERSIONS.contains(&sphinx_version) {
        return Err(IndexFormatError::UnsupportedVersion {
            found: sphinx_version,
            min: *SUPPORTED_ENV_VERSIONS.start(),
            max: *SUPPORTED_ENV_VERSIONS.end(),
        });
    }

    let mut domains: Vec<String> = envversion
        .keys()
        .filter_map(|key| key.strip_prefix("sphinx.domains."))
        .map(str::to_string)
        .collect();
    domains.sort_unstable();

    Ok(EnvMetadata {
        sphinx_version,
        domains,
        fingerprint,
    })
}

fn build_documents(
    docnames: Vec<String>,
    filenames: Vec<String>,
    titles: Vec<String>,
) -> Result<Vec<Document>, IndexFormatError> {
    if docnames.len() != filenames.len() || docnames.len() != titles.len() {
        return Err(IndexFormatError::LengthMismatch {
            docnames: docnames.len(),
            filenames: filenames.len(),
            titles: titles.len(),
        });
    }

    Ok(docnames
        .into_iter()
        .zip(filenames)
        .zip(titles)
        .map(|((docname, filename), title)| Document {
            docname,
            filename,
            title,
        })
        .collect())
}

fn build_object_types(
    objtypes: HashMap<String, String>,
    objnames: HashMap<String, (String, String, String)>,
) -> Result<BTreeMap<u32, ObjectType>, IndexFormatError> {
    let parse_code = |raw: &str| {
        raw.parse::<u32>().map_err(|_| IndexFormatError::Malformed {
            field: "objtypes",
            reason: format!("type code '{}' is not an integer", raw),
        })
    };

    let mut types = BTreeMap::new();

    for (code, qualified) in &objtypes {
        let (domain, role) = qualified.split_once(':').unwrap_or(("", qualified));
        types.insert(
            parse_code(code)?,
            ObjectType {
                domain: domain.to_string(),
                role: role.to_string(),
                label: qualified.clone(),
            },
        );
    }

    // objnames carries the display label and wins over objtypes
    for (code, (domain, role, label)) in objnames {
        types.insert(
            parse_code(&code)?,
            ObjectType {
                domain,
                role,
                label,
            },
        );
    }

    Ok(types)
}

fn build_objects(
    raw: HashMap<String, Vec<RawObject>>,
    object_types: &BTreeMap<u32, ObjectType>,
    doc_count: usize,
) -> Result<Vec<ObjectEntry>, IndexError> {
    let mut objects = Vec::new();

    for (module, rows) in raw {
        for (doc, type_code, priority, anchor, name) in rows {
            let full_name = if module.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", module, name)
            };
            check_doc("objects", &full_name, doc, doc_count)?;

            let priority =
                ObjectPriority::from_code(priority).ok_or_else(|| IndexFormatError::Malformed {
                    field: "objects",
                    reason: format!("unknown priority {} for '{}'", priority, full_name),
                })?;
            if priority == ObjectPriority::Hidden {
                continue;
            }

            let object_type =
                object_types
                    .get(&type_code)
                    .ok_or_else(|| IndexFormatError::Malformed {
                        field: "objects",
                        reason: format!("unknown object type {} for '{}'", type_code, full_name),
                    })?;

            let anchor = match anchor.as_str() {
                "" => full_name,
                "-" => format!("{}-{}", object_type.role, full_name),
                _ => anchor,
            };

            objects.push(ObjectEntry {
                module_key: module.to_lowercase(),
                name_key: name.to_lowercase(),
                module: module.clone(),
                name,
                anchor,
                type_code,
                priority,
                doc,
            });
        }
    }

    objects.sort_by(|a, b| {
        a.module
            .cmp(&b.module)
            .then_with(|| a.name.cmp(&b.name))
            .then(a.doc.cmp(&b.doc))
    });

    Ok(objects)
}

fn build_sections(
    alltitles: HashMap<String, Vec<(usize, Option<String>)>>,
    doc_count: usize,
) -> Result<Vec<Section>, IndexIntegrityError> {
    let mut sections = Vec::new();

    for (title, locations) in alltitles {
        for (doc, anchor) in locations {
            check_doc("alltitles", &title, doc, doc_count)?;
            sections.push(Section {
                title: title.clone(),
                doc,
                anchor,
            });
        }
    }

    sections.sort_by(|a, b| {
        a.doc
            .cmp(&b.doc)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.anchor.cmp(&b.anchor))
    });

    Ok(sections)
}

fn check_doc(
    table: &'static str,
    key: &str,
    doc: usize,
    doc_count: usize,
) -> Result<(), IndexIntegrityError> {
    if doc < doc_count {
        Ok(())
    } else {
        Err(IndexIntegrityError {
            table,
            key: key.to_string(),
            doc_index: doc,
            doc_count,
        })
    }
}
