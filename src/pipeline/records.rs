use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::alignment::lexicon::Lexicon;
use crate::alignment::normalize::strip_reference_header;
use crate::error::AlignmentError;
use crate::pipeline::traits::ReferenceStore;

pub const TRANSCRIPT_FILE_NAME: &str = "transcript.txt";
const ARTICLE_ID_DIGITS: usize = 17;

/// One `id|text` line of a prompt file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRecord {
    pub id: String,
    pub text: String,
}

impl PromptRecord {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    pub fn to_line(&self) -> String {
        format!("{}|{}", self.id, self.text)
    }
}

/// Parses prompt lines. Blank lines are skipped; a line without `|` or with
/// an empty id yields a [`AlignmentError::MalformedRecord`] carrying its
/// 1-based line number.
pub fn parse_records(input: &str) -> Vec<Result<PromptRecord, AlignmentError>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            let line_no = idx + 1;
            let (id, text) = line
                .split_once('|')
                .ok_or_else(|| AlignmentError::malformed_record(line_no, "missing '|' separator", line))?;
            let id = id.trim();
            if id.is_empty() {
                return Err(AlignmentError::malformed_record(line_no, "empty record id", line));
            }
            Ok(PromptRecord::new(id, text.trim()))
        })
        .collect()
}

pub fn read_records(path: &Path) -> Result<Vec<Result<PromptRecord, AlignmentError>>, AlignmentError> {
    let data = fs::read_to_string(path).map_err(|e| AlignmentError::io("read prompt records", e))?;
    Ok(parse_records(&data))
}

pub fn write_records(path: &Path, records: &[PromptRecord]) -> Result<(), AlignmentError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AlignmentError::io("create prompt output directory", e))?;
    }
    let mut out = String::new();
    for record in records {
        out.push_str(&record.to_line());
        out.push('\n');
    }
    fs::write(path, out).map_err(|e| AlignmentError::io("write prompt records", e))
}

fn is_article_id(part: &str) -> bool {
    part.len() == ARTICLE_ID_DIGITS && part.bytes().all(|b| b.is_ascii_digit())
}

/// First 17-digit `_`-separated part of a record id's file stem.
///
/// `thoi-su_20240901123456789_3.wav` belongs to article `20240901123456789`.
pub fn article_id_from_record_id(record_id: &str) -> Option<&str> {
    file_stem(record_id).split('_').find(|part| is_article_id(part))
}

fn file_stem(record_id: &str) -> &str {
    let name = record_id.rsplit(['/', '\\']).next().unwrap_or(record_id);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Key of the reference document a record belongs to: its article id, or
/// the whole file stem when the id carries none.
pub fn document_key(record_id: &str) -> &str {
    article_id_from_record_id(record_id).unwrap_or_else(|| file_stem(record_id))
}

/// A reference document as handed to the aligner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceDocument<'a> {
    pub key: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    category: String,
    text: String,
}

/// Reference transcripts laid out as `<root>/<category>/<article_id>/transcript.txt`.
#[derive(Debug, Clone, Default)]
pub struct DirectoryReferenceStore {
    documents: HashMap<String, StoredDocument>,
}

impl DirectoryReferenceStore {
    pub fn load(root: &Path, lexicon: &Lexicon) -> Result<Self, AlignmentError> {
        let mut documents: HashMap<String, StoredDocument> = HashMap::new();
        for category_dir in sorted_dirs(root)? {
            let category = dir_name(&category_dir);
            for article_dir in sorted_dirs(&category_dir)? {
                let article_id = dir_name(&article_dir);
                if !is_article_id(&article_id) {
                    continue;
                }
                let transcript = article_dir.join(TRANSCRIPT_FILE_NAME);
                if !transcript.is_file() {
                    tracing::debug!(path = %transcript.display(), "reference store: no transcript");
                    continue;
                }
                if let Some(existing) = documents.get(&article_id) {
                    tracing::warn!(
                        article_id = %article_id,
                        kept = %existing.category,
                        ignored = %category,
                        "reference store: duplicate article id"
                    );
                    continue;
                }
                let raw = fs::read_to_string(&transcript)
                    .map_err(|e| AlignmentError::io("read reference transcript", e))?;
                documents.insert(
                    article_id,
                    StoredDocument {
                        category: category.clone(),
                        text: strip_reference_header(&raw, lexicon),
                    },
                );
            }
        }
        tracing::info!(
            root = %root.display(),
            documents = documents.len(),
            "reference store loaded"
        );
        Ok(Self { documents })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn category(&self, article_id: &str) -> Option<&str> {
        self.documents.get(article_id).map(|d| d.category.as_str())
    }
}

impl ReferenceStore for DirectoryReferenceStore {
    fn lookup(&self, record_id: &str) -> Option<ReferenceDocument<'_>> {
        let (key, doc) = self.documents.get_key_value(document_key(record_id))?;
        Some(ReferenceDocument {
            key: key.as_str(),
            text: doc.text.as_str(),
        })
    }
}

fn sorted_dirs(path: &Path) -> Result<Vec<std::path::PathBuf>, AlignmentError> {
    let mut dirs = fs::read_dir(path)
        .map_err(|e| AlignmentError::io("list reference directory", e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect::<Vec<_>>();
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reference documents keyed by [`document_key`], already cleaned.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceStore {
    documents: HashMap<String, String>,
}

impl InMemoryReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.documents.insert(key.into(), text.into());
    }
}

impl ReferenceStore for InMemoryReferenceStore {
    fn lookup(&self, record_id: &str) -> Option<ReferenceDocument<'_>> {
        let (key, text) = self.documents.get_key_value(document_key(record_id))?;
        Some(ReferenceDocument {
            key: key.as_str(),
            text: text.as_str(),
        })
    }
}
