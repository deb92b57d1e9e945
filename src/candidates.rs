use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TandemError;
use crate::session::InputSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl Candidate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            group: None,
        }
    }

    #[cfg(test)]
    pub fn grouped(text: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            group: Some(group.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub preamble: Option<String>,
    pub candidates: Vec<Candidate>,
}

pub trait CandidateSource {
    fn complete(&self, query: &str, session: &InputSession) -> Result<Listing, TandemError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    query: String,
    generation: u64,
    items: Vec<Candidate>,
}

impl CandidateSet {
    pub fn new(query: impl Into<String>, generation: u64, items: Vec<Candidate>) -> Self {
        let items = items
            .into_iter()
            .filter(|item| !item.text.trim().is_empty())
            .collect();
        Self {
            query: query.into(),
            generation,
            items,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn items(&self) -> &[Candidate] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A fixed list filtered by prefix first, then substring. Matching ignores
/// case unless the query has an uppercase letter.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entries: Vec<Candidate>,
}

impl StaticSource {
    pub fn new(entries: Vec<Candidate>) -> Self {
        Self { entries }
    }

    pub fn from_lines(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim_end)
                .filter(|line| !line.is_empty())
                .map(Candidate::new)
                .collect(),
        )
    }

    pub fn load(path: &Path) -> Result<Self, TandemError> {
        let text = fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            let entries = serde_json::from_str::<Vec<Candidate>>(&text)
                .map_err(|err| TandemError::Source(format!("{}: {err}", path.display())))?;
            return Ok(Self::new(entries));
        }
        Ok(Self::from_lines(&text))
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[Candidate] {
        &self.entries
    }
}

impl CandidateSource for StaticSource {
    fn complete(&self, query: &str, _session: &InputSession) -> Result<Listing, TandemError> {
        if query.is_empty() {
            return Ok(Listing {
                preamble: None,
                candidates: self.entries.clone(),
            });
        }

        let fold = !query.chars().any(char::is_uppercase);
        let needle = if fold {
            query.to_lowercase()
        } else {
            query.to_string()
        };
        let mut prefix = Vec::new();
        let mut substring = Vec::new();
        for entry in &self.entries {
            let hay = if fold {
                entry.text.to_lowercase()
            } else {
                entry.text.clone()
            };
            if hay.starts_with(&needle) {
                prefix.push(entry.clone());
            } else if hay.contains(&needle) {
                substring.push(entry.clone());
            }
        }
        prefix.extend(substring);
        Ok(Listing {
            preamble: None,
            candidates: prefix,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
    home: Option<PathBuf>,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            home: None,
        }
    }

    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    fn resolve_dir(&self, dir_part: &str) -> PathBuf {
        if dir_part.is_empty() {
            return self.root.clone();
        }
        if let Some(rest) = dir_part.strip_prefix("~/")
            && let Some(home) = &self.home
        {
            return home.join(rest);
        }
        let path = Path::new(dir_part);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl CandidateSource for FileSource {
    fn complete(&self, query: &str, _session: &InputSession) -> Result<Listing, TandemError> {
        let split = query.rfind('/').map(|idx| idx + 1).unwrap_or(0);
        let (dir_part, name_prefix) = query.split_at(split);
        let dir = self.resolve_dir(dir_part);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Listing::default()),
            Err(err) => return Err(listing_error(err)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(listing_error)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') && !name_prefix.starts_with('.') {
                continue;
            }
            if !name.starts_with(name_prefix) {
                continue;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            names.push(if is_dir { format!("{name}/") } else { name });
        }
        names.sort();

        Ok(Listing {
            preamble: Some(format!("Possible completions in {}", dir.display())),
            candidates: names
                .into_iter()
                .map(|name| Candidate::new(format!("{dir_part}{name}")))
                .collect(),
        })
    }
}

// An interrupted scan means the user quit mid-listing.
fn listing_error(err: io::Error) -> TandemError {
    if err.kind() == io::ErrorKind::Interrupted {
        TandemError::Aborted
    } else {
        TandemError::Io(err)
    }
}
