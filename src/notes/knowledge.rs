//! Stable knowledge notes
//!
//! A knowledge note is validated before anything touches the disk: the domain
//! and at least one tag must survive normalization to `[a-z0-9_-]+`, and in
//! strict mode (the default) at least one non-empty source path is required.

use crate::error::{Error, Result};
use crate::vault::fs::write_replace;
use crate::vault::text::{first_words, format_ymd, normalize_tag, slugify};
use crate::vault::VaultLayout;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

const TITLE_SEED_WORDS: usize = 8;
const FALLBACK_TITLE: &str = "knowledge";

/// Request to write a knowledge note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeEntry {
    /// Note body
    pub text: String,
    /// Title; defaults to the first words of the body
    pub title: Option<String>,
    /// Related project
    pub project_slug: Option<String>,
    /// Knowledge domain (required)
    pub domain: Option<String>,
    /// Tags; `None` defaults to the domain alone
    pub tags: Option<Vec<String>>,
    /// Source references
    pub sources: Vec<String>,
    /// Require at least one source
    pub strict: bool,
}

impl Default for KnowledgeEntry {
    fn default() -> Self {
        Self {
            text: String::new(),
            title: None,
            project_slug: None,
            domain: None,
            tags: None,
            sources: Vec::new(),
            strict: true,
        }
    }
}

impl KnowledgeEntry {
    /// Create a strict entry with the given body
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A validated knowledge note ready to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeNote {
    title: String,
    body: String,
    domain: String,
    tags: Vec<String>,
    project_slug: Option<String>,
    sources: Vec<String>,
    date: String,
}

/// Normalize the domain, failing when nothing remains
pub fn validate_domain(domain: Option<&str>) -> Result<String> {
    let normalized = normalize_tag(domain.unwrap_or_default());
    if normalized.is_empty() {
        return Err(Error::InvalidDomain);
    }
    Ok(normalized)
}

/// Normalize every tag, dropping empties and duplicates; fail if none remain
pub fn validate_tags<S: AsRef<str>>(tags: &[S]) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = normalize_tag(tag.as_ref());
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    if normalized.is_empty() {
        return Err(Error::InvalidTags);
    }
    Ok(normalized)
}

/// Trim sources and drop blanks; in strict mode at least one must remain
pub fn validate_sources<S: AsRef<str>>(sources: &[S], strict: bool) -> Result<Vec<String>> {
    let normalized: Vec<String> = sources
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if strict && normalized.is_empty() {
        return Err(Error::MissingSources);
    }
    Ok(normalized)
}

impl KnowledgeNote {
    /// Validate `entry` and build a note dated `now`
    pub fn new(entry: &KnowledgeEntry, now: DateTime<Utc>) -> Result<Self> {
        let domain = validate_domain(entry.domain.as_deref())?;
        let tags = match &entry.tags {
            Some(tags) => validate_tags(tags)?,
            None => validate_tags(&[domain.as_str()])?,
        };
        let sources = validate_sources(&entry.sources, entry.strict)?;

        let body = entry.text.trim().to_string();
        let title = entry
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                let seed = first_words(&body, TITLE_SEED_WORDS);
                if seed.is_empty() {
                    FALLBACK_TITLE.to_string()
                } else {
                    seed
                }
            });

        Ok(Self {
            title,
            body,
            domain,
            tags,
            project_slug: entry.project_slug.clone(),
            sources,
            date: format_ymd(&now),
        })
    }

    /// Note title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Normalized domain
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Normalized tags
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Source references
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// `<YYYY-MM-DD>-<title-slug>.md`
    pub fn file_name(&self) -> String {
        format!("{}-{}.md", self.date, slugify(&self.title))
    }

    /// Markdown with YAML frontmatter
    pub fn render(&self) -> String {
        let mut lines = vec![
            "---".to_string(),
            "type: knowledge".to_string(),
            format!("tags: [{}]", self.tags.join(", ")),
        ];
        if let Some(project) = &self.project_slug {
            lines.push(format!("project: {}", project));
        }
        lines.push(format!("domain: {}", self.domain));
        lines.push("status: stable".to_string());
        if self.sources.is_empty() {
            lines.push("sources: []".to_string());
        } else {
            lines.push("sources:".to_string());
            lines.extend(self.sources.iter().map(|s| format!("  - path: {}", s)));
        }
        lines.push(format!("created: {}", self.date));
        lines.push(format!("updated: {}", self.date));
        lines.push("---".to_string());
        lines.push(String::new());
        lines.push(format!("# {}", self.title));
        lines.push(String::new());
        lines.push(self.body.clone());
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Validate and write a knowledge note under `Knowledge/`.
///
/// A same-day note with the same title slug is replaced.
pub async fn write_knowledge_note(
    layout: &VaultLayout,
    entry: &KnowledgeEntry,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let note = KnowledgeNote::new(entry, now)?;
    let path = layout.knowledge_dir().join(note.file_name());
    write_replace(&path, &note.render()).await?;
    tracing::info!(
        "Knowledge note written: {} (domain={}, tags={})",
        path.display(),
        note.domain(),
        note.tags().join(",")
    );
    Ok(path)
}
