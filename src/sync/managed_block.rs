//! Machine-managed regions inside user-editable markdown
//!
//! A block is delimited by HTML comment markers carrying its id:
//!
//! ```text
//! <!-- openclaw:<id>:start -->
//! ...
//! <!-- openclaw:<id>:end -->
//! ```
//!
//! Merging replaces an existing block in place or appends a new one, so a
//! file never holds more than one block per id.

/// Split of a document around a managed block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRegion<'a> {
    /// Text before the start marker
    pub before: &'a str,
    /// Text between the markers
    pub body: &'a str,
    /// Text after the end marker
    pub after: &'a str,
}

/// A managed block id and its markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedBlock {
    id: String,
    start: String,
    end: String,
}

impl ManagedBlock {
    /// Create a block with the given id
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            start: format!("<!-- openclaw:{}:start -->", id),
            end: format!("<!-- openclaw:{}:end -->", id),
            id,
        }
    }

    /// Block id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Start marker line
    pub fn start_marker(&self) -> &str {
        &self.start
    }

    /// End marker line
    pub fn end_marker(&self) -> &str {
        &self.end
    }

    /// Locate the block: the first start marker followed by an end marker.
    ///
    /// Returns `None` when either marker is missing or the end marker only
    /// appears before the start marker.
    pub fn parse<'a>(&self, text: &'a str) -> Option<BlockRegion<'a>> {
        let start = text.find(&self.start)?;
        let body_start = start + self.start.len();
        let end = body_start + text[body_start..].find(&self.end)?;
        Some(BlockRegion {
            before: &text[..start],
            body: &text[body_start..end],
            after: &text[end + self.end.len()..],
        })
    }

    /// Render the block with `body` trimmed between the markers
    pub fn render(&self, body: &str) -> String {
        format!("{}\n{}\n{}", self.start, body.trim(), self.end)
    }

    /// Replace or append the block in `text`.
    ///
    /// Surrounding content is kept, separated from the block by exactly one
    /// blank line, and the result ends with a single newline, so repeated
    /// merges of the same body are byte-stable.
    pub fn merge(&self, text: &str, body: &str) -> String {
        let block = self.render(body);
        match self.parse(text) {
            Some(region) => {
                let before = region.before.trim_end();
                let after = region.after.trim();
                let mut out = String::with_capacity(text.len() + block.len());
                out.push_str(before);
                out.push_str("\n\n");
                out.push_str(&block);
                if !after.is_empty() {
                    out.push_str("\n\n");
                    out.push_str(after);
                }
                out.push('\n');
                out
            }
            None => format!("{}\n\n{}\n", text.trim_end(), block),
        }
    }
}
