//! Commit objects: snapshot metadata
//!
//! A commit's content is UTF-8 text:
//!
//! ```text
//! tree <tree-hash>
//! parent <parent-hash>            (omitted for the initial commit)
//! author <name> <<email>> <unix-seconds> <+HHMM|-HHMM>
//! committer <name> <<email>> <unix-seconds> <+HHMM|-HHMM>
//!
//! <message>
//! ```
//!
//! The message is followed by a newline whenever it is non-empty. Parsing
//! rebuilds the commit from its fields and rehashes it, so a commit's hash is
//! always a function of its structured fields rather than of whatever bytes
//! happened to be stored.

use crate::error::{GroveError, Result};
use crate::hash::{compute_hash, object_header, ObjectType};
use chrono::{DateTime, FixedOffset, Local, Timelike};
use std::fmt;
use tracing::trace;

const TREE_PREFIX: &str = "tree ";
const PARENT_PREFIX: &str = "parent ";
const AUTHOR_PREFIX: &str = "author ";
const COMMITTER_PREFIX: &str = "committer ";

const SECONDS_PER_HOUR: i32 = 3600;
const SECONDS_PER_MINUTE: i32 = 60;

/// Identity and time attached to a commit
///
/// Timestamps are stored with whole-second precision in a fixed UTC offset,
/// which is exactly what the text encoding can represent.
#[derive(Debug, Clone)]
pub struct Author {
    name: String,
    email: String,
    timestamp: DateTime<FixedOffset>,
}

impl Author {
    /// Create an author; surrounding whitespace in the name and any
    /// sub-second part of the timestamp are dropped
    ///
    /// The UTC offset is truncated toward zero to whole minutes, keeping the
    /// same instant, so `+01:00:30` becomes `+01:00`.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        let name: String = name.into();
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        Self {
            name: name.trim().to_string(),
            email: email.into(),
            timestamp: timestamp.with_timezone(&whole_minute_offset(timestamp.offset())),
        }
    }

    /// Create an author stamped with the current local time
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Local::now();
        Self::new(name, email, now.with_timezone(now.offset()))
    }

    /// Author name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Author email
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Timestamp in the author's UTC offset
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// Parse `"<name> <<email>> <unix-seconds> <±HHMM>"`
    ///
    /// # Errors
    ///
    /// - [`GroveError::Format`] if the email, timestamp or timezone is malformed
    pub fn parse_line(line: &str) -> Result<Self> {
        let email_start = line
            .find('<')
            .ok_or_else(|| GroveError::format(format!("invalid author format: no email in {:?}", line)))?;
        let name = line[..email_start].trim();

        let parts: Vec<&str> = line[email_start..].split_whitespace().collect();
        let [email, seconds, timezone] = parts.as_slice() else {
            return Err(GroveError::format(format!(
                "invalid author format: expected email, timestamp and timezone in {:?}",
                line
            )));
        };

        let email = email
            .strip_prefix('<')
            .and_then(|e| e.strip_suffix('>'))
            .ok_or_else(|| GroveError::format(format!("invalid author email: {}", email)))?;

        let seconds: i64 = seconds
            .parse()
            .map_err(|e| GroveError::format(format!("invalid timestamp {:?}: {}", seconds, e)))?;
        let offset = parse_timezone(timezone)?;
        let utc = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| GroveError::format(format!("timestamp out of range: {}", seconds)))?;

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            timestamp: utc.with_timezone(&offset),
        })
    }

    fn validate(&self, role: &str) -> Result<()> {
        if self.name.is_empty() {
            return Err(GroveError::validation(format!("commit {} name cannot be empty", role)));
        }
        if self.name.contains(['<', '>', '\n']) {
            return Err(GroveError::validation(format!(
                "commit {} name {:?} contains '<', '>' or a newline",
                role, self.name
            )));
        }
        if self.email.contains(|c: char| c == '<' || c == '>' || c.is_whitespace()) {
            return Err(GroveError::validation(format!(
                "commit {} email {:?} contains '<', '>' or whitespace",
                role, self.email
            )));
        }
        Ok(())
    }

    /// `"<name> <<email>> <unix-seconds> <±HHMM>"`
    fn encode(&self) -> String {
        format!(
            "{} {} {}",
            self,
            self.timestamp.timestamp(),
            format_timezone(self.timestamp.offset().local_minus_utc())
        )
    }
}

/// Authors are equal when name, email, instant and UTC offset all match
impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.email == other.email
            && self.timestamp == other.timestamp
            && self.timestamp.offset() == other.timestamp.offset()
    }
}

impl Eq for Author {}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

fn whole_minute_offset(offset: &FixedOffset) -> FixedOffset {
    let seconds = offset.local_minus_utc();
    FixedOffset::east_opt(seconds - seconds % SECONDS_PER_MINUTE).unwrap_or(*offset)
}

/// Format a UTC offset in seconds as `±HHMM`
///
/// The sign comes from the whole offset, so `-1800` renders as `-0030`.
pub fn format_timezone(offset_seconds: i32) -> String {
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let abs = offset_seconds.unsigned_abs();
    let hours = abs / SECONDS_PER_HOUR as u32;
    let minutes = (abs % SECONDS_PER_HOUR as u32) / SECONDS_PER_MINUTE as u32;
    format!("{}{:02}{:02}", sign, hours, minutes)
}

/// Parse a `±HHMM` timezone into a fixed offset
///
/// # Errors
///
/// - [`GroveError::Format`] unless `tz` is a sign followed by four digits
///   describing an offset below 24 hours with minutes below 60
pub fn parse_timezone(tz: &str) -> Result<FixedOffset> {
    let bytes = tz.as_bytes();
    if bytes.len() != 5 {
        return Err(GroveError::format(format!("invalid timezone format: {}", tz)));
    }

    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return Err(GroveError::format(format!("invalid timezone sign: {}", tz))),
    };
    if !bytes[1..].iter().all(u8::is_ascii_digit) {
        return Err(GroveError::format(format!("invalid timezone digits: {}", tz)));
    }

    let hours: i32 = tz[1..3]
        .parse()
        .map_err(|e| GroveError::format(format!("invalid timezone hours {:?}: {}", tz, e)))?;
    let minutes: i32 = tz[3..5]
        .parse()
        .map_err(|e| GroveError::format(format!("invalid timezone minutes {:?}: {}", tz, e)))?;
    if minutes >= 60 {
        return Err(GroveError::format(format!("invalid timezone minutes: {}", tz)));
    }

    let offset = sign * (hours * SECONDS_PER_HOUR + minutes * SECONDS_PER_MINUTE);
    FixedOffset::east_opt(offset)
        .ok_or_else(|| GroveError::format(format!("timezone out of range: {}", tz)))
}

/// A snapshot record linking a tree to its author and optional parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    hash: String,
    tree_hash: String,
    parent_hash: Option<String>,
    author: Author,
    committer: Author,
    message: String,
}

impl Commit {
    /// Create a commit; the author also acts as committer
    ///
    /// An empty `parent_hash` is treated the same as `None`.
    ///
    /// # Errors
    ///
    /// - [`GroveError::Validation`] if a field cannot be represented in the
    ///   text encoding (empty tree hash or author name, stray `<`/`>`, ...)
    pub fn new(
        tree_hash: impl Into<String>,
        parent_hash: Option<String>,
        message: impl Into<String>,
        author: Author,
    ) -> Result<Self> {
        Self::from_parts(
            tree_hash.into(),
            parent_hash,
            author.clone(),
            author,
            message.into(),
        )
    }

    /// Create the root commit of a history
    pub fn initial(
        tree_hash: impl Into<String>,
        message: impl Into<String>,
        author: Author,
    ) -> Result<Self> {
        Self::new(tree_hash, None, message, author)
    }

    fn from_parts(
        tree_hash: String,
        parent_hash: Option<String>,
        author: Author,
        committer: Author,
        message: String,
    ) -> Result<Self> {
        if tree_hash.is_empty() || tree_hash.contains(char::is_whitespace) {
            return Err(GroveError::validation(format!(
                "commit tree hash {:?} must be non-empty and contain no whitespace",
                tree_hash
            )));
        }
        let parent_hash = parent_hash.filter(|p| !p.is_empty());
        if let Some(parent) = &parent_hash {
            if parent.contains(char::is_whitespace) {
                return Err(GroveError::validation(format!(
                    "commit parent hash {:?} contains whitespace",
                    parent
                )));
            }
        }
        author.validate("author")?;
        committer.validate("committer")?;

        // The encoding always ends a non-empty message with exactly one newline
        let message = message.trim_end_matches('\n').to_string();

        let mut commit = Self {
            hash: String::new(),
            tree_hash,
            parent_hash,
            author,
            committer,
            message,
        };
        commit.hash = compute_hash(commit.encode().as_bytes(), ObjectType::Commit);
        Ok(commit)
    }

    /// Parse commit content (the bytes after the header)
    ///
    /// # Errors
    ///
    /// - [`GroveError::Format`] if the text is not UTF-8, lacks the blank line
    ///   before the message, is missing the tree, author or committer, or has a
    ///   malformed author line
    pub fn parse_content(content: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(content)
            .map_err(|e| GroveError::format(format!("commit content is not UTF-8: {}", e)))?;

        let mut tree_hash = None;
        let mut parent_hash = None;
        let mut author = None;
        let mut committer = None;
        let mut found_blank_line = false;

        let mut lines = text.split('\n');
        for line in lines.by_ref() {
            if line.is_empty() {
                found_blank_line = true;
                break;
            }

            if let Some(rest) = line.strip_prefix(TREE_PREFIX) {
                tree_hash = Some(rest.to_string());
            } else if let Some(rest) = line.strip_prefix(PARENT_PREFIX) {
                parent_hash = Some(rest.to_string());
            } else if let Some(rest) = line.strip_prefix(AUTHOR_PREFIX) {
                author = Some(Author::parse_line(rest).map_err(|e| match e {
                    GroveError::Format(msg) => GroveError::format(format!("failed to parse author: {}", msg)),
                    other => other,
                })?);
            } else if let Some(rest) = line.strip_prefix(COMMITTER_PREFIX) {
                committer = Some(Author::parse_line(rest).map_err(|e| match e {
                    GroveError::Format(msg) => GroveError::format(format!("failed to parse committer: {}", msg)),
                    other => other,
                })?);
            } else {
                trace!("Ignoring unknown commit header line {:?}", line);
            }
        }

        if !found_blank_line {
            return Err(GroveError::format("commit has no blank line before the message"));
        }

        let tree_hash = tree_hash
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GroveError::format("commit missing tree hash"))?;
        let author = author
            .filter(|a| !a.name.is_empty())
            .ok_or_else(|| GroveError::format("commit missing author"))?;
        let committer = committer
            .filter(|c| !c.name.is_empty())
            .ok_or_else(|| GroveError::format("commit missing committer"))?;

        let message = lines.collect::<Vec<_>>().join("\n");
        let message = message.strip_suffix('\n').unwrap_or(&message).to_string();

        Self::from_parts(tree_hash, parent_hash, author, committer, message)
            .map_err(|e| match e {
                GroveError::Validation(msg) => GroveError::format(msg),
                other => other,
            })
    }

    fn encode(&self) -> String {
        let mut buf = String::with_capacity(256 + self.message.len());
        buf.push_str(TREE_PREFIX);
        buf.push_str(&self.tree_hash);
        buf.push('\n');

        if let Some(parent) = &self.parent_hash {
            buf.push_str(PARENT_PREFIX);
            buf.push_str(parent);
            buf.push('\n');
        }

        buf.push_str(AUTHOR_PREFIX);
        buf.push_str(&self.author.encode());
        buf.push('\n');
        buf.push_str(COMMITTER_PREFIX);
        buf.push_str(&self.committer.encode());
        buf.push('\n');

        buf.push('\n');
        buf.push_str(&self.message);
        if !self.message.is_empty() {
            buf.push('\n');
        }
        buf
    }

    /// Object hash (40 hex characters)
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Hash of the snapshot tree
    pub fn tree_hash(&self) -> &str {
        &self.tree_hash
    }

    /// Hash of the parent commit, `None` for the initial commit
    pub fn parent_hash(&self) -> Option<&str> {
        self.parent_hash.as_deref()
    }

    /// Who wrote the change
    pub fn author(&self) -> &Author {
        &self.author
    }

    /// Who recorded the commit; the author unless parsed otherwise
    pub fn committer(&self) -> &Author {
        &self.committer
    }

    /// Commit message without its trailing newline
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this commit starts a history
    pub fn is_initial_commit(&self) -> bool {
        self.parent_hash.is_none()
    }

    /// Canonical content bytes
    pub fn content(&self) -> Vec<u8> {
        self.encode().into_bytes()
    }

    /// Content length in bytes
    pub fn size(&self) -> usize {
        self.encode().len()
    }

    /// `"commit <size>\0"`
    pub fn header(&self) -> String {
        object_header(ObjectType::Commit, self.size())
    }

    /// Header followed by content
    pub fn data(&self) -> Vec<u8> {
        let content = self.encode();
        let mut data = object_header(ObjectType::Commit, content.len()).into_bytes();
        data.extend_from_slice(content.as_bytes());
        data
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
