//! ACE parsing.
//!
//! An ACL source is an ordered list of chunks. Each chunk is either a text
//! block, one ACE per line:
//!
//! ```text
//! ALLOW WHEEL     ALL        # administrators may do anything
//! DENY  ANONYMOUS http.write
//! GRANT ANY       http.read
//! ```
//!
//! or a structural [`AceEntry`] built in code. Both forms normalize to the
//! same sequence of [`Ace`] values, in declaration order.
//!
//! Text lines are processed as follows: everything from the first `#` is
//! dropped, surrounding whitespace is trimmed, blank lines are skipped, and
//! each remaining line must split into exactly three whitespace-separated
//! fields `STATE PREDICATE PERMISSION-SET`.

use std::iter::Enumerate;
use std::slice;

use serde_json::Value;

use crate::permission::{PermissionSet, parse_permission_set};
use crate::predicate::{PredicateRef, parse_predicate};
use crate::registry::Registry;
use crate::state::{parse_state, resolve_state};
use crate::{Error, Result};

// ============================================================================
// Parsed form
// ============================================================================

/// One access control entry.
#[derive(Clone, Debug)]
pub struct Ace {
    /// Outcome when this entry matches: `true` allows, `false` denies.
    pub state: bool,
    /// Who the entry applies to.
    pub predicate: PredicateRef,
    /// Which permissions the entry governs.
    pub permission_set: PermissionSet,
    /// 1-based line within its text block; `None` for structural entries.
    pub line: Option<usize>,
}

/// A fully parsed ACL.
#[derive(Clone, Debug, Default)]
pub struct Acl {
    aces: Vec<Ace>,
}

impl Acl {
    /// Parse every ACE in `source`, failing on the first bad one.
    pub fn parse(source: &AclSource, registry: &Registry) -> Result<Self> {
        parse_acl(source, registry).collect::<Result<Vec<_>>>().map(Acl::from)
    }

    /// Append the entries of another ACL after this one's.
    pub fn extend(&mut self, other: Acl) {
        self.aces.extend(other.aces);
    }

    /// Entries in evaluation order.
    pub fn iter(&self) -> slice::Iter<'_, Ace> {
        self.aces.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.aces.len()
    }

    /// Whether the ACL has no entries.
    pub fn is_empty(&self) -> bool {
        self.aces.is_empty()
    }
}

impl From<Vec<Ace>> for Acl {
    fn from(aces: Vec<Ace>) -> Self {
        Self { aces }
    }
}

impl<'a> IntoIterator for &'a Acl {
    type Item = &'a Ace;
    type IntoIter = slice::Iter<'a, Ace>;

    fn into_iter(self) -> Self::IntoIter {
        self.aces.iter()
    }
}

// ============================================================================
// Source form
// ============================================================================

/// Predicate component of a structural entry.
#[derive(Clone, Debug)]
pub enum PredicateSpec {
    /// A token, resolved through the registry like a text ACE field.
    Token(String),
    /// A predicate used as-is.
    Resolved(PredicateRef),
}

impl From<&str> for PredicateSpec {
    fn from(token: &str) -> Self {
        PredicateSpec::Token(token.to_string())
    }
}

impl From<String> for PredicateSpec {
    fn from(token: String) -> Self {
        PredicateSpec::Token(token)
    }
}

impl From<PredicateRef> for PredicateSpec {
    fn from(predicate: PredicateRef) -> Self {
        PredicateSpec::Resolved(predicate)
    }
}

/// A structural ACE.
///
/// The permission set is used as-is: no token parsing happens, so a
/// [`PermissionSet::Literal`] string matches by plain equality. The state is
/// still normalized.
#[derive(Clone, Debug)]
pub struct AceEntry {
    /// `true`/`false` or a state token.
    pub state: Value,
    /// Predicate token or resolved predicate.
    pub predicate: PredicateSpec,
    /// Permission set used without parsing.
    pub permission_set: PermissionSet,
}

impl AceEntry {
    /// An entry whose permission set is a literal compared by equality.
    pub fn new(
        state: impl Into<Value>,
        predicate: impl Into<PredicateSpec>,
        permission: impl Into<Value>,
    ) -> Self {
        Self::with_set(state, predicate, PermissionSet::Literal(permission.into()))
    }

    /// An entry with an explicit permission set.
    pub fn with_set(
        state: impl Into<Value>,
        predicate: impl Into<PredicateSpec>,
        permission_set: PermissionSet,
    ) -> Self {
        Self {
            state: state.into(),
            predicate: predicate.into(),
            permission_set,
        }
    }
}

/// One element of an ACL source.
#[derive(Clone, Debug)]
pub enum AclChunk {
    /// Line-oriented ACE text.
    Text(String),
    /// Structural entry.
    Entry(AceEntry),
}

/// Ordered ACL definition, as attached to a protected object.
#[derive(Clone, Debug, Default)]
pub struct AclSource {
    chunks: Vec<AclChunk>,
}

impl AclSource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk.
    pub fn push(&mut self, chunk: impl Into<AclChunk>) {
        self.chunks.push(chunk.into());
    }

    /// Builder-style append.
    pub fn and(mut self, chunk: impl Into<AclChunk>) -> Self {
        self.push(chunk);
        self
    }

    /// Chunks in declaration order.
    pub fn chunks(&self) -> &[AclChunk] {
        &self.chunks
    }

    /// Whether the source has no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Lazily parse this source. Each call starts from the beginning.
    pub fn aces<'a>(&'a self, registry: &'a Registry) -> AceIter<'a> {
        parse_acl(self, registry)
    }
}

impl From<&str> for AclChunk {
    fn from(text: &str) -> Self {
        AclChunk::Text(text.to_string())
    }
}

impl From<String> for AclChunk {
    fn from(text: String) -> Self {
        AclChunk::Text(text)
    }
}

impl From<AceEntry> for AclChunk {
    fn from(entry: AceEntry) -> Self {
        AclChunk::Entry(entry)
    }
}

impl From<AclChunk> for AclSource {
    fn from(chunk: AclChunk) -> Self {
        Self {
            chunks: vec![chunk],
        }
    }
}

impl From<&str> for AclSource {
    fn from(text: &str) -> Self {
        AclChunk::from(text).into()
    }
}

impl From<String> for AclSource {
    fn from(text: String) -> Self {
        AclChunk::from(text).into()
    }
}

impl From<AceEntry> for AclSource {
    fn from(entry: AceEntry) -> Self {
        AclChunk::from(entry).into()
    }
}

impl From<Vec<AclChunk>> for AclSource {
    fn from(chunks: Vec<AclChunk>) -> Self {
        Self { chunks }
    }
}

impl FromIterator<AclChunk> for AclSource {
    fn from_iter<I: IntoIterator<Item = AclChunk>>(iter: I) -> Self {
        Self {
            chunks: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Lazily parse `source` into ACEs, in declaration order.
pub fn parse_acl<'a>(source: &'a AclSource, registry: &'a Registry) -> AceIter<'a> {
    AceIter {
        chunks: source.chunks.iter(),
        lines: None,
        registry,
    }
}

/// Iterator over the ACEs of an [`AclSource`].
///
/// Yields an error in place of each entry that fails to parse; callers that
/// want all-or-nothing semantics collect into `Result<Vec<_>>`.
pub struct AceIter<'a> {
    chunks: slice::Iter<'a, AclChunk>,
    lines: Option<Enumerate<SourceLines<'a>>>,
    registry: &'a Registry,
}

impl Iterator for AceIter<'_> {
    type Item = Result<Ace>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(lines) = &mut self.lines {
                for (index, raw) in lines.by_ref() {
                    let line = strip_comment(raw).trim();
                    if line.is_empty() {
                        continue;
                    }
                    return Some(parse_line(index + 1, line, self.registry));
                }
                self.lines = None;
            }

            match self.chunks.next()? {
                AclChunk::Text(text) => {
                    self.lines = Some(SourceLines { rest: text }.enumerate());
                }
                AclChunk::Entry(entry) => return Some(parse_entry(entry, self.registry)),
            }
        }
    }
}

/// Splits ACL text at `\n`, `\r\n` or a lone `\r`.
struct SourceLines<'a> {
    rest: &'a str,
}

impl<'a> Iterator for SourceLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let Some(end) = self.rest.find(['\n', '\r']) else {
            return Some(std::mem::take(&mut self.rest));
        };
        let line = &self.rest[..end];
        let width = if self.rest[end..].starts_with("\r\n") { 2 } else { 1 };
        self.rest = &self.rest[end + width..];
        Some(line)
    }
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(head, _)| head)
}

fn parse_line(line_no: usize, line: &str, registry: &Registry) -> Result<Ace> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let &[state, predicate, permission_set] = fields.as_slice() else {
        return Err(Error::MalformedAce {
            line: line_no,
            fields: fields.len(),
            text: line.to_string(),
        });
    };

    Ok(Ace {
        state: parse_state(state)?,
        predicate: parse_predicate(predicate, registry)?,
        permission_set: parse_permission_set(permission_set, registry)?,
        line: Some(line_no),
    })
}

fn parse_entry(entry: &AceEntry, registry: &Registry) -> Result<Ace> {
    let predicate = match &entry.predicate {
        PredicateSpec::Token(token) => parse_predicate(token, registry)?,
        PredicateSpec::Resolved(predicate) => predicate.clone(),
    };

    Ok(Ace {
        state: resolve_state(&entry.state)?,
        predicate,
        permission_set: entry.permission_set.clone(),
        line: None,
    })
}
