//! # String Arena
//!
//! Externally-referenced strings: each string is an `(arena, offset, len)`
//! triple into a shared, 64-byte aligned byte buffer rather than an owned
//! allocation.
//!
//! A [`StringArena`] is cheap to clone (`Arc`) so a sink column can sit on top
//! of a source's reference buffer without copying it. The catch is that
//! growing an arena may move its bytes: either the buffer is still shared and
//! has to be copied before it can be written, or the allocation itself
//! reallocates. Every such move issues a fresh [`ArenaId`], and references
//! carrying the old id stop resolving. [`RefStrings`] owns both the arena and
//! its references and re-bases the references whenever the arena moves.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use minarrow::Vec64;

use crate::error::{Result, StreamError};

static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one placement of an arena's bytes in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaId(u64);

impl ArenaId {
    fn next() -> Self {
        ArenaId(NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A string stored as a byte range of a [`StringArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrRef {
    pub arena: ArenaId,
    pub offset: usize,
    pub len: usize,
}

impl StrRef {
    /// Zero-length reference, used for pre-sized and null slots.
    #[inline]
    pub fn empty(arena: ArenaId) -> Self {
        StrRef {
            arena,
            offset: 0,
            len: 0,
        }
    }
}

/// Shared byte buffer backing externally-referenced strings.
#[derive(Debug, Clone)]
pub struct StringArena {
    id: ArenaId,
    bytes: Arc<Vec64<u8>>,
}

impl Default for StringArena {
    fn default() -> Self {
        Self::from_vec64(Vec64::default())
    }
}

impl StringArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self::from_vec64(Vec64::with_capacity(n))
    }

    /// Copy `bytes` into a new arena.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_vec64(Vec64::from_slice(bytes))
    }

    pub fn from_vec64(bytes: Vec64<u8>) -> Self {
        Self {
            id: ArenaId::next(),
            bytes: Arc::new(bytes),
        }
    }

    #[inline]
    pub fn id(&self) -> ArenaId {
        self.id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes.0[..]
    }

    /// Whether both handles point at the same allocation.
    pub fn shares_memory_with(&self, other: &StringArena) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }

    /// Bytes of `r`, or `None` when `r` was issued against another arena id
    /// or runs past the end of the buffer.
    pub fn resolve_bytes(&self, r: StrRef) -> Option<&[u8]> {
        if r.arena != self.id {
            return None;
        }
        self.as_bytes().get(r.offset..r.offset.checked_add(r.len)?)
    }

    /// String of `r`; `None` as for [`resolve_bytes`](Self::resolve_bytes) or
    /// when the range is not valid UTF-8.
    pub fn resolve(&self, r: StrRef) -> Option<&str> {
        self.resolve_bytes(r).and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Append `bytes`, returning `true` when the buffer moved and a new id
    /// was issued.
    fn extend(&mut self, bytes: &[u8]) -> bool {
        if bytes.is_empty() {
            return false;
        }
        let before = self.bytes.0.as_ptr();
        let buf = Arc::make_mut(&mut self.bytes);
        buf.0.extend_from_slice(bytes);
        if buf.0.as_ptr() != before {
            self.id = ArenaId::next();
            return true;
        }
        false
    }
}

/// A column of externally-referenced strings: an arena plus one reference
/// per row.
///
/// Invariant: every reference carries the current arena id.
#[derive(Debug, Clone, Default)]
pub struct RefStrings {
    arena: StringArena,
    refs: Vec<StrRef>,
}

impl RefStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty column over an existing arena. The arena is shared, not copied.
    pub fn with_arena(arena: StringArena) -> Self {
        Self {
            arena,
            refs: Vec::new(),
        }
    }

    /// `rows` empty slots over `arena`.
    pub fn with_len(rows: usize, arena: StringArena) -> Self {
        let empty = StrRef::empty(arena.id());
        Self {
            arena,
            refs: vec![empty; rows],
        }
    }

    /// Lay references over `arena` from Arrow-style offsets, `offsets.len() - 1`
    /// strings where string `i` spans `offsets[i]..offsets[i + 1]`.
    pub fn from_offsets(arena: StringArena, offsets: &[u32]) -> Result<Self> {
        let id = arena.id();
        let mut refs = Vec::with_capacity(offsets.len().saturating_sub(1));
        for pair in offsets.windows(2) {
            let (start, end) = (pair[0] as usize, pair[1] as usize);
            if end < start || end > arena.len() {
                return Err(StreamError::InputData(format!(
                    "string offsets {}..{} invalid for {} bytes",
                    start,
                    end,
                    arena.len()
                )));
            }
            refs.push(StrRef {
                arena: id,
                offset: start,
                len: end - start,
            });
        }
        Ok(Self { arena, refs })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    #[inline]
    pub fn arena(&self) -> &StringArena {
        &self.arena
    }

    #[inline]
    pub fn refs(&self) -> &[StrRef] {
        &self.refs
    }

    /// Materialize row `i`.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.refs.get(i).and_then(|r| self.arena.resolve(*r))
    }

    /// Materialize row `i`, naming the failure: a reference that no longer
    /// matches the arena is stale, an unreadable range is bad input.
    pub fn try_get(&self, i: usize) -> Result<&str> {
        let r = *self.refs.get(i).ok_or(StreamError::OutOfBounds {
            row: i,
            len: self.refs.len(),
        })?;
        let bytes = self
            .arena
            .resolve_bytes(r)
            .ok_or(StreamError::StaleReference { arena: r.arena.get() })?;
        std::str::from_utf8(bytes)
            .map_err(|e| StreamError::InputData(format!("string at row {} is not UTF-8: {}", i, e)))
    }

    /// Iterate materialized strings; unresolvable slots yield `None`.
    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.refs.iter().map(move |r| self.arena.resolve(*r))
    }

    /// Copy `s` into the arena and reference it.
    pub fn push(&mut self, s: &str) {
        let r = self.intern(s.as_bytes());
        self.refs.push(r);
    }

    /// Push a reference issued against this column's arena or against
    /// `reference`. The former is adopted as is; the latter is copied in.
    pub fn push_ref(&mut self, r: StrRef, reference: Option<&StringArena>) -> Result<()> {
        let r = self.adopt(r, reference)?;
        self.refs.push(r);
        Ok(())
    }

    pub fn set(&mut self, row: usize, s: &str) -> Result<()> {
        self.check_row(row)?;
        let r = self.intern(s.as_bytes());
        self.refs[row] = r;
        Ok(())
    }

    pub fn set_ref(&mut self, row: usize, r: StrRef, reference: Option<&StringArena>) -> Result<()> {
        self.check_row(row)?;
        let r = self.adopt(r, reference)?;
        self.refs[row] = r;
        Ok(())
    }

    /// Drop all references and release the arena.
    pub fn clear(&mut self) {
        self.arena = StringArena::default();
        self.refs.clear();
    }

    /// Truncate, or extend with empty slots.
    pub fn resize(&mut self, rows: usize) {
        let empty = StrRef::empty(self.arena.id());
        self.refs.resize(rows, empty);
    }

    /// Append another column.
    ///
    /// An empty column takes over the incoming arena and references as is.
    /// Columns over the same arena placement only concatenate references.
    /// Otherwise the incoming arena is concatenated onto this one and
    /// references are re-based in two passes: existing references move to
    /// the new arena id (their offsets into the preserved prefix are
    /// unchanged), then incoming references are shifted by the arena length
    /// before the grow.
    pub fn append(&mut self, other: RefStrings) -> Result<()> {
        if let Some(stale) = other.refs.iter().find(|r| r.arena != other.arena.id()) {
            return Err(StreamError::StaleReference {
                arena: stale.arena.get(),
            });
        }
        if other.refs.is_empty() {
            return Ok(());
        }
        if self.refs.is_empty() {
            *self = other;
            return Ok(());
        }
        if other.arena.id() == self.arena.id() {
            self.refs.extend_from_slice(&other.refs);
            return Ok(());
        }

        let base = self.grow(other.arena.as_bytes());
        let id = self.arena.id();
        self.refs.reserve(other.refs.len());
        for r in &other.refs {
            self.refs.push(StrRef {
                arena: id,
                offset: r.offset + base,
                len: r.len,
            });
        }
        Ok(())
    }

    fn check_row(&self, row: usize) -> Result<()> {
        if row >= self.refs.len() {
            return Err(StreamError::OutOfBounds {
                row,
                len: self.refs.len(),
            });
        }
        Ok(())
    }

    fn adopt(&mut self, r: StrRef, reference: Option<&StringArena>) -> Result<StrRef> {
        if r.arena == self.arena.id() {
            if self.arena.resolve_bytes(r).is_none() {
                return Err(StreamError::StaleReference { arena: r.arena.get() });
            }
            return Ok(r);
        }
        match reference.and_then(|arena| arena.resolve_bytes(r)) {
            Some(bytes) => Ok(self.intern(bytes)),
            None => Err(StreamError::StaleReference { arena: r.arena.get() }),
        }
    }

    fn intern(&mut self, bytes: &[u8]) -> StrRef {
        let offset = self.grow(bytes);
        StrRef {
            arena: self.arena.id(),
            offset,
            len: bytes.len(),
        }
    }

    /// Grow the arena by `bytes` and return the arena length before the
    /// grow. Re-bases existing references when the arena moved.
    fn grow(&mut self, bytes: &[u8]) -> usize {
        let base = self.arena.len();
        if self.arena.extend(bytes) {
            let id = self.arena.id();
            for r in &mut self.refs {
                r.arena = id;
            }
        }
        base
    }
}
