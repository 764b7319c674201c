//! Stream entries and entry IDs.
//!
//! A stream is an append-only sequence of `(id, field-map)` pairs ordered by
//! the entry ID `(ms, seq)`. Entries live in a `BTreeMap` keyed by the typed
//! ID, and the maximum ID is cached so inserts validate monotonicity without
//! scanning.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum StreamError {
    #[error("Invalid stream ID specified as stream command argument")]
    InvalidIdFormat,
    #[error("The ID specified in XADD must be greater than 0-0")]
    IdIsZero,
    #[error("The ID specified in XADD is equal or smaller than the target stream top item")]
    IdNotGreaterThanTop,
}

/// A stream entry ID. Ordering is lexicographic on `(ms, seq)`, which the
/// derived `Ord` provides from field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const ZERO: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    pub fn new(ms: u64, seq: u64) -> Self {
        StreamId { ms, seq }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

/// The ID argument of an XADD call, before resolution against the stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IdSpec {
    /// `*` — both parts auto-generated from the clock.
    Auto,
    /// `<ms>-*` — explicit milliseconds, auto sequence.
    AutoSeq(u64),
    /// `<ms>-<seq>` or bare `<ms>` (sequence defaults to 0).
    Explicit(StreamId),
}

impl IdSpec {
    pub fn parse(argument: &str) -> Result<Self, StreamError> {
        if argument == "*" {
            return Ok(IdSpec::Auto);
        }

        match argument.split_once('-') {
            None => {
                let ms = parse_id_part(argument)?;
                Ok(IdSpec::Explicit(StreamId::new(ms, 0)))
            }
            Some((ms_part, "*")) => Ok(IdSpec::AutoSeq(parse_id_part(ms_part)?)),
            Some((ms_part, seq_part)) => {
                let ms = parse_id_part(ms_part)?;
                let seq = parse_id_part(seq_part)?;
                Ok(IdSpec::Explicit(StreamId::new(ms, seq)))
            }
        }
    }
}

/// Parses an XRANGE start bound: `-` is the minimum ID, a bare `<ms>` starts
/// at sequence 0.
pub fn parse_range_start(argument: &str) -> Result<StreamId, StreamError> {
    if argument == "-" {
        return Ok(StreamId::ZERO);
    }
    parse_bound(argument, 0)
}

/// Parses an XRANGE end bound: `+` is the maximum ID, a bare `<ms>` covers
/// the whole millisecond.
pub fn parse_range_end(argument: &str) -> Result<StreamId, StreamError> {
    if argument == "+" {
        return Ok(StreamId::MAX);
    }
    parse_bound(argument, u64::MAX)
}

/// Parses an XREAD offset (`<ms>` or `<ms>-<seq>`); entries strictly greater
/// than the offset are returned. `$` is resolved by the caller before this.
pub fn parse_read_offset(argument: &str) -> Result<StreamId, StreamError> {
    parse_bound(argument, 0)
}

fn parse_bound(argument: &str, default_seq: u64) -> Result<StreamId, StreamError> {
    match argument.split_once('-') {
        None => Ok(StreamId::new(parse_id_part(argument)?, default_seq)),
        Some((ms_part, seq_part)) => Ok(StreamId::new(
            parse_id_part(ms_part)?,
            parse_id_part(seq_part)?,
        )),
    }
}

fn parse_id_part(part: &str) -> Result<u64, StreamError> {
    part.parse::<u64>().map_err(|_| StreamError::InvalidIdFormat)
}

pub type EntryFields = BTreeMap<String, String>;

/// An ordered stream of entries with a cached maximum ID.
///
/// `last_id` starts at `0-0` for an empty stream, which makes the
/// auto-sequence rules fall out uniformly: `0-*` on an empty stream yields
/// `0-1` because `0-0` is never a valid entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stream {
    entries: BTreeMap<StreamId, EntryFields>,
    last_id: StreamId,
}

impl Stream {
    pub fn new() -> Self {
        Stream::default()
    }

    pub fn last_id(&self) -> StreamId {
        self.last_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves the ID spec against this stream and appends the entry.
    ///
    /// `now_ms` is the wall clock used for `*`. The returned ID is strictly
    /// greater than every ID previously returned for this stream.
    pub fn add(
        &mut self,
        spec: IdSpec,
        now_ms: u64,
        fields: EntryFields,
    ) -> Result<StreamId, StreamError> {
        let id = self.resolve_id(spec, now_ms)?;

        self.entries.insert(id, fields);
        self.last_id = id;

        Ok(id)
    }

    fn resolve_id(&self, spec: IdSpec, now_ms: u64) -> Result<StreamId, StreamError> {
        match spec {
            IdSpec::Auto => {
                if now_ms <= self.last_id.ms {
                    Ok(StreamId::new(self.last_id.ms, self.last_id.seq + 1))
                } else {
                    Ok(StreamId::new(now_ms, 0))
                }
            }
            IdSpec::AutoSeq(ms) => {
                if ms == self.last_id.ms {
                    Ok(StreamId::new(ms, self.last_id.seq + 1))
                } else if ms > self.last_id.ms {
                    Ok(StreamId::new(ms, 0))
                } else {
                    Err(StreamError::IdNotGreaterThanTop)
                }
            }
            IdSpec::Explicit(id) => {
                if id == StreamId::ZERO {
                    return Err(StreamError::IdIsZero);
                }
                if id <= self.last_id {
                    return Err(StreamError::IdNotGreaterThanTop);
                }
                Ok(id)
            }
        }
    }

    /// Inclusive range over entry IDs, oldest first.
    pub fn range(
        &self,
        start: StreamId,
        end: StreamId,
        count: Option<usize>,
    ) -> Vec<(&StreamId, &EntryFields)> {
        if start > end {
            return Vec::new();
        }

        let entries = self.entries.range(start..=end);

        match count {
            Some(count) => entries.take(count).collect(),
            None => entries.collect(),
        }
    }

    /// Entries with IDs strictly greater than `after`, oldest first.
    pub fn entries_after(
        &self,
        after: StreamId,
        count: Option<usize>,
    ) -> Vec<(&StreamId, &EntryFields)> {
        let entries = self
            .entries
            .range((Bound::Excluded(after), Bound::Unbounded));

        match count {
            Some(count) => entries.take(count).collect(),
            None => entries.collect(),
        }
    }
}
