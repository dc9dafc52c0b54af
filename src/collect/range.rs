//! Fetch-mode resolution.
//!
//! A fetch mode is one of:
//! - `all`: every page
//! - `<n>`: a single page offset (up to 5 digits) or a post id (longer)
//! - `<start>-<end>`: an offset range, where `start` and `end` may be the
//!   literal words; bounds outside `[0, total]` are read as a post id range
//! - `id:<n>` / `id:<a>-<b>`: always a post id or post id range

use std::cmp::Ordering;

use crate::api::PAGE_SIZE;
use crate::error::{Error, Result};

/// Digit strings up to this length are page offsets, longer ones post ids.
///
/// A post id of five digits or fewer is therefore read as an offset; use the
/// `id:` prefix to force id matching.
pub const MAX_OFFSET_DIGITS: usize = 5;

/// A resolved unit of collection work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchUnit {
    /// Fetch the listing page at this offset.
    Offset(u64),
    /// Scan every page, keeping only posts whose id matches.
    IdPredicate(IdPredicate),
}

/// Post id filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdPredicate {
    Exact(String),
    /// Inclusive range, `low <= high`.
    Range { low: String, high: String },
}

impl IdPredicate {
    /// Whether a post id passes the filter.
    pub fn matches(&self, id: &str) -> bool {
        match self {
            IdPredicate::Exact(expected) => id == expected,
            IdPredicate::Range { low, high } => {
                compare_ids(id, low) != Ordering::Less && compare_ids(id, high) != Ordering::Greater
            }
        }
    }

    /// Ids whose appearance ends the scan once all have been seen.
    pub fn boundaries(&self) -> Vec<&str> {
        match self {
            IdPredicate::Exact(id) => vec![id.as_str()],
            IdPredicate::Range { low, high } => vec![low.as_str(), high.as_str()],
        }
    }

    fn range(a: u64, b: u64) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        IdPredicate::Range {
            low: low.to_string(),
            high: high.to_string(),
        }
    }
}

/// Compare post ids numerically, falling back to text order.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn parse_number(value: &str, fetch_mode: &str) -> Result<u64> {
    if !is_digits(value) {
        return Err(Error::InvalidFetchMode(fetch_mode.to_string()));
    }
    value
        .parse()
        .map_err(|_| Error::InvalidFetchMode(fetch_mode.to_string()))
}

/// Offsets of every page: `0, 50, ...` below `total`.
pub fn all_offsets(total: u64) -> Vec<u64> {
    (0..total).step_by(PAGE_SIZE as usize).collect()
}

/// Page offsets covering `[start, end)`.
fn offset_range(start: u64, end: u64) -> Vec<u64> {
    let first = start / PAGE_SIZE * PAGE_SIZE;
    (first..end).step_by(PAGE_SIZE as usize).collect()
}

fn resolve_id_syntax(value: &str, fetch_mode: &str) -> Result<FetchUnit> {
    match value.split_once('-') {
        None => {
            if !is_digits(value) {
                return Err(Error::InvalidFetchMode(fetch_mode.to_string()));
            }
            Ok(FetchUnit::IdPredicate(IdPredicate::Exact(value.to_string())))
        }
        Some((a, b)) => {
            let a = parse_number(a.trim(), fetch_mode)?;
            let b = parse_number(b.trim(), fetch_mode)?;
            Ok(FetchUnit::IdPredicate(IdPredicate::range(a, b)))
        }
    }
}

/// Resolve a fetch mode against the creator's post count.
pub fn resolve(fetch_mode: &str, total_count: u64) -> Result<Vec<FetchUnit>> {
    let mode = fetch_mode.trim();

    if mode.eq_ignore_ascii_case("all") {
        return Ok(all_offsets(total_count)
            .into_iter()
            .map(FetchUnit::Offset)
            .collect());
    }

    if let Some(rest) = mode.strip_prefix("id:") {
        return Ok(vec![resolve_id_syntax(rest.trim(), fetch_mode)?]);
    }

    if is_digits(mode) {
        if mode.len() <= MAX_OFFSET_DIGITS {
            return Ok(vec![FetchUnit::Offset(parse_number(mode, fetch_mode)?)]);
        }
        return Ok(vec![FetchUnit::IdPredicate(IdPredicate::Exact(
            mode.to_string(),
        ))]);
    }

    let (start, end) = mode
        .split_once('-')
        .ok_or_else(|| Error::InvalidFetchMode(fetch_mode.to_string()))?;
    let start = start.trim();
    let end = end.trim();

    let start = if start.eq_ignore_ascii_case("start") {
        0
    } else {
        parse_number(start, fetch_mode)?
    };
    let end = if end.eq_ignore_ascii_case("end") {
        total_count
    } else {
        parse_number(end, fetch_mode)?
    };

    if start <= total_count && end <= total_count {
        if start > end {
            return Err(Error::InvalidFetchMode(fetch_mode.to_string()));
        }
        return Ok(offset_range(start, end)
            .into_iter()
            .map(FetchUnit::Offset)
            .collect());
    }

    Ok(vec![FetchUnit::IdPredicate(IdPredicate::range(start, end))])
}

/// Resolved units flattened into the pages to walk and the filter to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub offsets: Vec<u64>,
    pub predicate: Option<IdPredicate>,
}

impl FetchPlan {
    /// An id predicate expands into a scan of every page.
    pub fn new(units: Vec<FetchUnit>, total_count: u64) -> Self {
        let mut offsets = Vec::new();
        let mut predicate = None;

        for unit in units {
            match unit {
                FetchUnit::Offset(offset) => offsets.push(offset),
                FetchUnit::IdPredicate(p) => predicate = Some(p),
            }
        }

        if predicate.is_some() {
            offsets = all_offsets(total_count);
        }

        Self { offsets, predicate }
    }

    pub fn first_offset(&self) -> Option<u64> {
        self.offsets.first().copied()
    }

    pub fn last_offset(&self) -> Option<u64> {
        self.offsets.last().copied()
    }
}
