//! Validity patterns and their interning registry.
//!
//! A validity pattern is a 366-day bitmask anchored to a beginning date; a
//! vehicle journey runs on day `d` of the timetable period iff bit `d` is
//! set. Patterns are interned: two byte-equal masks share one index. The
//! registry grows while the graph is built (legs crossing midnight get a
//! mask shifted by one day) and is read-only afterwards.

use bit_set::BitSet;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, DAY_SECONDS};

/// Number of days covered by one validity pattern.
pub const DAY_COUNT: usize = 366;

/// Index of a pattern inside the [`PatternRegistry`].
pub type PatternIdx = u32;

/// Sentinel carried by edges whose traversal is not gated by the calendar.
/// Never a valid registry index.
pub const ALWAYS_VALID: PatternIdx = u32::MAX;

/// A leg from seconds-of-day `start` to `end` crosses midnight iff its end
/// modularly precedes its start. Sole arbiter for in-vehicle and dwell legs.
#[must_use]
pub fn crosses_midnight(start: u32, end: u32) -> bool {
    start % DAY_SECONDS > end % DAY_SECONDS
}

/// 366-day running mask of a vehicle journey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityPattern {
    beginning_date: NaiveDate,
    days: BitSet,
}

impl ValidityPattern {
    #[must_use]
    pub fn new(beginning_date: NaiveDate) -> Self {
        ValidityPattern {
            beginning_date,
            days: BitSet::with_capacity(DAY_COUNT),
        }
    }

    /// Pattern with the given days of the period set.
    #[must_use]
    pub fn from_days(beginning_date: NaiveDate, days: impl IntoIterator<Item = usize>) -> Self {
        let mut pattern = Self::new(beginning_date);
        for day in days {
            pattern.set(day);
        }
        pattern
    }

    /// Pattern valid on every day of the period.
    #[must_use]
    pub fn always(beginning_date: NaiveDate) -> Self {
        Self::from_days(beginning_date, 0..DAY_COUNT)
    }

    pub fn set(&mut self, day: usize) {
        if day < DAY_COUNT {
            self.days.insert(day);
        }
    }

    /// True iff the pattern is valid on `day`. Days outside the period are
    /// never valid.
    #[must_use]
    pub fn check(&self, day: usize) -> bool {
        day < DAY_COUNT && self.days.contains(day)
    }

    /// Mask rotated one day forward: `out[0] = in[365]`, `out[i+1] = in[i]`.
    /// Re-labels legs that depart today and arrive tomorrow.
    #[must_use]
    pub fn shifted_by_one_day(&self) -> Self {
        let mut shifted = Self::new(self.beginning_date);
        for day in self.days.iter() {
            shifted.set((day + 1) % DAY_COUNT);
        }
        shifted
    }

    #[must_use]
    pub fn beginning_date(&self) -> NaiveDate {
        self.beginning_date
    }
}

/// Append-only, interning store of validity patterns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternRegistry {
    patterns: Vec<ValidityPattern>,
}

impl PatternRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of an existing pattern with the same 366-day mask,
    /// or appends `pattern` and returns its fresh index.
    pub fn intern(&mut self, pattern: ValidityPattern) -> Result<PatternIdx, Error> {
        if let Some(existing) = self.patterns.iter().position(|p| p.days == pattern.days) {
            return Ok(existing as PatternIdx);
        }
        // ALWAYS_VALID must stay unreachable as a real index
        if self.patterns.len() >= ALWAYS_VALID as usize {
            return Err(Error::CalendarOverflow);
        }
        self.patterns.push(pattern);
        Ok((self.patterns.len() - 1) as PatternIdx)
    }

    #[must_use]
    pub fn get(&self, idx: PatternIdx) -> Option<&ValidityPattern> {
        self.patterns.get(idx as usize)
    }

    /// True iff the pattern behind `idx` is valid on `day`. The
    /// [`ALWAYS_VALID`] sentinel passes unconditionally; an unknown index
    /// never does.
    #[must_use]
    pub fn is_valid(&self, idx: PatternIdx, day: usize) -> bool {
        idx == ALWAYS_VALID
            || self
                .patterns
                .get(idx as usize)
                .is_some_and(|pattern| pattern.check(day))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
