// SPDX-License-Identifier: MIT OR Apache-2.0
//! Face index sets.
//!
//! A [`FaceSet`] is a non-empty, sorted set of polygon indices. On disk it is
//! written in host component notation as comma-separated inclusive runs
//! (`"0:3,7,9:12"`), which keeps large contiguous selections small.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Highest face index accepted when parsing. Larger runs are refused before
/// any face is expanded.
pub const MAX_FACE_INDEX: u32 = (1 << 24) - 1;

/// Error building or parsing a face set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FaceSetError {
    /// A face set must contain at least one face
    #[error("Face set is empty")]
    Empty,

    /// A run could not be parsed as an index or `start:end` pair
    #[error("Invalid face run: {0:?}")]
    InvalidRun(String),

    /// A run ends before it starts
    #[error("Face run {0}:{1} is reversed")]
    Reversed(u32, u32),

    /// Runs must be ascending and disjoint
    #[error("Face runs out of order or overlapping at {0}")]
    Unordered(u32),

    /// A face index above [`MAX_FACE_INDEX`]
    #[error("Face index {0} is out of range (max {MAX_FACE_INDEX})")]
    OutOfRange(u32),
}

/// Non-empty sorted set of face indices
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FaceSet(BTreeSet<u32>);

impl FaceSet {
    /// Build a face set from indices, rejecting an empty input
    pub fn new(indices: impl IntoIterator<Item = u32>) -> Result<Self, FaceSetError> {
        let set: BTreeSet<u32> = indices.into_iter().collect();
        if set.is_empty() {
            return Err(FaceSetError::Empty);
        }
        Ok(Self(set))
    }

    /// Number of faces in the set
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if a face belongs to the set
    pub fn contains(&self, face: u32) -> bool {
        self.0.contains(&face)
    }

    /// Iterate faces in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Highest face index in the set
    pub fn max(&self) -> u32 {
        self.0.last().copied().unwrap_or_default()
    }

    /// Check if the set is exactly `0..face_count`
    pub fn covers(&self, face_count: u32) -> bool {
        self.0.len() as u64 == u64::from(face_count)
            && self.0.first() == Some(&0)
            && u64::from(self.max()) + 1 == u64::from(face_count)
    }

    /// Collapse the set into ascending inclusive runs
    pub fn runs(&self) -> Vec<RangeInclusive<u32>> {
        let mut runs: Vec<RangeInclusive<u32>> = Vec::new();
        for face in self.iter() {
            match runs.last_mut() {
                Some(run) if run.end().checked_add(1) == Some(face) => {
                    *run = *run.start()..=face;
                }
                _ => runs.push(face..=face),
            }
        }
        runs
    }

    /// Restrict the set to faces also in `other`
    pub fn intersection(&self, other: &FaceSet) -> Option<FaceSet> {
        let set: BTreeSet<u32> = self.0.intersection(&other.0).copied().collect();
        (!set.is_empty()).then_some(Self(set))
    }
}

impl fmt::Display for FaceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, run) in self.runs().into_iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if run.start() == run.end() {
                write!(f, "{}", run.start())?;
            } else {
                write!(f, "{}:{}", run.start(), run.end())?;
            }
        }
        Ok(())
    }
}

impl FromStr for FaceSet {
    type Err = FaceSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = BTreeSet::new();
        let mut next_free: Option<u32> = None;

        for run in s.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            let parse = |part: &str| {
                part.trim()
                    .parse::<u32>()
                    .map_err(|_| FaceSetError::InvalidRun(run.to_string()))
            };
            let (start, end) = match run.split_once(':') {
                Some((a, b)) => (parse(a)?, parse(b)?),
                None => {
                    let face = parse(run)?;
                    (face, face)
                }
            };
            if end < start {
                return Err(FaceSetError::Reversed(start, end));
            }
            if end > MAX_FACE_INDEX {
                return Err(FaceSetError::OutOfRange(end));
            }
            if next_free.is_some_and(|free| start < free) {
                return Err(FaceSetError::Unordered(start));
            }
            set.extend(start..=end);
            next_free = end.checked_add(1);
        }

        if set.is_empty() {
            return Err(FaceSetError::Empty);
        }
        Ok(Self(set))
    }
}

impl Serialize for FaceSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FaceSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rejected() {
        assert_eq!(FaceSet::new([]), Err(FaceSetError::Empty));
        assert_eq!("".parse::<FaceSet>(), Err(FaceSetError::Empty));
    }

    #[test]
    fn test_runs_notation() {
        let faces = FaceSet::new([9, 0, 1, 2, 3, 7, 10, 11, 12]).unwrap();
        assert_eq!(faces.to_string(), "0:3,7,9:12");
        assert_eq!("0:3,7,9:12".parse::<FaceSet>().unwrap(), faces);
    }

    #[test]
    fn test_malformed_runs() {
        assert_eq!("4:2".parse::<FaceSet>(), Err(FaceSetError::Reversed(4, 2)));
        assert_eq!("0:4,3".parse::<FaceSet>(), Err(FaceSetError::Unordered(3)));
        assert!(matches!("1,x".parse::<FaceSet>(), Err(FaceSetError::InvalidRun(_))));
        assert!(matches!("-1".parse::<FaceSet>(), Err(FaceSetError::InvalidRun(_))));
    }

    #[test]
    fn test_huge_runs_rejected() {
        assert_eq!(
            "0:4294967295".parse::<FaceSet>(),
            Err(FaceSetError::OutOfRange(u32::MAX))
        );
        assert_eq!(
            "0:3,20000000".parse::<FaceSet>(),
            Err(FaceSetError::OutOfRange(20_000_000))
        );
        let top = format!("{MAX_FACE_INDEX}");
        assert_eq!(top.parse::<FaceSet>().unwrap().max(), MAX_FACE_INDEX);
    }

    #[test]
    fn test_covers() {
        let faces = FaceSet::new(0..10).unwrap();
        assert!(faces.covers(10));
        assert!(!faces.covers(11));
        assert!(!FaceSet::new(1..10).unwrap().covers(9));
    }

    #[test]
    fn test_intersection() {
        let a = FaceSet::new([0, 2, 4, 6]).unwrap();
        let b = FaceSet::new([2, 3, 4]).unwrap();
        assert_eq!(a.intersection(&b), Some(FaceSet::new([2, 4]).unwrap()));
        assert_eq!(a.intersection(&FaceSet::new([1]).unwrap()), None);
    }
}
