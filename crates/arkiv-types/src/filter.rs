//! Query filters for list reads.
//!
//! A [`Filter`] holds an ordered list of include [`Part`]s, each holding an
//! ordered list of [`Condition`]s, plus optional 1-based inclusive
//! pagination bounds. Storage backends evaluate only the first part; the
//! conditions inside it are combined with logical AND.

use serde::{Deserialize, Serialize};

/// Comparison operator of a [`Condition`]. Only equality is supported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    #[default]
    Equals,
}

/// A single `key <op> value` test against a storage key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub key: String,
    pub operator: Operator,
    pub value: String,
}

impl Condition {
    /// An equality condition.
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator: Operator::Equals,
            value: value.into(),
        }
    }
}

/// An ordered group of conditions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub conditions: Vec<Condition>,
}

impl Part {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }
}

/// Filter and pagination bounds for list reads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(default)]
    pub include: Vec<Part>,
    /// First position to return, 1-based and inclusive. Defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_no: Option<u64>,
    /// Last position to return, inclusive. Defaults to the result size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_no: Option<u64>,
}

impl Filter {
    /// A filter with no conditions and no bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter with a single part holding one equality condition.
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new().with_part(Part::new(vec![Condition::equals(key, value)]))
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.include.push(part);
        self
    }

    pub fn with_from_no(mut self, from_no: u64) -> Self {
        self.from_no = Some(from_no);
        self
    }

    pub fn with_to_no(mut self, to_no: u64) -> Self {
        self.to_no = Some(to_no);
        self
    }

    /// Returns `true` if the filter restricts which records match.
    ///
    /// Pagination bounds alone do not make a filter restrictive.
    pub fn filters_results(&self) -> bool {
        !self.include.is_empty()
    }

    /// Resolve the pagination bounds against a result of `size` items.
    ///
    /// Returns the zero-based half-open range to return. `from_no` defaults to
    /// 1 and is raised to 1 if given as 0; `to_no` defaults to `size` and is
    /// clamped to it. If `from_no > to_no` the range is empty.
    pub fn page_range(&self, size: usize) -> std::ops::Range<usize> {
        let size = size as u64;
        let from = self.from_no.unwrap_or(1).max(1);
        let to = self.to_no.unwrap_or(size).min(size);
        if from > to {
            return 0..0;
        }
        (from - 1) as usize..to as usize
    }
}
