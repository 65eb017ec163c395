//! Per-question answer values and their distance and aggregation rules

use crate::error::{Error, MetricError, Result};
use crate::text::{edit_distance, keywords};
use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The typed answer to a single question
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttributeValue {
    /// Integer answer within fixed bounds
    Numeric {
        /// Answered value
        value: i64,
        /// Lower bound of the question
        min: i64,
        /// Upper bound of the question
        max: i64,
    },
    /// One or more selected options, indexed from 1
    Categorical {
        /// Selected option indices
        selected: Vec<usize>,
        /// Whether the options have a natural order
        ordered: bool,
        /// Number of options offered by the question
        num_options: usize,
    },
    /// Free-form text
    FreeText(String),
}

impl AttributeValue {
    /// Create a numeric answer
    pub fn numeric(value: i64, min: i64, max: i64) -> Self {
        Self::Numeric { value, min, max }
    }

    /// Create a single-selection answer
    pub fn single_choice(option: usize, ordered: bool, num_options: usize) -> Self {
        Self::Categorical {
            selected: vec![option],
            ordered,
            num_options,
        }
    }

    /// Create a multi-selection answer
    pub fn multi_choice(selected: impl IntoIterator<Item = usize>, num_options: usize) -> Self {
        Self::Categorical {
            selected: selected.into_iter().collect(),
            ordered: false,
            num_options,
        }
    }

    /// Create a free-text answer
    pub fn text(text: impl Into<String>) -> Self {
        Self::FreeText(text.into())
    }

    /// Short name of the answer kind, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Numeric { .. } => "numeric",
            Self::Categorical { .. } => "categorical",
            Self::FreeText(_) => "text",
        }
    }

    /// Distance to another answer of the same question.
    ///
    /// Every variant yields a value in `[0, 1]` except `Numeric`, which grows
    /// past 1 when a value lies outside its declared bounds.
    pub fn distance(&self, other: &Self) -> std::result::Result<f64, MetricError> {
        match (self, other) {
            (Self::Numeric { value: a, min, max }, Self::Numeric { value: b, .. }) => {
                let range = max.abs_diff(*min);
                if range == 0 {
                    return Err(MetricError::DivisionDegenerate);
                }
                Ok(a.abs_diff(*b) as f64 / range as f64)
            }
            (
                Self::Categorical {
                    selected: a,
                    ordered,
                    num_options,
                },
                Self::Categorical { selected: b, .. },
            ) => categorical_distance(a, b, *ordered, *num_options),
            (Self::FreeText(a), Self::FreeText(b)) => {
                let longest = a.chars().count().max(b.chars().count());
                if longest == 0 {
                    return Err(MetricError::BothEmpty);
                }
                Ok(edit_distance(a, b) as f64 / longest as f64)
            }
            _ => Err(MetricError::KindMismatch),
        }
    }

    /// Representative answer for a group of answers to the same question.
    ///
    /// Multi-selection input produces a single-selection answer holding the
    /// most frequently chosen option.
    pub fn aggregate(values: &[&AttributeValue]) -> Result<AttributeValue> {
        let first = values
            .first()
            .ok_or_else(|| Error::invalid_data("Cannot aggregate an empty set of answers"))?;

        match first {
            Self::Numeric { min, max, .. } => {
                let mut sum: i128 = 0;
                for value in values {
                    match value {
                        Self::Numeric { value, .. } => sum += i128::from(*value),
                        other => return Err(mixed_kinds(first, other)),
                    }
                }
                let mean = sum / values.len() as i128;
                Ok(Self::Numeric {
                    value: mean as i64,
                    min: *min,
                    max: *max,
                })
            }
            Self::Categorical {
                ordered,
                num_options,
                ..
            } => {
                let mut selections = Vec::with_capacity(values.len());
                for value in values {
                    match value {
                        Self::Categorical { selected, .. } => selections.push(selected.as_slice()),
                        other => return Err(mixed_kinds(first, other)),
                    }
                }
                let selected = aggregate_selections(&selections).into_iter().collect();
                Ok(Self::Categorical {
                    selected,
                    ordered: *ordered,
                    num_options: *num_options,
                })
            }
            Self::FreeText(_) => {
                let mut counts: BTreeMap<String, usize> = BTreeMap::new();
                for value in values {
                    match value {
                        Self::FreeText(text) => {
                            for word in keywords(text) {
                                *counts.entry(word).or_insert(0) += 1;
                            }
                        }
                        other => return Err(mixed_kinds(first, other)),
                    }
                }
                let top = counts.values().copied().max().unwrap_or(0);
                let profile: Vec<String> = counts
                    .into_iter()
                    .filter(|(_, count)| *count == top)
                    .map(|(word, _)| word)
                    .collect();
                Ok(Self::FreeText(profile.join(" ")))
            }
        }
    }
}

fn categorical_distance(
    a: &[usize],
    b: &[usize],
    ordered: bool,
    num_options: usize,
) -> std::result::Result<f64, MetricError> {
    match (a, b) {
        ([x], [y]) if ordered => {
            if num_options < 2 {
                return Err(MetricError::TooFewModalities);
            }
            Ok(x.abs_diff(*y) as f64 / (num_options - 1) as f64)
        }
        ([x], [y]) => Ok(if x == y { 0.0 } else { 1.0 }),
        _ => {
            let a: BTreeSet<usize> = a.iter().copied().collect();
            let b: BTreeSet<usize> = b.iter().copied().collect();
            let union = a.union(&b).count();
            if union == 0 {
                return Err(MetricError::EmptyUnion);
            }
            let intersection = a.intersection(&b).count();
            Ok(1.0 - intersection as f64 / union as f64)
        }
    }
}

/// Most popular option across selections, ties going to the smallest index
fn aggregate_selections(selections: &[&[usize]]) -> Option<usize> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    if selections.iter().all(|s| s.len() == 1) {
        for selection in selections {
            *counts.entry(selection[0]).or_insert(0) += 1;
        }
    } else {
        for option in selections.iter().flat_map(|s| s.iter()) {
            *counts.entry(*option).or_insert(0) += 1;
        }
    }

    // BTreeMap iterates in ascending order, so the first maximum is the smallest index
    let mut best: Option<(usize, usize)> = None;
    for (option, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((option, count));
        }
    }
    best.map(|(option, _)| option)
}

fn mixed_kinds(first: &AttributeValue, other: &AttributeValue) -> Error {
    Error::invalid_data(format!(
        "Cannot aggregate {} answers together with {} answers",
        first.kind(),
        other.kind()
    ))
}
