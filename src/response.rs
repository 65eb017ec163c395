//! Survey responses as seen by the clustering engine

use crate::attribute::AttributeValue;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identity of a response: which survey, which respondent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResponseId {
    /// Survey the response belongs to
    pub survey: String,
    /// Respondent who answered
    pub respondent: String,
}

impl ResponseId {
    /// Create a new response identity
    pub fn new(survey: impl Into<String>, respondent: impl Into<String>) -> Self {
        Self {
            survey: survey.into(),
            respondent: respondent.into(),
        }
    }
}

/// One respondent's answers to a survey, question 1 first.
///
/// Centroids are responses too; they are synthetic and carry no identity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Response {
    id: Option<ResponseId>,
    answers: Vec<AttributeValue>,
}

impl Response {
    /// Create a response for a respondent
    pub fn new(id: ResponseId, answers: Vec<AttributeValue>) -> Self {
        Self {
            id: Some(id),
            answers,
        }
    }

    /// Create a response with no identity, such as a centroid
    pub fn synthetic(answers: Vec<AttributeValue>) -> Self {
        Self { id: None, answers }
    }

    /// Identity of the response, `None` for synthetic responses
    pub fn id(&self) -> Option<&ResponseId> {
        self.id.as_ref()
    }

    /// All answers, question 1 first
    pub fn answers(&self) -> &[AttributeValue] {
        &self.answers
    }

    /// Answer to a question, numbered from 1
    pub fn answer(&self, question: usize) -> Option<&AttributeValue> {
        question.checked_sub(1).and_then(|i| self.answers.get(i))
    }

    /// Number of questions answered
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Whether the response has no answers
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Whether two responses hold the same answers, ignoring identity
    pub fn same_answers(&self, other: &Response) -> bool {
        self.answers == other.answers
    }
}
