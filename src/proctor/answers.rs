use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Wire value for a question the student has not answered.
pub(crate) const UNANSWERED: &str = "";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum AnswerOption {
    A,
    B,
    C,
    D,
}

impl AnswerOption {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            AnswerOption::A => "A",
            AnswerOption::B => "B",
            AnswerOption::C => "C",
            AnswerOption::D => "D",
        }
    }
}

impl fmt::Display for AnswerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum AnswerError {
    #[error("unknown answer option: {0}")]
    UnknownOption(String),
    #[error("canonical index {index} is out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },
}

impl FromStr for AnswerOption {
    type Err = AnswerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(AnswerOption::A),
            "B" => Ok(AnswerOption::B),
            "C" => Ok(AnswerOption::C),
            "D" => Ok(AnswerOption::D),
            _ => Err(AnswerError::UnknownOption(value.to_string())),
        }
    }
}

/// Selected options keyed by canonical index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AnswerStore {
    total_questions: usize,
    answers: BTreeMap<usize, AnswerOption>,
}

impl AnswerStore {
    pub(crate) fn new(total_questions: usize) -> Self {
        Self { total_questions, answers: BTreeMap::new() }
    }

    /// Overwrites any earlier selection for the same question.
    pub(crate) fn set_answer(
        &mut self,
        canonical_index: usize,
        option: AnswerOption,
    ) -> Result<(), AnswerError> {
        if canonical_index >= self.total_questions {
            return Err(AnswerError::IndexOutOfRange {
                index: canonical_index,
                len: self.total_questions,
            });
        }
        self.answers.insert(canonical_index, option);
        Ok(())
    }

    pub(crate) fn get_answer(&self, canonical_index: usize) -> Option<AnswerOption> {
        self.answers.get(&canonical_index).copied()
    }

    pub(crate) fn is_answered(&self, canonical_index: usize) -> bool {
        self.answers.contains_key(&canonical_index)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub(crate) fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// One entry per canonical index, in canonical order. This is the payload for both
    /// autosave and final submission, independent of the display order.
    pub(crate) fn to_ordered_list(&self) -> Vec<String> {
        (0..self.total_questions)
            .map(|index| {
                self.get_answer(index)
                    .map_or_else(|| UNANSWERED.to_string(), |option| option.as_str().to_string())
            })
            .collect()
    }
}
