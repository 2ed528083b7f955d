use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::time::now_utc;

use crate::proctor::answers::{AnswerError, AnswerOption, AnswerStore};
use crate::proctor::order::{OrderError, QuestionOrder};
use crate::proctor::presenter::{GridMark, QuestionView};
use crate::schemas::TestRef;

/// Navigation requests from the question pager and grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NavTarget {
    Next,
    Previous,
    /// Zero-based view position.
    To(usize),
}

/// Per-student state of one test attempt: display order, current position and answers.
#[derive(Debug, Clone)]
pub(crate) struct TestSession {
    id: Uuid,
    started_at: OffsetDateTime,
    test: TestRef,
    order: QuestionOrder,
    answers: AnswerStore,
    current_view: usize,
    current_canonical: usize,
}

impl TestSession {
    /// `order` must cover at least one question.
    pub(crate) fn new(test: TestRef, order: QuestionOrder) -> Result<Self, OrderError> {
        let current_canonical = order.to_canonical(0)?;
        let answers = AnswerStore::new(order.len());
        Ok(Self {
            id: Uuid::new_v4(),
            started_at: now_utc(),
            test,
            order,
            answers,
            current_view: 0,
            current_canonical,
        })
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn started_at(&self) -> OffsetDateTime {
        self.started_at
    }

    pub(crate) fn test(&self) -> &TestRef {
        &self.test
    }

    pub(crate) fn total_questions(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn current_view(&self) -> usize {
        self.current_view
    }

    pub(crate) fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub(crate) fn answer_snapshot(&self) -> Vec<String> {
        self.answers.to_ordered_list()
    }

    /// Returns whether the position changed. Out-of-range targets are ignored.
    pub(crate) fn navigate(&mut self, target: NavTarget) -> bool {
        let view_position = match target {
            NavTarget::Next => self.current_view + 1,
            NavTarget::Previous => match self.current_view.checked_sub(1) {
                Some(previous) => previous,
                None => return false,
            },
            NavTarget::To(view_position) => view_position,
        };
        self.move_to(view_position).unwrap_or(false)
    }

    /// Records `option` for the displayed question, then moves on to the next unanswered
    /// question after it (or simply the next one when all later questions are answered).
    pub(crate) fn select_answer(&mut self, option: AnswerOption) -> Result<(), AnswerError> {
        self.answers.set_answer(self.current_canonical, option)?;

        let next_unanswered = self
            .order
            .iter()
            .enumerate()
            .skip(self.current_view + 1)
            .find(|&(_, canonical)| !self.answers.is_answered(canonical))
            .map(|(view_position, _)| view_position);

        match next_unanswered {
            Some(view_position) => {
                self.move_to(view_position).ok();
            }
            None => {
                self.navigate(NavTarget::Next);
            }
        }
        Ok(())
    }

    pub(crate) fn view(&self) -> QuestionView {
        let grid = self
            .order
            .iter()
            .enumerate()
            .map(|(view_position, canonical)| {
                if self.answers.is_answered(canonical) {
                    GridMark::Answered
                } else if view_position == self.current_view {
                    GridMark::Current
                } else {
                    GridMark::Unanswered
                }
            })
            .collect();

        QuestionView {
            view_position: self.current_view,
            total_questions: self.total_questions(),
            page_index: self.current_canonical,
            selected: self.answers.get_answer(self.current_canonical),
            has_previous: self.current_view > 0,
            has_next: self.current_view + 1 < self.total_questions(),
            grid,
        }
    }

    fn move_to(&mut self, view_position: usize) -> Result<bool, OrderError> {
        let canonical = self.order.to_canonical(view_position)?;
        if view_position == self.current_view {
            return Ok(false);
        }
        self.current_view = view_position;
        self.current_canonical = canonical;
        Ok(true)
    }
}
