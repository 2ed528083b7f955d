//! The seam between the session controller and whatever draws it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::proctor::answers::AnswerOption;
use crate::proctor::submission::SubmitTrigger;
use crate::schemas::QuestionDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ShellNotice {
    pub(crate) level: NoticeLevel,
    pub(crate) title: String,
    pub(crate) message: String,
}

impl ShellNotice {
    pub(crate) fn info(title: &str, message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, title: title.to_string(), message: message.into() }
    }

    pub(crate) fn warning(title: &str, message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, title: title.to_string(), message: message.into() }
    }

    pub(crate) fn error(title: &str, message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, title: title.to_string(), message: message.into() }
    }
}

/// Locked navbar contents, shown once the test has loaded.
#[derive(Debug, Clone)]
pub(crate) struct SessionHeader {
    pub(crate) testname: String,
    pub(crate) student: String,
    pub(crate) total_questions: usize,
    pub(crate) document: Arc<QuestionDocument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GridMark {
    Answered,
    Current,
    Unanswered,
}

/// Everything needed to draw the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QuestionView {
    pub(crate) view_position: usize,
    pub(crate) total_questions: usize,
    /// Document page to show; the canonical index of the displayed question.
    pub(crate) page_index: usize,
    pub(crate) selected: Option<AnswerOption>,
    pub(crate) has_previous: bool,
    pub(crate) has_next: bool,
    /// One mark per view position.
    pub(crate) grid: Vec<GridMark>,
}

/// What the shell gets back when the session hands control over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionOutcome {
    /// The test was not `ACTIVE` when the student entered.
    NotActive,
    Submitted { trigger: SubmitTrigger },
    SubmissionFailed { trigger: SubmitTrigger, message: String },
}

#[async_trait]
pub(crate) trait SessionPresenter: Send + Sync {
    fn session_started(&self, header: &SessionHeader);

    fn render(&self, view: &QuestionView);

    /// Block all interaction until [`SessionPresenter::clear_pause`]. A second call
    /// replaces the notice on screen.
    fn show_pause(&self, notice: &ShellNotice);

    fn clear_pause(&self);

    /// Non-blocking message; the session keeps running.
    fn show_banner(&self, notice: &ShellNotice);

    /// Show a terminal notice and resolve once the student dismisses it.
    async fn acknowledge(&self, notice: &ShellNotice);
}
