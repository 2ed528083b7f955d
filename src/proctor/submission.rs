use crate::proctor::presenter::{SessionOutcome, ShellNotice};

/// What ended the session and asked for the final submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubmitTrigger {
    Normal,
    TeacherEnded,
    Lockout,
}

impl SubmitTrigger {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            SubmitTrigger::Normal => "normal",
            SubmitTrigger::TeacherEnded => "teacher_ended",
            SubmitTrigger::Lockout => "lockout",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubmissionState {
    NotSubmitted,
    Submitting,
    Submitted,
    /// The call failed. The guard stays set; there is no client-side retry.
    Failed,
}

/// Result of a finished submission call: the notice to show, then the hand-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubmissionCompletion {
    pub(crate) notice: ShellNotice,
    pub(crate) outcome: SessionOutcome,
}

/// At most one final submission per session, whichever trigger fires first.
#[derive(Debug, Clone)]
pub(crate) struct SubmissionCoordinator {
    state: SubmissionState,
    trigger: Option<SubmitTrigger>,
    max_warnings: u32,
}

impl SubmissionCoordinator {
    pub(crate) fn new(max_warnings: u32) -> Self {
        Self { state: SubmissionState::NotSubmitted, trigger: None, max_warnings }
    }

    pub(crate) fn state(&self) -> SubmissionState {
        self.state
    }

    pub(crate) fn has_begun(&self) -> bool {
        self.state != SubmissionState::NotSubmitted
    }

    /// Claims the guard. Must be called before the network call is dispatched; returns
    /// `false` if any submission was already claimed, in which case the caller does nothing.
    pub(crate) fn begin(&mut self, trigger: SubmitTrigger) -> bool {
        if self.has_begun() {
            return false;
        }
        self.state = SubmissionState::Submitting;
        self.trigger = Some(trigger);
        true
    }

    /// Records the network result. `None` if no submission is in flight.
    pub(crate) fn complete(&mut self, result: Result<(), String>) -> Option<SubmissionCompletion> {
        if self.state != SubmissionState::Submitting {
            return None;
        }
        let trigger = self.trigger?;

        match result {
            Ok(()) => {
                self.state = SubmissionState::Submitted;
                Some(SubmissionCompletion {
                    notice: self.success_notice(trigger),
                    outcome: SessionOutcome::Submitted { trigger },
                })
            }
            Err(message) => {
                self.state = SubmissionState::Failed;
                Some(SubmissionCompletion {
                    notice: ShellNotice::error(
                        "Submission Failed",
                        format!(
                            "Your answers could not be submitted: {message}\n\
                             Please contact your teacher before leaving."
                        ),
                    ),
                    outcome: SessionOutcome::SubmissionFailed { trigger, message },
                })
            }
        }
    }

    /// Shown as soon as the lockout happens, while the submission is still running.
    pub(crate) fn lockout_notice(&self) -> ShellNotice {
        ShellNotice::error(
            "Test Locked",
            format!(
                "You have been locked out for exiting fullscreen {} times.
                 Submitting your answers...",
                self.max_warnings
            ),
        )
    }

    fn success_notice(&self, trigger: SubmitTrigger) -> ShellNotice {
        match trigger {
            SubmitTrigger::Normal => {
                ShellNotice::info("Test Submitted", "Your answers have been submitted.")
            }
            SubmitTrigger::TeacherEnded => ShellNotice::info(
                "Test Ended",
                "The test has been ended by the teacher. Your answers are submitted.",
            ),
            SubmitTrigger::Lockout => ShellNotice::error(
                "Test Locked",
                format!(
                    "You have been locked out for exiting fullscreen {} times.\n\
                     Your partial results have been submitted.\n\
                     Please contact your teacher.",
                    self.max_warnings
                ),
            ),
        }
    }
}
