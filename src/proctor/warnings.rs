/// How the student tried to leave the locked environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExitKind {
    /// The window lost focus (alt-tab, another app in front).
    FocusLost,
    /// An explicit close request such as Alt+F4 or SIGINT.
    CloseRequested,
    Minimized,
}

impl ExitKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ExitKind::FocusLost => "focus_lost",
            ExitKind::CloseRequested => "close_requested",
            ExitKind::Minimized => "minimized",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WarningOutcome {
    /// Nothing counted: already locked out, or a focus loss while the pause notice is up.
    Ignored,
    Paused { count: u32, max: u32 },
    LockedOut { count: u32 },
}

/// Exit-attempt escalation. `count` never decreases and `locked_out` never resets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WarningState {
    count: u32,
    max: u32,
    paused: bool,
    locked_out: bool,
}

impl WarningState {
    pub(crate) fn new(max: u32) -> Self {
        Self { count: 0, max: max.max(1), paused: false, locked_out: false }
    }

    pub(crate) fn count(&self) -> u32 {
        self.count
    }

    pub(crate) fn max(&self) -> u32 {
        self.max
    }

    #[cfg(test)]
    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn register_exit(&mut self, kind: ExitKind) -> WarningOutcome {
        if self.locked_out {
            return WarningOutcome::Ignored;
        }
        // The pause notice itself takes focus; only explicit exits count while it is up.
        if kind == ExitKind::FocusLost && self.paused {
            return WarningOutcome::Ignored;
        }

        self.count = (self.count + 1).min(self.max);
        self.paused = true;

        if self.count >= self.max {
            self.locked_out = true;
            WarningOutcome::LockedOut { count: self.count }
        } else {
            WarningOutcome::Paused { count: self.count, max: self.max }
        }
    }

    /// Drops any pause without counting or unlocking; used once the session is ending.
    pub(crate) fn end_pause(&mut self) {
        self.paused = false;
    }

    /// Returns `true` when this ends a pause.
    pub(crate) fn regain_focus(&mut self) -> bool {
        if self.locked_out || !self.paused {
            return false;
        }
        self.paused = false;
        true
    }
}
