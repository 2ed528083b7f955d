//! Line-oriented terminal host for a proctored session.
//!
//! stdin is read on a dedicated thread; lines are routed either to a pending
//! acknowledgement or, parsed as commands, into the session's event channel.
//! SIGINT and SIGTERM become close requests.

use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::core::config::SessionSettings;
use crate::core::signals;
use crate::proctor::answers::AnswerOption;
use crate::proctor::controller::SessionController;
use crate::proctor::machine::UiEvent;
use crate::proctor::presenter::{
    GridMark, NoticeLevel, QuestionView, SessionHeader, SessionOutcome, SessionPresenter,
    ShellNotice,
};
use crate::proctor::session::NavTarget;
use crate::schemas::TestRef;
use crate::services::{Identity, QuizApi};

const EVENT_BUFFER: usize = 64;

const HELP: &str = "\
Commands:
  a | b | c | d     answer the current question
  n | p             next / previous question
  g <number>        go to question <number>
  finish            submit your answers and end the test
  help              show this list";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Event(UiEvent),
    Help,
    Blank,
    Unknown,
}

/// Also accepts `blur`, `focus`, `minimize` and `close` to simulate window events.
pub(crate) fn parse_command(line: &str) -> Command {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Command::Blank;
    };
    let arg = parts.next();
    if parts.next().is_some() {
        return Command::Unknown;
    }

    let event = match (head.to_ascii_lowercase().as_str(), arg) {
        ("n" | "next", None) => UiEvent::Navigate(NavTarget::Next),
        ("p" | "prev" | "previous", None) => UiEvent::Navigate(NavTarget::Previous),
        ("g" | "goto", Some(number)) => match number.parse::<usize>() {
            Ok(number) if number >= 1 => UiEvent::Navigate(NavTarget::To(number - 1)),
            _ => return Command::Unknown,
        },
        ("finish" | "submit", None) => UiEvent::Finish,
        ("blur", None) => UiEvent::FocusLost,
        ("focus", None) => UiEvent::FocusGained,
        ("min" | "minimize", None) => UiEvent::Minimized,
        ("close" | "quit" | "exit", None) => UiEvent::CloseRequested,
        ("help" | "?", None) => return Command::Help,
        (other, None) => match AnswerOption::from_str(other) {
            Ok(option) => UiEvent::SelectAnswer(option),
            Err(_) => return Command::Unknown,
        },
        _ => return Command::Unknown,
    };
    Command::Event(event)
}

#[derive(Debug, Default)]
enum AckSlot {
    #[default]
    Idle,
    Waiting(oneshot::Sender<()>),
    InputClosed,
}

/// Writes the session to stdout. Acknowledgements wait for the next line of input.
#[derive(Debug, Default)]
pub(crate) struct TerminalPresenter {
    ack: Mutex<AckSlot>,
}

impl TerminalPresenter {
    fn ack_slot(&self) -> MutexGuard<'_, AckSlot> {
        self.ack.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if the line was consumed by a pending acknowledgement.
    fn take_acknowledgement(&self) -> bool {
        let mut slot = self.ack_slot();
        match std::mem::take(&mut *slot) {
            AckSlot::Waiting(tx) => {
                tx.send(()).ok();
                true
            }
            other => {
                *slot = other;
                false
            }
        }
    }

    fn input_closed(&self) {
        // Dropping a waiting sender releases the acknowledgement.
        *self.ack_slot() = AckSlot::InputClosed;
    }
}

#[async_trait]
impl SessionPresenter for TerminalPresenter {
    fn session_started(&self, header: &SessionHeader) {
        emit(&format!(
            "\n=== {} ===\n{}  |  {} questions  |  question document: {} bytes\n{HELP}",
            header.testname,
            header.student,
            header.total_questions,
            header.document.len(),
        ));
    }

    fn render(&self, view: &QuestionView) {
        emit(&render_view(view));
    }

    fn show_pause(&self, notice: &ShellNotice) {
        emit(&render_pause(notice));
    }

    // Nothing stays on a line terminal; a resume is followed by a fresh render.
    fn clear_pause(&self) {}

    fn show_banner(&self, notice: &ShellNotice) {
        emit(&render_notice(notice));
    }

    async fn acknowledge(&self, notice: &ShellNotice) {
        let (tx, rx) = oneshot::channel();
        {
            let mut slot = self.ack_slot();
            if matches!(*slot, AckSlot::InputClosed) {
                drop(slot);
                emit(&render_notice(notice));
                return;
            }
            *slot = AckSlot::Waiting(tx);
        }
        emit(&format!("{}\nPress Enter to continue.", render_notice(notice)));
        rx.await.ok();
    }
}

/// Runs one session against `api`, reading commands from stdin until it ends.
pub(crate) async fn run_session(
    api: Arc<dyn QuizApi>,
    identity: Identity,
    test: TestRef,
    settings: SessionSettings,
) -> anyhow::Result<SessionOutcome> {
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let (lines_tx, lines_rx) = mpsc::unbounded_channel();
    let (close_tx, close_rx) = mpsc::unbounded_channel();
    let presenter = Arc::new(TerminalPresenter::default());

    spawn_stdin_reader(lines_tx)?;
    signals::forward_close_requests(close_tx);
    let router = tokio::spawn(route_input(lines_rx, close_rx, events_tx, Arc::clone(&presenter)));

    let controller = SessionController::new(api, presenter, identity, test, settings);
    let outcome = controller.run(events_rx).await;
    router.abort();

    Ok(outcome?)
}

fn spawn_stdin_reader(lines: mpsc::UnboundedSender<String>) -> anyhow::Result<()> {
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if lines.send(line).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "Failed to read stdin");
                        return;
                    }
                }
            }
        })
        .context("Failed to spawn stdin reader")?;
    Ok(())
}

async fn route_input(
    mut lines: mpsc::UnboundedReceiver<String>,
    mut closes: mpsc::UnboundedReceiver<()>,
    events: mpsc::Sender<UiEvent>,
    presenter: Arc<TerminalPresenter>,
) {
    loop {
        let event = tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    tracing::info!("stdin closed");
                    presenter.input_closed();
                    return;
                };
                if presenter.take_acknowledgement() {
                    continue;
                }
                match parse_command(&line) {
                    Command::Event(event) => event,
                    Command::Help => {
                        emit(HELP);
                        continue;
                    }
                    Command::Blank => continue,
                    Command::Unknown => {
                        emit(&format!("Unknown command `{}`; type `help`.", line.trim()));
                        continue;
                    }
                }
            }
            Some(()) = closes.recv() => UiEvent::CloseRequested,
        };

        if events.send(event).await.is_err() {
            return;
        }
    }
}

fn render_view(view: &QuestionView) -> String {
    let selected = view.selected.map(AnswerOption::as_str).unwrap_or("-");
    let grid = view
        .grid
        .iter()
        .enumerate()
        .map(|(position, mark)| {
            let symbol = match mark {
                GridMark::Answered => 'x',
                GridMark::Current => '>',
                GridMark::Unanswered => ' ',
            };
            format!("{}[{symbol}]", position + 1)
        })
        .collect::<Vec<_>>()
        .join(" ");

    let previous = if view.has_previous { "<- p" } else { "    " };
    let next = if view.has_next { "n ->" } else { "" };

    format!(
        "\nQuestion {} of {} (page {})  answer: {selected}\n{grid}\n{previous}  {next}",
        view.view_position + 1,
        view.total_questions,
        view.page_index + 1,
    )
}

/// Only warning pauses can be lifted by the student.
fn render_pause(notice: &ShellNotice) -> String {
    match notice.level {
        NoticeLevel::Warning => {
            format!("{}\n(type `focus` to return to the test)", render_notice(notice))
        }
        NoticeLevel::Info | NoticeLevel::Error => render_notice(notice),
    }
}

fn render_notice(notice: &ShellNotice) -> String {
    let marker = match notice.level {
        NoticeLevel::Info => "==",
        NoticeLevel::Warning => "!!",
        NoticeLevel::Error => "XX",
    };
    format!("\n{marker} {} {marker}\n{}", notice.title, notice.message)
}

fn emit(text: &str) {
    let mut stdout = io::stdout().lock();
    if let Err(err) = writeln!(stdout, "{text}").and_then(|()| stdout.flush()) {
        tracing::warn!(error = %err, "Failed to write to stdout");
    }
}
