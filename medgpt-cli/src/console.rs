//! Terminal rendering and the interactive loop.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use medgpt_agent::{
    Answer, AnswerKind, Interaction, MedicalAssistant, QueryPhase, ResponseRenderer, Session,
    SystemStatus, Transcript, TurnRole,
};
use medgpt_model::CancelHandle;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const PROMPT: &str = "medgpt> ";
const EMPTY_QUERY_WARNING: &str = "Please enter a query.";

/// The stream currently being rendered, if any.
pub type ActiveStream = Arc<Mutex<Option<CancelHandle>>>;

/// Writes fragments as they arrive.
pub struct ConsoleRenderer<W: Write + Send> {
    out: W,
    active: ActiveStream,
    progress: bool,
    write_error: Option<io::ErrorKind>,
}

impl ConsoleRenderer<io::Stdout> {
    pub fn stdout(active: ActiveStream) -> Self {
        Self { out: io::stdout(), active, progress: true, write_error: None }
    }
}

impl<W: Write + Send> ConsoleRenderer<W> {
    /// Render into `out` without progress lines on stderr.
    pub fn new(out: W, active: ActiveStream) -> Self {
        Self { out, active, progress: false, write_error: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Kind of the first failed write to the output, if any.
    pub fn write_error(&self) -> Option<io::ErrorKind> {
        self.write_error
    }

    /// Logs the first failure only; a closed pipe fails every later write too.
    fn record(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            if self.write_error.is_none() {
                debug!(error = %e, "cannot write answer to output");
                self.write_error = Some(e.kind());
            }
        }
    }

    fn set_active(&self, handle: Option<CancelHandle>) {
        if let Ok(mut slot) = self.active.lock() {
            *slot = handle;
        }
    }
}

impl<W: Write + Send> ResponseRenderer for ConsoleRenderer<W> {
    fn on_phase(&mut self, phase: QueryPhase) {
        debug!(?phase, "query phase");
        match phase {
            QueryPhase::Retrieving if self.progress => eprintln!("Analyzing medical literature..."),
            QueryPhase::Rendered => self.set_active(None),
            _ => {}
        }
    }

    fn on_stream_start(&mut self, cancel: CancelHandle) {
        self.set_active(Some(cancel));
    }

    fn on_fragment(&mut self, fragment: &str, _accumulated: &str) {
        let result = write!(self.out, "{fragment}").and_then(|()| self.out.flush());
        self.record(result);
    }

    fn on_finish(&mut self, answer: &Answer) {
        let result = match answer.kind {
            AnswerKind::Fallback => writeln!(self.out, "{}", answer.text),
            AnswerKind::Generated => writeln!(self.out),
            AnswerKind::Interrupted => writeln!(self.out, "\n[answer interrupted]"),
        };
        let result = result.and_then(|()| self.out.flush());
        self.record(result);
    }
}

/// Cancel the active stream on Ctrl-C; with nothing streaming, exit.
pub fn spawn_interrupt_watcher(active: ActiveStream) -> JoinHandle<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            let handle = active.lock().ok().and_then(|mut slot| slot.take());
            match handle {
                Some(handle) => {
                    debug!("cancelling completion stream");
                    handle.cancel();
                }
                None => std::process::exit(130),
            }
        }
    })
}

/// Print what happened after the answer itself. Returns whether an answer was produced.
pub fn report(out: &mut impl Write, interaction: &Interaction, transcript: &Transcript) -> io::Result<bool> {
    match interaction {
        Interaction::Rejected => {
            writeln!(out, "{EMPTY_QUERY_WARNING}")?;
            Ok(false)
        }
        Interaction::Halted { notice } => {
            writeln!(out, "{notice}")?;
            Ok(false)
        }
        Interaction::Failed { notice, .. } => {
            writeln!(out, "{notice}")?;
            Ok(false)
        }
        Interaction::Answered(_) => {
            if let Some(turn) = transcript.last() {
                writeln!(out, "\nGenerated on {}", turn.timestamp)?;
            }
            Ok(true)
        }
    }
}

pub fn print_history(out: &mut impl Write, transcript: &Transcript) -> io::Result<()> {
    if transcript.is_empty() {
        return writeln!(out, "No questions asked yet.");
    }
    for turn in transcript {
        let who = match turn.role {
            TurnRole::User => "You",
            TurnRole::Assistant => "MedGPT",
        };
        writeln!(out, "[{}] {who}: {}", turn.timestamp, turn.content)?;
    }
    Ok(())
}

pub fn print_status(out: &mut impl Write, status: &SystemStatus) -> io::Result<()> {
    let mark = |ok: bool| if ok { "✅" } else { "❌" };
    writeln!(out, "System Status")?;
    writeln!(out, "  Vector Store: {}", mark(status.index_reachable))?;
    writeln!(out, "  API Key:      {}", mark(status.credential_present))?;
    writeln!(out, "  Model:        {}", status.model.as_deref().unwrap_or("-"))
}

const HELP: &str = "\
Type a medical question, or one of:
  /history  show this session's questions and answers
  /status   show index and credential status
  /quit     leave
Ctrl-C while an answer streams stops it.";

/// Interactive question loop until `/quit` or end of input.
pub async fn run_chat(assistant: &MedicalAssistant, session: &mut Session) -> Result<()> {
    let active = ActiveStream::default();
    let watcher = spawn_interrupt_watcher(active.clone());
    let mut editor = DefaultEditor::new()?;

    println!("MedGPT: ask a medical question (/help for commands)");
    if !session.status().credential_present {
        println!("{}", medgpt_agent::MISSING_CREDENTIAL_NOTICE);
    }

    let mut stdout = io::stdout();
    loop {
        let line = tokio::task::block_in_place(|| editor.readline(PROMPT));
        let input = match line {
            Ok(line) => line.trim().to_string(),
            Err(ReadlineError::Interrupted) => {
                println!("(type /quit to leave)");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                watcher.abort();
                return Err(e.into());
            }
        };
        if input.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(input.as_str());

        match input.as_str() {
            "/quit" | "/exit" => break,
            "/help" => println!("{HELP}"),
            "/history" => print_history(&mut stdout, session.transcript())?,
            "/status" => {
                session.set_status(assistant.status().await);
                print_status(&mut stdout, session.status())?;
            }
            command if command.starts_with('/') => {
                warn!(command, "unknown command");
                println!("Unknown command {command}; /help lists commands.");
            }
            query => {
                let mut renderer = ConsoleRenderer::stdout(active.clone());
                let interaction = session.ask(assistant, query, &mut renderer).await;
                report(&mut stdout, &interaction, session.transcript())?;
            }
        }
    }

    watcher.abort();
    Ok(())
}
