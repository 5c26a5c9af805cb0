//! Caret entrypoint.
//!
//! A headless runner: opens a file, replays a key script through the editor
//! facade on the async event loop, then writes the buffer back (or prints it).
use anyhow::{Result, bail};
use clap::Parser;
use core_actions::Editor;
use core_actions::io_ops::{self, OpenFileResult, WriteFileResult};
use core_config::{ConfigContext, load_from};
use core_events::{
    CHANNEL_SEND_FAILURES, EVENT_CHANNEL_CAP, Event, EventSourceRegistry, InputEvent, KEYPRESS_TOTAL,
    ScriptEventSource, TickEventSource,
};
use core_text::Buffer;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod script;
mod words;

const STATUS_ROWS: u16 = 1;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "caret", version, about = "Caret headless text editing engine")]
struct Args {
    /// File to edit. If omitted an empty untitled buffer is used.
    pub path: Option<PathBuf>,
    /// Configuration file path (overrides discovery of `caret.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Key script replayed against the buffer.
    #[arg(long = "keys")]
    pub keys: Option<PathBuf>,
    /// Save the buffer when the script finishes instead of printing it.
    #[arg(long = "write")]
    pub write: bool,
    /// Save to this path rather than the opened file. Implies `--write`.
    #[arg(long = "out")]
    pub out: Option<PathBuf>,
    /// Viewport height used for reveal and margin clamping.
    #[arg(long = "rows", default_value_t = 24)]
    pub rows: u16,
    /// Directory receiving `caret.log`.
    #[arg(long = "log-dir", default_value = ".")]
    pub log_dir: PathBuf,
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

struct RuntimeContext {
    editor: Editor,
    script: script::Script,
    tick: Duration,
    output: OutputTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputTarget {
    Stdout,
    File(Option<PathBuf>),
}

impl OutputTarget {
    fn from_args(args: &Args) -> Self {
        match (&args.out, args.write) {
            (Some(out), _) => OutputTarget::File(Some(out.clone())),
            (None, true) => OutputTarget::File(None),
            (None, false) => OutputTarget::Stdout,
        }
    }
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn run(&mut self) -> Result<RuntimeContext> {
        let args = Args::parse();
        self.configure_logging(&args.log_dir)?;
        Self::install_panic_hook();
        info!(target: "runtime", "startup");

        let script = match args.keys.as_deref() {
            Some(path) => script::load(path)?,
            None => script::Script::default(),
        };
        let context = Self::load_editor_state(&args, script)?;
        info!(
            target: "runtime.startup",
            path = args.path.as_ref().map(|p| p.display().to_string()).as_deref(),
            config_override = args.config.is_some(),
            events = context.script.events.len(),
            output = ?context.output,
            "bootstrap_complete"
        );
        Ok(context)
    }

    fn configure_logging(&mut self, log_dir: &Path) -> Result<()> {
        let log_path = log_dir.join("caret.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "caret.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .with_ansi(false)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Already installed; dropping the guard shuts this writer down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }

    fn load_editor_state(args: &Args, mut script: script::Script) -> Result<RuntimeContext> {
        let mut open_failed = false;
        let (buffer, file_name) = match args.path.as_ref() {
            Some(path) => match io_ops::open_file(path) {
                OpenFileResult::Success(opened) => (opened.buffer, Some(opened.file_name)),
                OpenFileResult::Error => {
                    open_failed = true;
                    (Buffer::from_str("untitled", ""), Some(path.clone()))
                }
            },
            None => (Buffer::from_str("untitled", ""), None),
        };

        let mut config = load_from(args.config.clone())?;
        let ctx = ConfigContext::new(args.rows, STATUS_ROWS);
        config.apply_context(ctx);

        let mut editor = Editor::with_config(buffer, &config, usize::from(ctx.text_rows()));
        editor.state_mut().file_name = file_name;
        editor.set_status_reporter(Box::new(|message: &str, is_error: bool, is_progress: bool| {
            info!(target: "runtime.status", text = message, is_error, is_progress, "status");
        }));
        editor.set_content_assist(Box::new(words::BufferWords));
        let mut answers = std::mem::take(&mut script.answers);
        editor.set_line_prompt(Box::new(move |_current: usize, _count: usize| answers.pop_front()));
        if open_failed {
            editor.state_mut().report_status("Open failed", true, false);
        }

        Ok(RuntimeContext {
            editor,
            tick: config.file.reveal.tick(),
            output: OutputTarget::from_args(args),
            script,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownReason {
    ShutdownEvent,
    ChannelClosed,
}

impl ShutdownReason {
    fn as_str(self) -> &'static str {
        match self {
            ShutdownReason::ShutdownEvent => "shutdown_event",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn log_shutdown_stage(reason: ShutdownReason, stage: &'static str) {
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = stage,
        "shutdown_stage"
    );
}

enum LoopControl {
    Continue,
    Break { reason: ShutdownReason },
}

struct EditorRuntime {
    editor: Editor,
    output: OutputTarget,
    rx: mpsc::Receiver<Event>,
    tx: Option<mpsc::Sender<Event>>,
    source_handles: Vec<tokio::task::JoinHandle<()>>,
    consumed: usize,
    ignored: usize,
}

impl EditorRuntime {
    fn new(
        editor: Editor,
        output: OutputTarget,
        tx: mpsc::Sender<Event>,
        rx: mpsc::Receiver<Event>,
        source_handles: Vec<tokio::task::JoinHandle<()>>,
    ) -> Self {
        Self {
            editor,
            output,
            rx,
            tx: Some(tx),
            source_handles,
            consumed: 0,
            ignored: 0,
        }
    }

    async fn run(&mut self) -> Result<()> {
        let loop_span = tracing::debug_span!(target: "runtime", "event_loop");
        let _enter_loop = loop_span.enter();

        let mut shutdown_reason = ShutdownReason::ChannelClosed;
        while let Some(event) = self.rx.recv().await {
            let control = match &event {
                Event::Input(input) => self.handle_input_event(input),
                Event::Tick => self.handle_tick(),
                Event::Shutdown => LoopControl::Break {
                    reason: ShutdownReason::ShutdownEvent,
                },
            };
            if let LoopControl::Break { reason } = control {
                shutdown_reason = reason;
                break;
            }
        }

        self.rx.close();
        self.finalize_shutdown(shutdown_reason).await;
        self.settle_reveal();
        self.emit_output()
    }

    fn handle_input_event(&mut self, input: &InputEvent) -> LoopControl {
        let consumed = match input {
            InputEvent::Key(key) => self.editor.handle_key(key),
            InputEvent::Text(text) => self.editor.handle_text(text),
        };
        if consumed {
            self.consumed += 1;
        } else {
            self.ignored += 1;
            trace!(target: "runtime.input", ?input, "input_not_consumed");
        }
        LoopControl::Continue
    }

    fn handle_tick(&mut self) -> LoopControl {
        if self.editor.tick(Instant::now()) {
            trace!(target: "runtime", first_line = self.editor.view().first_line, "reveal_step");
        }
        LoopControl::Continue
    }

    /// Run any reveal animation still in flight to its target.
    fn settle_reveal(&mut self) {
        let mut now = Instant::now();
        while self.editor.view().is_animating() {
            now += Duration::from_secs(1);
            self.editor.tick(now);
        }
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        log_shutdown_stage(reason, "begin");
        if let Some(tx) = self.tx.take() {
            drop(tx);
        }

        while let Some(handle) = self.source_handles.pop() {
            handle.abort();
            match tokio::time::timeout(Duration::from_millis(200), handle).await {
                Ok(Ok(_)) => trace!(target: "runtime.shutdown", "event_source_task_stopped"),
                Ok(Err(err)) if err.is_cancelled() => {
                    trace!(target: "runtime.shutdown", "event_source_task_cancelled")
                }
                Ok(Err(err)) => error!(target: "runtime.shutdown", ?err, "event_source_task_error"),
                Err(_) => warn!(target: "runtime.shutdown", "event_source_task_timeout"),
            }
        }

        info!(
            target: "runtime.shutdown",
            consumed = self.consumed,
            ignored = self.ignored,
            keypress_total = KEYPRESS_TOTAL.load(Ordering::Relaxed),
            send_failures = CHANNEL_SEND_FAILURES.load(Ordering::Relaxed),
            "input_summary"
        );
        log_shutdown_stage(reason, "complete");
    }

    fn emit_output(&mut self) -> Result<()> {
        match &self.output {
            OutputTarget::Stdout => {
                print!("{}", self.editor.text());
                Ok(())
            }
            OutputTarget::File(target) => {
                match io_ops::write_file(self.editor.state_mut(), target.as_deref()) {
                    WriteFileResult::Success => Ok(()),
                    WriteFileResult::NoFilename => bail!("no file name to write to; pass a path or --out"),
                    WriteFileResult::Error => bail!("write failed; see caret.log"),
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    let RuntimeContext {
        editor,
        script,
        tick,
        output,
    } = startup.run()?;
    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let mut registry = EventSourceRegistry::new();
    registry.register(ScriptEventSource::new(script.events));
    registry.register(TickEventSource::new(tick));
    let source_handles = registry.spawn_all(&tx);

    let mut runtime = EditorRuntime::new(editor, output, tx, rx, source_handles);
    runtime.run().await
}
