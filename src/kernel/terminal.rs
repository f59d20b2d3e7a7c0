//! 内嵌终端会话
//!
//! 一个 shell 子进程 + 两个读线程；输出经 terminal bus 回到控制线程，由 `pump` 写入输出缓冲

use crate::kernel::services::adapters::paths;
use crate::kernel::services::adapters::shell::{
    host_name, kill_process_tree, reader_loop, user_name, ShellLauncher,
};
use crate::kernel::services::bus::{
    terminal_bus, OutputStream, TerminalBusReceiver, TerminalMessage,
};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Child;
use std::sync::mpsc::{RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TerminalState {
    Uninitialized,
    Running,
    Terminated,
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerminalState::Uninitialized => "uninitialized",
            TerminalState::Running => "running",
            TerminalState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LineKind {
    Output,
    Error,
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalLine {
    pub kind: LineKind,
    pub text: String,
}

impl TerminalLine {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug)]
pub enum TerminalError {
    SpawnFailure(io::Error),
    WriteFailure(io::Error),
    InvalidState {
        op: &'static str,
        state: TerminalState,
    },
}

impl fmt::Display for TerminalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalError::SpawnFailure(e) => write!(f, "failed to start shell: {}", e),
            TerminalError::WriteFailure(e) => write!(f, "failed to write to shell: {}", e),
            TerminalError::InvalidState { op, state } => {
                write!(f, "{} is not allowed while the terminal is {}", op, state)
            }
        }
    }
}

impl std::error::Error for TerminalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TerminalError::SpawnFailure(e) | TerminalError::WriteFailure(e) => Some(e),
            TerminalError::InvalidState { .. } => None,
        }
    }
}

/// Shared handle on the shell's stdin. Writers queue on one mutex, so a line
/// is never interleaved with another.
#[derive(Clone)]
pub struct ShellInput {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl ShellInput {
    fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Writes `line` plus the platform line ending and flushes.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut writer = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "shell input poisoned"))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(LINE_ENDING.as_bytes())?;
        writer.flush()
    }
}

pub struct TerminalSession {
    launcher: Box<dyn ShellLauncher>,
    state: TerminalState,
    child: Option<Child>,
    input: Option<ShellInput>,
    rx: Option<TerminalBusReceiver>,
    output: Vec<TerminalLine>,
    working_directory: Option<PathBuf>,
    prompt_owner: String,
    open_streams: usize,
}

impl TerminalSession {
    pub fn new(launcher: Box<dyn ShellLauncher>) -> Self {
        Self {
            launcher,
            state: TerminalState::Uninitialized,
            child: None,
            input: None,
            rx: None,
            output: Vec::new(),
            working_directory: None,
            prompt_owner: String::new(),
            open_streams: 0,
        }
    }

    pub fn state(&self) -> TerminalState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TerminalState::Running
    }

    pub fn output(&self) -> &[TerminalLine] {
        &self.output
    }

    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    pub fn input(&self) -> Option<ShellInput> {
        self.input.clone()
    }

    /// Output streams that have not reached EOF yet.
    pub fn open_streams(&self) -> usize {
        self.open_streams
    }

    /// Starts the shell in `working_directory`, falling back to the home
    /// directory and then the process directory.
    ///
    /// A spawn failure is written to the output buffer and leaves the
    /// session uninitialized, so it can be retried.
    pub fn initialize(&mut self, working_directory: Option<&Path>) -> Result<(), TerminalError> {
        self.require(TerminalState::Uninitialized, "initialize")?;

        let cwd = resolve_working_directory(working_directory);
        let io = match self.launcher.launch(&cwd) {
            Ok(io) => io,
            Err(e) => {
                tracing::error!(cwd = %cwd.display(), error = %e, "spawn shell failed");
                self.push(LineKind::Error, format!("Error starting terminal: {}", e));
                return Err(TerminalError::SpawnFailure(e));
            }
        };

        let mut child = io.child;
        let (tx, rx) = terminal_bus();
        let readers = [
            ("zfiles-term-stdout", OutputStream::Stdout, io.stdout),
            ("zfiles-term-stderr", OutputStream::Stderr, io.stderr),
        ];
        for (name, stream, reader) in readers {
            let tx = tx.clone();
            if let Err(e) = std::thread::Builder::new()
                .name(name.to_string())
                .spawn(move || reader_loop(stream, reader, tx))
            {
                tracing::error!(error = %e, "spawn terminal reader thread failed");
                if let Some(child) = child.as_mut() {
                    kill_process_tree(child);
                    let _ = child.wait();
                }
                self.push(LineKind::Error, format!("Error starting terminal: {}", e));
                return Err(TerminalError::SpawnFailure(e));
            }
        }

        self.child = child;
        self.input = Some(ShellInput::new(io.stdin));
        self.rx = Some(rx);
        self.open_streams = 2;
        self.prompt_owner = format!("{}@{}", user_name(), host_name());
        self.working_directory = Some(cwd);
        self.state = TerminalState::Running;
        self.push_prompt();
        Ok(())
    }

    /// Sends `text` to the shell. Blank input only re-emits the prompt.
    pub fn submit_command(&mut self, text: &str) -> Result<(), TerminalError> {
        self.require(TerminalState::Running, "submit_command")?;

        if text.trim().is_empty() {
            self.push_prompt();
            return Ok(());
        }

        tracing::debug!(command = text, "terminal command");
        self.write(text).map_err(|e| {
            self.push(LineKind::Error, format!("Error executing command: {}", e));
            TerminalError::WriteFailure(e)
        })
    }

    /// Types a `cd` into the shell. Returns `Ok(false)` when `path` is not a
    /// directory.
    pub fn set_working_directory(&mut self, path: &Path) -> Result<bool, TerminalError> {
        self.require(TerminalState::Running, "set_working_directory")?;

        if !path.is_dir() {
            return Ok(false);
        }

        let command = self.launcher.cd_command(path);
        match self.write(&command) {
            Ok(()) => {
                self.working_directory = Some(path.to_path_buf());
                Ok(true)
            }
            Err(e) => {
                self.push(LineKind::Error, format!("Error changing directory: {}", e));
                Err(TerminalError::WriteFailure(e))
            }
        }
    }

    /// Kills the shell together with anything it started, and reaps it. Safe
    /// to call in any state, any number of times.
    pub fn shutdown(&mut self) {
        if let Some(mut child) = self.child.take() {
            let pid = child.id();
            kill_process_tree(&mut child);
            match child.wait() {
                Ok(status) => tracing::info!(pid, ?status, "shell stopped"),
                Err(e) => tracing::warn!(pid, error = %e, "reap shell failed"),
            }
        }
        self.input = None;
        self.rx = None;
        self.open_streams = 0;
        self.state = TerminalState::Terminated;
    }

    /// Applies every output line queued by the reader threads. Returns how
    /// many lines were appended.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let Some(rx) = self.rx.as_mut() else {
                return applied;
            };
            match rx.try_recv() {
                Ok(msg) => applied += self.apply(msg),
                Err(TryRecvError::Empty) => return applied,
                Err(TryRecvError::Disconnected) => {
                    self.rx = None;
                    return applied;
                }
            }
        }
    }

    /// Like [`pump`](Self::pump), but waits up to `timeout` for the first
    /// message.
    pub fn pump_timeout(&mut self, timeout: Duration) -> usize {
        let Some(rx) = self.rx.as_mut() else {
            return 0;
        };
        match rx.recv_timeout(timeout) {
            Ok(msg) => self.apply(msg) + self.pump(),
            Err(RecvTimeoutError::Timeout) => 0,
            Err(RecvTimeoutError::Disconnected) => {
                self.rx = None;
                0
            }
        }
    }

    fn apply(&mut self, msg: TerminalMessage) -> usize {
        match msg {
            TerminalMessage::Line { stream, text } => {
                let kind = match stream {
                    OutputStream::Stdout => LineKind::Output,
                    OutputStream::Stderr => LineKind::Error,
                };
                self.push(kind, text);
                1
            }
            TerminalMessage::StreamClosed { stream } => {
                self.open_streams = self.open_streams.saturating_sub(1);
                tracing::debug!(?stream, "shell stream closed");
                if self.open_streams == 0 {
                    self.log_exit();
                }
                0
            }
        }
    }

    fn log_exit(&mut self) {
        let Some(child) = self.child.as_mut() else {
            return;
        };
        match child.try_wait() {
            Ok(Some(status)) => tracing::info!(?status, "shell exited"),
            Ok(None) => tracing::info!("shell closed its output"),
            Err(e) => tracing::warn!(error = %e, "query shell status failed"),
        }
    }

    fn write(&self, line: &str) -> io::Result<()> {
        match self.input.as_ref() {
            Some(input) => input.write_line(line),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "shell input closed",
            )),
        }
    }

    fn require(&self, expected: TerminalState, op: &'static str) -> Result<(), TerminalError> {
        if self.state == expected {
            return Ok(());
        }
        tracing::error!(op, state = %self.state, "terminal call in wrong state");
        Err(TerminalError::InvalidState {
            op,
            state: self.state,
        })
    }

    fn push(&mut self, kind: LineKind, text: impl Into<String>) {
        self.output.push(TerminalLine::new(kind, text));
    }

    fn push_prompt(&mut self) {
        let cwd = self
            .working_directory
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let prompt = format!("{} {}> ", self.prompt_owner, cwd);
        self.push(LineKind::Prompt, prompt);
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for TerminalSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalSession")
            .field("state", &self.state)
            .field("working_directory", &self.working_directory)
            .field("lines", &self.output.len())
            .finish()
    }
}

fn resolve_working_directory(requested: Option<&Path>) -> PathBuf {
    pick_working_directory(requested, paths::home_dir(), std::env::current_dir())
}

fn pick_working_directory(
    requested: Option<&Path>,
    home: Option<PathBuf>,
    current: io::Result<PathBuf>,
) -> PathBuf {
    if let Some(path) = requested.filter(|p| p.is_dir()) {
        return path.to_path_buf();
    }
    if let Some(home) = home.filter(|p| p.is_dir()) {
        return home;
    }
    match current {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(error = %e, "current dir unavailable, starting shell in \".\"");
            PathBuf::from(".")
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/terminal.rs"]
mod tests;
