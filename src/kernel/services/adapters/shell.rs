//! Shell 子进程适配器
//!
//! 启动交互式 shell（管道 stdio），以及读取输出流的线程循环

use crate::kernel::services::bus::{OutputStream, TerminalBusSender, TerminalMessage};
use crate::kernel::services::ports::TerminalSettings;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Pipes of a freshly started shell. `child` is `None` for in-memory shells.
pub struct ShellIo {
    pub stdin: Box<dyn Write + Send>,
    pub stdout: Box<dyn Read + Send>,
    pub stderr: Box<dyn Read + Send>,
    pub child: Option<Child>,
}

pub trait ShellLauncher: Send {
    fn launch(&self, cwd: &Path) -> io::Result<ShellIo>;

    /// Command line that changes the shell's directory to `path`.
    fn cd_command(&self, path: &Path) -> String {
        cd_command_for(path, cfg!(windows))
    }
}

pub(crate) fn cd_command_for(path: &Path, windows: bool) -> String {
    let raw = path.to_string_lossy();
    if windows {
        format!("Set-Location -LiteralPath '{}'", raw.replace('\'', "''"))
    } else {
        format!("cd '{}'", raw.replace('\'', "'\\''"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemShell {
    program: String,
    args: Vec<String>,
}

impl SystemShell {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn platform_default() -> Self {
        #[cfg(windows)]
        {
            Self::new(
                "powershell.exe",
                vec!["-NoLogo".to_string(), "-Command".to_string(), "-".to_string()],
            )
        }

        #[cfg(not(windows))]
        {
            let program = if Path::new("/bin/bash").exists() {
                "/bin/bash"
            } else {
                "/bin/sh"
            };
            Self::new(program, Vec::new())
        }
    }

    pub fn from_settings(settings: &TerminalSettings) -> Self {
        match settings.shell.as_deref().map(str::trim) {
            Some(shell) if !shell.is_empty() => Self::new(shell, settings.args.clone()),
            _ => Self::platform_default(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for SystemShell {
    fn default() -> Self {
        Self::platform_default()
    }
}

impl ShellLauncher for SystemShell {
    fn launch(&self, cwd: &Path) -> io::Result<ShellIo> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so shutdown can take down whatever the shell started.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        let mut child = cmd.spawn()?;
        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            kill_process_tree(&mut child);
            let _ = child.wait();
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "shell stdio unavailable",
            ));
        };

        tracing::info!(
            program = %self.program,
            cwd = %cwd.display(),
            pid = child.id(),
            "shell started"
        );
        Ok(ShellIo {
            stdin: Box::new(stdin),
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            child: Some(child),
        })
    }
}

/// Kills `child` and, on Unix, every process in its group. Does not reap.
pub fn kill_process_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pid) = libc::pid_t::try_from(child.id()) {
            let ret = unsafe { libc::kill(-pid, libc::SIGKILL) };
            if ret != 0 {
                tracing::debug!(pid, error = %io::Error::last_os_error(), "kill process group failed");
            }
        }
    }
    let _ = child.kill();
}

/// Forwards each line of `reader` to the bus until EOF, then reports the
/// stream as closed. Empty lines are dropped.
pub fn reader_loop(stream: OutputStream, reader: Box<dyn Read + Send>, tx: TerminalBusSender) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let text = text.trim_end_matches(['\n', '\r']);
                if text.is_empty() {
                    continue;
                }
                if tx.send_line(stream, text.to_string()).is_err() {
                    return;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!(?stream, error = %e, "shell stream read failed");
                break;
            }
        }
    }
    let _ = tx.send(TerminalMessage::StreamClosed { stream });
}

pub fn user_name() -> String {
    ["USER", "USERNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "user".to_string())
}

pub fn host_name() -> String {
    #[cfg(unix)]
    {
        let mut buf = [0u8; 256];
        let ret = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
        if ret == 0 {
            let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
            let name = String::from_utf8_lossy(&buf[..len]).into_owned();
            if !name.is_empty() {
                return name;
            }
        }
    }

    std::env::var("COMPUTERNAME")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Hands `path` to the desktop's default application without waiting.
pub fn open_detached(path: &Path) -> io::Result<()> {
    #[cfg(windows)]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    };

    #[cfg(target_os = "macos")]
    let mut cmd = {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    };

    #[cfg(not(any(windows, target_os = "macos")))]
    let mut cmd = {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    };

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    std::thread::Builder::new()
        .name("zfiles-opener".to_string())
        .spawn(move || {
            let _ = child.wait();
        })?;
    Ok(())
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/shell.rs"]
mod tests;
