use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use zfiles::app::{Console, ConsoleCommand, Flow, ParseError, Workbench};
use zfiles::kernel::services::adapters::{
    ensure_settings_file, load_settings, LocalFileProvider, SystemShell,
};

mod logging;
mod signals;

const TICK: Duration = Duration::from_millis(50);

fn main() -> io::Result<()> {
    let logging = logging::init();

    if let Err(e) = ensure_settings_file() {
        tracing::warn!(error = %e, "create settings file failed");
    }
    let mut settings = load_settings().unwrap_or_default();

    let cwd = std::env::current_dir()?;
    let arg = std::env::args().nth(1);
    if let Some(start) = resolve_start_path(&cwd, arg.as_deref())? {
        settings.start_path = Some(start);
    }

    let (sig_tx, sig_rx) = mpsc::channel();
    if let Err(e) = signals::install_termination_signals(sig_tx) {
        tracing::warn!(error = %e, "install signal handlers failed");
    }

    let launcher = SystemShell::from_settings(&settings.terminal);
    let mut workbench = Workbench::new(
        &settings,
        Arc::new(LocalFileProvider::new()),
        Box::new(launcher),
    );
    let mut console = Console::new();

    let line_rx = spawn_stdin_reader()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "zfiles {} (type `help`)", env!("CARGO_PKG_VERSION"))?;
    console.print_listing(&workbench, &mut out)?;
    console.report_events(&mut workbench, &mut out)?;
    prompt(&workbench, &mut out)?;

    loop {
        if let Ok(signal) = sig_rx.try_recv() {
            tracing::info!(?signal, "termination signal");
            workbench.unload();
            drop(logging);
            std::process::exit(signal.exit_code());
        }

        match line_rx.recv_timeout(TICK) {
            Ok(line) => {
                match ConsoleCommand::parse(&line) {
                    Ok(cmd) => {
                        if console.execute(&mut workbench, cmd, &mut out)? == Flow::Quit {
                            break;
                        }
                    }
                    Err(ParseError::Empty) => {}
                    Err(e) => writeln!(out, "{}", e)?,
                }
                workbench.pump_terminal();
                console.report_events(&mut workbench, &mut out)?;
                prompt(&workbench, &mut out)?;
            }
            Err(RecvTimeoutError::Timeout) => {
                if workbench.pump_terminal() > 0 {
                    console.report_events(&mut workbench, &mut out)?;
                    prompt(&workbench, &mut out)?;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    workbench.unload();
    Ok(())
}

fn prompt(workbench: &Workbench, out: &mut impl Write) -> io::Result<()> {
    write!(out, "[{}]> ", workbench.tabs().active_tab().display_name())?;
    out.flush()
}

fn spawn_stdin_reader() -> io::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("zfiles-stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Resolves the optional directory argument against `cwd`. `None` keeps the
/// configured start location.
fn resolve_start_path(cwd: &Path, arg: Option<&str>) -> io::Result<Option<PathBuf>> {
    let Some(arg) = arg.map(str::trim).filter(|a| !a.is_empty()) else {
        return Ok(None);
    };

    let path = Path::new(arg);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let meta = std::fs::metadata(&path)?;
    if !meta.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a directory: {}", path.display()),
        ));
    }
    Ok(Some(path))
}

#[cfg(test)]
#[path = "../tests/unit/cli_startup_paths.rs"]
mod cli_startup_paths_tests;
