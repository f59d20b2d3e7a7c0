use std::io;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    SigInt,
    SigTerm,
}

impl TerminationSignal {
    pub fn exit_code(self) -> i32 {
        match self {
            TerminationSignal::SigInt => 130,
            TerminationSignal::SigTerm => 143,
        }
    }
}

/// Forwards SIGINT/SIGTERM to the control loop. If the loop does not exit
/// within the grace period the process is ended from here.
#[cfg(unix)]
pub fn install_termination_signals(tx: Sender<TerminationSignal>) -> io::Result<JoinHandle<()>> {
    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;
    use std::time::Duration;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::Builder::new()
        .name("zfiles-signals".to_string())
        .spawn(move || {
            for sig in signals.forever() {
                let signal = match sig {
                    SIGINT => TerminationSignal::SigInt,
                    SIGTERM => TerminationSignal::SigTerm,
                    _ => continue,
                };

                let _ = tx.send(signal);

                std::thread::sleep(Duration::from_secs(2));
                std::process::exit(signal.exit_code());
            }
        })
}

#[cfg(not(unix))]
pub fn install_termination_signals(_tx: Sender<TerminationSignal>) -> io::Result<JoinHandle<()>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "termination signals are only handled on unix",
    ))
}
