use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalMessage {
    Line { stream: OutputStream, text: String },
    StreamClosed { stream: OutputStream },
}

#[derive(Clone)]
pub struct TerminalBusSender {
    tx: Sender<TerminalMessage>,
}

pub struct TerminalBusReceiver {
    rx: Receiver<TerminalMessage>,
}

pub fn terminal_bus() -> (TerminalBusSender, TerminalBusReceiver) {
    let (tx, rx) = mpsc::channel();
    (TerminalBusSender { tx }, TerminalBusReceiver { rx })
}

impl TerminalBusSender {
    pub fn send(&self, msg: TerminalMessage) -> Result<(), mpsc::SendError<TerminalMessage>> {
        self.tx.send(msg)
    }

    pub fn send_line(
        &self,
        stream: OutputStream,
        text: String,
    ) -> Result<(), mpsc::SendError<TerminalMessage>> {
        self.send(TerminalMessage::Line { stream, text })
    }
}

impl TerminalBusReceiver {
    pub fn try_recv(&mut self) -> Result<TerminalMessage, TryRecvError> {
        self.rx.try_recv()
    }

    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<TerminalMessage, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}
