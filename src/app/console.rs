//! 控制台前端：行命令解析、执行与文本渲染
//!
//! 架构：
//! - ConsoleCommand: 语义命令（与输入方式无关）
//! - Console: 把命令交给 Workbench 执行，并把列表、树、终端输出写到 `Write`

use super::workbench::{NoticeLevel, Workbench, WorkbenchEvent};
use crate::kernel::LineKind;
use crate::models::{format_size, EntryKind, Location, TreeRow};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    // ==================== 导航 ====================
    List,
    Cd(String),
    Up,
    Back,
    Forward,
    Home,
    Drives,
    Open(usize),

    // ==================== 标签页 ====================
    Tabs,
    NewTab(Option<String>),
    CloseTab(Option<usize>),
    SwitchTab(usize),
    NextTab,
    PrevTab,

    // ==================== 目录树 ====================
    Tree,
    Expand(usize),
    Collapse(usize),
    Select(usize),
    Reveal,
    RebuildTree,

    // ==================== 文件操作 ====================
    ToggleHidden,
    MakeDir(String),
    Touch(String),
    Remove(usize),
    Rename(usize, String),
    Copy(usize),
    Cut(usize),
    Paste,

    // ==================== 终端 ====================
    ShowTerminal,
    HideTerminal,
    CloseTerminal,
    Shell(String),

    // ==================== 系统 ====================
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Unknown(String),
    MissingArgument(&'static str),
    InvalidIndex(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty command"),
            ParseError::Unknown(cmd) => write!(f, "unknown command: {} (try `help`)", cmd),
            ParseError::MissingArgument(what) => write!(f, "missing argument: {}", what),
            ParseError::InvalidIndex(raw) => write!(f, "not an index: {}", raw),
        }
    }
}

impl std::error::Error for ParseError {}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        if let Some(shell) = line.strip_prefix('!') {
            return Ok(ConsoleCommand::Shell(shell.trim().to_string()));
        }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let cmd = match head {
            "ls" | "refresh" => ConsoleCommand::List,
            "cd" => ConsoleCommand::Cd(required(rest, "path")?.to_string()),
            "up" => ConsoleCommand::Up,
            "back" => ConsoleCommand::Back,
            "fwd" | "forward" => ConsoleCommand::Forward,
            "home" => ConsoleCommand::Home,
            "drives" => ConsoleCommand::Drives,
            "open" => ConsoleCommand::Open(index(rest)?),

            "tabs" => ConsoleCommand::Tabs,
            "tab" => parse_tab(rest)?,
            "next" => ConsoleCommand::NextTab,
            "prev" => ConsoleCommand::PrevTab,

            "tree" => ConsoleCommand::Tree,
            "expand" => ConsoleCommand::Expand(index(rest)?),
            "collapse" => ConsoleCommand::Collapse(index(rest)?),
            "select" => ConsoleCommand::Select(index(rest)?),
            "reveal" => ConsoleCommand::Reveal,
            "rebuild" => ConsoleCommand::RebuildTree,

            "hidden" => ConsoleCommand::ToggleHidden,
            "mkdir" => ConsoleCommand::MakeDir(required(rest, "name")?.to_string()),
            "touch" => ConsoleCommand::Touch(required(rest, "name")?.to_string()),
            "rm" => ConsoleCommand::Remove(index(rest)?),
            "mv" | "rename" => {
                let (idx, name) = required(rest, "index")?
                    .split_once(char::is_whitespace)
                    .ok_or(ParseError::MissingArgument("new name"))?;
                ConsoleCommand::Rename(index(idx)?, name.trim().to_string())
            }
            "cp" => ConsoleCommand::Copy(index(rest)?),
            "cut" => ConsoleCommand::Cut(index(rest)?),
            "paste" => ConsoleCommand::Paste,

            "term" => match rest {
                "" | "show" => ConsoleCommand::ShowTerminal,
                "hide" => ConsoleCommand::HideTerminal,
                "close" => ConsoleCommand::CloseTerminal,
                other => return Err(ParseError::Unknown(format!("term {}", other))),
            },

            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" | "q" => ConsoleCommand::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(cmd)
    }
}

fn parse_tab(rest: &str) -> Result<ConsoleCommand, ParseError> {
    let (sub, arg) = match rest.split_once(char::is_whitespace) {
        Some((sub, arg)) => (sub, arg.trim()),
        None => (rest, ""),
    };
    match sub {
        "" => Err(ParseError::MissingArgument("tab index or `new`/`close`")),
        "new" => Ok(ConsoleCommand::NewTab((!arg.is_empty()).then(|| arg.to_string()))),
        "close" if arg.is_empty() => Ok(ConsoleCommand::CloseTab(None)),
        "close" => Ok(ConsoleCommand::CloseTab(Some(index(arg)?))),
        n => Ok(ConsoleCommand::SwitchTab(index(n)?)),
    }
}

fn required<'a>(rest: &'a str, what: &'static str) -> Result<&'a str, ParseError> {
    if rest.is_empty() {
        Err(ParseError::MissingArgument(what))
    } else {
        Ok(rest)
    }
}

fn index(raw: &str) -> Result<usize, ParseError> {
    let raw = required(raw.trim(), "index")?;
    raw.parse()
        .map_err(|_| ParseError::InvalidIndex(raw.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

const HELP: &str = "\
navigation: ls | cd <path> | up | back | fwd | home | drives | open <n>
tabs:       tabs | tab new [path] | tab close [n] | tab <n> | next | prev
tree:       tree | expand <n> | collapse <n> | select <n> | reveal | rebuild
files:      hidden | mkdir <name> | touch <name> | rm <n> | mv <n> <name> | cp <n> | cut <n> | paste
terminal:   term [show|hide|close] | !<command>
            help | quit";

/// Line-oriented front end over a [`Workbench`].
#[derive(Debug, Default)]
pub struct Console {
    printed_terminal_lines: usize,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn execute(
        &mut self,
        wb: &mut Workbench,
        cmd: ConsoleCommand,
        out: &mut impl Write,
    ) -> io::Result<Flow> {
        tracing::debug!(?cmd, "console command");
        match cmd {
            ConsoleCommand::List => {
                wb.reload();
                self.print_listing(wb, out)?;
            }
            ConsoleCommand::Cd(raw) => {
                let target = resolve_target(wb.location(), &raw);
                if wb.navigate_to(target) {
                    self.print_listing(wb, out)?;
                }
            }
            ConsoleCommand::Up => self.navigated(wb.navigate_up(), wb, out)?,
            ConsoleCommand::Back => self.navigated(wb.navigate_back(), wb, out)?,
            ConsoleCommand::Forward => self.navigated(wb.navigate_forward(), wb, out)?,
            ConsoleCommand::Home => self.navigated(wb.navigate_home(), wb, out)?,
            ConsoleCommand::Drives => self.navigated(wb.navigate_to(Location::Drives), wb, out)?,
            ConsoleCommand::Open(n) => {
                let is_folder = wb
                    .listing()
                    .get(n)
                    .is_some_and(|e| e.kind.is_navigable());
                let opened = wb.open_entry(n);
                if !opened && wb.listing().get(n).is_none() {
                    writeln!(out, "no entry {}", n)?;
                }
                if opened && is_folder {
                    self.print_listing(wb, out)?;
                }
            }

            ConsoleCommand::Tabs => self.print_tabs(wb, out)?,
            ConsoleCommand::NewTab(raw) => {
                let location = raw.map(|raw| resolve_target(wb.location(), &raw));
                wb.new_tab(location);
                self.print_tabs(wb, out)?;
            }
            ConsoleCommand::CloseTab(n) => {
                let id = match n {
                    Some(n) => wb.tabs().tabs().get(n).map(|t| t.id()),
                    None => Some(wb.tabs().active_id()),
                };
                match id {
                    Some(id) if wb.close_tab(id) => self.print_tabs(wb, out)?,
                    Some(_) => writeln!(out, "the last tab stays open")?,
                    None => writeln!(out, "no tab {}", n.unwrap_or_default())?,
                }
            }
            ConsoleCommand::SwitchTab(n) => match wb.tabs().tabs().get(n).map(|t| t.id()) {
                Some(id) => {
                    wb.switch_to_tab(id);
                    self.print_tabs(wb, out)?;
                }
                None => writeln!(out, "no tab {}", n)?,
            },
            ConsoleCommand::NextTab => self.switched(wb.next_tab(), wb, out)?,
            ConsoleCommand::PrevTab => self.switched(wb.prev_tab(), wb, out)?,

            ConsoleCommand::Tree => self.print_tree(wb, out)?,
            ConsoleCommand::Expand(n) => {
                if let Some(row) = tree_row(wb, n, out)? {
                    wb.expand_tree_node(row.id);
                    self.print_tree(wb, out)?;
                }
            }
            ConsoleCommand::Collapse(n) => {
                if let Some(row) = tree_row(wb, n, out)? {
                    wb.collapse_tree_node(row.id);
                    self.print_tree(wb, out)?;
                }
            }
            ConsoleCommand::Select(n) => {
                if let Some(row) = tree_row(wb, n, out)? {
                    wb.select_tree_node(row.id);
                    self.print_tree(wb, out)?;
                }
            }
            ConsoleCommand::Reveal => {
                wb.reveal_in_tree();
                self.print_tree(wb, out)?;
            }
            ConsoleCommand::RebuildTree => {
                wb.rebuild_tree();
                self.print_tree(wb, out)?;
            }

            ConsoleCommand::ToggleHidden => {
                let shown = wb.toggle_hidden();
                writeln!(out, "hidden files {}", if shown { "shown" } else { "hidden" })?;
                self.print_listing(wb, out)?;
            }
            ConsoleCommand::MakeDir(name) => {
                if wb.create_folder(&name).is_some() {
                    self.print_listing(wb, out)?;
                }
            }
            ConsoleCommand::Touch(name) => {
                if wb.create_text_file(&name).is_some() {
                    self.print_listing(wb, out)?;
                }
            }
            ConsoleCommand::Remove(n) => {
                if let Some(path) = entry_path(wb, n, out)? {
                    if wb.delete_item(&path) {
                        self.print_listing(wb, out)?;
                    }
                }
            }
            ConsoleCommand::Rename(n, name) => {
                if let Some(path) = entry_path(wb, n, out)? {
                    if wb.rename_item(&path, &name).is_some() {
                        self.print_listing(wb, out)?;
                    }
                }
            }
            ConsoleCommand::Copy(n) => {
                if let Some(path) = entry_path(wb, n, out)? {
                    wb.copy_item(&path);
                    writeln!(out, "copied {}", path.display())?;
                }
            }
            ConsoleCommand::Cut(n) => {
                if let Some(path) = entry_path(wb, n, out)? {
                    wb.cut_item(&path);
                    writeln!(out, "cut {}", path.display())?;
                }
            }
            ConsoleCommand::Paste => {
                if wb.clipboard().is_none() {
                    writeln!(out, "clipboard is empty")?;
                } else if wb.paste().is_some() {
                    self.print_listing(wb, out)?;
                }
            }

            ConsoleCommand::ShowTerminal => {
                if wb.show_terminal() {
                    self.flush_terminal(wb, out)?;
                }
            }
            ConsoleCommand::HideTerminal => wb.hide_terminal(),
            ConsoleCommand::CloseTerminal => wb.request_terminal_close(),
            ConsoleCommand::Shell(text) => {
                if !wb.terminal().is_some_and(|t| t.is_running()) && !wb.show_terminal() {
                    return Ok(Flow::Continue);
                }
                wb.submit_command(&text);
            }

            ConsoleCommand::Help => writeln!(out, "{}", HELP)?,
            ConsoleCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn navigated(&self, moved: bool, wb: &Workbench, out: &mut impl Write) -> io::Result<()> {
        if moved {
            self.print_listing(wb, out)?;
        }
        Ok(())
    }

    fn switched(&self, moved: bool, wb: &Workbench, out: &mut impl Write) -> io::Result<()> {
        if moved {
            self.print_tabs(wb, out)?;
        }
        Ok(())
    }

    pub fn print_listing(&self, wb: &Workbench, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{}", wb.location())?;
        for (i, entry) in wb.listing().iter().enumerate() {
            let (name, size) = match entry.kind {
                EntryKind::File => (entry.name.clone(), file_size(entry.size)),
                _ => (format!("{}/", entry.name.trim_end_matches(['/', '\\'])), format_size(0)),
            };
            writeln!(out, "{:>4}  {:<48} {:>10}", i, name, size)?;
        }
        Ok(())
    }

    pub fn print_tabs(&self, wb: &Workbench, out: &mut impl Write) -> io::Result<()> {
        for (i, tab) in wb.tabs().tabs().iter().enumerate() {
            let marker = if tab.is_active() { '*' } else { ' ' };
            writeln!(out, "{} {:>2}  {:<24} {}", marker, i, tab.display_name(), tab.location())?;
        }
        Ok(())
    }

    pub fn print_tree(&self, wb: &Workbench, out: &mut impl Write) -> io::Result<()> {
        for (i, row) in wb.tree().flatten_for_view().iter().enumerate() {
            writeln!(out, "{:>4}  {}", i, tree_line(row))?;
        }
        Ok(())
    }

    /// Writes terminal lines not printed yet.
    pub fn flush_terminal(&mut self, wb: &Workbench, out: &mut impl Write) -> io::Result<()> {
        let Some(terminal) = wb.terminal() else {
            return Ok(());
        };
        let lines = terminal.output();
        for line in lines.iter().skip(self.printed_terminal_lines) {
            match line.kind {
                LineKind::Output => writeln!(out, "{}", line.text)?,
                LineKind::Error => writeln!(out, "[stderr] {}", line.text)?,
                LineKind::Prompt => writeln!(out, "{}", line.text.trim_end())?,
            }
        }
        self.printed_terminal_lines = lines.len();
        Ok(())
    }

    /// Prints notices and new terminal output raised since the last call.
    pub fn report_events(&mut self, wb: &mut Workbench, out: &mut impl Write) -> io::Result<()> {
        let mut terminal_output = false;
        for event in wb.take_events() {
            match event {
                WorkbenchEvent::Notice { level, message } => {
                    let tag = match level {
                        NoticeLevel::Info => "info",
                        NoticeLevel::Warning => "warning",
                        NoticeLevel::Error => "error",
                    };
                    writeln!(out, "{}: {}", tag, message)?;
                }
                WorkbenchEvent::TerminalOutput { .. } => terminal_output = true,
                WorkbenchEvent::TerminalCloseRequested => writeln!(out, "terminal hidden")?,
                WorkbenchEvent::ActiveTabChanged { .. } | WorkbenchEvent::ListingChanged { .. } => {}
            }
        }
        if terminal_output {
            self.flush_terminal(wb, out)?;
        }
        Ok(())
    }
}

fn file_size(size: u64) -> String {
    if size == 0 {
        "0 B".to_string()
    } else {
        format_size(size)
    }
}

fn tree_line(row: &TreeRow) -> String {
    let marker = if row.is_expanded { 'v' } else { '>' };
    let selected = if row.is_selected { " *" } else { "" };
    format!(
        "{}{} {}{}",
        "  ".repeat(row.depth as usize),
        marker,
        row.name,
        selected
    )
}

fn tree_row(wb: &Workbench, n: usize, out: &mut impl Write) -> io::Result<Option<TreeRow>> {
    let row = wb.tree().flatten_for_view().into_iter().nth(n);
    if row.is_none() {
        writeln!(out, "no tree row {}", n)?;
    }
    Ok(row)
}

fn entry_path(wb: &Workbench, n: usize, out: &mut impl Write) -> io::Result<Option<PathBuf>> {
    match wb.listing().get(n) {
        Some(entry) if entry.kind == EntryKind::File || entry.kind == EntryKind::Directory => {
            Ok(Some(entry.path.clone()))
        }
        Some(entry) => {
            writeln!(out, "{} cannot be changed", entry.name)?;
            Ok(None)
        }
        None => {
            writeln!(out, "no entry {}", n)?;
            Ok(None)
        }
    }
}

/// Resolves a typed path against the active location. `~` is the home
/// directory.
pub fn resolve_target(current: &Location, raw: &str) -> Location {
    let raw = raw.trim();
    if raw == "~" {
        if let Some(home) = crate::kernel::services::adapters::home_dir() {
            return Location::Dir(home);
        }
    }

    let path = Path::new(raw);
    if path.is_absolute() {
        return Location::dir(path);
    }
    match current.as_path() {
        Some(dir) => Location::Dir(dir.join(path)),
        None => Location::dir(path),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/app/console.rs"]
mod tests;
