use super::*;
use crate::kernel::services::adapters::{LocalFileProvider, SystemShell};
use crate::kernel::services::ports::Settings;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn parses_navigation_commands() {
    assert_eq!(ConsoleCommand::parse("ls"), Ok(ConsoleCommand::List));
    assert_eq!(
        ConsoleCommand::parse("  cd  My Documents "),
        Ok(ConsoleCommand::Cd("My Documents".to_string()))
    );
    assert_eq!(ConsoleCommand::parse("fwd"), Ok(ConsoleCommand::Forward));
    assert_eq!(ConsoleCommand::parse("open 3"), Ok(ConsoleCommand::Open(3)));
    assert_eq!(ConsoleCommand::parse("drives"), Ok(ConsoleCommand::Drives));
}

#[test]
fn parses_tab_commands() {
    assert_eq!(ConsoleCommand::parse("tab new"), Ok(ConsoleCommand::NewTab(None)));
    assert_eq!(
        ConsoleCommand::parse("tab new /srv"),
        Ok(ConsoleCommand::NewTab(Some("/srv".to_string())))
    );
    assert_eq!(ConsoleCommand::parse("tab close"), Ok(ConsoleCommand::CloseTab(None)));
    assert_eq!(
        ConsoleCommand::parse("tab close 2"),
        Ok(ConsoleCommand::CloseTab(Some(2)))
    );
    assert_eq!(ConsoleCommand::parse("tab 1"), Ok(ConsoleCommand::SwitchTab(1)));
    assert_eq!(
        ConsoleCommand::parse("tab"),
        Err(ParseError::MissingArgument("tab index or `new`/`close`"))
    );
}

#[test]
fn parses_file_and_terminal_commands() {
    assert_eq!(
        ConsoleCommand::parse("mv 4 new name.txt"),
        Ok(ConsoleCommand::Rename(4, "new name.txt".to_string()))
    );
    assert_eq!(
        ConsoleCommand::parse("mv 4"),
        Err(ParseError::MissingArgument("new name"))
    );
    assert_eq!(
        ConsoleCommand::parse("!git status"),
        Ok(ConsoleCommand::Shell("git status".to_string()))
    );
    assert_eq!(ConsoleCommand::parse("term hide"), Ok(ConsoleCommand::HideTerminal));
    assert_eq!(ConsoleCommand::parse("term"), Ok(ConsoleCommand::ShowTerminal));
}

#[test]
fn rejects_bad_input() {
    assert_eq!(ConsoleCommand::parse("   "), Err(ParseError::Empty));
    assert_eq!(
        ConsoleCommand::parse("open x"),
        Err(ParseError::InvalidIndex("x".to_string()))
    );
    assert_eq!(
        ConsoleCommand::parse("cd"),
        Err(ParseError::MissingArgument("path"))
    );
    assert!(matches!(
        ConsoleCommand::parse("frobnicate"),
        Err(ParseError::Unknown(_))
    ));
}

#[test]
fn resolves_relative_targets() {
    let here = Location::dir("/data");
    assert_eq!(resolve_target(&here, "logs"), Location::dir("/data/logs"));
    assert_eq!(resolve_target(&here, "/etc"), Location::dir("/etc"));
    assert_eq!(resolve_target(&Location::Drives, "/"), Location::dir("/"));
}

fn sandbox() -> (TempDir, Workbench) {
    let dir = tempfile::Builder::new().prefix("zfiles").tempdir().unwrap();
    fs::create_dir(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("big.bin"), vec![0u8; 2048]).unwrap();
    let settings = Settings {
        start_path: Some(dir.path().to_path_buf()),
        ..Settings::default()
    };
    let wb = Workbench::new(
        &settings,
        Arc::new(LocalFileProvider::new()),
        Box::new(SystemShell::platform_default()),
    );
    (dir, wb)
}

fn run(console: &mut Console, wb: &mut Workbench, line: &str) -> (Flow, String) {
    let mut out = Vec::new();
    let cmd = ConsoleCommand::parse(line).unwrap();
    let flow = console.execute(wb, cmd, &mut out).unwrap();
    console.report_events(wb, &mut out).unwrap();
    (flow, String::from_utf8(out).unwrap())
}

#[test]
fn listing_shows_folders_and_sizes() {
    let (_dir, mut wb) = sandbox();
    let mut console = Console::new();

    let (flow, text) = run(&mut console, &mut wb, "ls");
    assert_eq!(flow, Flow::Continue);
    assert!(text.contains("docs/"));
    assert!(text.contains("Folder"));
    assert!(text.contains("big.bin"));
    assert!(text.contains("2 KB"));
}

#[test]
fn cd_and_back_move_the_active_tab() {
    let (dir, mut wb) = sandbox();
    let mut console = Console::new();

    run(&mut console, &mut wb, "cd docs");
    assert_eq!(wb.location(), &Location::dir(dir.path().join("docs")));

    run(&mut console, &mut wb, "back");
    assert_eq!(wb.location(), &Location::dir(dir.path()));

    let (_, text) = run(&mut console, &mut wb, "cd missing");
    assert!(text.starts_with("warning: Cannot open"));
}

#[test]
fn tabs_are_listed_with_active_marker() {
    let (_dir, mut wb) = sandbox();
    let mut console = Console::new();

    let (_, text) = run(&mut console, &mut wb, "tab new docs");
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with('*'));
    assert!(lines[1].contains("docs"));

    let (_, text) = run(&mut console, &mut wb, "tab close 0");
    assert_eq!(text.lines().count(), 1);
    let (_, text) = run(&mut console, &mut wb, "tab close");
    assert_eq!(text.trim(), "the last tab stays open");
}

#[test]
fn mkdir_and_rm_round_trip() {
    let (dir, mut wb) = sandbox();
    let mut console = Console::new();

    run(&mut console, &mut wb, "mkdir fresh");
    assert!(dir.path().join("fresh").is_dir());

    let index = wb
        .listing()
        .iter()
        .position(|e| e.name == "fresh")
        .unwrap();
    run(&mut console, &mut wb, &format!("rm {}", index));
    assert!(!dir.path().join("fresh").exists());

    let (_, text) = run(&mut console, &mut wb, "rm 0");
    assert_eq!(text.trim(), ".. cannot be changed");
}

#[test]
fn quit_stops_the_loop() {
    let (_dir, mut wb) = sandbox();
    let mut console = Console::new();
    assert_eq!(run(&mut console, &mut wb, "quit").0, Flow::Quit);
}
