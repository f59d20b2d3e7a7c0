use super::*;
use crate::models::EntryKind;
use std::fs::File;
use tempfile::tempdir;

fn names(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

#[test]
fn test_list_directory_puts_parent_then_dirs_then_files() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("beta")).unwrap();
    fs::create_dir(dir.path().join("Alpha")).unwrap();
    File::create(dir.path().join("b.txt")).unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();

    let provider = LocalFileProvider::new();
    let entries = provider
        .list_directory(&Location::dir(dir.path()), false)
        .unwrap();

    assert_eq!(names(&entries), vec!["..", "Alpha", "beta", "a.txt", "b.txt"]);
    assert_eq!(entries[0].kind, EntryKind::ParentRef);
    assert_eq!(entries[0].path, dir.path().parent().unwrap());
    assert_eq!(entries[1].kind, EntryKind::Directory);
    assert_eq!(entries[1].size, 0);
    assert_eq!(entries[3].kind, EntryKind::File);
    assert_eq!(entries[3].size, 5);
}

#[cfg(unix)]
#[test]
fn test_list_directory_filters_hidden() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join(".secret")).unwrap();
    File::create(dir.path().join("visible")).unwrap();

    let provider = LocalFileProvider::new();
    let location = Location::dir(dir.path());

    let hidden_off = provider.list_directory(&location, false).unwrap();
    assert_eq!(names(&hidden_off), vec!["..", "visible"]);

    let hidden_on = provider.list_directory(&location, true).unwrap();
    assert_eq!(names(&hidden_on), vec!["..", ".secret", "visible"]);
}

#[cfg(unix)]
#[test]
fn test_root_has_no_parent_entry() {
    let provider = LocalFileProvider::new();
    let entries = provider.list_directory(&Location::dir("/"), false).unwrap();
    assert!(entries.iter().all(|e| e.kind != EntryKind::ParentRef));
}

#[test]
fn test_list_drives() {
    let provider = LocalFileProvider::new();
    let drives = provider.list_directory(&Location::Drives, false).unwrap();
    assert!(!drives.is_empty());
    assert!(drives.iter().all(|e| e.kind == EntryKind::Drive));
}

#[test]
fn test_list_missing_directory_is_not_found() {
    let dir = tempdir().unwrap();
    let provider = LocalFileProvider::new();
    let result = provider.list_directory(&Location::dir(dir.path().join("gone")), false);
    assert!(matches!(result, Err(FileError::NotFound(_))));
}

#[test]
fn test_list_file_is_not_a_directory() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("f.txt");
    File::create(&file).unwrap();

    let provider = LocalFileProvider::new();
    let result = provider.list_directory(&Location::dir(&file), false);
    assert!(matches!(result, Err(FileError::NotADirectory(_))));
}

#[test]
fn test_create_directory_and_file() {
    let dir = tempdir().unwrap();
    let provider = LocalFileProvider::new();

    let sub = provider.create_directory(dir.path(), "New Folder").unwrap();
    assert!(sub.is_dir());
    assert!(matches!(
        provider.create_directory(dir.path(), "New Folder"),
        Err(FileError::AlreadyExists(_))
    ));

    let file = provider.create_file(&sub, "notes.txt").unwrap();
    assert!(file.is_file());
    assert_eq!(fs::read_to_string(&file).unwrap(), "");
    assert!(matches!(
        provider.create_file(&sub, "notes.txt"),
        Err(FileError::AlreadyExists(_))
    ));
}

#[test]
fn test_create_rejects_bad_names() {
    let dir = tempdir().unwrap();
    let provider = LocalFileProvider::new();

    for name in ["", "  ", ".", "..", "a/b"] {
        assert!(matches!(
            provider.create_directory(dir.path(), name),
            Err(FileError::InvalidPath(_))
        ));
    }
}

#[test]
fn test_delete_is_recursive() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();
    File::create(nested.join("f.txt")).unwrap();

    let provider = LocalFileProvider::new();
    provider.delete(&dir.path().join("a")).unwrap();
    assert!(!dir.path().join("a").exists());

    assert!(matches!(
        provider.delete(&dir.path().join("a")),
        Err(FileError::NotFound(_))
    ));
}

#[test]
fn test_move_item() {
    let dir = tempdir().unwrap();
    let from = dir.path().join("old.txt");
    let to = dir.path().join("new.txt");
    fs::write(&from, "content").unwrap();

    let provider = LocalFileProvider::new();
    provider.move_item(&from, &to).unwrap();
    assert!(!from.exists());
    assert_eq!(fs::read_to_string(&to).unwrap(), "content");

    fs::write(&from, "again").unwrap();
    assert!(matches!(
        provider.move_item(&from, &to),
        Err(FileError::AlreadyExists(_))
    ));
}

#[test]
fn test_copy_directory_recursively() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(src.join("inner")).unwrap();
    fs::write(src.join("top.txt"), "top").unwrap();
    fs::write(src.join("inner").join("deep.txt"), "deep").unwrap();

    let dst = dir.path().join("dst");
    let provider = LocalFileProvider::new();
    provider.copy(&src, &dst).unwrap();

    assert!(src.join("top.txt").exists());
    assert_eq!(fs::read_to_string(dst.join("top.txt")).unwrap(), "top");
    assert_eq!(
        fs::read_to_string(dst.join("inner").join("deep.txt")).unwrap(),
        "deep"
    );
}

#[test]
fn test_copy_into_own_subtree_is_rejected() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();

    let provider = LocalFileProvider::new();
    assert!(matches!(
        provider.copy(&src, &src.join("copy")),
        Err(FileError::InvalidPath(_))
    ));
}

#[test]
fn test_parent_and_can_enter() {
    let dir = tempdir().unwrap();
    let provider = LocalFileProvider::new();

    assert_eq!(
        provider.parent(dir.path()).as_deref(),
        dir.path().parent()
    );
    assert!(provider.can_enter(dir.path()));
    assert!(!provider.can_enter(&dir.path().join("missing")));
    assert!(provider.parent(Path::new("relative")).is_none());
}

#[cfg(unix)]
#[test]
fn test_copy_keeps_symlink_loops_as_links() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("a");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("note.txt"), "n").unwrap();
    std::os::unix::fs::symlink(&src, src.join("loop")).unwrap();

    let dst = dir.path().join("b");
    LocalFileProvider::new().copy(&src, &dst).unwrap();

    assert_eq!(fs::read_to_string(dst.join("note.txt")).unwrap(), "n");
    let link = dst.join("loop");
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_link(&link).unwrap(), src);
    assert_eq!(fs::read_dir(&dst).unwrap().count(), 2);
}

#[cfg(unix)]
#[test]
fn test_list_skips_entries_that_cannot_be_inspected() {
    use std::os::unix::fs::PermissionsExt;

    // root ignores permission bits
    if unsafe { libc::geteuid() } == 0 {
        return;
    }

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    File::create(locked.join("inside.txt")).unwrap();
    File::create(dir.path().join("open.txt")).unwrap();
    // names readable, but no search permission to stat them
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o444)).unwrap();

    let provider = LocalFileProvider::new();
    let inner = provider.list_directory(&Location::dir(&locked), true);
    let outer = provider.list_directory(&Location::dir(dir.path()), true);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(names(&inner.unwrap()), vec![".."]);
    assert_eq!(names(&outer.unwrap()), vec!["..", "locked", "open.txt"]);
}
