use super::*;
use crate::kernel::services::adapters::LocalFileProvider;
use crate::kernel::services::ports::FileResult;
use crate::models::Entry;
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

/// One fake drive rooted in a temp dir; counts directory listings.
struct FakeDrives {
    drive: PathBuf,
    local: LocalFileProvider,
    listings: Mutex<Vec<PathBuf>>,
    deny: Option<PathBuf>,
    uninspectable: Vec<PathBuf>,
}

impl FakeDrives {
    fn new(drive: &Path) -> Self {
        Self {
            drive: drive.to_path_buf(),
            local: LocalFileProvider::new(),
            listings: Mutex::new(Vec::new()),
            deny: None,
            uninspectable: Vec::new(),
        }
    }

    fn listings_of(&self, path: &Path) -> usize {
        self.listings
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_path() == path)
            .count()
    }
}

impl FileProvider for FakeDrives {
    fn list_directory(&self, location: &Location, show_hidden: bool) -> FileResult<Vec<Entry>> {
        match location {
            Location::Drives => Ok(vec![Entry::drive(self.drive.clone())]),
            Location::Dir(path) => {
                self.listings.lock().unwrap().push(path.clone());
                if self.deny.as_deref() == Some(path.as_path()) {
                    return Err(FileError::PermissionDenied(path.clone()));
                }
                let mut entries = self.local.list_directory(location, show_hidden)?;
                entries.retain(|e| !self.uninspectable.contains(&e.path));
                Ok(entries)
            }
        }
    }

    fn create_directory(&self, parent: &Path, name: &str) -> FileResult<PathBuf> {
        self.local.create_directory(parent, name)
    }

    fn create_file(&self, parent: &Path, name: &str) -> FileResult<PathBuf> {
        self.local.create_file(parent, name)
    }

    fn delete(&self, path: &Path) -> FileResult<()> {
        self.local.delete(path)
    }

    fn move_item(&self, from: &Path, to: &Path) -> FileResult<()> {
        self.local.move_item(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> FileResult<()> {
        self.local.copy(from, to)
    }

    fn parent(&self, path: &Path) -> Option<PathBuf> {
        self.local.parent(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.local.is_dir(path)
    }

    fn can_enter(&self, path: &Path) -> bool {
        self.local.can_enter(path)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        None
    }
}

fn sample_drive() -> TempDir {
    let dir = tempfile::Builder::new().prefix("zfiles").tempdir().unwrap();
    fs::create_dir_all(dir.path().join("docs").join("reports")).unwrap();
    fs::create_dir_all(dir.path().join("music")).unwrap();
    fs::create_dir_all(dir.path().join(".cache")).unwrap();
    fs::write(dir.path().join("readme.txt"), "hi").unwrap();
    dir
}

fn drive_node(tree: &DirectoryTreeCache) -> NodeId {
    tree.children(tree.root()).next().unwrap()
}

#[test]
fn new_tree_lists_drives_without_fetching_them() {
    let drive = sample_drive();
    let fs = FakeDrives::new(drive.path());
    let tree = DirectoryTreeCache::new(&fs);

    let root = tree.root();
    assert!(tree.is_expanded(root));
    assert_eq!(tree.name(root), Some(DRIVES_LABEL));
    assert_eq!(tree.location(root), Some(Location::Drives));

    let drive_id = drive_node(&tree);
    assert_eq!(tree.kind(drive_id), Some(NodeKind::Drive));
    assert_eq!(tree.load_state(drive_id), Some(LoadState::NotLoaded));
    assert!(!tree.is_expanded(drive_id));
    assert_eq!(fs.listings_of(drive.path()), 0);
}

#[test]
fn expand_fetches_only_directories_once() {
    let drive = sample_drive();
    let fs = FakeDrives::new(drive.path());
    let mut tree = DirectoryTreeCache::new(&fs);
    let drive_id = drive_node(&tree);

    assert_eq!(tree.expand(drive_id, &fs, false).unwrap(), 2);
    let names: Vec<_> = tree
        .children(drive_id)
        .filter_map(|id| tree.name(id))
        .collect();
    assert_eq!(names, vec!["docs", "music"]);
    assert_eq!(tree.load_state(drive_id), Some(LoadState::Loaded));

    tree.collapse(drive_id);
    assert!(!tree.is_expanded(drive_id));
    assert_eq!(tree.children(drive_id).count(), 2);

    assert_eq!(tree.expand(drive_id, &fs, false).unwrap(), 0);
    assert!(tree.is_expanded(drive_id));
    assert_eq!(fs.listings_of(drive.path()), 1);
}

#[test]
fn hidden_toggle_does_not_refresh_expanded_nodes() {
    let drive = sample_drive();
    let fs = FakeDrives::new(drive.path());
    let mut tree = DirectoryTreeCache::new(&fs);
    let drive_id = drive_node(&tree);

    tree.expand(drive_id, &fs, false).unwrap();
    tree.collapse(drive_id);
    tree.expand(drive_id, &fs, true).unwrap();
    assert!(tree.child_by_name(drive_id, ".cache").is_none());

    tree.rebuild(&fs);
    let drive_id = drive_node(&tree);
    tree.expand(drive_id, &fs, true).unwrap();
    assert!(tree.child_by_name(drive_id, ".cache").is_some());
}

#[test]
fn failed_expansion_keeps_node_loaded_and_empty() {
    let drive = sample_drive();
    let mut fs = FakeDrives::new(drive.path());
    fs.deny = Some(drive.path().join("docs"));
    let mut tree = DirectoryTreeCache::new(&fs);
    let drive_id = drive_node(&tree);
    tree.expand(drive_id, &fs, false).unwrap();

    let docs = tree.child_by_name(drive_id, "docs").unwrap();
    let err = tree.expand(docs, &fs, false).unwrap_err();
    assert!(matches!(err, DirTreeError::Listing(FileError::PermissionDenied(_))));
    assert_eq!(tree.load_state(docs), Some(LoadState::Loaded));
    assert_eq!(tree.children(docs).count(), 0);

    // siblings are unaffected
    let music = tree.child_by_name(drive_id, "music").unwrap();
    assert!(tree.expand(music, &fs, false).is_ok());
}

#[test]
fn select_returns_location() {
    let drive = sample_drive();
    let fs = FakeDrives::new(drive.path());
    let mut tree = DirectoryTreeCache::new(&fs);
    let drive_id = drive_node(&tree);

    assert_eq!(
        tree.select(drive_id, &fs, false),
        Some(Location::dir(drive.path()))
    );
    assert_eq!(tree.selected(), Some(drive_id));
    assert!(tree.is_expanded(drive_id));
    assert_eq!(tree.children(drive_id).count(), 2);

    let root = tree.root();
    assert_eq!(tree.select(root, &fs, false), Some(Location::Drives));
}

#[test]
fn reveal_walks_parent_chain() {
    let drive = sample_drive();
    let fs = FakeDrives::new(drive.path());
    let mut tree = DirectoryTreeCache::new(&fs);

    let target = drive.path().join("docs").join("reports");
    let id = tree.reveal(&target, &fs, false).unwrap();

    assert_eq!(tree.path(id), Some(target.as_path()));
    assert_eq!(tree.selected(), Some(id));
    assert_eq!(tree.find_node_by_path(&target), Some(id));

    let docs = tree.find_node_by_path(&drive.path().join("docs")).unwrap();
    assert!(tree.is_expanded(docs));
    assert_eq!(fs.listings_of(&target), 0);
}

#[test]
fn reveal_stops_at_deepest_existing_node() {
    let drive = sample_drive();
    let fs = FakeDrives::new(drive.path());
    let mut tree = DirectoryTreeCache::new(&fs);

    let id = tree
        .reveal(&drive.path().join("music").join("missing"), &fs, false)
        .unwrap();
    assert_eq!(tree.name(id), Some("music"));
}

#[test]
fn reveal_outside_drives_is_none() {
    let drive = sample_drive();
    let other = tempfile::Builder::new().prefix("zfiles").tempdir().unwrap();
    let fs = FakeDrives::new(drive.path());
    let mut tree = DirectoryTreeCache::new(&fs);

    assert!(tree.reveal(other.path(), &fs, false).is_none());
}

#[test]
fn flatten_for_view_follows_expansion() {
    let drive = sample_drive();
    let fs = FakeDrives::new(drive.path());
    let mut tree = DirectoryTreeCache::new(&fs);
    let drive_id = drive_node(&tree);

    assert_eq!(tree.flatten_for_view().len(), 2);

    tree.expand(drive_id, &fs, false).unwrap();
    let rows = tree.flatten_for_view();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[2].name, "docs");
    assert_eq!(rows[2].depth, 2);

    let docs = rows[2].id;
    tree.select(docs, &fs, false);
    let rows = tree.flatten_for_view();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[3].name, "reports");
    assert!(rows[2].is_selected);
}

#[test]
fn expand_unknown_node_fails() {
    let drive = sample_drive();
    let fs = FakeDrives::new(drive.path());
    let mut tree = DirectoryTreeCache::new(&fs);
    let stale = drive_node(&tree);
    tree.rebuild(&fs);

    assert!(matches!(
        tree.expand(stale, &fs, false),
        Err(DirTreeError::InvalidNodeId)
    ));
}

#[test]
fn expand_shows_the_children_that_could_be_read() {
    let drive = sample_drive();
    fs::create_dir(drive.path().join("videos")).unwrap();
    let mut fs = FakeDrives::new(drive.path());
    fs.uninspectable.push(drive.path().join("docs"));
    fs.deny = Some(drive.path().join("music"));

    let mut tree = DirectoryTreeCache::new(&fs);
    let drive_id = drive_node(&tree);

    assert_eq!(tree.expand(drive_id, &fs, false).unwrap(), 2);
    let names: Vec<_> = tree
        .children(drive_id)
        .filter_map(|id| tree.name(id))
        .collect();
    assert_eq!(names, vec!["music", "videos"]);

    let music = tree.child_by_name(drive_id, "music").unwrap();
    assert!(matches!(
        tree.expand(music, &fs, false),
        Err(DirTreeError::Listing(FileError::PermissionDenied(_)))
    ));

    let rows: Vec<_> = tree.flatten_for_view().into_iter().map(|r| r.name).collect();
    assert!(rows.contains(&"videos".to_string()));
    assert_eq!(tree.children(music).count(), 0);
}
