//! 目录树数据模型
//!
//! 节点的子目录只在首次展开时读取，之后在整个会话内保留

use super::{EntryKind, Location, DRIVES_LABEL};
use crate::kernel::services::ports::{FileError, FileProvider};
use rustc_hash::FxHashSet;
use slotmap::{new_key_type, SlotMap};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    path::{Path, PathBuf},
};

new_key_type! { pub struct NodeId; }

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Drive,
    Dir,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loaded,
}

#[derive(Debug)]
pub enum DirTreeError {
    InvalidNodeId,
    Listing(FileError),
}

impl fmt::Display for DirTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirTreeError::InvalidNodeId => write!(f, "invalid node id"),
            DirTreeError::Listing(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DirTreeError {}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    name: String,
    path: Option<PathBuf>,
    parent: Option<NodeId>,
    children: BTreeMap<String, NodeId>,
    load_state: LoadState,
}

impl Node {
    fn new(kind: NodeKind, name: String, path: Option<PathBuf>, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            name,
            path,
            parent,
            children: BTreeMap::new(),
            load_state: LoadState::NotLoaded,
        }
    }
}

pub struct DirectoryTreeCache {
    arena: SlotMap<NodeId, Node>,
    root: NodeId,
    expanded: FxHashSet<NodeId>,
    selected: Option<NodeId>,
    id_by_path: HashMap<PathBuf, NodeId>,
}

impl DirectoryTreeCache {
    /// Builds the "This PC" root with one unexpanded node per drive.
    pub fn new(fs: &dyn FileProvider) -> Self {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Node::new(
            NodeKind::Root,
            DRIVES_LABEL.to_string(),
            None,
            None,
        ));

        let mut tree = Self {
            arena,
            root,
            expanded: FxHashSet::default(),
            selected: None,
            id_by_path: HashMap::new(),
        };
        tree.load_drives(fs);
        tree
    }

    fn load_drives(&mut self, fs: &dyn FileProvider) {
        match fs.list_directory(&Location::Drives, true) {
            Ok(entries) => {
                for entry in entries.into_iter().filter(|e| e.kind == EntryKind::Drive) {
                    self.insert_child(self.root, NodeKind::Drive, entry.name, entry.path);
                }
            }
            Err(e) => tracing::warn!(error = %e, "list drives failed"),
        }

        if let Some(root) = self.arena.get_mut(self.root) {
            root.load_state = LoadState::Loaded;
        }
        self.expanded.insert(self.root);
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        name: String,
        path: PathBuf,
    ) -> Option<NodeId> {
        if self.arena.get(parent)?.children.contains_key(&name) {
            return None;
        }
        let id = self
            .arena
            .insert(Node::new(kind, name.clone(), Some(path.clone()), Some(parent)));
        self.arena.get_mut(parent)?.children.insert(name, id);
        self.id_by_path.insert(path, id);
        Some(id)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.arena.get(id).map(|n| n.name.as_str())
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.arena.get(id).map(|n| n.kind)
    }

    pub fn path(&self, id: NodeId) -> Option<&Path> {
        self.arena.get(id).and_then(|n| n.path.as_deref())
    }

    pub fn location(&self, id: NodeId) -> Option<Location> {
        let node = self.arena.get(id)?;
        Some(match &node.path {
            Some(path) => Location::Dir(path.clone()),
            None => Location::Drives,
        })
    }

    pub fn load_state(&self, id: NodeId) -> Option<LoadState> {
        self.arena.get(id).map(|n| n.load_state)
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.arena
            .get(id)
            .into_iter()
            .flat_map(|n| n.children.values().copied())
    }

    pub fn child_by_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.arena.get(id)?.children.get(name).copied()
    }

    pub fn find_node_by_path(&self, path: &Path) -> Option<NodeId> {
        self.id_by_path.get(path).copied()
    }

    /// Opens `id`, fetching its child directories on the first expansion
    /// only. Returns how many children were fetched (0 when cached).
    ///
    /// A node whose listing fails stays loaded with no children; the error is
    /// still returned so the caller can report it.
    pub fn expand(
        &mut self,
        id: NodeId,
        fs: &dyn FileProvider,
        show_hidden: bool,
    ) -> Result<usize, DirTreeError> {
        let node = self.arena.get(id).ok_or(DirTreeError::InvalidNodeId)?;
        self.expanded.insert(id);

        if node.load_state == LoadState::Loaded {
            return Ok(0);
        }
        let Some(path) = node.path.clone() else {
            return Ok(0);
        };

        if let Some(node) = self.arena.get_mut(id) {
            node.load_state = LoadState::Loaded;
        }

        let entries = fs
            .list_directory(&Location::Dir(path.clone()), show_hidden)
            .map_err(|e| {
                tracing::warn!(path = %path.display(), error = %e, "expand tree node failed");
                DirTreeError::Listing(e)
            })?;

        let mut fetched = 0;
        for entry in entries
            .into_iter()
            .filter(|e| e.kind == EntryKind::Directory)
        {
            if self
                .insert_child(id, NodeKind::Dir, entry.name, entry.path)
                .is_some()
            {
                fetched += 1;
            }
        }
        Ok(fetched)
    }

    /// Closes `id`; fetched children are kept.
    pub fn collapse(&mut self, id: NodeId) {
        self.expanded.remove(&id);
    }

    pub fn toggle_expand(
        &mut self,
        id: NodeId,
        fs: &dyn FileProvider,
        show_hidden: bool,
    ) -> Result<usize, DirTreeError> {
        if self.expanded.contains(&id) {
            self.collapse(id);
            Ok(0)
        } else {
            self.expand(id, fs, show_hidden)
        }
    }

    /// Selects and opens `id`, returning where the active tab should go.
    /// A failed expansion still selects the node.
    pub fn select(
        &mut self,
        id: NodeId,
        fs: &dyn FileProvider,
        show_hidden: bool,
    ) -> Option<Location> {
        let location = self.location(id)?;
        self.selected = Some(id);
        let _ = self.expand(id, fs, show_hidden);
        Some(location)
    }

    /// Expands every ancestor of `path` starting from its drive, then
    /// selects the deepest node reached.
    pub fn reveal(
        &mut self,
        path: &Path,
        fs: &dyn FileProvider,
        show_hidden: bool,
    ) -> Option<NodeId> {
        let drive = self
            .children(self.root)
            .filter_map(|id| Some((id, self.path(id)?)))
            .filter(|(_, drive_path)| path.starts_with(drive_path))
            .max_by_key(|(_, drive_path)| drive_path.as_os_str().len())
            .map(|(id, _)| id)?;

        let mut current = drive;
        let relative = self.path(drive).and_then(|p| path.strip_prefix(p).ok())?;
        let components: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        for name in components {
            let _ = self.expand(current, fs, show_hidden);
            match self.child_by_name(current, &name) {
                Some(child) => current = child,
                None => break,
            }
        }

        self.selected = Some(current);
        Some(current)
    }

    /// Discards every fetched node and reloads the drives.
    pub fn rebuild(&mut self, fs: &dyn FileProvider) {
        *self = Self::new(fs);
    }
}

#[derive(Debug, Clone)]
pub struct TreeRow {
    pub id: NodeId,
    pub depth: u16,
    pub name: String,
    pub is_expanded: bool,
    pub is_selected: bool,
    pub load_state: LoadState,
}

impl DirectoryTreeCache {
    pub fn flatten_for_view(&self) -> Vec<TreeRow> {
        let mut result = Vec::new();
        let mut stack: Vec<(NodeId, u16)> = vec![(self.root, 0)];

        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.arena.get(id) else {
                continue;
            };

            result.push(TreeRow {
                id,
                depth,
                name: node.name.clone(),
                is_expanded: self.expanded.contains(&id),
                is_selected: self.selected == Some(id),
                load_state: node.load_state,
            });

            if self.expanded.contains(&id) {
                for &child in node.children.values().rev() {
                    stack.push((child, depth + 1));
                }
            }
        }

        result
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/dir_tree.rs"]
mod tests;
