use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Local};
use indextree::{Arena, NodeId};
use serde::Serialize;
use thiserror::Error;

use super::HOME_DIR;

const SECRET_TXT: &str =
    "Mission briefing: Infiltration successful. Proceed with data extraction.";
const README_TXT: &str = "Welcome to the system. Use standard Unix commands to navigate.";

pub const FILE_PERMISSIONS: &str = "-rw-r--r--";
pub const DIR_PERMISSIONS: &str = "drwxr-xr-x";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualFile {
    pub name: String,
    pub content: String,
    pub permissions: String,
    pub hidden: bool,
    pub size: usize,
    pub created_at: DateTime<Local>,
    pub modified_at: DateTime<Local>,
}

impl VirtualFile {
    /// New file stamped with the current time. Dot-prefixed names start hidden.
    pub fn new(name: &str, content: impl Into<String>) -> Self {
        let content = content.into();
        let now = Local::now();
        Self {
            name: name.to_string(),
            size: content.len(),
            content,
            permissions: FILE_PERMISSIONS.to_string(),
            hidden: name.starts_with('.'),
            created_at: now,
            modified_at: now,
        }
    }

    /// Copy of this file holding `content`; `created_at` and `hidden` carry over.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        let mut file = self.clone();
        file.content = content.into();
        file.size = file.content.len();
        file.modified_at = Local::now();
        file
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VfsNode {
    Directory { name: String },
    File(VirtualFile),
}

impl VfsNode {
    pub fn name(&self) -> &str {
        match self {
            VfsNode::Directory { name } => name,
            VfsNode::File(file) => &file.name,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, VfsNode::Directory { .. })
    }

    pub fn as_file(&self) -> Option<&VirtualFile> {
        match self {
            VfsNode::File(file) => Some(file),
            VfsNode::Directory { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    #[error("No such file or directory")]
    NotFound,
    #[error("Not a directory")]
    NotADirectory,
    #[error("File exists")]
    AlreadyExists,
}

/// Resolve `path` against `current_dir` into a normalized absolute path.
///
/// `.` segments vanish, `..` pops one resolved segment and never climbs above `/`.
pub fn normalize_path(path: &str, current_dir: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else if current_dir == "/" {
        format!("/{path}")
    } else {
        format!("{current_dir}/{path}")
    };

    let mut resolved: Vec<&str> = Vec::new();
    for part in joined.split('/').filter(|s| !s.is_empty()) {
        match part {
            "." => continue,
            ".." => {
                resolved.pop();
            }
            name => resolved.push(name),
        }
    }

    if resolved.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", resolved.join("/"))
    }
}

// Only meaningful for normalized paths other than "/".
fn split_parent(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some(("", name)) => ("/", name),
        Some((parent, name)) => (parent, name),
        None => ("/", path),
    }
}

fn find_child(arena: &Arena<VfsNode>, dir: NodeId, name: &str, want_dir: bool) -> Option<NodeId> {
    dir.children(arena).find(|child| {
        let node = arena[*child].get();
        node.is_directory() == want_dir && node.name() == name
    })
}

/// One immutable snapshot of the sandbox tree.
///
/// Every mutator returns a new snapshot. The arena and the path index sit
/// behind `Arc`s and are copied on write, so a snapshot handed out earlier
/// never changes underneath its holder.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualFilesystem {
    arena: Arc<Arena<VfsNode>>,
    root: NodeId,
    directories: Arc<BTreeMap<String, NodeId>>,
    current_directory: String,
    history: Arc<Vec<String>>,
}

impl Default for VirtualFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFilesystem {
    /// An empty tree holding only `/`, with `/` as the working directory.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(VfsNode::Directory {
            name: "/".to_string(),
        });
        let mut directories = BTreeMap::new();
        directories.insert("/".to_string(), root);

        Self {
            arena: Arc::new(arena),
            root,
            directories: Arc::new(directories),
            current_directory: "/".to_string(),
            history: Arc::new(Vec::new()),
        }
    }

    /// The mission seed tree: `/home/user` holding `readme.txt` and a hidden
    /// `.secret.txt`, with the working directory at home.
    pub fn seed() -> Self {
        let mut fs = Self::new();
        let home = fs.insert_directory(fs.root, "home", "/home".to_string());
        let user = fs.insert_directory(home, "user", HOME_DIR.to_string());
        fs.insert_file(user, VirtualFile::new(".secret.txt", SECRET_TXT));
        fs.insert_file(user, VirtualFile::new("readme.txt", README_TXT));
        fs.current_directory = HOME_DIR.to_string();
        fs
    }

    pub fn current_directory(&self) -> &str {
        &self.current_directory
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// True when both values are the very same snapshot, not merely equal ones.
    pub fn same_snapshot(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.arena, &other.arena)
            && Arc::ptr_eq(&self.directories, &other.directories)
            && Arc::ptr_eq(&self.history, &other.history)
            && self.current_directory == other.current_directory
    }

    pub fn directory_paths(&self) -> impl Iterator<Item = &str> {
        self.directories.keys().map(String::as_str)
    }

    pub fn get_directory(&self, path: &str) -> Option<VirtualDirectory<'_>> {
        let path = normalize_path(path, &self.current_directory);
        let id = *self.directories.get(&path)?;
        Some(VirtualDirectory {
            fs: self,
            id,
            path,
        })
    }

    pub fn path_exists(&self, path: &str) -> bool {
        self.directories
            .contains_key(&normalize_path(path, &self.current_directory))
    }

    /// Looks `name` up among the files of `dir` (the working directory when `None`).
    pub fn file_exists(&self, name: &str, dir: Option<&str>) -> bool {
        self.file(name, dir).is_some()
    }

    pub fn file_content(&self, name: &str, dir: Option<&str>) -> Option<&str> {
        self.file(name, dir).map(|file| file.content.as_str())
    }

    pub fn file(&self, name: &str, dir: Option<&str>) -> Option<&VirtualFile> {
        let dir = self.get_directory(dir.unwrap_or(self.current_directory.as_str()))?;
        dir.file(name)
    }

    /// Resolves `path` (relative or absolute) to a file anywhere in the tree.
    pub fn file_at(&self, path: &str) -> Option<&VirtualFile> {
        let path = normalize_path(path, &self.current_directory);
        if path == "/" {
            return None;
        }
        let (parent, name) = split_parent(&path);
        self.file(name, Some(parent))
    }

    /// Sorted entry names of `path`; directories carry a trailing `/`.
    pub fn list_directory(&self, path: Option<&str>, show_hidden: bool) -> Vec<String> {
        let Some(dir) = self.get_directory(path.unwrap_or(self.current_directory.as_str())) else {
            return Vec::new();
        };

        let mut items: Vec<String> = dir.subdirectories().map(|name| format!("{name}/")).collect();
        items.extend(
            dir.files()
                .filter(|file| show_hidden || !file.hidden)
                .map(|file| file.name.clone()),
        );
        items.sort();
        items
    }

    /// Creates `name` (a name or path) relative to the working directory.
    /// Falls back to this very snapshot when the directory cannot be created.
    pub fn make_directory(&self, name: &str) -> Self {
        self.try_make_directory(name)
            .unwrap_or_else(|_| self.clone())
    }

    pub fn try_make_directory(&self, name: &str) -> Result<Self, VfsError> {
        let path = normalize_path(name, &self.current_directory);
        if self.directories.contains_key(&path) {
            return Err(VfsError::AlreadyExists);
        }

        let (parent_path, dir_name) = split_parent(&path);
        let parent = self.directory_id(parent_path)?;
        if find_child(&self.arena, parent, dir_name, false).is_some() {
            return Err(VfsError::AlreadyExists);
        }

        let mut next = self.clone();
        let dir_name = dir_name.to_string();
        next.insert_directory(parent, &dir_name, path);
        Ok(next)
    }

    /// Moves the working directory, or hands back this very snapshot when the
    /// target does not exist.
    pub fn change_directory(&self, path: &str) -> Self {
        let target = normalize_path(path, &self.current_directory);
        if !self.directories.contains_key(&target) {
            return self.clone();
        }
        let mut next = self.clone();
        next.current_directory = target;
        next
    }

    /// Puts an empty file in the working directory, truncating any existing one.
    pub fn touch_file(&self, name: &str) -> Self {
        self.put_file(VirtualFile::new(name, ""))
    }

    pub fn write_to_file(&self, name: &str, content: &str) -> Self {
        let file = match self.file(name, None) {
            Some(existing) => existing.with_content(content),
            None => VirtualFile::new(name, content),
        };
        self.put_file(file)
    }

    pub fn remove_file(&self, name: &str) -> Self {
        let Some(&dir) = self.directories.get(&self.current_directory) else {
            return self.clone();
        };
        let Some(file_id) = find_child(&self.arena, dir, name, false) else {
            return self.clone();
        };

        let mut next = self.clone();
        file_id.remove(Arc::make_mut(&mut next.arena));
        next
    }

    pub fn with_history_entry(&self, entry: &str) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.history).push(entry.to_string());
        next
    }

    fn put_file(&self, file: VirtualFile) -> Self {
        let Some(&dir) = self.directories.get(&self.current_directory) else {
            return self.clone();
        };
        let mut next = self.clone();
        next.insert_file(dir, file);
        next
    }

    fn insert_file(&mut self, dir: NodeId, file: VirtualFile) {
        let arena = Arc::make_mut(&mut self.arena);
        match find_child(arena, dir, &file.name, false) {
            Some(existing) => *arena[existing].get_mut() = VfsNode::File(file),
            None => {
                let id = arena.new_node(VfsNode::File(file));
                dir.append(id, arena);
            }
        }
    }

    fn insert_directory(&mut self, parent: NodeId, name: &str, path: String) -> NodeId {
        let arena = Arc::make_mut(&mut self.arena);
        let id = arena.new_node(VfsNode::Directory {
            name: name.to_string(),
        });
        parent.append(id, arena);
        Arc::make_mut(&mut self.directories).insert(path, id);
        id
    }

    fn directory_id(&self, path: &str) -> Result<NodeId, VfsError> {
        match self.directories.get(path) {
            Some(id) => Ok(*id),
            None => Err(self.missing_reason(path)),
        }
    }

    // Walks up to the nearest indexed ancestor to tell "missing" from "a file
    // sits where a directory was expected".
    fn missing_reason(&self, path: &str) -> VfsError {
        let mut current = path;
        while current != "/" {
            let (parent, name) = split_parent(current);
            if let Some(&parent_id) = self.directories.get(parent) {
                return if find_child(&self.arena, parent_id, name, false).is_some() {
                    VfsError::NotADirectory
                } else {
                    VfsError::NotFound
                };
            }
            current = parent;
        }
        VfsError::NotFound
    }

    fn node_path(&self, node: NodeId) -> String {
        if node == self.root {
            return "/".to_string();
        }

        let mut parts = Vec::new();
        let mut current = node;
        while let Some(parent) = self.arena[current].parent() {
            parts.push(self.arena[current].get().name());
            current = parent;
        }
        parts.reverse();
        format!("/{}", parts.join("/"))
    }
}

/// Borrowed view of one directory inside a snapshot.
#[derive(Debug, Clone)]
pub struct VirtualDirectory<'a> {
    fs: &'a VirtualFilesystem,
    id: NodeId,
    path: String,
}

impl<'a> VirtualDirectory<'a> {
    pub fn name(&self) -> &'a str {
        self.fs.arena[self.id].get().name()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent_path(&self) -> Option<String> {
        self.fs.arena[self.id]
            .parent()
            .map(|parent| self.fs.node_path(parent))
    }

    pub fn files(&self) -> impl Iterator<Item = &'a VirtualFile> + 'a {
        let arena: &'a Arena<VfsNode> = &self.fs.arena;
        self.id
            .children(arena)
            .filter_map(move |child| arena[child].get().as_file())
    }

    pub fn file(&self, name: &str) -> Option<&'a VirtualFile> {
        let arena: &'a Arena<VfsNode> = &self.fs.arena;
        find_child(arena, self.id, name, false).and_then(|id| arena[id].get().as_file())
    }

    pub fn subdirectories(&self) -> impl Iterator<Item = &'a str> + 'a {
        let arena: &'a Arena<VfsNode> = &self.fs.arena;
        self.id.children(arena).filter_map(move |child| {
            let node = arena[child].get();
            node.is_directory().then(|| node.name())
        })
    }
}
