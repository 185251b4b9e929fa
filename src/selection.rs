//! Editable state in front of merge and split.
//!
//! Both types are immutable snapshots: every edit returns a new value and
//! leaves the old one intact, so whoever holds a snapshot always sees a
//! consistent whole.

use crate::pdf::merge::SourceEntry;
use crate::rotation::Rotation;
use crate::validation::FileKind;
use std::sync::Arc;

/// A file waiting to be merged.
#[derive(Debug, Clone)]
pub struct QueuedFile {
    pub id: u64,
    pub name: String,
    pub kind: FileKind,
    pub content: Arc<[u8]>,
    /// Images count as one page
    pub page_count: u32,
    pub rotation: Rotation,
}

impl QueuedFile {
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Ordered list of files to merge.
#[derive(Debug, Clone, Default)]
pub struct MergeQueue {
    files: Arc<[QueuedFile]>,
    next_id: u64,
}

impl MergeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[QueuedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Append a file; returns the new queue and the file's id.
    pub fn add(
        &self,
        name: impl Into<String>,
        kind: FileKind,
        content: impl Into<Arc<[u8]>>,
        page_count: u32,
    ) -> (Self, u64) {
        let id = self.next_id;
        let file = QueuedFile {
            id,
            name: name.into(),
            kind,
            content: content.into(),
            page_count,
            rotation: Rotation::None,
        };
        let files = self.files.iter().cloned().chain([file]).collect();
        (
            MergeQueue {
                files,
                next_id: id + 1,
            },
            id,
        )
    }

    /// Drop a file. The removed entry is handed back so the caller can release
    /// anything attached to it.
    pub fn remove(&self, id: u64) -> (Self, Option<QueuedFile>) {
        let Some(position) = self.position(id) else {
            return (self.clone(), None);
        };
        let mut files = self.files.to_vec();
        let removed = files.remove(position);
        (self.with_files(files), Some(removed))
    }

    /// Move file `active` to where `over` currently is. Unknown ids leave the
    /// queue as it was.
    pub fn reorder(&self, active: u64, over: u64) -> Self {
        let (Some(from), Some(to)) = (self.position(active), self.position(over)) else {
            return self.clone();
        };
        let mut files = self.files.to_vec();
        let moved = files.remove(from);
        files.insert(to, moved);
        self.with_files(files)
    }

    /// Turn a file one quarter clockwise.
    pub fn rotate(&self, id: u64) -> Self {
        match self.position(id) {
            Some(position) => self.with_rotation(id, self.files[position].rotation.next()),
            None => self.clone(),
        }
    }

    pub fn with_rotation(&self, id: u64, rotation: Rotation) -> Self {
        let files = self
            .files
            .iter()
            .map(|f| {
                let mut f = f.clone();
                if f.id == id {
                    f.rotation = rotation;
                }
                f
            })
            .collect::<Vec<_>>();
        self.with_files(files)
    }

    pub fn clear(&self) -> Self {
        self.with_files(Vec::new())
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(QueuedFile::size).sum()
    }

    pub fn total_pages(&self) -> u64 {
        self.files.iter().map(|f| f.page_count as u64).sum()
    }

    /// Merge input borrowing this snapshot's bytes.
    pub fn entries(&self) -> Vec<SourceEntry<'_>> {
        self.files
            .iter()
            .map(|f| {
                SourceEntry::new(&f.content, f.kind)
                    .with_rotation(f.rotation)
                    .with_name(f.name.clone())
            })
            .collect()
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.files.iter().position(|f| f.id == id)
    }

    fn with_files(&self, files: Vec<QueuedFile>) -> Self {
        MergeQueue {
            files: files.into(),
            next_id: self.next_id,
        }
    }
}

/// Which pages of one document are picked for extraction, and how each is
/// turned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    selected: Arc<[bool]>,
    rotations: Arc<[Rotation]>,
}

impl PageSelection {
    /// Every page selected, none rotated.
    pub fn all(page_count: u32) -> Self {
        PageSelection {
            selected: vec![true; page_count as usize].into(),
            rotations: vec![Rotation::None; page_count as usize].into(),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.selected.len() as u32
    }

    pub fn is_selected(&self, index: u32) -> bool {
        self.selected.get(index as usize).copied().unwrap_or(false)
    }

    pub fn rotation(&self, index: u32) -> Rotation {
        self.rotations.get(index as usize).copied().unwrap_or_default()
    }

    pub fn toggle(&self, index: u32) -> Self {
        self.map_selected(|i, selected| if i == index { !selected } else { selected })
    }

    pub fn select_all(&self) -> Self {
        self.map_selected(|_, _| true)
    }

    pub fn deselect_all(&self) -> Self {
        self.map_selected(|_, _| false)
    }

    /// Select exactly `indices`; out-of-range indices are ignored.
    pub fn with_selected(&self, indices: &[u32]) -> Self {
        self.map_selected(|i, _| indices.contains(&i))
    }

    /// Turn one page a quarter clockwise.
    pub fn rotate(&self, index: u32) -> Self {
        self.with_rotation(index, self.rotation(index).next())
    }

    pub fn with_rotation(&self, index: u32, rotation: Rotation) -> Self {
        let rotations = self
            .rotations
            .iter()
            .enumerate()
            .map(|(i, &r)| if i as u32 == index { rotation } else { r })
            .collect();
        PageSelection {
            selected: Arc::clone(&self.selected),
            rotations,
        }
    }

    pub fn selected_count(&self) -> usize {
        self.selected.iter().filter(|&&s| s).count()
    }

    /// Selected indices in page order.
    pub fn selected_indices(&self) -> Vec<u32> {
        (0..self.page_count())
            .filter(|&i| self.is_selected(i))
            .collect()
    }

    /// Rotations parallel to `selected_indices`.
    pub fn selected_rotations(&self) -> Vec<Rotation> {
        self.selected_indices()
            .into_iter()
            .map(|i| self.rotation(i))
            .collect()
    }

    fn map_selected(&self, f: impl Fn(u32, bool) -> bool) -> Self {
        let selected = self
            .selected
            .iter()
            .enumerate()
            .map(|(i, &s)| f(i as u32, s))
            .collect();
        PageSelection {
            selected,
            rotations: Arc::clone(&self.rotations),
        }
    }
}
