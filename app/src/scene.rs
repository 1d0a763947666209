use crate::error::{CollageError, Result};
use crate::placement::Placement;
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PlacementId(u64);

impl Display for PlacementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
struct Entry {
    id: PlacementId,
    placement: Placement,
}

/// Placements in insertion order, which is also the order they are drawn
/// into the PDF. The same file may appear any number of times.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Scene {
    entries: Vec<Entry>,
    #[serde(skip_serializing)]
    next_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, placement: Placement) -> PlacementId {
        let id = PlacementId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, placement });
        id
    }

    pub fn remove(&mut self, id: PlacementId) -> Result<Placement> {
        let index = self
            .index_of(id)
            .ok_or(CollageError::UnknownPlacement(id))?;
        Ok(self.entries.remove(index).placement)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, id: PlacementId) -> Option<&Placement> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.placement)
    }

    pub fn get_mut(&mut self, id: PlacementId) -> Option<&mut Placement> {
        self.entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .map(|entry| &mut entry.placement)
    }

    pub fn index_of(&self, id: PlacementId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    pub fn contains(&self, id: PlacementId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl DoubleEndedIterator<Item = PlacementId> + '_ {
        self.entries.iter().map(|entry| entry.id)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Placement> {
        self.entries.iter().map(|entry| &entry.placement)
    }

    pub fn iter_with_ids(&self) -> impl DoubleEndedIterator<Item = (PlacementId, &Placement)> {
        self.entries.iter().map(|entry| (entry.id, &entry.placement))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Placement> {
        self.entries.iter_mut().map(|entry| &mut entry.placement)
    }
}
