//! Copy-on-write list for read-mostly collections.

use std::sync::{Arc, RwLock};

/// An ordered list whose readers work on immutable snapshots.
///
/// Writers replace the shared vector; a snapshot taken before a write keeps
/// seeing the old contents.
#[derive(Debug)]
pub struct SnapshotList<T> {
    items: RwLock<Arc<Vec<T>>>,
}

impl<T: Clone> SnapshotList<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Arc::new(Vec::new())),
        }
    }

    pub fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.items.read().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn push(&self, item: T) {
        self.update(|items| items.push(item));
    }

    /// Remove the first element matching `pred`.
    pub fn remove_first(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        let mut removed = None;
        self.update(|items| {
            if let Some(pos) = items.iter().position(&pred) {
                removed = Some(items.remove(pos));
            }
        });
        removed
    }

    pub fn last(&self) -> Option<T> {
        self.snapshot().last().cloned()
    }

    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.snapshot().iter().find(|item| pred(item)).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn update(&self, f: impl FnOnce(&mut Vec<T>)) {
        let mut guard = self.items.write().unwrap_or_else(|e| e.into_inner());
        f(Arc::make_mut(&mut guard));
    }
}

impl<T: Clone> Default for SnapshotList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> FromIterator<T> for SnapshotList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: RwLock::new(Arc::new(iter.into_iter().collect())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_stable_across_writes() {
        let list: SnapshotList<u32> = [1, 2].into_iter().collect();
        let before = list.snapshot();
        list.push(3);
        assert_eq!(*before, vec![1, 2]);
        assert_eq!(*list.snapshot(), vec![1, 2, 3]);
    }

    #[test]
    fn test_remove_first_and_last() {
        let list: SnapshotList<u32> = [1, 2, 1].into_iter().collect();
        assert_eq!(list.remove_first(|v| *v == 1), Some(1));
        assert_eq!(*list.snapshot(), vec![2, 1]);
        assert_eq!(list.last(), Some(1));
        assert_eq!(list.remove_first(|v| *v == 9), None);
    }
}
