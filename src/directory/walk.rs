//! Tree traversal in three orders.

use std::collections::{HashSet, VecDeque};
use std::ops::ControlFlow;

use tracing::trace;

use super::Directory;
use crate::{FsError, FsUrl, Item, Traversal};

impl Directory {
    /// Visit every item below this directory (not the directory itself).
    ///
    /// The visitor receives each item and its depth (`1` for direct
    /// children). Returning [`ControlFlow::Break`] stops the walk and the
    /// break value is returned as `Some`.
    ///
    /// | Order | Visits |
    /// |-------|--------|
    /// | [`Traversal::PreOrder`] | a node, then its subtree |
    /// | [`Traversal::PostOrder`] | a subtree, then its node |
    /// | [`Traversal::LevelOrder`] | all of depth 1, then all of depth 2, ... |
    ///
    /// Each URL is visited at most once, so backends that expose a directory
    /// under two parents (or inside itself) cannot make the walk loop.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ezfs::{Filesystem, MemoryFs, Traversal};
    /// use std::ops::ControlFlow;
    /// use std::sync::Arc;
    ///
    /// let fs = MemoryFs::new();
    /// fs.insert_file("/a/b.txt", "").unwrap();
    /// fs.insert_file("/a/c/d.txt", "").unwrap();
    /// let root = Filesystem::new(Arc::new(fs)).root().unwrap();
    ///
    /// let nearest = root
    ///     .walk(Traversal::LevelOrder, |item, _| {
    ///         if item.name().ends_with(".txt") {
    ///             ControlFlow::Break(item.name())
    ///         } else {
    ///             ControlFlow::Continue(())
    ///         }
    ///     })
    ///     .unwrap();
    /// assert_eq!(nearest.as_deref(), Some("b.txt"));
    /// ```
    pub fn walk<R, F>(&self, order: Traversal, mut visit: F) -> Result<Option<R>, FsError>
    where
        F: FnMut(&Item, usize) -> ControlFlow<R>,
    {
        let mut visited = HashSet::from([self.url().clone()]);
        let flow = match order {
            Traversal::PreOrder => self.pre_order(1, &mut visited, &mut visit)?,
            Traversal::PostOrder => self.post_order(1, &mut visited, &mut visit)?,
            Traversal::LevelOrder => self.level_order(&mut visited, &mut visit)?,
        };
        Ok(match flow {
            ControlFlow::Break(value) => Some(value),
            ControlFlow::Continue(()) => None,
        })
    }

    fn pre_order<R, F>(
        &self,
        depth: usize,
        visited: &mut HashSet<FsUrl>,
        visit: &mut F,
    ) -> Result<ControlFlow<R>, FsError>
    where
        F: FnMut(&Item, usize) -> ControlFlow<R>,
    {
        for child in self.children()? {
            if !visited.insert(child.url().clone()) {
                continue;
            }
            trace!(url = %child.url(), depth, "pre-order visit");
            if let ControlFlow::Break(value) = visit(&child, depth) {
                return Ok(ControlFlow::Break(value));
            }
            if let Some(dir) = child.as_dir() {
                if let ControlFlow::Break(value) = dir.pre_order(depth + 1, visited, visit)? {
                    return Ok(ControlFlow::Break(value));
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn post_order<R, F>(
        &self,
        depth: usize,
        visited: &mut HashSet<FsUrl>,
        visit: &mut F,
    ) -> Result<ControlFlow<R>, FsError>
    where
        F: FnMut(&Item, usize) -> ControlFlow<R>,
    {
        for child in self.children()? {
            if !visited.insert(child.url().clone()) {
                continue;
            }
            if let Some(dir) = child.as_dir() {
                if let ControlFlow::Break(value) = dir.post_order(depth + 1, visited, visit)? {
                    return Ok(ControlFlow::Break(value));
                }
            }
            trace!(url = %child.url(), depth, "post-order visit");
            if let ControlFlow::Break(value) = visit(&child, depth) {
                return Ok(ControlFlow::Break(value));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn level_order<R, F>(
        &self,
        visited: &mut HashSet<FsUrl>,
        visit: &mut F,
    ) -> Result<ControlFlow<R>, FsError>
    where
        F: FnMut(&Item, usize) -> ControlFlow<R>,
    {
        let mut queue = VecDeque::from([(self.clone(), 1)]);
        while let Some((dir, depth)) = queue.pop_front() {
            for child in dir.children()? {
                if !visited.insert(child.url().clone()) {
                    continue;
                }
                trace!(url = %child.url(), depth, "level-order visit");
                if let ControlFlow::Break(value) = visit(&child, depth) {
                    return Ok(ControlFlow::Break(value));
                }
                if let Some(sub) = child.as_dir() {
                    queue.push_back((sub, depth + 1));
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}
