//! Name search (`glob`, `regex_find`) and flattening (`get_all`).

use std::ops::ControlFlow;

use indexmap::IndexSet;
use regex::{Regex, RegexBuilder};

use super::{Directory, match_child};
use crate::{FsError, Item, Traversal};

fn compile(pattern: &str, source: &str, ignore_case: bool) -> Result<Regex, FsError> {
    RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|e| FsError::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })
}

fn has_wildcard(segment: &str) -> bool {
    segment.contains(['*', '?', '['])
}

/// Translate one glob segment into an anchored regex.
///
/// `*` matches any run, `?` at most one character, and `[...]` ranges are
/// kept (`[!...]` negates). An unclosed `[` is literal.
fn glob_to_regex(segment: &str) -> String {
    let mut out = String::from("^");
    let mut chars = segment.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*?"),
            '?' => out.push_str(".?"),
            '[' => {
                let rest: String = chars.clone().collect();
                match rest.find(']') {
                    Some(end) if end > 0 => {
                        let body = &rest[..end];
                        out.push('[');
                        match body.strip_prefix('!') {
                            Some(negated) => {
                                out.push('^');
                                out.push_str(&negated.replace('\\', "\\\\"));
                            }
                            None => out.push_str(&body.replace('\\', "\\\\")),
                        }
                        out.push(']');
                        for _ in 0..body.chars().count() + 1 {
                            chars.next();
                        }
                    }
                    _ => out.push_str(r"\["),
                }
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    out
}

impl Directory {
    /// Files anywhere below this directory whose name matches `pattern`.
    ///
    /// The pattern is anchored at the start of the name. Directories are
    /// searched whether or not their own name matches, and are never
    /// returned themselves.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPattern`] if `pattern` is not a valid regex
    pub fn regex_find(&self, pattern: &str, ignore_case: bool) -> Result<Vec<Item>, FsError> {
        let regex = compile(&format!("^(?:{pattern})"), pattern, ignore_case)?;
        let mut found = Vec::new();
        self.walk(Traversal::PreOrder, |item, _| {
            if item.is_file() && regex.is_match(&item.name()) {
                found.push(item.clone());
            }
            ControlFlow::<()>::Continue(())
        })?;
        Ok(found)
    }

    /// Items matching a glob expression such as `a/*/*.txt`.
    ///
    /// Segments with `*`, `?` or `[` match names by pattern; other segments
    /// are looked up by name (exact first, then case-folded when
    /// `ignore_case` is set or the backend is case-insensitive). When the
    /// last segment is such a name and it exists, every child of the
    /// directory holding it is returned, not just the named item. Results
    /// are de-duplicated in discovery order.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPattern`] if a segment cannot be translated
    /// - [`FsError::PathEscapesRoot`] if `..` climbs above the root
    ///
    /// # Example
    ///
    /// ```rust
    /// use ezfs::{Filesystem, MemoryFs};
    /// use std::sync::Arc;
    ///
    /// let fs = MemoryFs::new();
    /// fs.insert_file("/a/b.txt", "").unwrap();
    /// fs.insert_file("/a/c/d.txt", "").unwrap();
    /// let root = Filesystem::new(Arc::new(fs)).root().unwrap();
    ///
    /// let names: Vec<_> = root.glob("a/*", false).unwrap().iter().map(|i| i.name()).collect();
    /// assert_eq!(names, ["b.txt", "c"]);
    /// ```
    pub fn glob(&self, pattern: &str, ignore_case: bool) -> Result<Vec<Item>, FsError> {
        let start = if pattern.starts_with('/') {
            self.root()?
        } else {
            self.clone()
        };
        let segments: Vec<&str> = pattern
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();
        let fold = ignore_case || !self.backend().case_sensitive();
        let mut found = IndexSet::new();
        start.glob_step(&segments, fold, &mut found)?;
        Ok(found.into_iter().collect())
    }

    /// The single item matching a glob expression that names one item.
    ///
    /// The final segment is matched against names only, so `a/b.txt` yields
    /// `b.txt` rather than its whole directory.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if nothing matches
    /// - [`FsError::TooManyFiles`] if more than one item matches
    pub fn glob_one(&self, pattern: &str, ignore_case: bool) -> Result<Item, FsError> {
        let (dirs, last) = match pattern.rsplit_once('/') {
            Some((dirs, last)) => (Some(dirs), last),
            None => (None, pattern),
        };
        let containers: Vec<Directory> = match dirs {
            None => vec![self.clone()],
            Some("") => vec![self.root()?],
            Some(dirs) if has_wildcard(dirs) => self
                .glob(&format!("{dirs}/*"), ignore_case)?
                .into_iter()
                .filter_map(|item| item.parent().ok().flatten())
                .collect::<IndexSet<_>>()
                .into_iter()
                .collect(),
            Some(dirs) => vec![self.get(dirs)?.into_dir()?],
        };
        let fold = ignore_case || !self.backend().case_sensitive();
        let regex = if has_wildcard(last) {
            Some(compile(&glob_to_regex(last), last, fold)?)
        } else {
            None
        };
        let mut found = Vec::new();
        for dir in &containers {
            let children = dir.children()?;
            match &regex {
                Some(regex) => {
                    found.extend(children.into_iter().filter(|c| regex.is_match(&c.name())));
                }
                None => found.extend(match_child(children, last, fold)),
            }
        }
        let url = format!("{}{}", self.url().as_dir(), pattern.trim_start_matches('/'));
        match found.len() {
            0 => Err(FsError::NotFound { url }),
            1 => Ok(found.remove(0)),
            count => Err(FsError::TooManyFiles { url, count }),
        }
    }

    /// Alias for [`glob`](Directory::glob).
    pub fn find(&self, pattern: &str, ignore_case: bool) -> Result<Vec<Item>, FsError> {
        self.glob(pattern, ignore_case)
    }

    fn glob_step(
        &self,
        segments: &[&str],
        fold: bool,
        found: &mut IndexSet<Item>,
    ) -> Result<(), FsError> {
        let Some((&segment, rest)) = segments.split_first() else {
            found.extend(self.children()?);
            return Ok(());
        };

        if segment == ".." {
            let parent = self.parent()?.ok_or_else(|| FsError::PathEscapesRoot {
                url: self.url().to_string(),
            })?;
            return parent.glob_step(rest, fold, found);
        }

        if has_wildcard(segment) {
            let regex = compile(&glob_to_regex(segment), segment, fold)?;
            for child in self.children()? {
                if !regex.is_match(&child.name()) {
                    continue;
                }
                if rest.is_empty() {
                    found.insert(child);
                } else if let Some(dir) = child.as_dir() {
                    dir.glob_step(rest, fold, found)?;
                }
            }
            return Ok(());
        }

        let children = self.children()?;
        let Some(child) = match_child(children.clone(), segment, fold) else {
            return Ok(());
        };
        // A located final name lists its whole container.
        if rest.is_empty() {
            found.extend(children);
            return Ok(());
        }
        match child.as_dir() {
            Some(dir) => dir.glob_step(rest, fold, found),
            None => Ok(()),
        }
    }

    /// Every item below this directory exactly once, breadth-first.
    ///
    /// Identity is the normalized URL, so an item reachable through several
    /// paths (links, aliases) is still returned once, and a directory that
    /// lists one of its ancestors cannot make this loop.
    ///
    /// # Errors
    ///
    /// Any error from listing a directory.
    pub fn get_all(&self) -> Result<Vec<Item>, FsError> {
        let mut tape: IndexSet<Item> = IndexSet::from([self.item().clone()]);
        let mut cursor = 0;
        while let Some(item) = tape.get_index(cursor).cloned() {
            if let Some(dir) = item.as_dir() {
                tape.extend(dir.children()?);
            }
            cursor += 1;
        }
        Ok(tape.into_iter().skip(1).collect())
    }

    /// [`get_all`](Directory::get_all) below `path`; empty when `path` is a
    /// file.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if `path` does not resolve
    pub fn get_all_under(&self, path: Option<&str>) -> Result<Vec<Item>, FsError> {
        match path {
            None => self.get_all(),
            Some(path) => match self.get(path)?.as_dir() {
                Some(dir) => dir.get_all(),
                None => Ok(Vec::new()),
            },
        }
    }
}
