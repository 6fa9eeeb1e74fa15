use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::ConvertConfig;

/// A directory that directly holds candidate files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseDir {
    /// Directory basename, the id the case gets unless it is already taken
    pub name: String,
    pub dir: PathBuf,
}

/// Ids of the cases accepted so far in a run.
///
/// A candidate id is `name`, then `name_2`, `name_3`, ... until one is free.
/// Only accepted cases take an id, so a rejected directory never pushes a
/// later one onto a suffix.
#[derive(Debug, Default)]
pub struct CaseIds {
    taken: HashSet<String>,
}

impl CaseIds {
    pub fn next_free(&self, base: &str) -> String {
        let mut id = base.to_string();
        let mut suffix = 2;
        while self.taken.contains(&id) {
            id = format!("{base}_{suffix}");
            suffix += 1;
        }
        id
    }

    pub fn accept(&mut self, id: &str) {
        self.taken.insert(id.to_string());
    }
}

fn walk(root: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
}

/// Number of candidate files anywhere under `root`.
pub fn count_candidates(root: &Path, config: &ConvertConfig) -> usize {
    walk(root)
        .filter(|entry| !entry.file_type().is_dir() && config.is_candidate(entry.path()))
        .count()
}

/// Whether `dir` directly contains a candidate file.
pub fn has_candidates(dir: &Path, config: &ConvertConfig) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .any(|path| !path.is_dir() && config.is_candidate(&path))
        })
        .unwrap_or(false)
}

/// Split the tree under `root` into case directories, in depth-first discovery order.
///
/// The root is a case of its own when it directly holds candidate files; it is
/// named after its basename, or `root_case_name` when it has none.
pub fn partition_cases(root: &Path, config: &ConvertConfig) -> Vec<CaseDir> {
    walk(root)
        .filter(|entry| entry.file_type().is_dir())
        .filter(|entry| has_candidates(entry.path(), config))
        .map(|entry| {
            let name = if entry.depth() == 0 {
                root.file_name()
                    .and_then(|name| name.to_str())
                    .filter(|name| !name.is_empty())
                    .unwrap_or(config.root_case_name.as_str())
                    .to_string()
            } else {
                entry.file_name().to_string_lossy().into_owned()
            };
            CaseDir {
                name,
                dir: entry.into_path(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn ids_are_deduplicated_against_accepted_ones() {
        let mut ids = CaseIds::default();
        assert_eq!(ids.next_free("P1"), "P1");
        ids.accept("P1");
        assert_eq!(ids.next_free("P1"), "P1_2");
        assert_eq!(ids.next_free("P1"), "P1_2");
        ids.accept("P1_2");
        assert_eq!(ids.next_free("P2"), "P2");
        assert_eq!(ids.next_free("P1"), "P1_3");
        assert_eq!(ids.next_free("P1_2"), "P1_2_2");
    }

    #[test]
    fn counts_candidates_recursively() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        fs::write(tmp.path().join("a/one.dcm"), b"x").unwrap();
        fs::write(tmp.path().join("a/b/two.DCM"), b"x").unwrap();
        fs::write(tmp.path().join("a/b/notes.txt"), b"x").unwrap();

        let config = ConvertConfig::default();
        assert_eq!(count_candidates(tmp.path(), &config), 2);
        assert!(!has_candidates(tmp.path(), &config));
        assert!(has_candidates(&tmp.path().join("a/b"), &config));
    }

    #[test]
    fn root_with_files_becomes_first_case() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("Study");
        fs::create_dir_all(root.join("Study")).unwrap();
        fs::write(root.join("ct.dcm"), b"x").unwrap();
        fs::write(root.join("Study/ct.dcm"), b"x").unwrap();

        let cases = partition_cases(&root, &ConvertConfig::default());
        let names: Vec<_> = cases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Study", "Study"]);
        assert_eq!(cases[0].dir, root);
    }

    #[test]
    fn missing_root_has_no_candidates() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("does-not-exist");
        let config = ConvertConfig::default();
        assert_eq!(count_candidates(&root, &config), 0);
        assert!(partition_cases(&root, &config).is_empty());
    }
}
