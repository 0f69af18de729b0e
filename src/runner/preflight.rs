//! Pre-flight reachability check for the network paths a plan depends on.

use std::collections::HashSet;
use std::path::Path;

/// Answers whether a path is reachable.
pub trait PathProbe {
    fn exists(&self, path: &str) -> bool;
}

/// [`PathProbe`] backed by the filesystem (UNC paths included).
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl PathProbe for FsProbe {
    fn exists(&self, path: &str) -> bool {
        std::fs::metadata(Path::new(path)).is_ok()
    }
}

/// Paths that failed the check, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreflightResult {
    pub failed_paths: Vec<String>,
}

impl PreflightResult {
    pub fn passed(&self) -> bool {
        self.failed_paths.is_empty()
    }
}

/// Check every path; no early stop. Repeated paths are probed once.
pub fn check<S: AsRef<str>>(paths: &[S], probe: &dyn PathProbe) -> PreflightResult {
    let mut seen = HashSet::new();
    let failed_paths = paths
        .iter()
        .map(AsRef::as_ref)
        .filter(|path| seen.insert(*path))
        .filter(|path| !probe.exists(path))
        .map(str::to_string)
        .collect();

    PreflightResult { failed_paths }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    struct ListProbe {
        present: Vec<&'static str>,
        probed: RefCell<Vec<String>>,
    }

    impl PathProbe for ListProbe {
        fn exists(&self, path: &str) -> bool {
            self.probed.borrow_mut().push(path.to_string());
            self.present.contains(&path)
        }
    }

    fn probe(present: Vec<&'static str>) -> ListProbe {
        ListProbe {
            present,
            probed: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn empty_input_passes() {
        let result = check::<&str>(&[], &FsProbe);
        assert!(result.passed());
    }

    #[test]
    fn failed_paths_keep_input_order_and_probe_everything() {
        let probe = probe(vec![r"\\srv\b"]);
        let result = check(&[r"\\srv\c", r"\\srv\b", r"\\srv\a"], &probe);

        assert_eq!(result.failed_paths, vec![r"\\srv\c", r"\\srv\a"]);
        assert_eq!(probe.probed.borrow().len(), 3);
    }

    #[test]
    fn duplicates_are_probed_once() {
        let probe = probe(vec![]);
        let result = check(&["x", "y", "x"], &probe);

        assert_eq!(result.failed_paths, vec!["x", "y"]);
        assert_eq!(*probe.probed.borrow(), vec!["x", "y"]);
    }

    #[test]
    fn fs_probe_sees_real_directories() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().to_string_lossy().to_string();
        let missing = temp.path().join("missing").to_string_lossy().to_string();

        let result = check(&[present, missing.clone()], &FsProbe);

        assert_eq!(result.failed_paths, vec![missing]);
    }
}
