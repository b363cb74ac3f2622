//! Import of tracked data from archive files

mod workflow;

use std::path::{Path, PathBuf};
use tracing::debug;

pub(crate) use workflow::ImportWorkflow;

/// Archive files waiting in `import_dir`, sorted by name
pub(crate) fn pending_imports(import_dir: &Path) -> Vec<PathBuf> {
    let Some(dir) = import_dir.to_str() else {
        return Vec::new();
    };
    // the directory is literal; only the file name is a pattern
    let pattern = Path::new(&glob::Pattern::escape(dir)).join("*.json");
    let Some(pattern) = pattern.to_str() else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = match glob::glob(pattern) {
        Ok(paths) => paths.filter_map(Result::ok).filter(|p| p.is_file()).collect(),
        Err(e) => {
            debug!(event = "dashboard.import.bad_pattern", error = %e);
            Vec::new()
        }
    };
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn lists_only_json_files_sorted() {
        let dir = tempdir().unwrap();
        for name in ["b.json", "a.json", "notes.txt"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let names: Vec<_> = pending_imports(dir.path())
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn directory_with_glob_characters_is_literal() {
        let root = tempdir().unwrap();
        let dir = root.path().join("data [old]*");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("a.json"), "{}").unwrap();
        // would match `data [old]*` as a pattern if left unescaped
        let decoy = root.path().join("data o");
        fs::create_dir(&decoy).unwrap();
        fs::write(decoy.join("b.json"), "{}").unwrap();

        assert_eq!(pending_imports(&dir), vec![dir.join("a.json")]);
    }

    #[test]
    fn missing_directory_has_nothing_pending() {
        let dir = tempdir().unwrap();
        assert!(pending_imports(&dir.path().join("absent")).is_empty());
    }
}
