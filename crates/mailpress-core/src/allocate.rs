//! Collision-free path allocation.

use std::path::{Path, PathBuf};

/// Returns a path that does not currently exist, derived from `desired`.
///
/// If `desired` is free it is returned unchanged; otherwise ` (1)`,
/// ` (2)`, … is inserted before the extension (appended to the whole
/// name when there is none) and the first free candidate wins.
/// Existence is re-checked per candidate at call time, so a sequential
/// single-writer caller never collides; concurrent writers to the same
/// directory are outside the supported model.
#[must_use]
pub fn allocate_unique(desired: &Path) -> PathBuf {
    if !desired.exists() {
        return desired.to_path_buf();
    }

    let parent = desired.parent().map_or_else(PathBuf::new, Path::to_path_buf);
    let stem = desired
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = desired
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter: u32 = 1;
    loop {
        let candidate = parent.join(format!("{stem} ({counter}){suffix}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_free_path_returned_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let desired = dir.path().join("report.pdf");
        assert_eq!(allocate_unique(&desired), desired);
    }

    #[test]
    fn test_suffix_inserted_before_extension() {
        let dir = tempfile::tempdir().unwrap();
        let desired = dir.path().join("report.pdf");
        fs::write(&desired, b"x").unwrap();

        assert_eq!(allocate_unique(&desired), dir.path().join("report (1).pdf"));

        fs::write(dir.path().join("report (1).pdf"), b"x").unwrap();
        assert_eq!(allocate_unique(&desired), dir.path().join("report (2).pdf"));
    }

    #[test]
    fn test_no_extension() {
        let dir = tempfile::tempdir().unwrap();
        let desired = dir.path().join("archive");
        fs::create_dir(&desired).unwrap();

        assert_eq!(allocate_unique(&desired), dir.path().join("archive (1)"));
    }

    #[test]
    fn test_many_shared_base_names() {
        let dir = tempfile::tempdir().unwrap();
        let desired = dir.path().join("scan.png");
        for _ in 0..4 {
            let allocated = allocate_unique(&desired);
            fs::write(&allocated, b"x").unwrap();
        }
        assert!(dir.path().join("scan.png").exists());
        assert!(dir.path().join("scan (3).png").exists());
    }
}
