// src/pipeline/freshness.rs

use std::path::Path;

use crate::fs::FileSystem;

/// A destination is fresh when it exists and is not older than its source.
///
/// Any metadata error counts as stale, so the file is rebuilt.
pub fn is_fresh(fs: &dyn FileSystem, src: &Path, dest: &Path) -> bool {
    if !fs.is_file(dest) {
        return false;
    }
    match (fs.modified(src), fs.modified(dest)) {
        (Ok(src_time), Ok(dest_time)) => dest_time >= src_time,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn newer_or_equal_destination_is_fresh() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/a.png", "a");
        assert!(!is_fresh(&fs, Path::new("./src/a.png"), Path::new("./dist/a.png")));

        fs.add_file("./dist/a.png", "a");
        assert!(is_fresh(&fs, Path::new("./src/a.png"), Path::new("./dist/a.png")));

        fs.touch("./src/a.png");
        assert!(!is_fresh(&fs, Path::new("./src/a.png"), Path::new("./dist/a.png")));
    }
}
