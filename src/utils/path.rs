//! Work arenas and output naming

use std::path::{Path, PathBuf};

use chrono::Local;
use tempfile::TempDir;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::errors::DomainError;

/// Prefix of arena directories created inside an output directory
pub const ARENA_PREFIX: &str = ".reelforge-work-";

/// Per-run scratch directory removed when dropped
#[derive(Debug)]
pub struct WorkArena {
    dir: TempDir,
    next_index: usize,
}

impl WorkArena {
    /// Create a uniquely named arena under `parent`, creating `parent` if needed
    pub fn create_in(parent: &Path) -> Result<Self, DomainError> {
        std::fs::create_dir_all(parent).map_err(|e| {
            DomainError::FsFail(format!("Cannot create {}: {}", parent.display(), e))
        })?;
        let dir = tempfile::Builder::new()
            .prefix(ARENA_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| {
                DomainError::FsFail(format!(
                    "Cannot create work arena in {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        debug!(arena = %dir.path().display(), "Created work arena");
        Ok(Self { dir, next_index: 0 })
    }

    /// [`WorkArena::create_in`] on the blocking pool
    pub async fn create(parent: PathBuf) -> Result<Self, DomainError> {
        tokio::task::spawn_blocking(move || Self::create_in(&parent))
            .await
            .map_err(|e| DomainError::InternalError(format!("work arena task failed: {}", e)))?
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Fresh file path for a stage, numbered in creation order
    pub fn stage_path(&mut self, label: &str, extension: &str) -> PathBuf {
        self.next_index += 1;
        self.dir
            .path()
            .join(format!("{:02}-{}.{}", self.next_index, label, extension))
    }

    /// Files currently held by the arena
    pub fn file_count(&self) -> usize {
        count_files(self.dir.path())
    }

    /// Remove the arena now, reporting failures instead of ignoring them
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        let files = self.file_count();
        match self.dir.close() {
            Ok(()) => debug!(arena = %path.display(), files, "Removed work arena"),
            Err(e) => warn!(arena = %path.display(), "Failed to remove work arena: {}", e),
        }
    }
}

/// Regular files below `root`
pub fn count_files(root: &Path) -> usize {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .count()
}

/// Timestamp embedded in output names
pub fn output_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S_%3f").to_string()
}

fn stem_of(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "output".to_string())
}

/// `<dir>/<stem>_final_<timestamp>.<ext>`
pub fn final_output_path(dir: &Path, input: &Path, extension: &str, timestamp: &str) -> PathBuf {
    dir.join(format!("{}_final_{}.{}", stem_of(input), timestamp, extension))
}

/// `<dir>/<stem>_thumb_<timestamp>.jpg`
pub fn thumbnail_output_path(dir: &Path, input: &Path, timestamp: &str) -> PathBuf {
    dir.join(format!("{}_thumb_{}.jpg", stem_of(input), timestamp))
}

/// Lowercase extension of `path`, `mp4` when it has none
pub fn extension_or_mp4(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "mp4".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_is_removed_on_drop() {
        let parent = TempDir::new().unwrap();
        let arena_path;
        {
            let mut arena = WorkArena::create_in(parent.path()).unwrap();
            arena_path = arena.path().to_path_buf();
            std::fs::write(arena.stage_path("effects", "mp4"), b"x").unwrap();
            assert_eq!(arena.file_count(), 1);
        }
        assert!(!arena_path.exists());
        assert_eq!(count_files(parent.path()), 0);
    }

    #[test]
    fn test_arena_close_removes_directory() {
        let parent = TempDir::new().unwrap();
        let arena = WorkArena::create_in(&parent.path().join("nested/out")).unwrap();
        let path = arena.path().to_path_buf();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(ARENA_PREFIX));
        arena.close();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_async_create_builds_missing_parent() {
        let parent = TempDir::new().unwrap();
        let nested = parent.path().join("a/b");
        let arena = WorkArena::create(nested.clone()).await.unwrap();
        assert!(arena.path().starts_with(&nested));
        arena.close();
        assert_eq!(std::fs::read_dir(&nested).unwrap().count(), 0);
    }

    #[test]
    fn test_stage_paths_are_unique_and_ordered() {
        let parent = TempDir::new().unwrap();
        let mut arena = WorkArena::create_in(parent.path()).unwrap();
        let first = arena.stage_path("trim", "mp4");
        let second = arena.stage_path("trim", "mp4");
        assert_ne!(first, second);
        assert!(first.ends_with("01-trim.mp4"));
        assert!(second.ends_with("02-trim.mp4"));
    }

    #[test]
    fn test_output_names() {
        let dir = Path::new("/out");
        let input = Path::new("/videos/clip.MOV");
        assert_eq!(
            final_output_path(dir, input, &extension_or_mp4(input), "20240101_000000_000"),
            PathBuf::from("/out/clip_final_20240101_000000_000.mov")
        );
        assert_eq!(
            thumbnail_output_path(dir, input, "ts"),
            PathBuf::from("/out/clip_thumb_ts.jpg")
        );
        assert_eq!(extension_or_mp4(Path::new("noext")), "mp4");
    }
}
