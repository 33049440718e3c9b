//! In-memory mock filesystem for testing collectors without real `/proc`.

use crate::collector::traits::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files.insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Adds `/proc/[pid]/cmdline` built from `args` (NUL-separated, NUL-terminated).
    pub fn add_cmdline(&mut self, pid: u32, args: &[&str]) {
        let mut content = String::new();
        for arg in args {
            content.push_str(arg);
            content.push('\0');
        }
        self.add_file(format!("/proc/{}/cmdline", pid), content);
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_add_file() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/431/cmdline", "memcached\0");

        let content = fs.read_to_string(Path::new("/proc/431/cmdline")).unwrap();
        assert_eq!(content, "memcached\0");
    }

    #[test]
    fn test_mock_fs_add_cmdline() {
        let mut fs = MockFs::new();
        fs.add_cmdline(7, &["/usr/bin/memcached", "-c", "64"]);

        let content = fs.read_to_string(Path::new("/proc/7/cmdline")).unwrap();
        assert_eq!(content, "/usr/bin/memcached\0-c\064\0");
    }

    #[test]
    fn test_mock_fs_not_found() {
        let fs = MockFs::new();
        let result = fs.read_to_string(Path::new("/nonexistent"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
