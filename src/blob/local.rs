use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use super::{BlobError, BlobSource};

/// Files rooted at a configured directory on the local filesystem.
pub struct LocalBlobSource {
    root: PathBuf,
}

impl LocalBlobSource {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl BlobSource for LocalBlobSource {
    fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    fn open(&self, name: &str) -> Result<Box<dyn Read + Send>, BlobError> {
        let path = self.path_for(name);
        match File::open(&path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(BlobError::Transport(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn opens_existing_file_and_reports_missing() {
        let dir = std::env::temp_dir().join(format!("gtfs-blob-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::File::create(dir.join("stops.txt"))
            .unwrap()
            .write_all(b"stop_id\n1\n")
            .unwrap();

        let source = LocalBlobSource::new(dir.clone());
        assert!(source.exists("stops.txt"));
        assert!(!source.exists("missing.txt"));

        let mut buf = String::new();
        source
            .open("stops.txt")
            .unwrap()
            .read_to_string(&mut buf)
            .unwrap();
        assert_eq!(buf, "stop_id\n1\n");

        assert!(matches!(source.open("missing.txt"), Err(BlobError::NotFound(_))));

        std::fs::remove_dir_all(&dir).ok();
    }
}
