use crate::domain::ports::Storage;
use crate::utils::error::{Result, WriteError};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);
        fs::write(&full_path, data).map_err(|e| WriteError::from_io(&full_path, e))?;
        Ok(())
    }

    fn describe(&self, path: &str) -> String {
        self.resolve(path).display().to_string()
    }
}
