use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const REDIRECT_FILE_NAME: &str = ".babytrack_redirect";
const DEFAULT_DIRECTORY_NAME: &str = "Baby Tracker";

/// CsvConnection owns the data directory and knows where every file lives
#[derive(Clone, Debug)]
pub struct CsvConnection {
    base_directory: PathBuf,
}

impl CsvConnection {
    /// Create a new connection rooted at `base_directory`, creating it if needed
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("Created data directory: {}", base_path.display());
        }

        Ok(Self { base_directory: base_path })
    }

    /// Create a connection in the default data directory.
    /// This uses ~/Documents/Baby Tracker, but checks for a redirect file first.
    pub fn new_default() -> Result<Self> {
        Self::new(Self::default_data_directory()?)
    }

    /// Resolve ~/Documents/Baby Tracker, following a redirect file if one exists
    pub fn default_data_directory() -> Result<PathBuf> {
        let documents_dir = dirs::document_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;

        let default_data_dir = documents_dir.join(DEFAULT_DIRECTORY_NAME);
        Ok(Self::follow_redirect(default_data_dir))
    }

    /// If `directory` holds a redirect file pointing at an existing
    /// directory, return that directory instead
    pub fn follow_redirect(directory: PathBuf) -> PathBuf {
        let redirect_file = directory.join(REDIRECT_FILE_NAME);
        if !redirect_file.exists() {
            debug!("No redirect file found, using data directory: {}", directory.display());
            return directory;
        }

        match fs::read_to_string(&redirect_file) {
            Ok(redirected_path) => {
                let redirected_path = redirected_path.trim();
                let path = PathBuf::from(redirected_path);
                if path.exists() {
                    info!("Found redirect file, using data directory: {}", path.display());
                    path
                } else {
                    warn!(
                        "Redirect file points to non-existent directory: {}. Using default.",
                        redirected_path
                    );
                    directory
                }
            }
            Err(e) => {
                error!("Failed to read redirect file: {}. Using default directory.", e);
                directory
            }
        }
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Directory holding everything stored for one baby
    pub fn get_baby_directory(&self, baby_id: &str) -> PathBuf {
        self.base_directory.join("babies").join(baby_id)
    }

    pub fn babies_directory(&self) -> PathBuf {
        self.base_directory.join("babies")
    }

    pub fn media_directory(&self) -> PathBuf {
        self.base_directory.join("Media")
    }

    /// Write `contents` to `path` through a temp file and rename
    pub fn write_atomic(&self, path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, contents)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Read a YAML document, `None` when the file does not exist
    pub fn read_yaml<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let yaml_content = fs::read_to_string(path)?;
        let value = serde_yaml::from_str(&yaml_content)?;
        Ok(Some(value))
    }

    pub fn write_yaml<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let yaml_content = serde_yaml::to_string(value)?;
        self.write_atomic(path, yaml_content)?;
        debug!("Saved {}", path.display());
        Ok(())
    }
}
