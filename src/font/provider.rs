use std::collections::HashMap;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::RwLock;
use thiserror::Error;

/// Errors a [FontProvider] can report while fetching font data
#[derive(Error, Debug)]
pub enum FontError {
    #[error("unknown font `{0}`")]
    Unknown(String),

    #[error("failed to read font `{name}`: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("font `{0}` could not be parsed")]
    Parse(String),

    #[error("loading font `{name}` would exceed the font memory threshold ({needed} bytes)")]
    MemoryExhausted { name: String, needed: usize },
}

/// Supplies raw font programs by name. Providers answer with [FontError::Unknown]
/// when they have nothing under that name.
pub trait FontProvider: Send + Sync + Debug {
    fn load(&self, name: &str) -> Result<Vec<u8>, FontError>;
}

/// Loads `<dir>/<name>.ttf` or `<dir>/<name>.otf`
#[derive(Debug, Clone)]
pub struct DirectoryFontProvider {
    dir: PathBuf,
}

impl DirectoryFontProvider {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

impl FontProvider for DirectoryFontProvider {
    fn load(&self, name: &str) -> Result<Vec<u8>, FontError> {
        // names are flat identifiers, never paths
        if name.contains(['/', '\\']) || name.contains("..") {
            return Err(FontError::Unknown(name.to_string()));
        }

        for extension in ["ttf", "otf"] {
            let path = self.dir.join(format!("{name}.{extension}"));
            if path.is_file() {
                log::debug!("loading font `{name}` from {}", path.display());
                return std::fs::read(&path).map_err(|source| FontError::Io {
                    name: name.to_string(),
                    source,
                });
            }
        }
        Err(FontError::Unknown(name.to_string()))
    }
}

/// Serves fonts registered up front, mostly for embedding applications and tests
#[derive(Debug, Default)]
pub struct InMemoryFontProvider {
    fonts: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryFontProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<S: Into<String>>(&self, name: S, data: Vec<u8>) {
        if let Ok(mut fonts) = self.fonts.write() {
            fonts.insert(name.into(), data);
        }
    }
}

impl FontProvider for InMemoryFontProvider {
    fn load(&self, name: &str) -> Result<Vec<u8>, FontError> {
        self.fonts
            .read()
            .ok()
            .and_then(|fonts| fonts.get(name).cloned())
            .ok_or_else(|| FontError::Unknown(name.to_string()))
    }
}
