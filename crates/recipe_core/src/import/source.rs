use crate::import::ImportError;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;

const BUNDLED_CATEGORIES: &str = include_str!("../../seed/recipetypes.json");
const BUNDLED_SAMPLE_RECIPES: &str = include_str!("../../seed/sampleRecipes.json");

/// Which bundled document a `SeedSource::Bundled` resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedDocument {
    Categories,
    SampleRecipes,
}

impl SeedDocument {
    fn bundled_text(self) -> &'static str {
        match self {
            Self::Categories => BUNDLED_CATEGORIES,
            Self::SampleRecipes => BUNDLED_SAMPLE_RECIPES,
        }
    }
}

/// Where a seed document is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    /// Document compiled into the crate.
    Bundled,
    /// Document on disk.
    File(PathBuf),
    /// Document already in memory.
    Text(String),
}

impl SeedSource {
    pub(crate) fn read(&self, document: SeedDocument) -> Result<String, ImportError> {
        match self {
            Self::Bundled => Ok(document.bundled_text().to_string()),
            Self::Text(text) => Ok(text.clone()),
            Self::File(path) => fs::read_to_string(path).map_err(|err| {
                if err.kind() == IoErrorKind::NotFound {
                    ImportError::SourceMissing(path.display().to_string())
                } else {
                    ImportError::Unreadable {
                        source_name: path.display().to_string(),
                        source: err,
                    }
                }
            }),
        }
    }

    /// Short label for diagnostics.
    pub fn label(&self) -> String {
        match self {
            Self::Bundled => "bundled".to_string(),
            Self::File(path) => path.display().to_string(),
            Self::Text(_) => "inline".to_string(),
        }
    }
}
