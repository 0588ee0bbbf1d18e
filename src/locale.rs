//! Locale descriptors for per-language resource files.

use crate::error::ResourceError;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static LOCALE_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"values-([a-zA-Z-]*)").expect("locale pattern is valid"));

/// A resource file that belongs to one locale, e.g. `res/values-zh-rTW/strings.xml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleFile {
    path: PathBuf,
    /// Full qualifier after `values-` (e.g. "zh-rTW")
    locale: String,
    /// Leading token of the qualifier (e.g. "zh")
    lang: String,
}

impl LocaleFile {
    /// Build a descriptor from a path inside a `values-<tag>` directory.
    ///
    /// Only the containing directory name is matched. Ancestors named
    /// `values-*` do not give a locale to files below them.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ResourceError> {
        let path = path.into();

        let dir_name = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let locale = LOCALE_DIR
            .captures(&dir_name)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ResourceError::InvalidPath(path.clone()))?;

        let lang = locale.split('-').next().unwrap_or_default().to_string();

        Ok(Self { path, locale, lang })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }
}

impl fmt::Display for LocaleFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "path: {}, lang: {}", self.path.display(), self.lang)
    }
}
