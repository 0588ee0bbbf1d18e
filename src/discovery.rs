use crate::locale::LocaleFile;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extension of Android resource files
pub const DEFAULT_EXTENSION: &str = "xml";

/// Name of the directory holding the base (untranslated) resources
const BASE_DIR_NAME: &str = "values";

/// Find every locale-specific resource file under `root`.
///
/// Files directly inside `values/` are the base resources and are skipped.
/// Files that are not inside a `values-<tag>` directory (layouts, drawables)
/// carry no locale and are skipped as well. Order follows the filesystem walk.
pub fn find_locale_files(root: &Path, extension: &str) -> Vec<LocaleFile> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().unwrap_or_default() == extension)
        .filter(|entry| !is_base_file(entry.path()))
        .filter_map(|entry| match LocaleFile::from_path(entry.into_path()) {
            Ok(file) => Some(file),
            Err(e) => {
                debug!("Skipping non-locale resource: {}", e);
                None
            }
        })
        .collect()
}

fn is_base_file(path: &Path) -> bool {
    path.parent()
        .and_then(Path::file_name)
        .is_some_and(|name| name == BASE_DIR_NAME)
}
