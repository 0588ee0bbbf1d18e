//! Per-locale diff and merge.
//!
//! For every locale file next to the base `values/strings.xml`, the strings
//! the locale lacks are translated and appended just before its closing
//! `</resources>` line. Existing lines are copied through untouched; the
//! file is never re-serialized from the parsed model.

use crate::config::Config;
use crate::discovery::{find_locale_files, DEFAULT_EXTENSION};
use crate::error::ResourceError;
use crate::locale::LocaleFile;
use crate::resource::{parse_resource_file, StringResource};
use crate::translation::Translate;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Closing tag of a resource file; any line containing it is dropped on merge
pub const END_OF_RESOURCES: &str = "</resources>";

const BASE_FILE_NAME: &str = "strings.xml";

/// What happened to one locale file
#[derive(Debug)]
pub enum LocaleOutcome {
    /// Language is in the exclusion list
    Excluded,
    /// File is missing or has no strings; nothing is written
    Empty,
    /// Every translatable base string is already present
    UpToDate,
    Saved { path: PathBuf, added: usize },
    Failed { error: anyhow::Error },
}

#[derive(Debug)]
pub struct LocaleReport {
    pub locale: LocaleFile,
    pub outcome: LocaleOutcome,
}

/// Outcome of a whole run, in processing order
#[derive(Debug, Default)]
pub struct MergeReport {
    pub locales: Vec<LocaleReport>,
}

impl MergeReport {
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, LocaleOutcome::Failed { .. }))
    }

    pub fn saved(&self) -> usize {
        self.count(|o| matches!(o, LocaleOutcome::Saved { .. }))
    }

    pub fn outcome_for(&self, lang: &str) -> Option<&LocaleOutcome> {
        self.locales
            .iter()
            .find(|r| r.locale.lang() == lang)
            .map(|r| &r.outcome)
    }

    fn count(&self, pred: impl Fn(&LocaleOutcome) -> bool) -> usize {
        self.locales.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Fills the gaps of every locale file from the base resources
#[derive(Debug)]
pub struct ResourceMerger<T> {
    translator: T,
    source_language: String,
    exclude_languages: HashSet<String>,
    dry_run: bool,
}

impl<T: Translate> ResourceMerger<T> {
    pub fn new(translator: T, config: &Config) -> Self {
        Self {
            translator,
            source_language: config.source_language.clone(),
            exclude_languages: HashSet::new(),
            dry_run: config.dry_run,
        }
    }

    pub fn with_excluded_languages(mut self, languages: HashSet<String>) -> Self {
        self.exclude_languages = languages;
        self
    }

    /// Merge missing strings into every locale found next to `root_file`.
    ///
    /// Fails only when the base file itself is unusable. Problems with a
    /// single locale are recorded in the report and the run moves on.
    pub async fn run(&self, root_file: &Path) -> Result<MergeReport> {
        let root_file = validate_root_file(root_file)?;
        let resource_root = resource_root(&root_file)?;

        let locale_files = find_locale_files(&resource_root, DEFAULT_EXTENSION);

        // Exclude non-translatable strings
        let translation_set: Vec<StringResource> = parse_resource_file(&root_file)?
            .into_iter()
            .filter(|r| r.translated)
            .collect();
        info!(
            "There are {} strings in root file should be translated: {}",
            translation_set.len(),
            root_file.display()
        );

        let mut report = MergeReport::default();
        for locale in locale_files {
            info!("Started lang: {} ({})", locale.lang(), locale.path().display());

            let outcome = match self.merge_locale(&locale, &translation_set).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    error!("Failed to merge {}: {:#}", locale.path().display(), error);
                    LocaleOutcome::Failed { error }
                }
            };
            report.locales.push(LocaleReport { locale, outcome });
        }

        info!(
            "Merge complete: {} saved, {} failed, {} locale files total",
            report.saved(),
            report.failed(),
            report.locales.len()
        );
        Ok(report)
    }

    async fn merge_locale(
        &self,
        locale: &LocaleFile,
        translation_set: &[StringResource],
    ) -> Result<LocaleOutcome> {
        if self.exclude_languages.contains(locale.lang()) {
            info!("Skipped lang: {}", locale.lang());
            return Ok(LocaleOutcome::Excluded);
        }

        let existing = parse_resource_file(locale.path())?;
        if existing.is_empty() {
            info!(
                "No strings in {}, not creating translations from scratch",
                locale.path().display()
            );
            return Ok(LocaleOutcome::Empty);
        }

        let missing = missing_resources(translation_set, &existing);
        if missing.is_empty() {
            info!("{} is up to date", locale.path().display());
            return Ok(LocaleOutcome::UpToDate);
        }
        info!(
            "There are {} strings in target file should be translated: {}",
            missing.len(),
            locale.path().display()
        );

        let mut translated = Vec::with_capacity(missing.len());
        for resource in missing {
            let content = self
                .translator
                .translate(&resource.content, &self.source_language, locale.lang())
                .await
                .with_context(|| {
                    format!("Failed to translate {} to {}", resource.id, locale.lang())
                })?;
            translated.push(StringResource::new(resource.id.clone(), content, true));
        }

        let path = self.save(locale, &translated)?;
        Ok(LocaleOutcome::Saved {
            path,
            added: translated.len(),
        })
    }

    fn save(&self, locale: &LocaleFile, entries: &[StringResource]) -> Result<PathBuf> {
        let existing = fs::read_to_string(locale.path())
            .with_context(|| format!("Failed to read {}", locale.path().display()))?;

        let output = splice_lines(&existing, entries);
        for entry in entries {
            debug!("{}", format_entry(entry).trim_end());
        }

        let output_path = if self.dry_run {
            backup_path(locale.path())
        } else {
            locale.path().to_path_buf()
        };
        fs::write(&output_path, output)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;

        info!("Saved to {}", output_path.display());
        Ok(output_path)
    }
}

fn validate_root_file(root_file: &Path) -> Result<PathBuf, ResourceError> {
    let invalid = || ResourceError::InvalidRoot(root_file.to_path_buf());

    if !root_file.is_file() || root_file.file_name().is_none_or(|n| n != BASE_FILE_NAME) {
        return Err(invalid());
    }
    std::path::absolute(root_file).map_err(|_| invalid())
}

/// `res/values/strings.xml` -> `res`
fn resource_root(root_file: &Path) -> Result<PathBuf, ResourceError> {
    root_file
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .ok_or_else(|| ResourceError::InvalidRoot(root_file.to_path_buf()))
}

/// Entries of `translation_set` whose id is absent from `existing`, in base order
pub fn missing_resources<'a>(
    translation_set: &'a [StringResource],
    existing: &[StringResource],
) -> Vec<&'a StringResource> {
    let existing_ids: HashSet<&str> = existing.iter().map(|r| r.id.as_str()).collect();
    translation_set
        .iter()
        .filter(|r| !existing_ids.contains(r.id.as_str()))
        .collect()
}

pub fn format_entry(resource: &StringResource) -> String {
    format!(
        "    <string name=\"{}\">{}</string>\n",
        resource.id, resource.content
    )
}

/// Copy every line of `existing` except those holding `</resources>`, then
/// append one line per entry and a single closing tag.
pub fn splice_lines(existing: &str, entries: &[StringResource]) -> String {
    let mut output = String::with_capacity(existing.len() + entries.len() * 64);

    for line in existing.split_inclusive('\n') {
        if line.contains(END_OF_RESOURCES) {
            continue;
        }
        output.push_str(line);
    }
    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }

    for entry in entries {
        output.push_str(&format_entry(entry));
    }
    output.push_str(END_OF_RESOURCES);
    output.push('\n');
    output
}

/// `strings.xml` -> `strings.xml.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Parse a comma-separated language list such as `af,ca`
pub fn parse_language_list(list: &str) -> HashSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
