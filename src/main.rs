use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use strings_backfill::config::Config;
use strings_backfill::merge::{parse_language_list, ResourceMerger};
use strings_backfill::translation::MyMemoryTranslator;
use tracing::{info, warn};

/// Translate the strings missing from every values-<locale>/strings.xml
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// List of languages to skip. For example, --exclude_languages=af,ca
    #[arg(short = 'e', long = "exclude_languages", default_value = "")]
    exclude_languages: String,

    /// Root/base resource path (values/strings.xml)
    #[arg(short = 'i', long = "root_file")]
    root_file: Option<PathBuf>,

    /// Overwrite locale files and call the translation API instead of dry-running
    #[arg(long)]
    write: bool,
}

/// `<exe dir>/../app/src/main/res/values/strings.xml`
fn default_root_file() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let exe_dir = exe.parent().map(PathBuf::from).unwrap_or_default();
    Ok(exe_dir
        .join("..")
        .join("app")
        .join("src")
        .join("main")
        .join("res")
        .join("values")
        .join("strings.xml"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("strings_backfill=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if cli.write {
        config.dry_run = false;
    }
    if config.dry_run {
        warn!("Dry run: results go to <file>.bak and no translation API calls are made (use --write)");
    }

    let root_file = match cli.root_file {
        Some(path) => path,
        None => default_root_file()?,
    };
    let exclude_languages = parse_language_list(&cli.exclude_languages);

    info!("Merging missing strings from {}", root_file.display());

    let translator = MyMemoryTranslator::new(&config)?;
    let report = ResourceMerger::new(translator, &config)
        .with_excluded_languages(exclude_languages)
        .run(&root_file)
        .await?;

    if report.failed() > 0 {
        anyhow::bail!("{} locale file(s) could not be merged", report.failed());
    }

    info!("Done: {} locale file(s) updated", report.saved());
    Ok(())
}
