use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;

use px2remvw_bundler::assets::AssetMap;
use px2remvw_bundler::pipeline::{load_assets, write_assets};
use px2remvw_bundler::{BuildPipeline, BundlerConfig, Stylesheet};

/// Rewrite px lengths to rem/vw and publish hashed interactive HTML.
#[derive(Debug, Parser)]
#[command(name = "px2remvw", version, about)]
struct Cli {
    /// Configuration file; defaults to `px2remvw.config.json` in the current directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert px lengths in stylesheet files.
    Rewrite {
        /// Stylesheets to convert.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Write converted files into this directory instead of in place. Relative inputs
        /// keep their directory layout below it.
        #[arg(long, conflicts_with = "stdout")]
        out_dir: Option<PathBuf>,
        /// Print converted stylesheets instead of writing files.
        #[arg(long)]
        stdout: bool,
    },
    /// Hash the interactive HTML in a build output directory and rewrite its manifests.
    Emit {
        /// Build output directory.
        dist: PathBuf,
    },
    /// Convert every stylesheet in a build output directory, then run the emit phase.
    Build {
        /// Build output directory.
        dist: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => BundlerConfig::from_path(path)?,
        None => BundlerConfig::discover(&env::current_dir()?)?,
    };

    match cli.command {
        Command::Rewrite {
            files,
            out_dir,
            stdout,
        } => rewrite_files(&config, &files, out_dir.as_deref(), stdout),
        Command::Emit { dist } => emit(&config, &dist),
        Command::Build { dist } => {
            let report = BuildPipeline::from_config(&config)?.run(&dist)?;
            for path in &report.written {
                info!("wrote {path}");
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn rewrite_files(
    config: &BundlerConfig,
    files: &[PathBuf],
    out_dir: Option<&Path>,
    stdout: bool,
) -> Result<()> {
    let rewriter = config.unit_rewriter()?;
    let destinations = match out_dir {
        Some(dir) if !stdout => output_paths(dir, files)?,
        _ => files.to_vec(),
    };
    let mut out = io::stdout().lock();

    for (file, destination) in files.iter().zip(&destinations) {
        let source =
            fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
        let mut sheet = Stylesheet::parse(source, Some(file.clone()));
        let summary = rewriter.rewrite(&mut sheet);
        info!(
            "{}: {} declaration(s) rewritten, {} inserted",
            file.display(),
            summary.rewritten,
            summary.inserted
        );

        if stdout {
            out.write_all(sheet.to_css().as_bytes())?;
            continue;
        }

        if let Some(parent) = destination.parent().filter(|_| out_dir.is_some()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(destination, sheet.to_css())
            .with_context(|| format!("failed to write {}", destination.display()))?;
    }

    Ok(())
}

/// Map every input onto a distinct path below `dir`.
///
/// Relative inputs without `..` keep their layout; anything else lands under its file
/// name, and two inputs claiming the same destination are rejected before any write.
fn output_paths(dir: &Path, files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
    let mut destinations = Vec::with_capacity(files.len());

    for file in files {
        let keeps_layout = file.is_relative()
            && file
                .components()
                .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        let destination = if keeps_layout {
            dir.join(file)
        } else {
            match file.file_name() {
                Some(name) => dir.join(name),
                None => bail!("{} does not name a file", file.display()),
            }
        };

        if let Some(previous) = claimed.insert(destination.clone(), file.as_path()) {
            bail!(
                "{} and {} would both be written to {}",
                previous.display(),
                file.display(),
                destination.display()
            );
        }
        destinations.push(destination);
    }

    Ok(destinations)
}

fn emit(config: &BundlerConfig, dist: &Path) -> Result<()> {
    let emitter = config.html_hash_emitter()?;
    let original = load_assets(dist)?;
    let mut assets: AssetMap = original.clone();
    let digest = emitter.apply(&mut assets)?;

    let written = write_assets(dist, &assets, &original)?;
    info!("digest {digest}, wrote {} asset(s)", written.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_inputs_keep_their_layout() {
        let files = vec![PathBuf::from("a/app.css"), PathBuf::from("./b/app.css")];
        let destinations = output_paths(Path::new("out"), &files).unwrap();
        assert_eq!(
            destinations,
            vec![PathBuf::from("out/a/app.css"), PathBuf::from("out/./b/app.css")]
        );
    }

    #[test]
    fn colliding_inputs_are_rejected_before_writing() -> Result<()> {
        let src = tempfile::tempdir()?;
        let out = tempfile::tempdir()?;
        let first = src.path().join("a/app.css");
        let second = src.path().join("b/app.css");
        for file in [&first, &second] {
            fs::create_dir_all(file.parent().unwrap())?;
            fs::write(file, ".a { width: 75px; }")?;
        }

        let err = rewrite_files(
            &BundlerConfig::default(),
            &[first, second],
            Some(out.path()),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("would both be written to"));
        assert!(!out.path().join("app.css").exists());
        Ok(())
    }

    #[test]
    fn writes_each_input_below_out_dir() -> Result<()> {
        let src = tempfile::tempdir()?;
        let out = tempfile::tempdir()?;
        let file = src.path().join("app.css");
        fs::write(&file, ".a { width: 75px; }")?;

        rewrite_files(&BundlerConfig::default(), &[file.clone()], Some(out.path()), false)?;
        assert_eq!(
            fs::read_to_string(out.path().join("app.css"))?,
            ".a { width: 0.75rem; width: 10vw; }"
        );
        assert_eq!(fs::read_to_string(file)?, ".a { width: 75px; }");
        Ok(())
    }
}
