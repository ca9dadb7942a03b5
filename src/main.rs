//! pdf-compose CLI - renders one page specification to PDF

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use pdf_compose::{Engine, EngineConfig, Error, GenerationRequest, OfflineFetcher};

#[derive(Parser)]
#[command(name = "pdf-compose")]
#[command(version)]
#[command(about = "Render a JSON page specification to PDF", long_about = None)]
struct Cli {
    /// Page specification (JSON)
    #[arg(value_name = "SPEC")]
    spec: PathBuf,

    /// Output file ending in `.pdf` (added when missing); defaults to
    /// `<output_dir>/<spec name>.pdf`
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Engine configuration (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Never fetch remote bindings or images
    #[arg(long)]
    offline: bool,
}

fn run(cli: Cli) -> Result<PathBuf, Error> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    let (dir, name) = output_target(&cli.spec, cli.output.as_deref())?;
    if let Some(dir) = dir {
        config.output_dir = dir;
    }

    let request = GenerationRequest::from_json_str(&std::fs::read_to_string(&cli.spec)?)?;
    let engine = if cli.offline {
        Engine::with_fetcher(config, Arc::new(OfflineFetcher))
    } else {
        Engine::new(config)?
    };
    engine.generate(&request, &name)
}

/// Directory override and document name for the output file. Files named
/// with an extension other than `.pdf` are rejected rather than renamed.
fn output_target(spec: &Path, output: Option<&Path>) -> Result<(Option<PathBuf>, String), Error> {
    let Some(output) = output else {
        return Ok((None, stem(spec)?));
    };
    if let Some(extension) = output.extension() {
        if !extension.eq_ignore_ascii_case("pdf") {
            return Err(Error::Output(format!(
                "output file `{}` must end in .pdf",
                output.display()
            )));
        }
    }
    let dir = output
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf);
    Ok((dir, stem(output)?))
}

fn stem(path: &Path) -> Result<String, Error> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| {
            Error::Output(format!("cannot derive an output name from `{}`", path.display()))
        })
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_defaults_to_the_spec_name() {
        let (dir, name) = output_target(Path::new("specs/invoice.json"), None).expect("target");
        assert_eq!(dir, None);
        assert_eq!(name, "invoice");
    }

    #[test]
    fn output_file_sets_directory_and_name() {
        let spec = Path::new("invoice.json");
        let (dir, name) = output_target(spec, Some(Path::new("out/report.PDF"))).expect("target");
        assert_eq!(dir, Some(PathBuf::from("out")));
        assert_eq!(name, "report");

        let (dir, name) = output_target(spec, Some(Path::new("report"))).expect("target");
        assert_eq!(dir, None);
        assert_eq!(name, "report");
    }

    #[test]
    fn other_output_extensions_are_rejected() {
        let result = output_target(Path::new("invoice.json"), Some(Path::new("report.txt")));
        assert!(matches!(result, Err(Error::Output(_))));
    }
}
