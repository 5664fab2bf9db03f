use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use jsdump::{Config, JsonInterpreter, SpecEntry, driver};

/// Dumps a JSON heap snapshot into a set of re-evaluatable JS source files.
#[derive(Parser)]
#[command(name = "jsdump")]
#[command(about = "Snapshots a JSON-described JS heap into re-evaluatable source text")]
struct Cli {
    /// Path to the heap snapshot (`{"global": ..., "objects": ..., "objectPrototype": ...}`).
    snapshot: PathBuf,

    /// Path to the dump spec: a JSON array of `{filename, contents, rest}` entries.
    spec: PathBuf,

    /// Directory the output files are written into; created if missing.
    #[arg(long, short, default_value = "dump")]
    out_dir: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let snapshot_text = match read_file(&cli.snapshot) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let interp = match JsonInterpreter::load(&snapshot_text) {
        Ok(interp) => interp,
        Err(err) => {
            eprintln!("error loading snapshot {}: {err}", cli.snapshot.display());
            return ExitCode::FAILURE;
        }
    };

    let spec_text = match read_file(&cli.spec) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let spec_entries: Vec<SpecEntry> = match serde_json::from_str(&spec_text) {
        Ok(entries) => entries,
        Err(err) => {
            eprintln!("error parsing {}: {err}", cli.spec.display());
            return ExitCode::FAILURE;
        }
    };
    let config = match Config::build(&spec_entries) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error in dump spec: {err}");
            return ExitCode::FAILURE;
        }
    };

    let outputs = match driver::dump(&interp, &config) {
        Ok(outputs) => outputs,
        Err(err) => {
            eprintln!("dump failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = write_outputs(&cli.out_dir, &outputs) {
        eprintln!("error writing output: {err}");
        return ExitCode::FAILURE;
    }

    eprintln!("wrote {} file(s) to {}", outputs.len(), cli.out_dir.display());
    ExitCode::SUCCESS
}

fn read_file(path: &Path) -> Result<String, String> {
    eprintln!("reading {}", path.display());
    match fs::metadata(path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("{} is not a file", path.display()));
            }
        }
        Err(err) => return Err(format!("reading {}: {err}", path.display())),
    }
    fs::read_to_string(path).map_err(|err| format!("reading {}: {err}", path.display()))
}

fn write_outputs(out_dir: &Path, outputs: &[driver::FileOutput]) -> std::io::Result<()> {
    fs::create_dir_all(out_dir)?;
    for output in outputs {
        let path = out_dir.join(&output.filename);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, output.source())?;
    }
    Ok(())
}
