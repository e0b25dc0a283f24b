use crate::types::CheckinReport;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Section name of this module in the checkin results document.
pub const MODULE_NAME: &str = "Salt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Stdout,
    File(PathBuf),
}

impl Target {
    pub fn parse(output_arg: &str) -> Self {
        match output_arg {
            "stdout" | "-" => Target::Stdout,
            path => Target::File(PathBuf::from(path)),
        }
    }
}

/// Replace the results file with `report`. A missing parent directory means
/// Sal is not installed; that is logged and otherwise ignored.
pub fn write_results(target: &Target, report: &CheckinReport) -> Result<()> {
    let path = match target {
        Target::Stdout => return write_stdout(&serde_json::to_value(report)?),
        Target::File(path) => path,
    };

    let file = match File::create(path) {
        Ok(f) => f,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "results directory is missing, not writing results");
            return Ok(());
        }
        Err(err) => return Err(err).with_context(|| format!("creating {}", path.display())),
    };
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, report)?;
    writer.flush()?;
    tracing::debug!(path = %path.display(), "wrote results");
    Ok(())
}

/// Merge `report` into the checkin results document under `module`, keeping
/// every other module's section.
pub fn write_section(target: &Target, module: &str, report: &CheckinReport) -> Result<()> {
    let section = serde_json::to_value(report)?;
    let path = match target {
        Target::Stdout => return write_stdout(&section),
        Target::File(path) => path,
    };

    let mut document = read_document(path);
    document.insert(module.to_string(), section);

    create_parent_dirs(path)?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &Value::Object(document))?;
    writeln!(writer)?;
    writer.flush()?;
    tracing::debug!(path = %path.display(), %module, "wrote checkin section");
    Ok(())
}

fn write_stdout(value: &Value) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

/// An unreadable or invalid document counts as empty.
fn read_document(path: &Path) -> Map<String, Value> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Map::new(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "could not read checkin results");
            return Map::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            tracing::warn!(path = %path.display(), "checkin results are not a JSON object, starting over");
            Map::new()
        }
    }
}

fn create_parent_dirs(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
