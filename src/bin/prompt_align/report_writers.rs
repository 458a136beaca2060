use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use prompt_align::{BatchOutput, Report};

fn ensure_parent_dir(path: &Path, what: &str) -> Result<(), String> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => fs::create_dir_all(parent)
            .map_err(|err| format!("Cannot create {what} directory '{}': {err}", parent.display())),
        None => Ok(()),
    }
}

/// Pretty JSON report with a trailing newline.
pub fn write_json_report(path: &Path, report: &Report) -> Result<(), String> {
    ensure_parent_dir(path, "report")?;
    let file = fs::File::create(path)
        .map_err(|err| format!("Cannot create report '{}': {err}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|err| format!("Cannot serialize report '{}': {err}", path.display()))?;
    writeln!(writer)
        .and_then(|_| writer.flush())
        .map_err(|err| format!("Cannot write report '{}': {err}", path.display()))
}

/// `GENERATED_AT:` line, summary header, then one `id|DECISION|score|ORIGINAL: ...|FINAL: ...` line per record.
pub fn write_decision_log(path: &Path, output: &BatchOutput, generated_at: &str) -> Result<(), String> {
    ensure_parent_dir(path, "decision log")?;
    let body = format!("GENERATED_AT: {generated_at}\n{}", output.decision_log());
    fs::write(path, body)
        .map_err(|err| format!("Cannot write decision log '{}': {err}", path.display()))
}
