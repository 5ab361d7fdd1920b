//! JSON export of crawl results

use crate::output::OutputResult;
use crate::storage::{CrawlResult, Storage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes results as a pretty-printed JSON array
pub fn write_json<W: Write>(results: &[CrawlResult], mut writer: W) -> OutputResult<()> {
    serde_json::to_writer_pretty(&mut writer, results)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Exports every stored result to a JSON file
///
/// # Arguments
///
/// * `storage` - The storage backend holding the results
/// * `path` - Destination file; overwritten if it exists
///
/// # Returns
///
/// * `Ok(usize)` - Number of results written
/// * `Err(OutputError)` - Failed to read results or write the file
pub fn export_json(storage: &dyn Storage, path: &Path) -> OutputResult<usize> {
    let results = storage.export_all()?;
    let file = File::create(path)?;
    write_json(&results, BufWriter::new(file))?;

    tracing::info!("Exported {} results to {}", results.len(), path.display());
    Ok(results.len())
}
