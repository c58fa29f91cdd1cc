use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use spendwise_core::{Bounds, CampaignStats};

use crate::schema::input::TuningInput;

/// Writes `value` as pretty JSON to `output_path`, or to stdout when it is `None`.
pub fn save_json<T>(value: &T, output_path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    match output_path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            write_json(BufWriter::new(file), value)
                .with_context(|| format!("Failed to write JSON to {}", path.display()))
        }
        None => write_json(io::stdout().lock(), value).context("Failed to write JSON to stdout"),
    }
}

fn write_json<W, T>(mut writer: W, value: &T) -> anyhow::Result<()>
where
    W: Write,
    T: serde::Serialize,
{
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })
}

/// Read per-campaign historical statistics (a JSON array) from a file
pub fn read_campaigns_file<P>(path: P) -> anyhow::Result<Vec<CampaignStats>>
where
    P: AsRef<Path>,
{
    read_json_file("campaigns", path)
}

/// Read current campaign parameters and their performance history from a file
pub fn read_tuning_file<P>(path: P) -> anyhow::Result<TuningInput>
where
    P: AsRef<Path>,
{
    read_json_file("tuning input", path)
}

/// Read a `{name: {min, max}}` map from a file
pub fn read_bounds_file<P>(file_kind: &str, path: P) -> anyhow::Result<BTreeMap<String, Bounds>>
where
    P: AsRef<Path>,
{
    read_json_file(file_kind, path)
}
