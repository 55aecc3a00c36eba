//! Fixture generation: the initial key→value dataset the service loads.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::error::{HarnessError, Result};

/// Well-known location the service reads its bootstrap state from. Part of
/// the contract with the service process; it resolves against the service's
/// working directory.
pub const FIXTURE_PATH: &str = "config.txt";

/// The identity fixture: every key maps to itself. A sorted map keeps the
/// serialized form deterministic across runs.
pub type Fixture = BTreeMap<String, String>;

/// Read the key list, one key per line, trimmed of surrounding whitespace.
/// Order is preserved; duplicates are kept here and collapse later under
/// mapping semantics.
pub fn load_keys(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| HarnessError::FixtureInput {
        path: path.to_path_buf(),
        source,
    })?;
    let mut keys = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| HarnessError::FixtureInput {
            path: path.to_path_buf(),
            source,
        })?;
        keys.push(line.trim().to_string());
    }
    Ok(keys)
}

/// Build the identity fixture from a key list. Last occurrence wins when a
/// key repeats, though for the identity mapping repeats are equivalent.
pub fn build_fixture(keys: &[String]) -> Fixture {
    keys.iter().map(|key| (key.clone(), key.clone())).collect()
}

/// Serialize the fixture to `path` as a JSON object. Runs once, before the
/// service process spawns.
pub fn write_fixture(fixture: &Fixture, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let serialized = serde_json::to_string(fixture).map_err(std::io::Error::from)?;
    fs::write(path, serialized)?;
    info!(
        entries = fixture.len(),
        path = %path.display(),
        "fixture written"
    );
    Ok(())
}
