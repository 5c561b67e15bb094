//! The persisted profile store.
//!
//! One JSON file holds the preferred variant per operation for every host
//! that has ever profiled into it:
//!
//! ```json
//! { "schema_version": 1, "hosts": { "<hostid>": { "<op>": "<impl>" } } }
//! ```
//!
//! Loading is deliberately infallible: a missing file, a parse error, or a
//! schema mismatch all yield the empty mapping, and the dispatch table then
//! behaves exactly as if no profile existed. Saving is read-modify-write of
//! the whole file through a sibling temp file and `fs::rename`, so a crash
//! mid-save leaves the previous file intact and other hosts' records are
//! preserved.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;
use crate::host::HostId;

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Default file name, resolved against `VLK_PROFILE_PATH`, then `HOME`,
/// then the working directory.
const FILE_NAME: &str = "vlk_profile.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct PrefsFile {
  #[serde(default)]
  schema_version: u32,
  #[serde(default)]
  hosts: BTreeMap<String, BTreeMap<String, String>>,
}

fn read_file(path: &Path) -> PrefsFile {
  let Ok(text) = fs::read_to_string(path) else {
    return PrefsFile::default();
  };
  match serde_json::from_str::<PrefsFile>(&text) {
    Ok(file) if file.schema_version == SCHEMA_VERSION => file,
    // Unknown schema or corrupt contents: start over rather than guess.
    _ => PrefsFile::default(),
  }
}

/// Load the persisted mapping for one host. Never fails; degraded inputs
/// yield the empty map.
#[must_use]
pub fn load(path: &Path, host: &HostId) -> BTreeMap<String, String> {
  read_file(path).hosts.remove(&host.to_string()).unwrap_or_default()
}

/// Persist one host's mapping, preserving every other host's record.
///
/// # Errors
///
/// [`ProfileError::Io`] if the directory cannot be created or the file
/// cannot be written or renamed into place.
pub fn save(path: &Path, host: &HostId, map: &BTreeMap<String, String>) -> Result<(), ProfileError> {
  let mut file = read_file(path);
  file.schema_version = SCHEMA_VERSION;
  file.hosts.insert(host.to_string(), map.clone());

  if let Some(parent) = path.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent)?;
    }
  }

  let mut tmp = path.as_os_str().to_owned();
  tmp.push(".tmp");
  let tmp = PathBuf::from(tmp);
  // Any failure past this point must not leave the temp file behind.
  let result = write_whole(&tmp, &file)
    .and_then(|()| fs::rename(&tmp, path).map_err(ProfileError::from));
  if let Err(err) = result {
    let _ = fs::remove_file(&tmp);
    return Err(err);
  }
  Ok(())
}

fn write_whole(tmp: &Path, file: &PrefsFile) -> Result<(), ProfileError> {
  let mut out = fs::File::create(tmp)?;
  serde_json::to_writer_pretty(&mut out, file).map_err(|e| ProfileError::Io(e.to_string()))?;
  out.write_all(b"\n")?;
  out.sync_all()?;
  Ok(())
}

/// Where the profile lives when the caller does not say otherwise.
#[must_use]
pub fn default_path() -> PathBuf {
  if let Some(p) = std::env::var_os("VLK_PROFILE_PATH") {
    return PathBuf::from(p);
  }
  if let Some(home) = std::env::var_os("HOME") {
    return PathBuf::from(home).join(".vlk").join(FILE_NAME);
  }
  PathBuf::from(FILE_NAME)
}
