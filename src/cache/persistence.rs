// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Disk mirror for cache entries
//!
//! One file per entry inside the configured directory. File names come from
//! the key with every non-alphanumeric character replaced by `_`, so distinct
//! keys can collide; the last writer wins.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;

use super::config::PersistenceConfig;
use super::entry::CacheEntry;
use crate::core::{Result, TemplateError};

const PLAIN_SUFFIX: &str = ".json";
const COMPRESSED_SUFFIX: &str = ".json.gz.b64";

pub fn file_name(key: &str, compress: bool) -> String {
    let stem: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let suffix = if compress { COMPRESSED_SUFFIX } else { PLAIN_SUFFIX };
    format!("{stem}{suffix}")
}

pub fn entry_path(config: &PersistenceConfig, key: &str) -> PathBuf {
    config.directory.join(file_name(key, config.compress))
}

fn is_entry_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(PLAIN_SUFFIX) || name.ends_with(COMPRESSED_SUFFIX))
}

fn persistence_error(path: &Path, error: impl std::fmt::Display) -> TemplateError {
    TemplateError::persistence(path.display().to_string(), error.to_string())
}

fn encode(json: Vec<u8>, compress: bool) -> std::io::Result<Vec<u8>> {
    if !compress {
        return Ok(json);
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let gzipped = encoder.finish()?;
    Ok(STANDARD.encode(gzipped).into_bytes())
}

fn decode(path: &Path, bytes: Vec<u8>) -> Result<Vec<u8>> {
    let compressed = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(COMPRESSED_SUFFIX));
    if !compressed {
        return Ok(bytes);
    }
    let gzipped = STANDARD
        .decode(bytes.trim_ascii())
        .map_err(|e| persistence_error(path, e))?;
    let mut json = Vec::new();
    GzDecoder::new(gzipped.as_slice())
        .read_to_end(&mut json)
        .map_err(|e| persistence_error(path, e))?;
    Ok(json)
}

pub async fn write_entry<V: Serialize>(
    config: &PersistenceConfig,
    entry: &CacheEntry<V>,
) -> Result<()> {
    let path = entry_path(config, &entry.key);
    let json = serde_json::to_vec_pretty(entry).map_err(|e| persistence_error(&path, e))?;
    let bytes = encode(json, config.compress).map_err(|e| persistence_error(&path, e))?;
    fs::create_dir_all(&config.directory)
        .await
        .map_err(|e| persistence_error(&config.directory, e))?;
    fs::write(&path, bytes)
        .await
        .map_err(|e| persistence_error(&path, e))
}

/// Remove the file for `key`; a missing file is not an error
pub async fn remove_entry(config: &PersistenceConfig, key: &str) -> Result<()> {
    remove_file(&entry_path(config, key)).await
}

async fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(persistence_error(path, e)),
    }
}

/// Remove every entry file, leaving unrelated files alone
pub async fn clear_directory(config: &PersistenceConfig) -> Result<usize> {
    let mut removed = 0;
    for path in list_entry_files(&config.directory).await? {
        remove_file(&path).await?;
        removed += 1;
    }
    Ok(removed)
}

async fn list_entry_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut reader = match fs::read_dir(directory).await {
        Ok(reader) => reader,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(persistence_error(directory, e)),
    };
    let mut paths = Vec::new();
    while let Some(item) = reader
        .next_entry()
        .await
        .map_err(|e| persistence_error(directory, e))?
    {
        let path = item.path();
        if is_entry_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Read every entry file; unreadable files are logged and skipped
pub async fn read_entries<V: DeserializeOwned>(
    config: &PersistenceConfig,
) -> Result<Vec<(PathBuf, CacheEntry<V>)>> {
    let mut entries = Vec::new();
    for path in list_entry_files(&config.directory).await? {
        match read_entry(&path).await {
            Ok(entry) => entries.push((path, entry)),
            Err(error) => warn!("skipping cache file: {error}"),
        }
    }
    Ok(entries)
}

async fn read_entry<V: DeserializeOwned>(path: &Path) -> Result<CacheEntry<V>> {
    let bytes = fs::read(path).await.map_err(|e| persistence_error(path, e))?;
    let json = decode(path, bytes)?;
    serde_json::from_slice(&json).map_err(|e| persistence_error(path, e))
}

pub async fn delete_path(path: &Path) -> Result<()> {
    remove_file(path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_sanitizes_key() {
        assert_eq!(file_name("{{user.name}}", false), "__user_name__.json");
        assert_eq!(file_name("abc123", true), "abc123.json.gz.b64");
    }

    #[test]
    fn test_compressed_encoding_round_trips() {
        let json = br#"{"key":"k"}"#.to_vec();
        let encoded = encode(json.clone(), true).unwrap();
        assert!(encoded.iter().all(u8::is_ascii));
        let path = PathBuf::from("k.json.gz.b64");
        assert_eq!(decode(&path, encoded).unwrap(), json);
        let plain = PathBuf::from("k.json");
        assert_eq!(decode(&plain, json.clone()).unwrap(), json);
    }

    #[tokio::test]
    async fn test_entry_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = PersistenceConfig::new(dir.path()).compressed(true);
        let entry = CacheEntry::new("greeting key", "hello".to_string());
        write_entry(&config, &entry).await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "ignored").await.unwrap();

        let loaded: Vec<(PathBuf, CacheEntry<String>)> = read_entries(&config).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].1, entry);

        assert_eq!(clear_directory(&config).await.unwrap(), 1);
        assert!(dir.path().join("notes.txt").exists());
        remove_entry(&config, "greeting key").await.unwrap();
    }
}
