//! JSONL (JSON Lines) storage.
//!
//! JSONL is the source of truth for all normalized data. Each line is one
//! entity. Drivers, constructors and circuits live in global files; races,
//! results and qualifying are partitioned by season.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::{StorageConfig, StorageError};

/// Entity types for JSONL storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Driver,
    Constructor,
    Circuit,
    Race,
    Result,
    Qualifying,
}

impl EntityType {
    /// Get the filename for this entity type.
    pub fn filename(&self) -> &'static str {
        match self {
            EntityType::Driver => "drivers.jsonl",
            EntityType::Constructor => "constructors.jsonl",
            EntityType::Circuit => "circuits.jsonl",
            EntityType::Race => "races.jsonl",
            EntityType::Result => "results.jsonl",
            EntityType::Qualifying => "qualifying.jsonl",
        }
    }

    /// Whether files of this type live under a season directory.
    pub fn is_seasonal(&self) -> bool {
        matches!(
            self,
            EntityType::Race | EntityType::Result | EntityType::Qualifying
        )
    }
}

/// Path of the JSONL file for an entity type.
///
/// Seasonal types need a season; global types ignore it.
pub fn entity_path(
    config: &StorageConfig,
    entity: EntityType,
    season: Option<u16>,
) -> Result<PathBuf, StorageError> {
    match (entity.is_seasonal(), season) {
        (true, Some(season)) => Ok(config.season_dir(season).join(entity.filename())),
        (true, None) => Err(StorageError::InvalidPath(format!(
            "{} requires a season",
            entity.filename()
        ))),
        (false, _) => Ok(config.normalized_dir().join(entity.filename())),
    }
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn write_lines(writer: &mut impl Write, entities: &[T]) -> Result<usize, StorageError> {
        for entity in entities {
            serde_json::to_writer(&mut *writer, entity)?;
            writer.write_all(b"\n")?;
        }
        Ok(entities.len())
    }

    pub fn append(&self, entity: &T) -> Result<(), StorageError> {
        self.append_batch(std::slice::from_ref(entity)).map(|_| ())
    }

    /// Append entities to the end of the file.
    pub fn append_batch(&self, entities: &[T]) -> Result<usize, StorageError> {
        if entities.is_empty() {
            return Ok(0);
        }

        self.ensure_dir()?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        let count = Self::write_lines(&mut writer, entities)?;
        writer.flush()?;

        debug!("Appended {} entities to {:?}", count, self.path);
        Ok(count)
    }

    /// Replace the file contents.
    ///
    /// Writes to a sibling temp file and renames it over the target, so a
    /// reader never sees a half-written file.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let tmp_path = self.path.with_extension("jsonl.tmp");
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        let count = Self::write_lines(&mut writer, entities)?;
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp_path, &self.path)?;

        debug!("Wrote {} entities to {:?}", count, self.path);
        Ok(count)
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all entities. A missing file reads as empty; lines that fail
    /// to parse are logged and skipped.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entities = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(e) => warn!("Skipping line {} in {:?}: {}", idx + 1, self.path, e),
            }
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }

    /// Read entities matching a predicate.
    pub fn read_where<F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self.read_all()?.into_iter().filter(predicate).collect())
    }

    /// Count non-empty lines without parsing them.
    pub fn count(&self) -> Result<usize, StorageError> {
        if !self.path.exists() {
            return Ok(0);
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut count = 0;
        for line in reader.lines() {
            if !line?.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Lazily iterate the file, surfacing parse errors per line.
    pub fn iter(&self) -> Result<JsonlIterator<T>, StorageError> {
        if !self.path.exists() {
            return Err(StorageError::PathNotFound(self.path.clone()));
        }

        Ok(JsonlIterator {
            reader: BufReader::new(File::open(&self.path)?),
            _marker: PhantomData,
        })
    }
}

/// Iterator over JSONL file entries.
pub struct JsonlIterator<T> {
    reader: BufReader<File>,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> Iterator for JsonlIterator<T> {
    type Item = Result<T, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();

        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) if line.trim().is_empty() => continue,
                Ok(_) => return Some(serde_json::from_str(&line).map_err(StorageError::Json)),
                Err(e) => return Some(Err(StorageError::Io(e))),
            }
        }
    }
}

/// Seasons that have a directory in the data lake, oldest first.
/// Directories whose name is not a year are ignored.
pub fn list_seasons(config: &StorageConfig) -> Result<Vec<u16>, StorageError> {
    let dir = config.normalized_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut seasons = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(season) = entry.file_name().to_str().and_then(|n| n.parse().ok()) {
            seasons.push(season);
        }
    }

    seasons.sort_unstable();
    Ok(seasons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Row {
        key: String,
        laps: u32,
    }

    fn row(key: &str, laps: u32) -> Row {
        Row {
            key: key.to_string(),
            laps,
        }
    }

    fn test_config(temp_dir: &TempDir) -> StorageConfig {
        StorageConfig::new(temp_dir.path().to_path_buf())
    }

    #[test]
    fn test_write_all_then_read_all() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("rows.jsonl");

        let writer: JsonlWriter<Row> = JsonlWriter::new(path.clone());
        assert_eq!(writer.write_all(&[row("a", 57), row("b", 56)]).unwrap(), 2);

        let reader: JsonlReader<Row> = JsonlReader::new(path);
        assert_eq!(reader.read_all().unwrap(), vec![row("a", 57), row("b", 56)]);
    }

    #[test]
    fn test_write_all_replaces_and_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rows.jsonl");
        let writer: JsonlWriter<Row> = JsonlWriter::new(path.clone());

        writer.write_all(&[row("old", 1)]).unwrap();
        writer.write_all(&[row("new", 2)]).unwrap();

        let reader: JsonlReader<Row> = JsonlReader::new(path.clone());
        assert_eq!(reader.read_all().unwrap(), vec![row("new", 2)]);
        assert!(!path.with_extension("jsonl.tmp").exists());
    }

    #[test]
    fn test_append_batch() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rows.jsonl");
        let writer: JsonlWriter<Row> = JsonlWriter::new(path.clone());

        writer.append(&row("a", 1)).unwrap();
        writer.append_batch(&[row("b", 2), row("c", 3)]).unwrap();
        assert_eq!(writer.append_batch(&[]).unwrap(), 0);

        let reader: JsonlReader<Row> = JsonlReader::new(path);
        let keys: Vec<String> = reader.read_all().unwrap().into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let reader: JsonlReader<Row> = JsonlReader::new(temp_dir.path().join("none.jsonl"));

        assert!(!reader.exists());
        assert!(reader.read_all().unwrap().is_empty());
        assert_eq!(reader.count().unwrap(), 0);
        assert!(matches!(reader.iter(), Err(StorageError::PathNotFound(_))));
    }

    #[test]
    fn test_read_all_skips_bad_and_blank_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mixed.jsonl");
        std::fs::write(
            &path,
            "{\"key\":\"a\",\"laps\":1}\nnot-json\n\n{\"key\":\"b\",\"laps\":2}\n",
        )
        .unwrap();

        let reader: JsonlReader<Row> = JsonlReader::new(path);
        assert_eq!(reader.read_all().unwrap(), vec![row("a", 1), row("b", 2)]);
        assert_eq!(reader.count().unwrap(), 3);

        let parsed: Vec<_> = reader.iter().unwrap().collect();
        assert_eq!(parsed.len(), 3);
        assert!(parsed[1].is_err());
    }

    #[test]
    fn test_read_where() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rows.jsonl");
        JsonlWriter::new(path.clone())
            .write_all(&[row("a", 10), row("b", 60), row("c", 70)])
            .unwrap();

        let reader: JsonlReader<Row> = JsonlReader::new(path);
        let long = reader.read_where(|r| r.laps > 50).unwrap();
        assert_eq!(long, vec![row("b", 60), row("c", 70)]);
    }

    #[test]
    fn test_entity_path() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let drivers = entity_path(&config, EntityType::Driver, Some(2024)).unwrap();
        assert_eq!(drivers, config.normalized_dir().join("drivers.jsonl"));

        let results = entity_path(&config, EntityType::Result, Some(2024)).unwrap();
        assert!(results.ends_with("2024/results.jsonl"));

        assert!(matches!(
            entity_path(&config, EntityType::Race, None),
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_list_seasons_sorted_and_numeric_only() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        assert!(list_seasons(&config).unwrap().is_empty());

        for dir in ["2024", "2019", "scratch", "2023"] {
            fs::create_dir_all(config.normalized_dir().join(dir)).unwrap();
        }
        fs::write(config.normalized_dir().join("drivers.jsonl"), "").unwrap();

        assert_eq!(list_seasons(&config).unwrap(), vec![2019, 2023, 2024]);
    }
}
