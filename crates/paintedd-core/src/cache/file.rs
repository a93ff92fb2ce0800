use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CacheError, CacheStorage, CachedData, Response};

/// Extension of generation files in the cache directory
const GENERATION_EXT: &str = "json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct GenerationFile {
    name: String,
    #[serde(default)]
    entries: BTreeMap<String, CachedData<Response>>,
}

/// Just the name of a generation file; entries are skipped unparsed.
#[derive(Deserialize)]
struct GenerationHeader {
    name: String,
}

type Loaded = HashMap<String, GenerationFile>;

/// Stores each generation as one JSON file under the cache directory.
///
/// A generation is parsed on first use and then served from memory; every
/// write goes to disk before it returns.
pub struct FileStorage {
    cache_dir: PathBuf,
    // Also serializes read-modify-write of generation files within this process
    loaded: Mutex<Loaded>,
}

impl FileStorage {
    pub fn new(cache_dir: PathBuf) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            loaded: Mutex::new(HashMap::new()),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn guard(&self) -> MutexGuard<'_, Loaded> {
        self.loaded.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// File names percent-encode the generation, so distinct names never share a file.
    fn generation_path(&self, generation: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{}", urlencoding::encode(generation), GENERATION_EXT))
    }

    fn name_from_stem(stem: &str) -> String {
        urlencoding::decode(stem)
            .map(|name| name.into_owned())
            .unwrap_or_else(|_| stem.to_string())
    }

    /// Make sure `generation` is in memory if it exists on disk.
    /// Returns whether it exists.
    fn ensure_loaded(&self, loaded: &mut Loaded, generation: &str) -> Result<bool, CacheError> {
        if loaded.contains_key(generation) {
            return Ok(true);
        }
        let path = self.generation_path(generation);
        if !path.exists() {
            return Ok(false);
        }
        let contents = std::fs::read_to_string(&path)?;
        let file: GenerationFile = serde_json::from_str(&contents)?;
        debug!(generation = generation, entries = file.entries.len(), "Loaded cache generation");
        loaded.insert(generation.to_string(), file);
        Ok(true)
    }

    fn save(&self, file: &GenerationFile) -> Result<(), CacheError> {
        let path = self.generation_path(&file.name);
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec(file)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn update(&self, generation: &str, responses: Vec<Response>) -> Result<(), CacheError> {
        let mut loaded = self.guard();
        if let Err(e) = self.ensure_loaded(&mut loaded, generation) {
            warn!(generation = generation, error = %e, "Discarding unreadable cache generation");
        }
        let file = loaded
            .entry(generation.to_string())
            .or_insert_with(|| GenerationFile {
                name: generation.to_string(),
                entries: BTreeMap::new(),
            });
        for response in responses {
            debug!(generation = generation, url = %response.url, "Caching response");
            file.entries.insert(response.url.clone(), CachedData::new(response));
        }

        let saved = self.save(file);
        if saved.is_err() {
            // Memory must not get ahead of disk; reload on next use
            loaded.remove(generation);
        }
        saved
    }
}

impl CacheStorage for FileStorage {
    fn generations(&self) -> Result<Vec<String>, CacheError> {
        let _guard = self.guard();
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(GENERATION_EXT) {
                continue;
            }
            let header = std::fs::read_to_string(&path)
                .map_err(CacheError::from)
                .and_then(|contents| Ok(serde_json::from_str::<GenerationHeader>(&contents)?));
            match header {
                Ok(header) => names.push(header.name),
                Err(e) => {
                    // Still listed so activation can purge it
                    warn!(path = %path.display(), error = %e, "Unreadable cache generation file");
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.push(Self::name_from_stem(stem));
                    }
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn lookup(&self, generation: &str, url: &str) -> Result<Option<CachedData<Response>>, CacheError> {
        let mut loaded = self.guard();
        if !self.ensure_loaded(&mut loaded, generation)? {
            return Ok(None);
        }
        Ok(loaded
            .get(generation)
            .and_then(|file| file.entries.get(url))
            .cloned())
    }

    fn put(&self, generation: &str, response: Response) -> Result<(), CacheError> {
        self.update(generation, vec![response])
    }

    fn put_all(&self, generation: &str, responses: Vec<Response>) -> Result<(), CacheError> {
        self.update(generation, responses)
    }

    fn keys(&self, generation: &str) -> Result<Vec<String>, CacheError> {
        let mut loaded = self.guard();
        if !self.ensure_loaded(&mut loaded, generation)? {
            return Ok(Vec::new());
        }
        Ok(loaded
            .get(generation)
            .map(|file| file.entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn delete_generation(&self, generation: &str) -> Result<bool, CacheError> {
        let mut loaded = self.guard();
        loaded.remove(generation);
        let path = self.generation_path(generation);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trips_generations() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("offline")).unwrap();

        storage
            .put_all(
                "paintedd-v1",
                vec![
                    Response::new("https://paintedd.art/", 200, "<html>"),
                    Response::new("https://paintedd.art/logo.png", 200, vec![137u8, 80, 78, 71]),
                ],
            )
            .unwrap();
        storage
            .put("paintedd/v2", Response::new("https://paintedd.art/", 200, "<html v2>"))
            .unwrap();

        assert_eq!(
            storage.generations().unwrap(),
            vec!["paintedd-v1".to_string(), "paintedd/v2".to_string()]
        );
        assert_eq!(storage.keys("paintedd-v1").unwrap().len(), 2);

        let logo = storage
            .lookup("paintedd-v1", "https://paintedd.art/logo.png")
            .unwrap()
            .unwrap();
        assert_eq!(logo.data.body, vec![137u8, 80, 78, 71]);

        assert!(storage.delete_generation("paintedd-v1").unwrap());
        assert!(storage.lookup("paintedd-v1", "https://paintedd.art/").unwrap().is_none());
        assert_eq!(storage.generations().unwrap(), vec!["paintedd/v2".to_string()]);
    }

    #[test]
    fn test_corrupt_generation_is_listed_for_purging() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("stale-v0.json"), "{not json").unwrap();

        assert_eq!(storage.generations().unwrap(), vec!["stale-v0".to_string()]);
        assert!(storage.delete_generation("stale-v0").unwrap());
        assert!(storage.generations().unwrap().is_empty());
    }

    #[test]
    fn test_similar_names_get_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        storage.put("paintedd/v2", Response::new("https://paintedd.art/", 200, "slash")).unwrap();
        storage.put("paintedd_v2", Response::new("https://paintedd.art/", 200, "underscore")).unwrap();

        assert_eq!(
            storage.generations().unwrap(),
            vec!["paintedd/v2".to_string(), "paintedd_v2".to_string()]
        );
        let slash = storage.lookup("paintedd/v2", "https://paintedd.art/").unwrap().unwrap();
        assert_eq!(slash.data.text(), "slash");

        assert!(storage.delete_generation("paintedd_v2").unwrap());
        let reopened = FileStorage::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.generations().unwrap(), vec!["paintedd/v2".to_string()]);
    }

    #[test]
    fn test_listing_reads_names_only() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        // Entries that would not decode do not matter for listing
        std::fs::write(
            dir.path().join("paintedd-v3.json"),
            r#"{"name": "paintedd-v3", "entries": {"x": {"data": {"body": "%%%"}}}}"#,
        )
        .unwrap();

        assert_eq!(storage.generations().unwrap(), vec!["paintedd-v3".to_string()]);
        assert!(storage.lookup("paintedd-v3", "x").is_err());
    }

    #[test]
    fn test_generation_is_parsed_once() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        storage.put("paintedd-v1", Response::new("https://paintedd.art/", 200, "<html>")).unwrap();

        let reopened = FileStorage::new(dir.path().to_path_buf()).unwrap();
        assert!(reopened.lookup("paintedd-v1", "https://paintedd.art/").unwrap().is_some());
        std::fs::write(dir.path().join("paintedd-v1.json"), "{not json").unwrap();
        assert!(reopened.lookup("paintedd-v1", "https://paintedd.art/").unwrap().is_some());
        assert_eq!(reopened.keys("paintedd-v1").unwrap().len(), 1);
    }
}
