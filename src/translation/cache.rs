/*!
 * Translation caching functionality.
 *
 * This module provides a persistent cache of accepted translations keyed by
 * source text and language pair, so repeated runs over the same content skip
 * the translator entirely. The cache lives in memory and is written to a JSON
 * side file as a whole when the workflow flushes it between stages.
 */

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use parking_lot::RwLock;
use log::{debug, warn};

use crate::errors::TranslationError;

/// Composite key used both in memory and in the side file
pub fn cache_key(source_text: &str, source_language: &str, target_language: &str) -> String {
    format!("{}_{}_{}", source_text, source_language, target_language)
}

/// Translation cache for storing and retrieving translations
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<String, String>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,

    /// Whether caching is enabled
    enabled: bool,

    /// Side file the cache is persisted to, if any
    path: Option<PathBuf>,
}

impl TranslationCache {
    /// Create a new in-memory translation cache
    pub fn new(enabled: bool) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
            enabled,
            path: None,
        }
    }

    /// Open the cache backed by `path`.
    ///
    /// A missing file starts an empty cache. An unreadable or corrupt file is
    /// logged and also starts an empty cache; the next flush overwrites it.
    pub fn load<P: AsRef<Path>>(path: P, enabled: bool) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut cache = Self::new(enabled);

        if enabled && path.exists() {
            match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|content| serde_json::from_str::<HashMap<String, String>>(&content).map_err(|e| e.to_string()))
            {
                Ok(entries) => {
                    debug!("Loaded {} cached translations from {:?}", entries.len(), path);
                    *cache.cache.write() = entries;
                }
                Err(e) => warn!("Failed to load translation cache {:?}: {}", path, e),
            }
        }

        cache.path = Some(path);
        cache
    }

    /// Get a translation from the cache
    pub fn get(&self, source_text: &str, source_language: &str, target_language: &str) -> Option<String> {
        self.get_accepted(source_text, source_language, target_language, |_| true)
    }

    /// Get a translation from the cache if `accept` approves it.
    ///
    /// Rejected entries stay in the cache but count as misses.
    pub fn get_accepted<F>(&self, source_text: &str, source_language: &str, target_language: &str, accept: F) -> Option<String>
    where
        F: Fn(&str) -> bool,
    {
        if !self.enabled {
            return None;
        }

        let key = cache_key(source_text, source_language, target_language);
        let found = self.cache.read().get(&key).cloned();

        match found {
            Some(translation) if accept(&translation) => {
                *self.hits.write() += 1;
                debug!("Cache hit for '{}' ({} -> {})",
                       truncate_text(source_text, 30),
                       source_language,
                       target_language);
                Some(translation)
            },
            Some(_) => {
                *self.misses.write() += 1;
                debug!("Rejected cached translation for '{}' ({} -> {})",
                       truncate_text(source_text, 30),
                       source_language,
                       target_language);
                None
            },
            None => {
                *self.misses.write() += 1;
                debug!("Cache miss for '{}' ({} -> {})",
                       truncate_text(source_text, 30),
                       source_language,
                       target_language);
                None
            }
        }
    }

    /// Store a translation in the cache
    pub fn put(&self, source_text: &str, source_language: &str, target_language: &str, translation: &str) {
        if !self.enabled {
            return;
        }

        let key = cache_key(source_text, source_language, target_language);
        self.cache.write().insert(key, translation.to_string());
    }

    /// Write the whole cache to its side file
    pub fn flush(&self) -> Result<(), TranslationError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.enabled {
            return Ok(());
        }

        let snapshot: BTreeMap<String, String> = self.cache.read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| TranslationError::Cache(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| TranslationError::Cache(format!("{:?}: {}", path, e)))?;

        debug!("Flushed {} cached translations to {:?}", snapshot.len(), path);
        Ok(())
    }

    /// Get cache statistics
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Check if the cache is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Clone for TranslationCache {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
            enabled: self.enabled,
            path: self.path.clone(),
        }
    }
}

impl std::fmt::Debug for TranslationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationCache")
            .field("entries", &self.len())
            .field("enabled", &self.enabled)
            .field("path", &self.path)
            .finish()
    }
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_length).collect();
        format!("{}...", head)
    }
}
