use std::collections::HashMap;

/// Default capacity applied to a named cache whose size is not explicitly
/// configured.
pub const DEFAULT_CACHE_SIZE: usize = 255;

/// Parsed `{ "enable_caching": bool, "cache_sizes": { "<name>": N, ... } }`
/// configuration (spec §6.3).
#[derive(Debug, Clone, Default)]
pub struct CacheSizes {
    enabled: bool,
    sizes: HashMap<String, usize>,
}

impl CacheSizes {
    /// Parses cache-sizing configuration out of an already-loaded JSON
    /// value. Missing or malformed fields fall back to caching disabled.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let enabled = value
            .get("enable_caching")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        let sizes = value
            .get("cache_sizes")
            .and_then(serde_json::Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_u64().map(|n| (k.clone(), n as usize)))
                    .collect()
            })
            .unwrap_or_default();

        Self { enabled, sizes }
    }

    /// Returns the configured cache size for `cache_name`: the explicit
    /// entry if present, [`DEFAULT_CACHE_SIZE`] if caching is enabled
    /// without an explicit entry, or `0` if caching is disabled entirely.
    pub fn size_for(&self, cache_name: &str) -> usize {
        if !self.enabled {
            return 0;
        }
        self.sizes
            .get(cache_name)
            .copied()
            .unwrap_or(DEFAULT_CACHE_SIZE)
    }
}
