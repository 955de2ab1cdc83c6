// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::bridge::MetaIndex;
use crate::resource::{Resource, ResourceResolver};
use crate::Error;

/// The unmodified game tables every default value is computed from.
///
/// Files are read once through the resolver and then shared, read-only, between every collection.
/// Nothing ever writes into these buffers, so reverting an entry never depends on a table that a mod already touched.
pub struct GameDefaults {
    resolver: Mutex<ResourceResolver>,
    cache: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl GameDefaults {
    pub fn new(resolver: ResourceResolver) -> Self {
        Self {
            resolver: Mutex::new(resolver),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Convenience for a resolver with a single source.
    pub fn from_resource(resource: impl Resource + 'static) -> Self {
        let mut resolver = ResourceResolver::new();
        resolver.add_source(resource);
        Self::new(resolver)
    }

    /// Returns the pristine contents of the game file at `path`.
    pub fn file(&self, path: &str) -> Result<Arc<[u8]>, Error> {
        let key = path.to_lowercase();
        if let Some(data) = self.cache.read().get(&key) {
            return Ok(data.clone());
        }

        let data = self
            .resolver
            .lock()
            .read(&key)
            .ok_or_else(|| Error::FileNotFound {
                path: path.to_string(),
            })?;

        debug!(path, len = data.len(), "Loaded pristine game file");

        let data: Arc<[u8]> = Arc::from(data);
        Ok(self.cache.write().entry(key).or_insert(data).clone())
    }

    /// Returns the pristine contents of the table behind `index`.
    pub fn meta_file(&self, index: MetaIndex) -> Result<Arc<[u8]>, Error> {
        self.file(&index.game_path())
    }
}
