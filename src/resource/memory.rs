// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;

use crate::ByteBuffer;

use super::Resource;

/// Serves files that the host has already extracted into memory.
#[derive(Default)]
pub struct MemoryResource {
    files: HashMap<String, ByteBuffer>,
}

impl MemoryResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the file at `path`.
    pub fn insert(&mut self, path: &str, data: ByteBuffer) {
        self.files.insert(path.to_lowercase(), data);
    }
}

impl Resource for MemoryResource {
    fn read(&mut self, path: &str) -> Option<ByteBuffer> {
        self.files.get(&path.to_lowercase()).cloned()
    }

    fn exists(&mut self, path: &str) -> bool {
        self.files.contains_key(&path.to_lowercase())
    }
}
