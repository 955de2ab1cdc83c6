// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::ByteBuffer;

use super::Resource;

/// Allows chaining multiple Resources together.
///
/// # Example
///
/// ```
/// # use xivmeta::resource::{MemoryResource, ResourceResolver, UnpackedResource};
/// let file_source = UnpackedResource::from_existing("unpacked/");
/// let memory_source = MemoryResource::new();
/// let mut resolver = ResourceResolver::new();
/// resolver.add_source(memory_source); // first has most priority
/// resolver.add_source(file_source); // this is the fallback
/// ```
#[derive(Default)]
pub struct ResourceResolver {
    resources: Vec<Box<dyn Resource>>,
}

impl ResourceResolver {
    /// Create a new, empty resolver.
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
        }
    }

    /// Adds a new source to this resolver, and makes it the least prioritized.
    pub fn add_source(&mut self, source: impl Resource + 'static) {
        self.resources.push(Box::new(source));
    }

    /// Reads `path` from the first source that has it.
    pub fn read(&mut self, path: &str) -> Option<ByteBuffer> {
        for resolver in &mut self.resources {
            if let Some(bytes) = resolver.read(path) {
                return Some(bytes);
            }
        }

        None
    }

    /// Checks whether any source has `path`.
    pub fn exists(&mut self, path: &str) -> bool {
        for resolver in &mut self.resources {
            if resolver.exists(path) {
                return true;
            }
        }

        false
    }
}
