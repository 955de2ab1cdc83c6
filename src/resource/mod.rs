// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

mod resolver;
pub use resolver::ResourceResolver;

mod unpacked;
pub use unpacked::UnpackedResource;

mod memory;
pub use memory::MemoryResource;

use crate::ByteBuffer;

/// Represents a source of pristine game files for reading.
///
/// This abstracts away where the unmodified tables come from. This could be unpacked files on disk, files already extracted into memory by the host, or anything else.
pub trait Resource: Send {
    /// Reads the file located at `path`. This is returned as an in-memory buffer, and will usually
    /// have to be further parsed.
    ///
    /// # Example
    ///
    /// ```
    /// # use xivmeta::resource::{MemoryResource, Resource};
    /// let mut resource = MemoryResource::new();
    /// resource.insert("chara/xls/charamake/human.cmp", vec![0u8; 4]);
    ///
    /// let data = resource.read("chara/xls/charamake/human.cmp").unwrap();
    /// assert_eq!(data.len(), 4);
    /// ```
    fn read(&mut self, path: &str) -> Option<ByteBuffer>;

    /// Checks if a file exists.
    ///
    /// While you could abuse `read` to do this, in some Resources they can optimize this since it doesn't read data.
    fn exists(&mut self, path: &str) -> bool;
}
