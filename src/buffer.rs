// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::Cursor;
use std::ptr::NonNull;

use binrw::{BinRead, BinWrite};
use tracing::error;

/// A pointer and length pair handed to the resource loader.
///
/// The address stays valid until the owning table is unpublished again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublishedBuffer {
    ptr: NonNull<u8>,
    len: usize,
}

// The buffer is only ever read through this handle, and the owning table outlives its publication.
unsafe impl Send for PublishedBuffer {}
unsafe impl Sync for PublishedBuffer {}

impl PublishedBuffer {
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Views the published bytes.
    ///
    /// # Safety
    ///
    /// The table this was published from must stay published, and must not be mutated, for as long as the returned slice is alive.
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        std::slice::from_raw_parts(self.ptr.as_ptr(), self.len)
    }
}

/// The backing storage of an expanded table.
///
/// The allocation never moves while the buffer is published, only in-place writes are possible then.
/// Dropping a buffer that is still published leaks it instead of freeing memory the game may still read.
#[derive(Debug)]
pub struct MetaBuffer {
    data: Box<[u8]>,
    published: bool,
}

impl MetaBuffer {
    /// Allocates a zeroed buffer of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self {
            data: vec![0u8; len].into_boxed_slice(),
            published: false,
        }
    }

    /// Copies `source` into a new buffer of at least `len` bytes, the remainder is zeroed.
    pub fn from_slice(source: &[u8], len: usize) -> Self {
        let mut data = vec![0u8; len.max(source.len())];
        data[..source.len()].copy_from_slice(source);

        Self {
            data: data.into_boxed_slice(),
            published: false,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Whether the resource loader currently holds a pointer to this buffer.
    pub fn is_published(&self) -> bool {
        self.published
    }

    fn handle(&mut self) -> PublishedBuffer {
        PublishedBuffer {
            ptr: NonNull::from(&mut *self.data).cast::<u8>(),
            len: self.data.len(),
        }
    }

    pub(crate) fn publish(&mut self) -> PublishedBuffer {
        self.published = true;
        self.handle()
    }

    /// Returns the handle that was handed out by [`Self::publish`], if any.
    pub(crate) fn unpublish(&mut self) -> Option<PublishedBuffer> {
        if !self.published {
            return None;
        }

        self.published = false;
        Some(self.handle())
    }

    /// Reallocates the buffer to `len` bytes, keeping the existing contents.
    ///
    /// Returns false without doing anything if the buffer is published.
    pub(crate) fn resize(&mut self, len: usize) -> bool {
        if self.published {
            return false;
        }

        let mut data = vec![0u8; len];
        let kept = len.min(self.data.len());
        data[..kept].copy_from_slice(&self.data[..kept]);
        self.data = data.into_boxed_slice();

        true
    }

    /// Reads a little-endian value at `offset`.
    pub fn read<T>(&self, offset: usize) -> Option<T>
    where
        T: for<'a> BinRead<Args<'a> = ()>,
    {
        read_le(&self.data, offset)
    }

    /// Writes a little-endian value at `offset`. Nothing is written if it doesn't fit.
    pub(crate) fn write<T>(&mut self, offset: usize, value: &T) -> bool
    where
        T: for<'a> BinWrite<Args<'a> = ()>,
    {
        let mut cursor = Cursor::new(Vec::new());
        if value.write_le(&mut cursor).is_err() {
            return false;
        }

        let bytes = cursor.into_inner();
        let Some(end) = offset.checked_add(bytes.len()) else {
            return false;
        };

        match self.data.get_mut(offset..end) {
            Some(target) => {
                target.copy_from_slice(&bytes);
                true
            }
            None => false,
        }
    }
}

impl Drop for MetaBuffer {
    fn drop(&mut self) {
        if self.published {
            error!(
                len = self.data.len(),
                "Meta buffer dropped while still published, leaking it"
            );
            let _ = Box::leak(std::mem::take(&mut self.data));
        }
    }
}

/// Reads a little-endian value at `offset` of `data`, such as an unmodified game file.
pub(crate) fn read_le<T>(data: &[u8], offset: usize) -> Option<T>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    let mut cursor = Cursor::new(data.get(offset..)?);
    T::read_le(&mut cursor).ok()
}

/// A densely indexed, in-memory copy of one game table, ready to be handed to the game.
pub trait ExpandedTable {
    fn buffer(&self) -> &MetaBuffer;

    fn buffer_mut(&mut self) -> &mut MetaBuffer;
}
