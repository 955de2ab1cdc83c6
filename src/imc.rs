// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::Cursor;
use std::sync::Arc;

use binrw::{binrw, BinRead};

use crate::buffer::{ExpandedTable, MetaBuffer};
use crate::Error;

const HEADER_SIZE: usize = 4;
const ENTRY_SIZE: usize = 6;
const ATTRIBUTE_MASK: u16 = 0x3FF;

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ImcHeader {
    variant_count: u16,
    part_mask: u16,
}

/// The image change data of one part in one variant.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "PascalCase")
)]
pub struct ImcEntry {
    pub material_id: u8,
    pub decal_id: u8,
    /// The low 10 bits are the attribute mask, the rest is the sound id.
    pub attribute_and_sound: u16,
    pub vfx_id: u8,
    pub material_animation_id: u8,
}

impl ImcEntry {
    pub fn attribute_mask(&self) -> u16 {
        self.attribute_and_sound & ATTRIBUTE_MASK
    }

    pub fn sound_id(&self) -> u8 {
        (self.attribute_and_sound >> 10) as u8
    }

    pub fn set_attribute_mask(&mut self, mask: u16) {
        self.attribute_and_sound =
            (self.attribute_and_sound & !ATTRIBUTE_MASK) | (mask & ATTRIBUTE_MASK);
    }

    pub fn set_sound_id(&mut self, sound_id: u8) {
        self.attribute_and_sound =
            (self.attribute_and_sound & ATTRIBUTE_MASK) | ((sound_id as u16 & 0x3F) << 10);
    }
}

/// An IMC file of a single game path, kept at its original size.
#[derive(Debug)]
pub struct ImcFile {
    path: String,
    header: ImcHeader,
    buffer: MetaBuffer,
    default_data: Arc<[u8]>,
}

impl ImcFile {
    pub fn from_existing(path: &str, default_data: Arc<[u8]>) -> Result<Self, Error> {
        let invalid = || Error::FileParsingFailed {
            path: path.to_string(),
        };

        let header = ImcHeader::read(&mut Cursor::new(&default_data[..])).map_err(|_| invalid())?;

        let rows = header.variant_count as usize + 1;
        let parts = header.part_mask.count_ones() as usize;
        if header.part_mask == 0 || default_data.len() < HEADER_SIZE + rows * parts * ENTRY_SIZE {
            return Err(invalid());
        }

        Ok(Self {
            path: path.to_string(),
            header,
            buffer: MetaBuffer::from_slice(&default_data, default_data.len()),
            default_data,
        })
    }

    /// The game path this file replaces.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of variants, not counting the default row.
    pub fn variant_count(&self) -> u16 {
        self.header.variant_count
    }

    pub fn part_mask(&self) -> u16 {
        self.header.part_mask
    }

    /// Offset of an entry, `None` if the part isn't in this file or the variant doesn't exist.
    fn entry_offset(&self, variant: u16, part: usize) -> Option<usize> {
        if part >= 16 || self.header.part_mask & (1 << part) == 0 {
            return None;
        }
        if variant > self.header.variant_count {
            return None;
        }

        let parts = self.header.part_mask.count_ones() as usize;
        let column = (self.header.part_mask & ((1 << part) - 1)).count_ones() as usize;
        Some(HEADER_SIZE + (variant as usize * parts + column) * ENTRY_SIZE)
    }

    pub fn get(&self, variant: u16, part: usize) -> Option<ImcEntry> {
        self.buffer.read(self.entry_offset(variant, part)?)
    }

    /// Returns whether the stored entry changed.
    pub fn set(&mut self, variant: u16, part: usize, entry: ImcEntry) -> bool {
        let Some(offset) = self.entry_offset(variant, part) else {
            return false;
        };

        self.buffer.read::<ImcEntry>(offset) != Some(entry) && self.buffer.write(offset, &entry)
    }

    pub fn default_entry(&self, variant: u16, part: usize) -> Option<ImcEntry> {
        let offset = self.entry_offset(variant, part)?;
        ImcEntry::read(&mut Cursor::new(self.default_data.get(offset..)?)).ok()
    }

    /// Writes the entry, returns false if the part or variant doesn't exist.
    pub fn apply(&mut self, variant: u16, part: usize, entry: ImcEntry) -> bool {
        if self.entry_offset(variant, part).is_none() {
            return false;
        }

        self.set(variant, part, entry);
        true
    }

    pub fn revert(&mut self, variant: u16, part: usize) -> bool {
        match self.default_entry(variant, part) {
            Some(default) => self.apply(variant, part, default),
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.buffer
            .as_mut_slice()
            .copy_from_slice(&self.default_data);
    }

    /// A copy of the current contents, for handing to the load hook.
    pub fn snapshot(&self) -> Arc<[u8]> {
        Arc::from(self.buffer.as_slice())
    }
}

impl ExpandedTable for ImcFile {
    fn buffer(&self) -> &MetaBuffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut MetaBuffer {
        &mut self.buffer
    }
}
