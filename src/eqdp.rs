// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::Cursor;
use std::sync::Arc;

use binrw::{binrw, BinRead};
use bitflags::bitflags;

use crate::buffer::{read_le, ExpandedTable, MetaBuffer};
use crate::equipment::Slot;
use crate::Error;

/// Marks a block that has no data in the unmodified table.
pub const COLLAPSED_BLOCK: u16 = u16::MAX;

const FIXED_HEADER_SIZE: usize = 6;
const ENTRY_SIZE: usize = 2;
const FILE_ALIGNMENT: usize = 1 << 9;

#[binrw]
#[brw(little)]
#[derive(Debug, Clone)]
struct EqdpHeader {
    identifier: u16,
    block_size: u16,
    block_count: u16,
    #[br(count = block_count)]
    block_offsets: Vec<u16>,
}

impl EqdpHeader {
    fn data_offset(&self) -> usize {
        FIXED_HEADER_SIZE + self.block_count as usize * 2
    }

    fn entry_count(&self) -> usize {
        self.block_size as usize * self.block_count as usize
    }
}

bitflags! {
    /// Deformer parameters, two bits per slot. Accessories reuse the same bits as equipment.
    pub struct EqdpEntry: u16 {
        const HEAD_MATERIAL = 1 << 0;
        const HEAD_MODEL = 1 << 1;
        const BODY_MATERIAL = 1 << 2;
        const BODY_MODEL = 1 << 3;
        const HANDS_MATERIAL = 1 << 4;
        const HANDS_MODEL = 1 << 5;
        const LEGS_MATERIAL = 1 << 6;
        const LEGS_MODEL = 1 << 7;
        const FEET_MATERIAL = 1 << 8;
        const FEET_MODEL = 1 << 9;

        const EARS_MATERIAL = 1 << 0;
        const EARS_MODEL = 1 << 1;
        const NECK_MATERIAL = 1 << 2;
        const NECK_MODEL = 1 << 3;
        const WRISTS_MATERIAL = 1 << 4;
        const WRISTS_MODEL = 1 << 5;
        const RFINGER_MATERIAL = 1 << 6;
        const RFINGER_MODEL = 1 << 7;
        const LFINGER_MATERIAL = 1 << 8;
        const LFINGER_MODEL = 1 << 9;
    }
}

impl EqdpEntry {
    /// The two bits belonging to `slot`.
    pub fn mask(slot: Slot) -> EqdpEntry {
        EqdpEntry::from_bits_truncate(0b11 << (slot.imc_part_index() * 2))
    }

    /// Builds an entry with only the bits of `slot` set as requested.
    pub fn from_slot_and_bits(slot: Slot, material: bool, model: bool) -> EqdpEntry {
        let shift = slot.imc_part_index() * 2;
        EqdpEntry::from_bits_truncate(((material as u16) | ((model as u16) << 1)) << shift)
    }

    /// Returns the (material, model) bits of `slot`.
    pub fn to_bits(self, slot: Slot) -> (bool, bool) {
        let shift = slot.imc_part_index() * 2;
        let bits = self.bits() >> shift;
        (bits & 1 == 1, bits & 2 == 2)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for EqdpEntry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.bits())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for EqdpEntry {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <u16 as serde::Deserialize>::deserialize(deserializer).map(EqdpEntry::from_bits_truncate)
    }
}

/// The expanded deformer parameter table of one gender-race, for either equipment or accessories.
///
/// Keeps the header of the original, but every block is present and stored in order.
#[derive(Debug)]
pub struct ExpandedEqdpFile {
    header: EqdpHeader,
    default_data: Arc<[u8]>,
    buffer: MetaBuffer,
}

impl ExpandedEqdpFile {
    /// Expands the unmodified table at `path`.
    pub fn from_existing(path: &str, default_data: Arc<[u8]>) -> Result<Self, Error> {
        let parsing_failed = || Error::FileParsingFailed {
            path: path.to_string(),
        };

        let header =
            EqdpHeader::read(&mut Cursor::new(&*default_data)).map_err(|_| parsing_failed())?;

        if header.block_size == 0
            || header.entry_count() > u16::MAX as usize + header.block_size as usize
        {
            return Err(parsing_failed());
        }

        let data_offset = header.data_offset();
        let block_size = header.block_size as usize;
        for offset in &header.block_offsets {
            if *offset == COLLAPSED_BLOCK {
                continue;
            }

            let end = data_offset + (*offset as usize + block_size) * ENTRY_SIZE;
            if end > default_data.len() {
                return Err(parsing_failed());
            }
        }

        let length = data_offset + header.entry_count() * ENTRY_SIZE;
        let aligned = length.div_ceil(FILE_ALIGNMENT) * FILE_ALIGNMENT;

        let mut file = Self {
            header,
            default_data,
            buffer: MetaBuffer::new(aligned),
        };
        file.reset();

        Ok(file)
    }

    pub fn identifier(&self) -> u16 {
        self.header.identifier
    }

    /// Number of set ids this table can hold.
    pub fn count(&self) -> usize {
        self.header.entry_count()
    }

    /// Rewrites the whole table from the unmodified one.
    pub fn reset(&mut self) {
        let block_size = self.header.block_size as usize;
        let expanded = EqdpHeader {
            identifier: self.header.identifier,
            block_size: self.header.block_size,
            block_count: self.header.block_count,
            block_offsets: (0..self.header.block_count)
                .map(|block| block.wrapping_mul(self.header.block_size))
                .collect(),
        };
        self.buffer.write(0, &expanded);

        let data_offset = self.header.data_offset();
        let block_bytes = block_size * ENTRY_SIZE;
        let data = self.buffer.as_mut_slice();

        for (block, offset) in self.header.block_offsets.iter().enumerate() {
            let start = data_offset + block * block_bytes;
            let target = &mut data[start..start + block_bytes];
            if *offset == COLLAPSED_BLOCK {
                target.fill(0);
            } else {
                let source = data_offset + *offset as usize * ENTRY_SIZE;
                target.copy_from_slice(&self.default_data[source..source + block_bytes]);
            }
        }

        let end = data_offset + self.header.entry_count() * ENTRY_SIZE;
        data[end..].fill(0);
    }

    fn offset(&self, set_id: u16) -> Option<usize> {
        if set_id as usize >= self.count() {
            return None;
        }

        Some(self.header.data_offset() + set_id as usize * ENTRY_SIZE)
    }

    pub fn get(&self, set_id: u16) -> Option<EqdpEntry> {
        self.buffer
            .read::<u16>(self.offset(set_id)?)
            .map(EqdpEntry::from_bits_truncate)
    }

    /// Overwrites the whole entry, returns whether it changed.
    pub fn set(&mut self, set_id: u16, entry: EqdpEntry) -> bool {
        self.set_masked(set_id, entry, EqdpEntry::all())
            .unwrap_or_default()
    }

    fn set_masked(&mut self, set_id: u16, entry: EqdpEntry, mask: EqdpEntry) -> Option<bool> {
        let offset = self.offset(set_id)?;
        let old = EqdpEntry::from_bits_truncate(self.buffer.read::<u16>(offset)?);
        let new = (old - mask) | (entry & mask);
        if new == old {
            return Some(false);
        }

        self.buffer.write(offset, &new.bits()).then_some(true)
    }

    /// The unmodified entry for `set_id`, empty for collapsed blocks.
    pub fn default_entry(&self, set_id: u16) -> EqdpEntry {
        let block_size = self.header.block_size as usize;
        let block = set_id as usize / block_size;

        let Some(offset) = self.header.block_offsets.get(block) else {
            return EqdpEntry::empty();
        };

        if *offset == COLLAPSED_BLOCK {
            return EqdpEntry::empty();
        }

        let position =
            self.header.data_offset() + (*offset as usize + set_id as usize % block_size) * ENTRY_SIZE;
        read_le(&self.default_data, position)
            .map(EqdpEntry::from_bits_truncate)
            .unwrap_or_else(EqdpEntry::empty)
    }

    /// Writes the bits of `entry` belonging to `slot`, returns false if the set id is out of range.
    pub fn apply(&mut self, set_id: u16, slot: Slot, entry: EqdpEntry) -> bool {
        self.set_masked(set_id, entry, EqdpEntry::mask(slot))
            .is_some()
    }

    /// Restores the bits belonging to `slot` to their defaults.
    pub fn revert(&mut self, set_id: u16, slot: Slot) -> bool {
        let default = self.default_entry(set_id);
        self.apply(set_id, slot, default)
    }
}

impl ExpandedTable for ExpandedEqdpFile {
    fn buffer(&self) -> &MetaBuffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut MetaBuffer {
        &mut self.buffer
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const PATH: &str = "chara/xls/charadb/equipmentdeformerparameter/c0101.eqdp";

    /// Four blocks of four entries, block 1 collapsed and the others stored in reverse order.
    /// Every stored entry is `0x100 | set id`.
    pub(crate) fn test_table() -> Vec<u8> {
        let mut data = Vec::new();
        for value in [0x1234u16, 4, 4, 8, COLLAPSED_BLOCK, 4, 0] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        for block in [3u16, 2, 0] {
            for entry in 0..4u16 {
                data.extend_from_slice(&(0x100 | (block * 4 + entry)).to_le_bytes());
            }
        }
        data
    }

    fn test_file() -> ExpandedEqdpFile {
        ExpandedEqdpFile::from_existing(PATH, Arc::from(test_table())).unwrap()
    }

    #[test]
    fn expansion() {
        let file = test_file();

        assert_eq!(file.identifier(), 0x1234);
        assert_eq!(file.count(), 16);
        assert_eq!(file.buffer().len(), 512);

        // block offsets are rewritten in order
        let offsets: Vec<u16> = (0..4)
            .map(|i| file.buffer().read::<u16>(6 + i * 2).unwrap())
            .collect();
        assert_eq!(offsets, vec![0, 4, 8, 12]);

        assert_eq!(file.get(1).unwrap().bits(), 0x101);
        assert_eq!(file.get(5), Some(EqdpEntry::empty()));
        assert_eq!(file.get(9).unwrap().bits(), 0x109);
        assert_eq!(file.get(14).unwrap().bits(), 0x10E);
        assert_eq!(file.get(16), None);
    }

    #[test]
    fn defaults_follow_block_offsets() {
        let file = test_file();

        for set_id in 0..16u16 {
            assert_eq!(file.default_entry(set_id), file.get(set_id).unwrap());
        }
        assert_eq!(file.default_entry(400), EqdpEntry::empty());
    }

    #[test]
    fn apply_is_masked() {
        let mut file = test_file();
        let entry = EqdpEntry::from_slot_and_bits(Slot::Legs, true, true);

        assert!(file.apply(5, Slot::Legs, entry | EqdpEntry::HEAD_MODEL));
        assert_eq!(file.get(5), Some(EqdpEntry::LEGS_MATERIAL | EqdpEntry::LEGS_MODEL));
        assert_eq!(file.get(5).unwrap().to_bits(Slot::Legs), (true, true));

        assert!(file.revert(5, Slot::Legs));
        assert_eq!(file.get(5), Some(EqdpEntry::empty()));

        assert!(!file.apply(16, Slot::Legs, entry));
    }

    #[test]
    fn accessory_bits() {
        assert_eq!(EqdpEntry::mask(Slot::LFinger), EqdpEntry::mask(Slot::Feet));
        assert_eq!(
            EqdpEntry::from_slot_and_bits(Slot::Neck, false, true),
            EqdpEntry::NECK_MODEL
        );
    }

    #[test]
    fn invalid_table() {
        let mut data = test_table();
        data.truncate(20);
        assert!(ExpandedEqdpFile::from_existing(PATH, Arc::from(data)).is_err());
        assert!(ExpandedEqdpFile::from_existing(PATH, Arc::from(vec![1u8, 2])).is_err());
    }
}
