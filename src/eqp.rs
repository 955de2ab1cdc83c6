// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Arc;

use bitflags::bitflags;

use crate::buffer::{read_le, ExpandedTable, MetaBuffer};
use crate::equipment::Slot;
use crate::Error;

/// Number of entries per block.
pub const BLOCK_SIZE: usize = 160;
/// Number of blocks addressable through the control word.
pub const NUM_BLOCKS: usize = 64;
/// Size of a single entry in bytes.
pub const ENTRY_SIZE: usize = 8;
/// Number of addressable set ids.
pub const ENTRY_COUNT: usize = BLOCK_SIZE * NUM_BLOCKS;

const EXPANDED_SIZE: usize = ENTRY_COUNT * ENTRY_SIZE;
const BLOCK_BYTES: usize = BLOCK_SIZE * ENTRY_SIZE;

bitflags! {
    /// Equipment parameters, mostly controlling which body parts are hidden or shown with a piece equipped.
    pub struct EqpEntry: u64 {
        const BODY_ENABLED = 1 << 0;
        const BODY_HIDE_WAIST = 1 << 1;
        const BODY_HIDE_THIGHS = 1 << 2;
        const BODY_HIDE_GLOVES_S = 1 << 3;
        const BODY_UNKNOWN_4 = 1 << 4;
        const BODY_HIDE_GLOVES_M = 1 << 5;
        const BODY_HIDE_GLOVES_L = 1 << 6;
        const BODY_HIDE_GORGET = 1 << 7;
        const BODY_SHOW_LEG = 1 << 8;
        const BODY_SHOW_HAND = 1 << 9;
        const BODY_SHOW_HEAD = 1 << 10;
        const BODY_SHOW_NECKLACE = 1 << 11;
        const BODY_SHOW_BRACELET = 1 << 12;
        const BODY_SHOW_TAIL = 1 << 13;
        const BODY_DISABLE_BREAST_PHYSICS = 1 << 14;
        const BODY_USES_EVP_TABLE = 1 << 15;

        const LEGS_ENABLED = 1 << 16;
        const LEGS_HIDE_KNEE_PADS = 1 << 17;
        const LEGS_HIDE_BOOTS_S = 1 << 18;
        const LEGS_HIDE_BOOTS_M = 1 << 19;
        const LEGS_UNKNOWN_20 = 1 << 20;
        const LEGS_SHOW_FOOT = 1 << 21;
        const LEGS_SHOW_TAIL = 1 << 22;
        const LEGS_UNKNOWN_23 = 1 << 23;

        const HANDS_ENABLED = 1 << 24;
        const HANDS_HIDE_ELBOW = 1 << 25;
        const HANDS_HIDE_FOREARM = 1 << 26;
        const HANDS_UNKNOWN_27 = 1 << 27;
        const HANDS_SHOW_BRACELET = 1 << 28;
        const HANDS_SHOW_RING_L = 1 << 29;
        const HANDS_SHOW_RING_R = 1 << 30;
        const HANDS_UNKNOWN_31 = 1 << 31;

        const FEET_ENABLED = 1 << 32;
        const FEET_HIDE_KNEE = 1 << 33;
        const FEET_HIDE_CALF = 1 << 34;
        const FEET_HIDE_ANKLE = 1 << 35;
        const FEET_UNKNOWN_36 = 1 << 36;
        const FEET_UNKNOWN_37 = 1 << 37;
        const FEET_UNKNOWN_38 = 1 << 38;
        const FEET_UNKNOWN_39 = 1 << 39;

        const HEAD_ENABLED = 1 << 40;
        const HEAD_HIDE_SCALP = 1 << 41;
        const HEAD_HIDE_HAIR = 1 << 42;
        const HEAD_SHOW_HAIR_OVERRIDE = 1 << 43;
        const HEAD_HIDE_NECK = 1 << 44;
        const HEAD_SHOW_NECKLACE = 1 << 45;
        const HEAD_UNKNOWN_46 = 1 << 46;
        const HEAD_SHOW_EARRINGS = 1 << 47;
        const HEAD_SHOW_EARRINGS_HUMAN = 1 << 48;
        const HEAD_SHOW_EARRINGS_AURA = 1 << 49;
        const HEAD_SHOW_EAR_HUMAN = 1 << 50;
        const HEAD_SHOW_EAR_MIQOTE = 1 << 51;
        const HEAD_SHOW_EAR_AURA = 1 << 52;
        const HEAD_SHOW_EAR_VIERA = 1 << 53;
        const HEAD_UNKNOWN_54 = 1 << 54;
        const HEAD_UNKNOWN_55 = 1 << 55;
        const HEAD_SHOW_HROTHGAR_HAT = 1 << 56;
        const HEAD_SHOW_VIERA_HAT = 1 << 57;
        const HEAD_UNKNOWN_58 = 1 << 58;
        const HEAD_UNKNOWN_59 = 1 << 59;
        const HEAD_UNKNOWN_60 = 1 << 60;
        const HEAD_UNKNOWN_61 = 1 << 61;
        const HEAD_UNKNOWN_62 = 1 << 62;
        const HEAD_UNKNOWN_63 = 1 << 63;
    }
}

impl EqpEntry {
    /// What the game uses for set ids that have no block in the table.
    pub const DEFAULT: EqpEntry = EqpEntry::from_bits_truncate(0x3FE0_0070_603F_00);

    /// The bits of the entry that belong to `slot`. Empty for slots without equipment parameters.
    pub fn mask(slot: Slot) -> EqpEntry {
        let bits = match slot {
            Slot::Body => 0xFFFF,
            Slot::Legs => 0xFF << 16,
            Slot::Hands => 0xFF << 24,
            Slot::Feet => 0xFF << 32,
            Slot::Head => 0xFF_FFFF << 40,
            _ => 0,
        };

        EqpEntry::from_bits_truncate(bits)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for EqpEntry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.bits())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for EqpEntry {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <u64 as serde::Deserialize>::deserialize(deserializer).map(EqpEntry::from_bits_truncate)
    }
}

/// Maps a set id to its entry index. Set 0 shares the entry of set 1, since entry 0 holds the control word.
fn entry_index(set_id: u16) -> Option<usize> {
    match set_id as usize {
        index if index >= ENTRY_COUNT => None,
        0 | 1 => Some(1),
        index => Some(index),
    }
}

/// Looks up the entry for `set_id` in an unmodified, block-compressed table.
///
/// Returns `fallback` for set ids in blocks the control word marks as absent.
pub fn lookup_compressed(data: &[u8], set_id: u16, fallback: u64) -> u64 {
    let Some(index) = entry_index(set_id) else {
        return fallback;
    };

    let Some(control) = read_le::<u64>(data, 0) else {
        return fallback;
    };

    let block = index / BLOCK_SIZE;
    let block_bit = 1u64 << block;
    if control & block_bit == 0 {
        return fallback;
    }

    let stored_block = (control & (block_bit - 1)).count_ones() as usize;
    let offset = (stored_block * BLOCK_SIZE + index % BLOCK_SIZE) * ENTRY_SIZE;

    read_le(data, offset).unwrap_or(fallback)
}

/// The expanded layout shared by the equipment and gimmick parameter tables.
#[derive(Debug)]
pub(crate) struct ExpandedBlocks {
    buffer: MetaBuffer,
    default_data: Arc<[u8]>,
    empty_entry: u64,
}

impl ExpandedBlocks {
    pub(crate) fn new(path: &str, default_data: Arc<[u8]>, empty_entry: u64) -> Result<Self, Error> {
        let control = read_le::<u64>(&default_data, 0).ok_or_else(|| Error::FileParsingFailed {
            path: path.to_string(),
        })?;

        if default_data.len() < control.count_ones() as usize * BLOCK_BYTES {
            return Err(Error::FileParsingFailed {
                path: path.to_string(),
            });
        }

        let mut blocks = Self {
            buffer: MetaBuffer::new(EXPANDED_SIZE),
            default_data,
            empty_entry,
        };
        blocks.reset();

        Ok(blocks)
    }

    /// Expands every block of the unmodified table, filling absent ones with the empty entry.
    pub(crate) fn reset(&mut self) {
        let control = read_le::<u64>(&self.default_data, 0).unwrap_or_default();
        let empty = self.empty_entry.to_le_bytes();
        let data = self.buffer.as_mut_slice();

        let mut stored_blocks = 0;
        for block in 0..NUM_BLOCKS {
            let target = &mut data[block * BLOCK_BYTES..(block + 1) * BLOCK_BYTES];
            if (control >> block) & 1 == 1 {
                let source = stored_blocks * BLOCK_BYTES;
                target.copy_from_slice(&self.default_data[source..source + BLOCK_BYTES]);
                stored_blocks += 1;
            } else {
                for entry in target.chunks_exact_mut(ENTRY_SIZE) {
                    entry.copy_from_slice(&empty);
                }
            }
        }

        data[..ENTRY_SIZE].copy_from_slice(&u64::MAX.to_le_bytes());
    }

    pub(crate) fn get(&self, set_id: u16) -> Option<u64> {
        self.buffer.read(entry_index(set_id)? * ENTRY_SIZE)
    }

    /// Writes the bits under `mask`, returns whether anything changed or `None` if out of range.
    pub(crate) fn set_masked(&mut self, set_id: u16, value: u64, mask: u64) -> Option<bool> {
        let offset = entry_index(set_id)? * ENTRY_SIZE;
        let old: u64 = self.buffer.read(offset)?;
        let new = (old & !mask) | (value & mask);
        if new == old {
            return Some(false);
        }

        self.buffer.write(offset, &new).then_some(true)
    }

    pub(crate) fn default_entry(&self, set_id: u16) -> u64 {
        lookup_compressed(&self.default_data, set_id, self.empty_entry)
    }

    pub(crate) fn buffer(&self) -> &MetaBuffer {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut MetaBuffer {
        &mut self.buffer
    }
}

/// The expanded equipment parameter table.
#[derive(Debug)]
pub struct ExpandedEqpFile {
    blocks: ExpandedBlocks,
}

impl ExpandedEqpFile {
    /// Expands the unmodified table at `path`.
    pub fn from_existing(path: &str, default_data: Arc<[u8]>) -> Result<Self, Error> {
        Ok(Self {
            blocks: ExpandedBlocks::new(path, default_data, EqpEntry::DEFAULT.bits())?,
        })
    }

    pub fn get(&self, set_id: u16) -> Option<EqpEntry> {
        self.blocks.get(set_id).map(EqpEntry::from_bits_truncate)
    }

    /// Overwrites the whole entry, returns whether it changed.
    pub fn set(&mut self, set_id: u16, entry: EqpEntry) -> bool {
        self.blocks
            .set_masked(set_id, entry.bits(), u64::MAX)
            .unwrap_or_default()
    }

    /// The unmodified entry for `set_id`.
    pub fn default_entry(&self, set_id: u16) -> EqpEntry {
        EqpEntry::from_bits_truncate(self.blocks.default_entry(set_id))
    }

    /// Writes the bits of `entry` belonging to `slot`.
    ///
    /// Returns false if the set id is out of range or the slot has no equipment parameters.
    pub fn apply(&mut self, set_id: u16, slot: Slot, entry: EqpEntry) -> bool {
        let mask = EqpEntry::mask(slot);
        if mask.is_empty() {
            return false;
        }

        self.blocks
            .set_masked(set_id, entry.bits(), mask.bits())
            .is_some()
    }

    /// Restores the bits belonging to `slot` to their defaults.
    pub fn revert(&mut self, set_id: u16, slot: Slot) -> bool {
        let default = self.default_entry(set_id);
        self.apply(set_id, slot, default)
    }

    /// Restores every entry.
    pub fn reset(&mut self) {
        self.blocks.reset();
    }
}

impl ExpandedTable for ExpandedEqpFile {
    fn buffer(&self) -> &MetaBuffer {
        self.blocks.buffer()
    }

    fn buffer_mut(&mut self) -> &mut MetaBuffer {
        self.blocks.buffer_mut()
    }
}
