// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Arc;

use modular_bitfield::prelude::*;

use crate::buffer::{ExpandedTable, MetaBuffer};
use crate::eqp::ExpandedBlocks;
use crate::Error;

/// Gimmick parameters, which control how visors and other moving parts of headgear behave.
#[bitfield]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GmpEntry {
    pub enabled: bool,
    pub animated: bool,
    pub rotation_a: B10,
    pub rotation_b: B10,
    pub rotation_c: B10,
    pub unknown_a: B4,
    pub unknown_b: B4,
    #[skip]
    __: B24,
}

impl GmpEntry {
    pub fn from_u64(value: u64) -> Self {
        Self::from_bytes(value.to_le_bytes())
    }

    pub fn to_u64(self) -> u64 {
        u64::from_le_bytes(self.into_bytes())
    }
}

impl Default for GmpEntry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for GmpEntry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.to_u64())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for GmpEntry {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <u64 as serde::Deserialize>::deserialize(deserializer).map(GmpEntry::from_u64)
    }
}

/// The expanded gimmick parameter table. Absent blocks are all zero.
#[derive(Debug)]
pub struct ExpandedGmpFile {
    blocks: ExpandedBlocks,
}

impl ExpandedGmpFile {
    /// Expands the unmodified table at `path`.
    pub fn from_existing(path: &str, default_data: Arc<[u8]>) -> Result<Self, Error> {
        Ok(Self {
            blocks: ExpandedBlocks::new(path, default_data, 0)?,
        })
    }

    pub fn get(&self, set_id: u16) -> Option<GmpEntry> {
        self.blocks.get(set_id).map(GmpEntry::from_u64)
    }

    /// Overwrites the entry, returns whether it changed.
    pub fn set(&mut self, set_id: u16, entry: GmpEntry) -> bool {
        self.blocks
            .set_masked(set_id, entry.to_u64(), u64::MAX)
            .unwrap_or_default()
    }

    /// The unmodified entry for `set_id`.
    pub fn default_entry(&self, set_id: u16) -> GmpEntry {
        GmpEntry::from_u64(self.blocks.default_entry(set_id))
    }

    /// Writes `entry`, returns false if the set id is out of range.
    pub fn apply(&mut self, set_id: u16, entry: GmpEntry) -> bool {
        self.blocks
            .set_masked(set_id, entry.to_u64(), u64::MAX)
            .is_some()
    }

    /// Restores the default entry for `set_id`.
    pub fn revert(&mut self, set_id: u16) -> bool {
        let default = self.default_entry(set_id);
        self.apply(set_id, default)
    }

    /// Restores every entry.
    pub fn reset(&mut self) {
        self.blocks.reset();
    }
}

impl ExpandedTable for ExpandedGmpFile {
    fn buffer(&self) -> &MetaBuffer {
        self.blocks.buffer()
    }

    fn buffer_mut(&mut self) -> &mut MetaBuffer {
        self.blocks.buffer_mut()
    }
}

#[cfg(test)]
mod tests {
    use crate::eqp::tests::test_table;

    use super::*;

    const PATH: &str = "chara/xls/equipmentparameter/gimmickparameter.gmp";

    #[test]
    fn bit_layout() {
        let entry = GmpEntry::new()
            .with_enabled(true)
            .with_animated(true)
            .with_rotation_a(0x3FF)
            .with_unknown_a(0xF);

        assert_eq!(entry.to_u64(), 0b11 | (0x3FF << 2) | (0xF << 32));
        assert_eq!(GmpEntry::from_u64(entry.to_u64()), entry);

        let entry = GmpEntry::from_u64(0x3FF << 22);
        assert_eq!(entry.rotation_c(), 0x3FF);
        assert_eq!(entry.rotation_b(), 0);
    }

    #[test]
    fn absent_blocks_are_zero() {
        let file = ExpandedGmpFile::from_existing(PATH, Arc::from(test_table())).unwrap();

        assert_eq!(file.get(200), Some(GmpEntry::default()));
        assert_eq!(file.get(6).unwrap().to_u64(), 0x106);
    }

    #[test]
    fn apply_and_revert() {
        let mut file = ExpandedGmpFile::from_existing(PATH, Arc::from(test_table())).unwrap();
        let entry = GmpEntry::new().with_enabled(true).with_rotation_b(12);

        assert!(file.apply(200, entry));
        assert_eq!(file.get(200), Some(entry));
        assert!(!file.set(200, entry));

        assert!(file.revert(200));
        assert_eq!(file.get(200), Some(GmpEntry::default()));

        assert!(!file.apply(u16::MAX, entry));
    }
}
