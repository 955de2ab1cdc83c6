// SPDX-FileCopyrightText: 2023 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Arc;

use binrw::binrw;

use crate::buffer::{read_le, ExpandedTable, MetaBuffer};
use crate::race::Subrace;
use crate::Error;

/// Where the racial scaling records start in `human.cmp`.
pub const RACIAL_SCALING_START: usize = 0x2A800;
const PARAMETER_SIZE: usize = std::mem::size_of::<RacialScalingParameters>();
const PARAMETER_COUNT: usize = 72;

#[binrw]
#[brw(little)]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RacialScalingParameters {
    pub male_min_size: f32,
    pub male_max_size: f32,

    pub male_min_tail: f32,
    pub male_max_tail: f32,

    pub female_min_size: f32,
    pub female_max_size: f32,

    pub female_min_tail: f32,
    pub female_max_tail: f32,

    pub bust_min_x: f32,
    pub bust_min_y: f32,
    pub bust_min_z: f32,

    pub bust_max_x: f32,
    pub bust_max_y: f32,
    pub bust_max_z: f32,
}

impl RacialScalingParameters {
    pub fn get(&self, attribute: RspAttribute) -> f32 {
        match attribute {
            RspAttribute::MaleMinSize => self.male_min_size,
            RspAttribute::MaleMaxSize => self.male_max_size,
            RspAttribute::MaleMinTail => self.male_min_tail,
            RspAttribute::MaleMaxTail => self.male_max_tail,
            RspAttribute::FemaleMinSize => self.female_min_size,
            RspAttribute::FemaleMaxSize => self.female_max_size,
            RspAttribute::FemaleMinTail => self.female_min_tail,
            RspAttribute::FemaleMaxTail => self.female_max_tail,
            RspAttribute::BustMinX => self.bust_min_x,
            RspAttribute::BustMinY => self.bust_min_y,
            RspAttribute::BustMinZ => self.bust_min_z,
            RspAttribute::BustMaxX => self.bust_max_x,
            RspAttribute::BustMaxY => self.bust_max_y,
            RspAttribute::BustMaxZ => self.bust_max_z,
        }
    }
}

/// One of the scaling values of a subrace.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RspAttribute {
    MaleMinSize,
    MaleMaxSize,
    MaleMinTail,
    MaleMaxTail,
    FemaleMinSize,
    FemaleMaxSize,
    FemaleMinTail,
    FemaleMaxTail,
    BustMinX,
    BustMinY,
    BustMinZ,
    BustMaxX,
    BustMaxY,
    BustMaxZ,
}

impl RspAttribute {
    pub const ALL: [RspAttribute; 14] = [
        RspAttribute::MaleMinSize,
        RspAttribute::MaleMaxSize,
        RspAttribute::MaleMinTail,
        RspAttribute::MaleMaxTail,
        RspAttribute::FemaleMinSize,
        RspAttribute::FemaleMaxSize,
        RspAttribute::FemaleMinTail,
        RspAttribute::FemaleMaxTail,
        RspAttribute::BustMinX,
        RspAttribute::BustMinY,
        RspAttribute::BustMinZ,
        RspAttribute::BustMaxX,
        RspAttribute::BustMaxY,
        RspAttribute::BustMaxZ,
    ];

    /// Byte offset inside a record.
    fn offset(self) -> usize {
        self as usize * std::mem::size_of::<f32>()
    }
}

/// Index of the subrace's record. Each race occupies ten records, the two clans are the first two.
fn parameter_index(subrace: Subrace) -> usize {
    let position = Subrace::ALL
        .iter()
        .position(|s| *s == subrace)
        .unwrap_or_default();
    (position / 2) * 10 + position % 2
}

fn value_offset(subrace: Subrace, attribute: RspAttribute) -> usize {
    RACIAL_SCALING_START + parameter_index(subrace) * PARAMETER_SIZE + attribute.offset()
}

/// The expanded `human.cmp`, which is just a full copy of the file.
#[derive(Debug)]
pub struct CmpFile {
    buffer: MetaBuffer,
    default_data: Arc<[u8]>,
}

impl CmpFile {
    pub fn from_existing(path: &str, default_data: Arc<[u8]>) -> Result<Self, Error> {
        if default_data.len() < RACIAL_SCALING_START + PARAMETER_COUNT * PARAMETER_SIZE {
            return Err(Error::FileParsingFailed {
                path: path.to_string(),
            });
        }

        Ok(Self {
            buffer: MetaBuffer::from_slice(&default_data, default_data.len()),
            default_data,
        })
    }

    /// Every scaling value of a subrace.
    pub fn parameters(&self, subrace: Subrace) -> Option<RacialScalingParameters> {
        self.buffer
            .read(RACIAL_SCALING_START + parameter_index(subrace) * PARAMETER_SIZE)
    }

    pub fn get(&self, subrace: Subrace, attribute: RspAttribute) -> Option<f32> {
        self.buffer.read(value_offset(subrace, attribute))
    }

    /// Returns whether the stored value changed.
    pub fn set(&mut self, subrace: Subrace, attribute: RspAttribute, value: f32) -> bool {
        match self.get(subrace, attribute) {
            Some(old) if old.to_bits() != value.to_bits() => {
                self.buffer.write(value_offset(subrace, attribute), &value)
            }
            _ => false,
        }
    }

    pub fn default_entry(&self, subrace: Subrace, attribute: RspAttribute) -> f32 {
        read_le(&self.default_data, value_offset(subrace, attribute)).unwrap_or_default()
    }

    pub fn apply(&mut self, subrace: Subrace, attribute: RspAttribute, value: f32) -> bool {
        self.set(subrace, attribute, value);
        self.get(subrace, attribute)
            .is_some_and(|stored| stored.to_bits() == value.to_bits())
    }

    pub fn revert(&mut self, subrace: Subrace, attribute: RspAttribute) -> bool {
        let default = self.default_entry(subrace, attribute);
        self.apply(subrace, attribute, default)
    }

    pub fn reset(&mut self) {
        let len = self.default_data.len();
        self.buffer.as_mut_slice()[..len].copy_from_slice(&self.default_data);
    }
}

impl ExpandedTable for CmpFile {
    fn buffer(&self) -> &MetaBuffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut MetaBuffer {
        &mut self.buffer
    }
}
