// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::cmp::Ordering;
use std::sync::Arc;

use binrw::binrw;

use crate::buffer::{read_le, ExpandedTable, MetaBuffer};
use crate::race::GenderRace;
use crate::Error;

const COUNT_SIZE: usize = 4;
const DESCRIPTOR_SIZE: usize = 4;
const ENTRY_SIZE: usize = 2;
/// Tables grow in steps of this many bytes.
pub const INCREASE_SIZE: usize = 512;

/// The four extra skeleton tables.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum EstType {
    Face,
    Hair,
    Body,
    Head,
}

impl EstType {
    pub const ALL: [EstType; 4] = [EstType::Face, EstType::Hair, EstType::Body, EstType::Head];

    pub fn game_path(self) -> &'static str {
        match self {
            EstType::Face => "chara/xls/charadb/faceskeletontemplate.est",
            EstType::Hair => "chara/xls/charadb/hairskeletontemplate.est",
            EstType::Body => "chara/xls/charadb/extra_top.est",
            EstType::Head => "chara/xls/charadb/extra_met.est",
        }
    }
}

#[binrw]
#[brw(little)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct EstDescriptor {
    set_id: u16,
    gender_race: u16,
}

impl EstDescriptor {
    fn compare(&self, gender_race: u16, set_id: u16) -> Ordering {
        self.gender_race
            .cmp(&gender_race)
            .then(self.set_id.cmp(&set_id))
    }
}

/// What a single write did to the table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EstEntryChange {
    Unchanged,
    Changed,
    Added,
    Removed,
}

fn entry_count(data: &[u8]) -> usize {
    read_le::<u32>(data, 0).unwrap_or_default() as usize
}

fn table_size(count: usize) -> usize {
    COUNT_SIZE + count * (DESCRIPTOR_SIZE + ENTRY_SIZE)
}

fn descriptor(data: &[u8], index: usize) -> Option<EstDescriptor> {
    read_le(data, COUNT_SIZE + index * DESCRIPTOR_SIZE)
}

fn skeleton(data: &[u8], count: usize, index: usize) -> Option<u16> {
    read_le(
        data,
        COUNT_SIZE + count * DESCRIPTOR_SIZE + index * ENTRY_SIZE,
    )
}

/// Binary search over the sorted descriptors.
fn find(data: &[u8], gender_race: u16, set_id: u16) -> Result<usize, usize> {
    let (mut low, mut high) = (0, entry_count(data));
    while low < high {
        let middle = low + (high - low) / 2;
        match descriptor(data, middle).map(|d| d.compare(gender_race, set_id)) {
            Some(Ordering::Less) => low = middle + 1,
            Some(Ordering::Greater) => high = middle,
            Some(Ordering::Equal) => return Ok(middle),
            None => return Err(middle),
        }
    }

    Err(low)
}

/// Looks up the skeleton id of an unmodified table, 0 if there is none.
pub fn lookup_skeleton(data: &[u8], gender_race: GenderRace, set_id: u16) -> u16 {
    match find(data, gender_race.id(), set_id) {
        Ok(index) => skeleton(data, entry_count(data), index).unwrap_or_default(),
        Err(_) => 0,
    }
}

fn capacity_for(size: usize) -> usize {
    (size / INCREASE_SIZE + 1) * INCREASE_SIZE
}

/// An extra skeleton table. Unlike the other tables this one is a sorted list, so it grows and shrinks as entries are set.
#[derive(Debug)]
pub struct EstFile {
    buffer: MetaBuffer,
    default_data: Arc<[u8]>,
}

impl EstFile {
    /// Copies the unmodified table at `path`, with some room to grow.
    pub fn from_existing(path: &str, default_data: Arc<[u8]>) -> Result<Self, Error> {
        if default_data.len() < COUNT_SIZE
            || default_data.len() < table_size(entry_count(&default_data))
        {
            return Err(Error::FileParsingFailed {
                path: path.to_string(),
            });
        }

        Ok(Self {
            buffer: MetaBuffer::from_slice(&default_data, capacity_for(default_data.len())),
            default_data,
        })
    }

    /// Number of entries currently in the table.
    pub fn count(&self) -> usize {
        entry_count(self.buffer.as_slice())
    }

    /// Number of bytes the table currently occupies in its buffer.
    pub fn size(&self) -> usize {
        table_size(self.count())
    }

    /// The skeleton id for a gender-race and set, 0 if there is none.
    pub fn get(&self, gender_race: GenderRace, set_id: u16) -> u16 {
        lookup_skeleton(self.buffer.as_slice(), gender_race, set_id)
    }

    /// The unmodified skeleton id.
    pub fn default_entry(&self, gender_race: GenderRace, set_id: u16) -> u16 {
        lookup_skeleton(&self.default_data, gender_race, set_id)
    }

    /// The buffer length needed before an entry for this gender-race and set could be added, if the current one is too small.
    pub fn required_len(&self, gender_race: GenderRace, set_id: u16) -> Option<usize> {
        let data = self.buffer.as_slice();
        if find(data, gender_race.id(), set_id).is_ok() {
            return None;
        }

        let needed = self.size() + DESCRIPTOR_SIZE + ENTRY_SIZE;
        (needed > data.len()).then(|| capacity_for(needed))
    }

    fn entries(&self) -> Vec<(EstDescriptor, u16)> {
        let data = self.buffer.as_slice();
        let count = self.count();
        (0..count)
            .filter_map(|i| Some((descriptor(data, i)?, skeleton(data, count, i)?)))
            .collect()
    }

    /// Rewrites the whole table in place. Fails if the buffer is too small.
    fn write_entries(&mut self, entries: &[(EstDescriptor, u16)]) -> bool {
        let size = table_size(entries.len());
        if size > self.buffer.len() {
            return false;
        }

        self.buffer.write(0, &(entries.len() as u32));
        for (i, (descriptor, _)) in entries.iter().enumerate() {
            self.buffer
                .write(COUNT_SIZE + i * DESCRIPTOR_SIZE, descriptor);
        }

        let skeleton_offset = COUNT_SIZE + entries.len() * DESCRIPTOR_SIZE;
        for (i, (_, skeleton)) in entries.iter().enumerate() {
            self.buffer
                .write(skeleton_offset + i * ENTRY_SIZE, skeleton);
        }

        self.buffer.as_mut_slice()[size..].fill(0);

        true
    }

    /// Sets the skeleton id, where 0 removes the entry.
    ///
    /// Returns `None` if a new entry does not fit into the buffer.
    pub fn set_entry(
        &mut self,
        gender_race: GenderRace,
        set_id: u16,
        skeleton_id: u16,
    ) -> Option<EstEntryChange> {
        let data = self.buffer.as_slice();
        let count = self.count();

        match find(data, gender_race.id(), set_id) {
            Ok(index) => {
                if skeleton_id == 0 {
                    let mut entries = self.entries();
                    entries.remove(index);
                    self.write_entries(&entries);
                    Some(EstEntryChange::Removed)
                } else if skeleton(data, count, index) == Some(skeleton_id) {
                    Some(EstEntryChange::Unchanged)
                } else {
                    let offset = COUNT_SIZE + count * DESCRIPTOR_SIZE + index * ENTRY_SIZE;
                    self.buffer
                        .write(offset, &skeleton_id)
                        .then_some(EstEntryChange::Changed)
                }
            }
            Err(_) if skeleton_id == 0 => Some(EstEntryChange::Unchanged),
            Err(index) => {
                if self.size() + DESCRIPTOR_SIZE + ENTRY_SIZE > self.buffer.len() {
                    return None;
                }

                let mut entries = self.entries();
                entries.insert(
                    index,
                    (
                        EstDescriptor {
                            set_id,
                            gender_race: gender_race.id(),
                        },
                        skeleton_id,
                    ),
                );
                self.write_entries(&entries)
                    .then_some(EstEntryChange::Added)
            }
        }
    }

    /// Sets the skeleton id, returns false if it did not fit.
    pub fn apply(&mut self, gender_race: GenderRace, set_id: u16, skeleton_id: u16) -> bool {
        self.set_entry(gender_race, set_id, skeleton_id).is_some()
    }

    /// Restores the unmodified skeleton id.
    pub fn revert(&mut self, gender_race: GenderRace, set_id: u16) -> bool {
        let default = self.default_entry(gender_race, set_id);
        self.apply(gender_race, set_id, default)
    }

    /// Restores the whole table.
    pub fn reset(&mut self) {
        let data = self.buffer.as_mut_slice();
        let len = self.default_data.len().min(data.len());
        data[..len].copy_from_slice(&self.default_data[..len]);
        data[len..].fill(0);
    }
}

impl ExpandedTable for EstFile {
    fn buffer(&self) -> &MetaBuffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut MetaBuffer {
        &mut self.buffer
    }
}
