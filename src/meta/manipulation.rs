// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::cmp::RspAttribute;
use crate::eqdp::EqdpEntry;
use crate::eqp::EqpEntry;
use crate::equipment::{build_imc_path, ObjectType, Slot};
use crate::est::EstType;
use crate::gmp::GmpEntry;
use crate::imc::ImcEntry;
use crate::race::{GenderRace, Subrace};

/// Position of a mod inside of its collection, a higher index has a higher priority.
pub type ModIndex = usize;

/// Changes the equipment parameters of one slot of an item set.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "PascalCase")
)]
pub struct EqpManipulation {
    pub entry: EqpEntry,
    pub set_id: u16,
    pub slot: Slot,
}

/// Set ids 0 and 1 share one table entry, so both map to set 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EqpKey {
    pub set_id: u16,
    pub slot: Slot,
}

impl EqpManipulation {
    pub fn key(&self) -> EqpKey {
        EqpKey {
            set_id: self.set_id.max(1),
            slot: self.slot,
        }
    }
}

/// Changes the gimmick parameters of a head item set.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "PascalCase")
)]
pub struct GmpManipulation {
    pub entry: GmpEntry,
    pub set_id: u16,
}

/// Like [`EqpKey`], set 0 is folded into set 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GmpKey {
    pub set_id: u16,
}

impl GmpManipulation {
    pub fn key(&self) -> GmpKey {
        GmpKey {
            set_id: self.set_id.max(1),
        }
    }
}

/// Changes which gender-race model and material an item set of one slot uses.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "PascalCase")
)]
pub struct EqdpManipulation {
    pub entry: EqdpEntry,
    pub gender_race: GenderRace,
    pub set_id: u16,
    pub slot: Slot,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EqdpKey {
    pub gender_race: GenderRace,
    pub set_id: u16,
    pub slot: Slot,
}

impl EqdpManipulation {
    pub fn key(&self) -> EqdpKey {
        EqdpKey {
            gender_race: self.gender_race,
            set_id: self.set_id,
            slot: self.slot,
        }
    }
}

/// Changes the extra skeleton used for a set, 0 removes it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "PascalCase")
)]
pub struct EstManipulation {
    pub entry: u16,
    pub gender_race: GenderRace,
    pub set_id: u16,
    pub slot: EstType,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EstKey {
    pub gender_race: GenderRace,
    pub set_id: u16,
    pub slot: EstType,
}

impl EstManipulation {
    pub fn key(&self) -> EstKey {
        EstKey {
            gender_race: self.gender_race,
            set_id: self.set_id,
            slot: self.slot,
        }
    }
}

/// Changes one racial scaling value.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "PascalCase")
)]
pub struct RspManipulation {
    pub entry: f32,
    pub sub_race: Subrace,
    pub attribute: RspAttribute,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RspKey {
    pub sub_race: Subrace,
    pub attribute: RspAttribute,
}

impl RspManipulation {
    pub fn key(&self) -> RspKey {
        RspKey {
            sub_race: self.sub_race,
            attribute: self.attribute,
        }
    }
}

/// Changes the image change data of one variant of one part.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "PascalCase")
)]
pub struct ImcManipulation {
    pub entry: ImcEntry,
    pub object_type: ObjectType,
    pub path: String,
    pub equip_slot: Slot,
    pub variant: u16,
}

/// Slots that resolve to the same part of a file share a key.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ImcKey {
    pub path: String,
    pub variant: u16,
    pub part: usize,
}

impl ImcManipulation {
    /// Targets the IMC file of an object by its ids. See [`build_imc_path`].
    pub fn new(
        object_type: ObjectType,
        primary_id: u16,
        secondary_id: u16,
        equip_slot: Slot,
        variant: u16,
        entry: ImcEntry,
    ) -> Self {
        Self {
            entry,
            object_type,
            path: build_imc_path(object_type, primary_id, secondary_id),
            equip_slot,
            variant,
        }
    }

    /// The part inside of the file. Weapons and monsters only have one.
    pub fn part(&self) -> usize {
        if self.object_type.is_single_part() {
            0
        } else {
            self.equip_slot.imc_part_index()
        }
    }

    pub fn key(&self) -> ImcKey {
        ImcKey {
            path: self.path.clone(),
            variant: self.variant,
            part: self.part(),
        }
    }
}

/// A single edit of a meta table, as found in mod packages.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "Type", content = "Manipulation")
)]
pub enum MetaManipulation {
    Eqp(EqpManipulation),
    Gmp(GmpManipulation),
    Eqdp(EqdpManipulation),
    Est(EstManipulation),
    Rsp(RspManipulation),
    Imc(ImcManipulation),
    /// A kind this crate doesn't know about, which is ignored.
    #[cfg_attr(feature = "serde", serde(skip))]
    Unknown,
}

#[cfg(feature = "serde")]
impl MetaManipulation {
    /// Parses the manipulation list of a mod option.
    ///
    /// Entries of kinds that can't be parsed become [`MetaManipulation::Unknown`] instead of failing the whole list.
    pub fn list_from_json(json: &str) -> Result<Vec<MetaManipulation>, serde_json::Error> {
        let values: Vec<serde_json::Value> = serde_json::from_str(json)?;

        Ok(values
            .into_iter()
            .map(|value| {
                serde_json::from_value(value).unwrap_or_else(|err| {
                    tracing::warn!("Ignoring unknown meta manipulation: {err}");
                    MetaManipulation::Unknown
                })
            })
            .collect())
    }
}

macro_rules! impl_from_manipulation {
    ($($variant:ident => $manipulation:ty),+) => {
        $(
            impl From<$manipulation> for MetaManipulation {
                fn from(manipulation: $manipulation) -> Self {
                    MetaManipulation::$variant(manipulation)
                }
            }
        )+
    };
}

impl_from_manipulation! {
    Eqp => EqpManipulation,
    Gmp => GmpManipulation,
    Eqdp => EqdpManipulation,
    Est => EstManipulation,
    Rsp => RspManipulation,
    Imc => ImcManipulation
}
