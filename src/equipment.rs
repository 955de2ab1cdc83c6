// SPDX-FileCopyrightText: 2023 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

/// Equipment and accessory slots that meta tables distinguish between.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Slot {
    Head,
    Hands,
    Legs,
    Feet,
    Body,
    Ears,
    Neck,
    Wrists,
    RFinger,
    LFinger,
}

impl Slot {
    /// Whether this slot is stored in the accessory variants of tables, such as the accessory deformer parameters.
    pub fn is_accessory(self) -> bool {
        matches!(
            self,
            Slot::Ears | Slot::Neck | Slot::Wrists | Slot::RFinger | Slot::LFinger
        )
    }

    /// The index of this slot's part inside of an IMC file.
    ///
    /// Equipment and accessories share the same five parts.
    pub fn imc_part_index(self) -> usize {
        match self {
            Slot::Head | Slot::Ears => 0,
            Slot::Body | Slot::Neck => 1,
            Slot::Hands | Slot::Wrists => 2,
            Slot::Legs | Slot::RFinger => 3,
            Slot::Feet | Slot::LFinger => 4,
        }
    }
}

/// The kind of game object an IMC file belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectType {
    Equipment,
    Accessory,
    Weapon,
    Monster,
    DemiHuman,
}

impl ObjectType {
    /// Whether IMC files of this object type only have a single part, regardless of slot.
    pub fn is_single_part(self) -> bool {
        matches!(self, ObjectType::Weapon | ObjectType::Monster)
    }
}

/// Builds the path of the IMC file for an object.
///
/// `primary_id` is the set, weapon, monster or demihuman id. `secondary_id` is the body id for weapons and monsters, or the equipment id for demihumans and is ignored otherwise.
pub fn build_imc_path(object_type: ObjectType, primary_id: u16, secondary_id: u16) -> String {
    match object_type {
        ObjectType::Equipment => {
            format!("chara/equipment/e{primary_id:04}/e{primary_id:04}.imc")
        }
        ObjectType::Accessory => {
            format!("chara/accessory/a{primary_id:04}/a{primary_id:04}.imc")
        }
        ObjectType::Weapon => format!(
            "chara/weapon/w{primary_id:04}/obj/body/b{secondary_id:04}/b{secondary_id:04}.imc"
        ),
        ObjectType::Monster => format!(
            "chara/monster/m{primary_id:04}/obj/body/b{secondary_id:04}/b{secondary_id:04}.imc"
        ),
        ObjectType::DemiHuman => format!(
            "chara/demihuman/d{primary_id:04}/obj/equipment/e{secondary_id:04}/e{secondary_id:04}.imc"
        ),
    }
}
