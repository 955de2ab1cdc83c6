// SPDX-FileCopyrightText: 2023 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

/// The clans, which racial scaling parameters are stored per.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Subrace {
    Midlander,
    Highlander,
    Wildwood,
    Duskwight,
    Plainsfolk,
    Dunesfolk,
    Seeker,
    Keeper,
    SeaWolf,
    Hellsguard,
    Raen,
    Xaela,
    Hellion,
    Lost,
    Rava,
    Veena,
}

impl Subrace {
    pub const ALL: [Subrace; 16] = [
        Subrace::Midlander,
        Subrace::Highlander,
        Subrace::Wildwood,
        Subrace::Duskwight,
        Subrace::Plainsfolk,
        Subrace::Dunesfolk,
        Subrace::Seeker,
        Subrace::Keeper,
        Subrace::SeaWolf,
        Subrace::Hellsguard,
        Subrace::Raen,
        Subrace::Xaela,
        Subrace::Hellion,
        Subrace::Lost,
        Subrace::Rava,
        Subrace::Veena,
    ];
}

mod internal_race {
    use crate::define_gender_race_enum;

    define_gender_race_enum! {
        pub enum GenderRace {
            [101](Hyur, Male, Midlander),
            [201](Hyur, Female, Midlander),
            [301](Hyur, Male, Highlander),
            [401](Hyur, Female, Highlander),

            [501](Elezen, Male),
            [601](Elezen, Female),

            [701](Miqote, Male),
            [801](Miqote, Female),

            [901](Roegadyn, Male),
            [1001](Roegadyn, Female),

            [1101](Lalafell, Male),
            [1201](Lalafell, Female),

            [1301](AuRa, Male),
            [1401](AuRa, Female),

            [1501](Hrothgar, Male),
            [1601](Hrothgar, Female),

            [1701](Viera, Male),
            [1801](Viera, Female)
        }
    }
}

pub use internal_race::GenderRace;
