// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

#![allow(dead_code)]

use std::sync::Arc;

use xivmeta::bridge::MetaIndex;
use xivmeta::cmp::RACIAL_SCALING_START;
use xivmeta::defaults::GameDefaults;
use xivmeta::eqdp::COLLAPSED_BLOCK;
use xivmeta::est::EstType;
use xivmeta::race::GenderRace;
use xivmeta::resource::MemoryResource;

pub const IMC_PATH: &str = "chara/equipment/e0001/model/c0101e0001_top.imc";
pub const IMC_VARIANTS: u16 = 3;

/// Unmodified EQP entry of every set in the test data.
pub fn eqp_default(set_id: u16) -> u64 {
    (1 << 40) | set_id.max(1) as u64
}

/// Only block 0 is present.
pub fn eqp_table() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&1u64.to_le_bytes());
    for set_id in 1..160u16 {
        data.extend_from_slice(&eqp_default(set_id).to_le_bytes());
    }
    data
}

pub fn gmp_table() -> Vec<u8> {
    let mut data = vec![0u8; 160 * 8];
    data[0] = 1;
    data
}

/// Eight sets per block, the second block is collapsed.
pub fn eqdp_table() -> Vec<u8> {
    let mut data = Vec::new();
    for value in [0u16, 8, 2, 0, COLLAPSED_BLOCK] {
        data.extend_from_slice(&value.to_le_bytes());
    }
    for _ in 0..8 {
        data.extend_from_slice(&0x3FFu16.to_le_bytes());
    }
    data
}

pub fn est_table() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&7u16.to_le_bytes());
    data.extend_from_slice(&101u16.to_le_bytes());
    data.extend_from_slice(&70u16.to_le_bytes());
    data
}

pub fn cmp_table() -> Vec<u8> {
    let mut data = vec![0u8; RACIAL_SCALING_START];
    for _ in 0..72 * 14 {
        data.extend_from_slice(&1.0f32.to_le_bytes());
    }
    data
}

/// Five parts, every entry of variant `v` uses material `v + 1`.
pub fn imc_table() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&IMC_VARIANTS.to_le_bytes());
    data.extend_from_slice(&0x1Fu16.to_le_bytes());
    for variant in 0..=IMC_VARIANTS {
        for _ in 0..5 {
            data.extend_from_slice(&[variant as u8 + 1, 0, 0x3F, 0, 0, 0]);
        }
    }
    data
}

/// A full set of unmodified tables, except for anything in `missing`.
pub fn game_files(missing: &[&str]) -> MemoryResource {
    let mut files = vec![
        (MetaIndex::Eqp.game_path(), eqp_table()),
        (MetaIndex::Gmp.game_path(), gmp_table()),
        (MetaIndex::HumanCmp.game_path(), cmp_table()),
        (IMC_PATH.to_string(), imc_table()),
    ];
    for gender_race in GenderRace::ALL {
        for accessory in [false, true] {
            let index = MetaIndex::Eqdp {
                gender_race: *gender_race,
                accessory,
            };
            files.push((index.game_path(), eqdp_table()));
        }
    }
    for est_type in EstType::ALL {
        files.push((MetaIndex::Est(est_type).game_path(), est_table()));
    }

    let mut resource = MemoryResource::new();
    for (path, data) in files {
        if !missing.contains(&path.as_str()) {
            resource.insert(&path, data);
        }
    }
    resource
}

pub fn defaults() -> Arc<GameDefaults> {
    Arc::new(GameDefaults::from_resource(game_files(&[])))
}
