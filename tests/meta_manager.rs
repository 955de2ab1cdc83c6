// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use common::*;
use xivmeta::bridge::{ImcLoadHook, MetaIndex, ResourceBridge, ResourceRegistry, ResourceSlot};
use xivmeta::buffer::ExpandedTable;
use xivmeta::cmp::RspAttribute;
use xivmeta::config::MetaConfig;
use xivmeta::defaults::GameDefaults;
use xivmeta::eqdp::EqdpEntry;
use xivmeta::eqp::EqpEntry;
use xivmeta::equipment::{ObjectType, Slot};
use xivmeta::est::EstType;
use xivmeta::gmp::GmpEntry;
use xivmeta::imc::ImcEntry;
use xivmeta::meta::{
    EqdpManipulation, EqpManipulation, EstManipulation, GmpManipulation, ImcManipulation,
    MetaManager, MetaManipulation, RspManipulation,
};
use xivmeta::race::{GenderRace, Subrace};

fn manager(registry: &Arc<ResourceRegistry>) -> MetaManager {
    MetaManager::new(
        "Default",
        defaults(),
        registry.clone(),
        &MetaConfig::default(),
    )
}

fn eqp(set_id: u16, slot: Slot, entry: EqpEntry) -> MetaManipulation {
    EqpManipulation {
        entry,
        set_id,
        slot,
    }
    .into()
}

fn imc(variant: u16, material_id: u8) -> MetaManipulation {
    imc_slot(Slot::Body, variant, material_id)
}

fn imc_slot(equip_slot: Slot, variant: u16, material_id: u8) -> MetaManipulation {
    ImcManipulation {
        entry: ImcEntry {
            material_id,
            ..Default::default()
        },
        object_type: ObjectType::Equipment,
        path: IMC_PATH.to_string(),
        equip_slot,
        variant,
    }
    .into()
}

fn eqdp(set_id: u16, slot: Slot, entry: EqdpEntry) -> MetaManipulation {
    EqdpManipulation {
        entry,
        gender_race: GenderRace::MiqoteFemale,
        set_id,
        slot,
    }
    .into()
}

fn est(set_id: u16, entry: u16) -> MetaManipulation {
    EstManipulation {
        entry,
        gender_race: GenderRace::HyurMidlanderMale,
        set_id,
        slot: EstType::Hair,
    }
    .into()
}

fn gmp(set_id: u16, entry: GmpEntry) -> MetaManipulation {
    GmpManipulation { entry, set_id }.into()
}

fn rsp(entry: f32) -> MetaManipulation {
    RspManipulation {
        entry,
        sub_race: Subrace::Hellion,
        attribute: RspAttribute::MaleMaxSize,
    }
    .into()
}

fn published_u64(registry: &ResourceRegistry, slot: &ResourceSlot, offset: usize) -> u64 {
    let buffer = registry.get(slot).unwrap();
    // the manager is still alive and published in the callers
    let bytes = unsafe { buffer.as_slice() };
    u64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

#[test]
fn eqp_scenario() {
    let registry = Arc::new(ResourceRegistry::new());
    let mut manager = manager(&registry);
    let slot = ResourceSlot::Character(MetaIndex::Eqp);

    let hidden = EqpEntry::HEAD_HIDE_SCALP | EqpEntry::HEAD_HIDE_HAIR;
    let manipulation = eqp(5, Slot::Head, hidden);
    assert!(manager.apply_mod(&manipulation, 0));
    manager.set_files();

    let value = published_u64(&registry, &slot, 5 * 8);
    assert!(EqpEntry::from_bits_truncate(value).contains(EqpEntry::HEAD_HIDE_HAIR));
    assert!(!EqpEntry::from_bits_truncate(value).contains(EqpEntry::HEAD_ENABLED));
    // bits of other slots are untouched
    assert_eq!(value & 0xFF_FFFF_FFFF, eqp_default(5) & 0xFF_FFFF_FFFF);

    assert!(manager.revert_mod(&manipulation));
    assert_eq!(published_u64(&registry, &slot, 5 * 8), eqp_default(5));
    assert_eq!(manager.count(), 0);

    // reverting again is a no-op
    assert!(!manager.revert_mod(&manipulation));
}

#[test]
fn imc_scenario() {
    let registry = Arc::new(ResourceRegistry::new());
    let mut manager = manager(&registry);

    assert!(manager.apply_mod(&imc(3, 20), 0));
    assert!(manager.apply_mod(&imc(3, 30), 1));
    assert_eq!(manager.owner(&imc(3, 0)), Some(1));

    let file = manager.imc_file(IMC_PATH).unwrap();
    let offset = 4 + (3 * 5 + 1) * 6;
    assert_eq!(
        &file.buffer().as_slice()[offset..offset + 6],
        &[30, 0, 0, 0, 0, 0]
    );
    // the other parts of variant 3 keep their data
    assert_eq!(file.get(3, 0).unwrap().material_id, 4);
}

#[test]
fn idempotent_apply() {
    let registry = Arc::new(ResourceRegistry::new());
    let mut manager = manager(&registry);
    let manipulation = eqdp(3, Slot::Wrists, EqdpEntry::WRISTS_MODEL);

    assert!(manager.apply_mod(&manipulation, 2));
    let once = manager
        .eqdp_file(GenderRace::MiqoteFemale, true)
        .unwrap()
        .buffer()
        .as_slice()
        .to_vec();

    assert!(manager.apply_mod(&manipulation, 2));
    let twice = manager
        .eqdp_file(GenderRace::MiqoteFemale, true)
        .unwrap()
        .buffer()
        .as_slice()
        .to_vec();

    assert_eq!(once, twice);
    assert_eq!(manager.count(), 1);
    assert_eq!(manager.owner(&manipulation), Some(2));
}

#[test]
fn revert_restores_defaults() {
    let registry = Arc::new(ResourceRegistry::new());
    let mut manager = manager(&registry);

    let manipulations = [
        eqp(20, Slot::Legs, EqpEntry::empty()),
        gmp(12, GmpEntry::new().with_enabled(true).with_rotation_a(300)),
        eqdp(9, Slot::Feet, EqdpEntry::empty()),
        est(7, 0),
        est(8, 80),
        rsp(2.0),
        imc(1, 9),
    ];

    for manipulation in &manipulations {
        assert!(manager.apply_mod(manipulation, 0), "{manipulation:?}");
    }
    assert_eq!(manager.count(), manipulations.len());

    for manipulation in &manipulations {
        assert!(manager.revert_mod(manipulation), "{manipulation:?}");
        assert_eq!(manager.owner(manipulation), None);
    }
    assert_eq!(manager.count(), 0);

    assert_eq!(
        manager.eqp_file().unwrap().get(20).unwrap().bits(),
        eqp_default(20)
    );
    assert_eq!(manager.gmp_file().unwrap().get(12), Some(GmpEntry::new()));
    assert_eq!(
        manager
            .eqdp_file(GenderRace::MiqoteFemale, false)
            .unwrap()
            .get(9),
        Some(EqdpEntry::empty())
    );
    let est_file = manager.est_file(EstType::Hair).unwrap();
    assert_eq!(est_file.get(GenderRace::HyurMidlanderMale, 7), 70);
    assert_eq!(est_file.get(GenderRace::HyurMidlanderMale, 8), 0);
    assert_eq!(&est_file.buffer().as_slice()[..est_table().len()], &est_table()[..]);
    assert_eq!(
        manager
            .cmp_file()
            .unwrap()
            .get(Subrace::Hellion, RspAttribute::MaleMaxSize),
        Some(1.0)
    );
    assert_eq!(
        manager.imc_file(IMC_PATH).unwrap().buffer().as_slice(),
        &imc_table()[..]
    );
}

#[test]
fn call_order_decides() {
    let registry = Arc::new(ResourceRegistry::new());
    let low = eqp(30, Slot::Body, EqpEntry::BODY_ENABLED);
    let high = eqp(30, Slot::Body, EqpEntry::BODY_ENABLED | EqpEntry::BODY_SHOW_TAIL);

    let mut manager = self::manager(&registry);
    manager.apply_all([(&low, 0), (&high, 1)]);
    assert_eq!(manager.owner(&low), Some(1));
    assert_eq!(
        manager.eqp_file().unwrap().get(30).unwrap().bits() & 0xFFFF,
        (EqpEntry::BODY_ENABLED | EqpEntry::BODY_SHOW_TAIL).bits()
    );
    drop(manager);

    let mut manager = self::manager(&registry);
    manager.apply_all([(&high, 1), (&low, 0)]);
    assert_eq!(manager.owner(&high), Some(0));
    assert_eq!(
        manager.eqp_file().unwrap().get(30).unwrap().bits() & 0xFFFF,
        EqpEntry::BODY_ENABLED.bits()
    );
}

#[test]
fn set_zero_and_set_one_share_an_owner() {
    let registry = Arc::new(ResourceRegistry::new());
    let mut manager = manager(&registry);

    let hidden = EqpEntry::HEAD_HIDE_HAIR | EqpEntry::HEAD_HIDE_SCALP;
    assert!(manager.apply_mod(&eqp(1, Slot::Head, hidden), 7));
    assert!(manager.apply_mod(&eqp(0, Slot::Head, EqpEntry::HEAD_ENABLED), 9));
    assert_eq!(manager.owner(&eqp(1, Slot::Head, hidden)), Some(9));
    assert_eq!(manager.count(), 1);

    assert!(manager.revert_mod(&eqp(0, Slot::Head, EqpEntry::empty())));
    assert_eq!(manager.owner(&eqp(1, Slot::Head, hidden)), None);
    assert_eq!(manager.count(), 0);
    assert_eq!(
        manager.eqp_file().unwrap().get(1).unwrap().bits(),
        eqp_default(1)
    );

    let entry = GmpEntry::new().with_enabled(true).with_rotation_b(40);
    assert!(manager.apply_mod(&gmp(1, entry), 7));
    assert!(manager.apply_mod(&gmp(0, entry.with_rotation_b(41)), 9));
    assert_eq!(manager.owner(&gmp(1, entry)), Some(9));
    assert!(manager.revert_mod(&gmp(1, entry)));
    assert_eq!(manager.owner(&gmp(0, entry)), None);
    assert_eq!(manager.gmp_file().unwrap().get(1), Some(GmpEntry::new()));
}

#[test]
fn imc_slots_of_one_part_share_an_owner() {
    let registry = Arc::new(ResourceRegistry::new());
    let mut manager = manager(&registry);

    // ears and head resolve to the same part of an equipment file
    assert!(manager.apply_mod(&imc_slot(Slot::Head, 2, 50), 1));
    assert!(manager.apply_mod(&imc_slot(Slot::Ears, 2, 60), 2));
    assert_eq!(manager.owner(&imc_slot(Slot::Head, 2, 0)), Some(2));
    assert_eq!(manager.count(), 1);
    assert_eq!(
        manager.imc_file(IMC_PATH).unwrap().get(2, 0).unwrap().material_id,
        60
    );

    assert!(manager.revert_mod(&imc_slot(Slot::Ears, 2, 0)));
    assert_eq!(manager.owner(&imc_slot(Slot::Head, 2, 0)), None);
    assert_eq!(manager.count(), 0);
    assert_eq!(
        manager.imc_file(IMC_PATH).unwrap().get(2, 0).unwrap().material_id,
        3
    );
}

#[test]
fn partial_failure_is_isolated() {
    let registry = Arc::new(ResourceRegistry::new());
    let mut manager = manager(&registry);

    let batch = [
        imc(1, 11),
        imc(2, 12),
        imc(IMC_VARIANTS + 5, 13),
        imc(3, 14),
    ];
    let applied = manager.apply_all(batch.iter().enumerate().map(|(i, m)| (m, i)));

    assert_eq!(applied, 3);
    assert_eq!(manager.count(), 3);
    assert_eq!(manager.owner(&batch[2]), None);

    let file = manager.imc_file(IMC_PATH).unwrap();
    assert_eq!(file.get(1, 1).unwrap().material_id, 11);
    assert_eq!(file.get(2, 1).unwrap().material_id, 12);
    assert_eq!(file.get(3, 1).unwrap().material_id, 14);
    assert_eq!(manager.error_count(), 0);
}

#[test]
fn reset_is_byte_exact() {
    let registry = Arc::new(ResourceRegistry::new());
    let mut manager = manager(&registry);

    // materialize the tables without changing anything
    assert!(manager.apply_mod(&eqp(1, Slot::Feet, EqpEntry::from_bits_truncate(eqp_default(1))), 0));
    assert!(manager.apply_mod(&est(7, 70), 0));
    assert!(manager.apply_mod(&rsp(1.0), 0));
    assert!(manager.apply_mod(&gmp(5, GmpEntry::new()), 0));
    assert!(manager.apply_mod(&eqdp(3, Slot::Neck, EqdpEntry::from_bits_truncate(0x3FF)), 0));
    let eqp_before = manager.eqp_file().unwrap().buffer().as_slice().to_vec();
    let est_before = manager.est_file(EstType::Hair).unwrap().buffer().as_slice().to_vec();
    let cmp_before = manager.cmp_file().unwrap().buffer().as_slice().to_vec();
    let gmp_before = manager.gmp_file().unwrap().buffer().as_slice().to_vec();
    let eqdp_before = manager
        .eqdp_file(GenderRace::MiqoteFemale, true)
        .unwrap()
        .buffer()
        .as_slice()
        .to_vec();

    for set_id in 0..40 {
        assert!(manager.apply_mod(&eqp(set_id, Slot::Head, EqpEntry::all()), set_id as usize));
        assert!(manager.apply_mod(&est(set_id + 100, set_id + 1), 0));
    }
    assert!(manager.apply_mod(&est(7, 0), 3));
    assert!(manager.apply_mod(&rsp(0.5), 1));
    for set_id in [0, 5, 200, 4000] {
        let entry = GmpEntry::new().with_enabled(true).with_rotation_c(12);
        assert!(manager.apply_mod(&gmp(set_id, entry), 2));
    }
    // the second block is collapsed in the game file
    for set_id in [3, 9, 12] {
        assert!(manager.apply_mod(&eqdp(set_id, Slot::Neck, EqdpEntry::empty()), 2));
        assert!(manager.apply_mod(&eqdp(set_id, Slot::LFinger, EqdpEntry::LFINGER_MATERIAL), 2));
    }

    manager.set_files();
    manager.reset();
    assert_eq!(manager.count(), 0);

    assert_eq!(manager.eqp_file().unwrap().buffer().as_slice(), &eqp_before[..]);
    assert_eq!(manager.est_file(EstType::Hair).unwrap().buffer().as_slice(), &est_before[..]);
    assert_eq!(manager.cmp_file().unwrap().buffer().as_slice(), &cmp_before[..]);
    assert_eq!(manager.gmp_file().unwrap().buffer().as_slice(), &gmp_before[..]);
    assert_eq!(
        manager
            .eqdp_file(GenderRace::MiqoteFemale, true)
            .unwrap()
            .buffer()
            .as_slice(),
        &eqdp_before[..]
    );

    // character tables stay published until disposed
    assert!(registry
        .get(&ResourceSlot::Character(MetaIndex::Eqp))
        .is_some());
    manager.dispose();
    assert!(registry.is_empty());
}

#[test]
fn count_tracks_every_kind() {
    let registry = Arc::new(ResourceRegistry::new());
    let mut manager = manager(&registry);

    let manipulations = [
        eqp(3, Slot::Hands, EqpEntry::HANDS_ENABLED),
        eqdp(3, Slot::Head, EqdpEntry::HEAD_MODEL),
        est(3, 30),
        rsp(1.5),
        imc(2, 5),
    ];
    for (i, manipulation) in manipulations.iter().enumerate() {
        assert!(manager.apply_mod(manipulation, 0));
        assert_eq!(manager.count(), i + 1);
    }

    // a second slot of the same set is a separate entry
    assert!(manager.apply_mod(&eqp(3, Slot::Feet, EqpEntry::empty()), 0));
    assert_eq!(manager.count(), manipulations.len() + 1);

    assert!(!manager.apply_mod(&MetaManipulation::Unknown, 0));
    assert!(!manager.revert_mod(&MetaManipulation::Unknown));
    assert_eq!(manager.count(), manipulations.len() + 1);

    manager.reset();
    assert_eq!(manager.count(), 0);
}

#[test]
fn disabled_kinds_are_ignored() {
    let registry = Arc::new(ResourceRegistry::new());
    let mut manager = MetaManager::new("Imc only", defaults(), registry.clone(), &MetaConfig::imc_only());

    assert!(!manager.apply_mod(&eqp(3, Slot::Head, EqpEntry::empty()), 0));
    assert!(!manager.apply_mod(&rsp(3.0), 0));
    assert!(manager.apply_mod(&imc(1, 3), 0));
    assert!(manager.eqp_file().is_none());
    assert!(manager.cmp_file().is_none());
    assert_eq!(manager.count(), 1);
    assert_eq!(manager.error_count(), 0);
}

#[test]
fn missing_game_file_disables_one_table() {
    let registry = Arc::new(ResourceRegistry::new());
    let missing = MetaIndex::Eqdp {
        gender_race: GenderRace::MiqoteFemale,
        accessory: false,
    }
    .game_path();
    let defaults = Arc::new(GameDefaults::from_resource(game_files(&[missing.as_str()])));
    let mut manager = MetaManager::new("Default", defaults, registry.clone(), &MetaConfig::default());

    assert!(!manager.apply_mod(&eqdp(3, Slot::Body, EqdpEntry::BODY_MODEL), 0));
    assert!(!manager.apply_mod(&eqdp(4, Slot::Body, EqdpEntry::BODY_MODEL), 0));
    assert_eq!(manager.error_count(), 1);

    // the accessory table of the same race is a different file
    assert!(manager.apply_mod(&eqdp(3, Slot::Neck, EqdpEntry::NECK_MODEL), 0));
    assert!(manager.apply_mod(&eqp(3, Slot::Body, EqpEntry::empty()), 0));
    assert_eq!(manager.count(), 2);
}

#[test]
fn imc_hook_follows_tables() {
    let installs = Arc::new(AtomicUsize::new(0));
    let hook = {
        let installs = installs.clone();
        ImcLoadHook::with_installer(move |install| {
            if install {
                installs.fetch_add(1, Ordering::SeqCst);
            }
        })
    };
    let registry = Arc::new(ResourceRegistry::with_imc_hook(hook));
    let mut manager = manager(&registry);

    assert!(!registry.imc_hook().is_installed());
    assert!(manager.apply_mod(&imc(2, 42), 0));
    assert!(manager.apply_mod(&imc(3, 43), 0));
    assert_eq!(registry.imc_hook().users(), 1);
    assert_eq!(installs.load(Ordering::SeqCst), 1);

    let mut data = imc_table();
    assert!(registry.imc_hook().on_load("Default", IMC_PATH, &mut data));
    assert_eq!(data[4 + (2 * 5 + 1) * 6], 42);
    assert_eq!(data.len(), imc_table().len());

    let mut other = imc_table();
    assert!(!registry.imc_hook().on_load("Other", IMC_PATH, &mut other));

    // reverting keeps the file, now with its default contents
    assert!(manager.revert_mod(&imc(2, 0)));
    let mut data = Vec::new();
    assert!(registry.imc_hook().on_load("Default", IMC_PATH, &mut data));
    assert_eq!(data[4 + (2 * 5 + 1) * 6], 3);

    manager.reset();
    assert!(manager.imc_file(IMC_PATH).is_none());
    assert!(!registry.imc_hook().is_installed());
    assert!(!registry.imc_hook().on_load("Default", IMC_PATH, &mut data));
}

#[test]
fn dropping_withdraws_everything() {
    let registry = Arc::new(ResourceRegistry::new());
    {
        let mut manager = manager(&registry);
        assert!(manager.apply_mod(&eqp(3, Slot::Head, EqpEntry::empty()), 0));
        assert!(manager.apply_mod(&imc(1, 2), 0));
        manager.set_files();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.imc_hook().users(), 1);
    }

    assert!(registry.is_empty());
    assert_eq!(registry.imc_hook().users(), 0);
}

#[test]
fn disposing_one_collection_keeps_another_published() {
    let registry = Arc::new(ResourceRegistry::new());
    let slot = ResourceSlot::Character(MetaIndex::Eqp);

    let mut first = MetaManager::new("First", defaults(), registry.clone(), &MetaConfig::default());
    let mut second = MetaManager::new("Second", defaults(), registry.clone(), &MetaConfig::default());
    assert!(first.apply_mod(&eqp(3, Slot::Head, EqpEntry::empty()), 0));
    assert!(second.apply_mod(&eqp(3, Slot::Head, EqpEntry::HEAD_ENABLED), 0));
    first.set_files();
    second.set_files();

    let second_ptr = second.eqp_file().unwrap().buffer().as_slice().as_ptr();
    assert_eq!(registry.get(&slot).unwrap().as_ptr(), second_ptr);

    drop(first);
    assert_eq!(registry.get(&slot).unwrap().as_ptr(), second_ptr);
    assert!(second.eqp_file().unwrap().buffer().is_published());

    second.reset_files();
    assert!(registry.get(&slot).is_none());
}

#[test]
fn collections_on_separate_threads() {
    let registry = Arc::new(ResourceRegistry::new());
    let defaults = defaults();

    let handles: Vec<_> = (0..4u8)
        .map(|i| {
            let registry = registry.clone();
            let defaults = defaults.clone();
            thread::spawn(move || {
                let name = format!("Collection {i}");
                let mut manager =
                    MetaManager::new(name.clone(), defaults, registry.clone(), &MetaConfig::default());
                for round in 0..50u8 {
                    assert!(manager.apply_mod(&imc(1, 100 + i), round as usize));
                    assert!(manager.apply_mod(&eqp(10, Slot::Legs, EqpEntry::empty()), round as usize));

                    let mut data = Vec::new();
                    assert!(registry.imc_hook().on_load(&name, IMC_PATH, &mut data));
                    assert_eq!(data[4 + (5 + 1) * 6], 100 + i);
                }
                manager.count()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
    assert_eq!(registry.imc_hook().users(), 0);
}
