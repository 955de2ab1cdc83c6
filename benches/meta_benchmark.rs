// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use xivmeta::bridge::ResourceRegistry;
use xivmeta::config::MetaConfig;
use xivmeta::eqp::EqpEntry;
use xivmeta::equipment::{ObjectType, Slot};
use xivmeta::est::EstType;
use xivmeta::imc::ImcEntry;
use xivmeta::meta::{
    EqpManipulation, EstManipulation, ImcManipulation, MetaManager, MetaManipulation,
};
use xivmeta::race::GenderRace;

#[path = "../tests/common/mod.rs"]
mod common;

fn manipulations() -> Vec<MetaManipulation> {
    let mut manipulations = Vec::new();
    for set_id in 0..150u16 {
        manipulations.push(
            EqpManipulation {
                entry: EqpEntry::all(),
                set_id,
                slot: Slot::Head,
            }
            .into(),
        );
        manipulations.push(
            EstManipulation {
                entry: set_id + 1,
                gender_race: GenderRace::AuRaFemale,
                set_id,
                slot: EstType::Body,
            }
            .into(),
        );
    }
    for variant in 1..=common::IMC_VARIANTS {
        manipulations.push(
            ImcManipulation {
                entry: ImcEntry::default(),
                object_type: ObjectType::Equipment,
                path: common::IMC_PATH.to_string(),
                equip_slot: Slot::Feet,
                variant,
            }
            .into(),
        );
    }
    manipulations
}

fn criterion_benchmark(c: &mut Criterion) {
    let defaults = common::defaults();
    let registry = Arc::new(ResourceRegistry::new());
    let manipulations = manipulations();

    c.bench_function("collection rebuild", |b| {
        b.iter(|| {
            let mut manager = MetaManager::new(
                "Default",
                defaults.clone(),
                registry.clone(),
                &MetaConfig::default(),
            );
            manager.apply_all(manipulations.iter().map(|m| (m, 0)));
            manager.set_files();
            manager.count()
        })
    });

    let mut manager = MetaManager::new(
        "Default",
        defaults.clone(),
        registry.clone(),
        &MetaConfig::default(),
    );
    c.bench_function("reapply and reset", |b| {
        b.iter(|| {
            manager.apply_all(manipulations.iter().map(|m| (m, 1)));
            manager.reset();
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
