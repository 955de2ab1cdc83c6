// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::buffer::PublishedBuffer;
use crate::est::EstType;
use crate::race::GenderRace;
use crate::ByteBuffer;

/// The fixed resource slots the game keeps for its character tables.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MetaIndex {
    Eqp,
    Gmp,
    Eqdp {
        gender_race: GenderRace,
        accessory: bool,
    },
    HumanCmp,
    Est(EstType),
}

impl MetaIndex {
    /// The numeric slot index, stable for the lifetime of the process.
    pub fn index(self) -> usize {
        let eqdp_count = GenderRace::ALL.len() * 2;

        match self {
            MetaIndex::Eqp => 0,
            MetaIndex::Gmp => 1,
            MetaIndex::Eqdp {
                gender_race,
                accessory,
            } => {
                let position = GenderRace::ALL
                    .iter()
                    .position(|g| *g == gender_race)
                    .unwrap_or_default();
                2 + position * 2 + accessory as usize
            }
            MetaIndex::HumanCmp => 2 + eqdp_count,
            MetaIndex::Est(est_type) => 3 + eqdp_count + est_type as usize,
        }
    }

    /// The game path of the unmodified table.
    pub fn game_path(self) -> String {
        match self {
            MetaIndex::Eqp => "chara/xls/equipmentparameter/equipmentparameter.eqp".to_string(),
            MetaIndex::Gmp => "chara/xls/equipmentparameter/gimmickparameter.gmp".to_string(),
            MetaIndex::Eqdp {
                gender_race,
                accessory: false,
            } => format!(
                "chara/xls/charadb/equipmentdeformerparameter/c{:04}.eqdp",
                gender_race.id()
            ),
            MetaIndex::Eqdp {
                gender_race,
                accessory: true,
            } => format!(
                "chara/xls/charadb/accessorydeformerparameter/c{:04}.eqdp",
                gender_race.id()
            ),
            MetaIndex::HumanCmp => "chara/xls/charamake/human.cmp".to_string(),
            MetaIndex::Est(est_type) => est_type.game_path().to_string(),
        }
    }
}

/// Where a table buffer is published to.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ResourceSlot {
    /// One of the character tables with a fixed slot.
    Character(MetaIndex),
    /// An IMC file, keyed by its game path.
    Imc(String),
}

impl ResourceSlot {
    /// The game path the slot stands in for.
    pub fn game_path(&self) -> String {
        match self {
            ResourceSlot::Character(index) => index.game_path(),
            ResourceSlot::Imc(path) => path.clone(),
        }
    }
}

/// The resource-loading side that consumes expanded tables.
///
/// Implementations must not read a buffer after `reset_file` was called with it.
/// Several collections may publish into the same slot, only the latest publication is in use.
pub trait ResourceBridge: Send + Sync {
    /// Publishes `buffer` for `slot`, replacing any previous publication.
    fn set_file(&self, slot: &ResourceSlot, buffer: PublishedBuffer);

    /// Stops using `buffer` for `slot`. Nothing happens if `slot` was republished with another buffer since.
    fn reset_file(&self, slot: &ResourceSlot, buffer: PublishedBuffer);

    /// The process-wide IMC load interception.
    fn imc_hook(&self) -> &ImcLoadHook;
}

/// A plain registry of published buffers, which an asset-load hook can look into.
#[derive(Default)]
pub struct ResourceRegistry {
    files: RwLock<HashMap<ResourceSlot, PublishedBuffer>>,
    imc_hook: ImcLoadHook,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_imc_hook(imc_hook: ImcLoadHook) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            imc_hook,
        }
    }

    /// The buffer currently published for `slot`, if any.
    pub fn get(&self, slot: &ResourceSlot) -> Option<PublishedBuffer> {
        self.files.read().get(slot).copied()
    }

    /// Number of published slots.
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl ResourceBridge for ResourceRegistry {
    fn set_file(&self, slot: &ResourceSlot, buffer: PublishedBuffer) {
        debug!(?slot, len = buffer.len(), "Publishing meta file");
        self.files.write().insert(slot.clone(), buffer);
    }

    fn reset_file(&self, slot: &ResourceSlot, buffer: PublishedBuffer) {
        let mut files = self.files.write();
        if files.get(slot) == Some(&buffer) {
            debug!(?slot, "Resetting meta file");
            files.remove(slot);
        }
    }

    fn imc_hook(&self) -> &ImcLoadHook {
        &self.imc_hook
    }
}

type InstallCallback = Box<dyn Fn(bool) + Send + Sync>;

/// Splices patched IMC files into loads of their game paths.
///
/// The hook itself is process wide and is only installed while at least one collection needs it,
/// tracked through `acquire` and `release`. Lookups are keyed by collection name, then by game path.
#[derive(Default)]
pub struct ImcLoadHook {
    users: Mutex<usize>,
    installed: AtomicBool,
    installer: Option<InstallCallback>,
    files: RwLock<HashMap<String, HashMap<String, Arc<[u8]>>>>,
}

impl ImcLoadHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// `installer` is called with `true` when the hook has to be installed, and with `false` once nothing needs it anymore.
    pub fn with_installer(installer: impl Fn(bool) + Send + Sync + 'static) -> Self {
        Self {
            installer: Some(Box::new(installer)),
            ..Self::default()
        }
    }

    pub fn acquire(&self) {
        let mut users = self.users.lock();
        *users += 1;

        if *users == 1 {
            debug!("Installing IMC load hook");
            if let Some(installer) = &self.installer {
                installer(true);
            }
            self.installed.store(true, Ordering::Release);
        }
    }

    pub fn release(&self) {
        let mut users = self.users.lock();
        if *users == 0 {
            warn!("IMC load hook released more often than acquired");
            return;
        }

        *users -= 1;

        if *users == 0 {
            debug!("Removing IMC load hook");
            self.installed.store(false, Ordering::Release);
            if let Some(installer) = &self.installer {
                installer(false);
            }
        }
    }

    /// Doesn't take the lock `acquire` and `release` use, so it is cheap enough for every load.
    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    /// How many live managers currently hold the hook.
    pub fn users(&self) -> usize {
        *self.users.lock()
    }

    pub(crate) fn register(&self, collection: &str, path: &str, data: Arc<[u8]>) {
        self.files
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(path.to_string(), data);
    }

    pub(crate) fn unregister(&self, collection: &str, path: &str) {
        let mut files = self.files.write();
        if let Some(paths) = files.get_mut(collection) {
            paths.remove(path);
            if paths.is_empty() {
                files.remove(collection);
            }
        }
    }

    /// The patched contents of `path` for `collection`, if that collection currently modifies it.
    pub fn patched_file(&self, collection: &str, path: &str) -> Option<Arc<[u8]>> {
        self.files.read().get(collection)?.get(path).cloned()
    }

    /// Called while the game constructs the handle for `path` on behalf of `collection`.
    ///
    /// Replaces `data` with the patched file and returns true if there is one.
    pub fn on_load(&self, collection: &str, path: &str, data: &mut ByteBuffer) -> bool {
        if !self.is_installed() {
            return false;
        }

        match self.patched_file(collection, path) {
            Some(patched) => {
                data.clear();
                data.extend_from_slice(&patched);
                true
            }
            None => false,
        }
    }
}
