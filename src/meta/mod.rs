// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Arc;

use tracing::{debug, warn};

use crate::bridge::ResourceBridge;
use crate::cmp::CmpFile;
use crate::config::MetaConfig;
use crate::defaults::GameDefaults;
use crate::eqdp::ExpandedEqdpFile;
use crate::eqp::ExpandedEqpFile;
use crate::est::{EstFile, EstType};
use crate::gmp::ExpandedGmpFile;
use crate::imc::ImcFile;
use crate::race::GenderRace;

mod imc;
mod kind;
mod manipulation;

pub use imc::ImcManager;
pub use kind::{
    CmpKind, EqdpKind, EqpKind, EstKind, GmpKind, ImcKind, ManagerContext, MetaKind,
    MetaKindManager,
};
pub use manipulation::{
    EqdpKey, EqdpManipulation, EqpKey, EqpManipulation, EstKey, EstManipulation, GmpKey,
    GmpManipulation, ImcKey, ImcManipulation, MetaManipulation, ModIndex, RspKey,
    RspManipulation,
};

/// Every meta table of one mod collection.
///
/// Mutating calls are expected to be serialized by the caller, different collections can be used from different threads.
/// Dropping the manager disposes it, which withdraws every published table first.
pub struct MetaManager {
    context: ManagerContext,
    eqp: MetaKindManager<EqpKind>,
    gmp: MetaKindManager<GmpKind>,
    eqdp: MetaKindManager<EqdpKind>,
    est: MetaKindManager<EstKind>,
    cmp: MetaKindManager<CmpKind>,
    imc: ImcManager,
}

impl MetaManager {
    pub fn new(
        collection: impl Into<String>,
        defaults: Arc<GameDefaults>,
        bridge: Arc<dyn ResourceBridge>,
        config: &MetaConfig,
    ) -> Self {
        Self {
            context: ManagerContext {
                collection: collection.into(),
                defaults,
                bridge,
            },
            eqp: MetaKindManager::new(config.eqp),
            gmp: MetaKindManager::new(config.gmp),
            eqdp: MetaKindManager::new(config.eqdp),
            est: MetaKindManager::new(config.est),
            cmp: MetaKindManager::new(config.cmp),
            imc: ImcManager::new(config.imc),
        }
    }

    /// The name of the collection this manager belongs to.
    pub fn collection(&self) -> &str {
        &self.context.collection
    }

    /// Applies a manipulation on behalf of a mod. Later calls for the same entry take over ownership.
    pub fn apply_mod(&mut self, manipulation: &MetaManipulation, mod_index: ModIndex) -> bool {
        let context = &self.context;
        match manipulation {
            MetaManipulation::Eqp(m) => self.eqp.apply_mod(context, m, mod_index),
            MetaManipulation::Gmp(m) => self.gmp.apply_mod(context, m, mod_index),
            MetaManipulation::Eqdp(m) => self.eqdp.apply_mod(context, m, mod_index),
            MetaManipulation::Est(m) => self.est.apply_mod(context, m, mod_index),
            MetaManipulation::Rsp(m) => self.cmp.apply_mod(context, m, mod_index),
            MetaManipulation::Imc(m) => self.imc.apply_mod(context, m, mod_index),
            MetaManipulation::Unknown => false,
        }
    }

    /// Applies manipulations in ascending priority order, returning how many succeeded.
    pub fn apply_all<'a>(
        &mut self,
        manipulations: impl IntoIterator<Item = (&'a MetaManipulation, ModIndex)>,
    ) -> usize {
        let mut applied = 0;
        let mut failed = 0;
        for (manipulation, mod_index) in manipulations {
            if self.apply_mod(manipulation, mod_index) {
                applied += 1;
            } else {
                failed += 1;
            }
        }

        if failed > 0 {
            warn!(
                collection = self.context.collection.as_str(),
                applied, failed, "Some meta manipulations could not be applied"
            );
        } else {
            debug!(
                collection = self.context.collection.as_str(),
                applied, "Applied meta manipulations"
            );
        }

        applied
    }

    /// Restores the default value of the manipulation's entry, if any mod owns it.
    pub fn revert_mod(&mut self, manipulation: &MetaManipulation) -> bool {
        let context = &self.context;
        match manipulation {
            MetaManipulation::Eqp(m) => self.eqp.revert_mod(context, m),
            MetaManipulation::Gmp(m) => self.gmp.revert_mod(context, m),
            MetaManipulation::Eqdp(m) => self.eqdp.revert_mod(context, m),
            MetaManipulation::Est(m) => self.est.revert_mod(context, m),
            MetaManipulation::Rsp(m) => self.cmp.revert_mod(context, m),
            MetaManipulation::Imc(m) => self.imc.revert_mod(context, m),
            MetaManipulation::Unknown => false,
        }
    }

    /// Restores every entry and forgets all owners.
    ///
    /// Character tables stay published with their defaults, IMC tables are released.
    pub fn reset(&mut self) {
        let context = &self.context;
        self.eqp.reset(context);
        self.gmp.reset(context);
        self.eqdp.reset(context);
        self.est.reset(context);
        self.cmp.reset(context);
        self.imc.reset(context);
    }

    /// Publishes every table to the bridge. Tables created afterwards are published right away.
    pub fn set_files(&mut self) {
        let context = &self.context;
        self.eqp.set_files(context);
        self.gmp.set_files(context);
        self.eqdp.set_files(context);
        self.est.set_files(context);
        self.cmp.set_files(context);
        self.imc.set_files(context);
    }

    /// Withdraws every table from the bridge.
    pub fn reset_files(&mut self) {
        let context = &self.context;
        self.eqp.reset_files(context);
        self.gmp.reset_files(context);
        self.eqdp.reset_files(context);
        self.est.reset_files(context);
        self.cmp.reset_files(context);
        self.imc.reset_files(context);
    }

    /// Withdraws and releases every table.
    pub fn dispose(&mut self) {
        let context = &self.context;
        self.eqp.dispose(context);
        self.gmp.dispose(context);
        self.eqdp.dispose(context);
        self.est.dispose(context);
        self.cmp.dispose(context);
        self.imc.dispose(context);
    }

    /// Which mod currently owns the manipulation's entry.
    pub fn owner(&self, manipulation: &MetaManipulation) -> Option<ModIndex> {
        match manipulation {
            MetaManipulation::Eqp(m) => self.eqp.owner(&m.key()),
            MetaManipulation::Gmp(m) => self.gmp.owner(&m.key()),
            MetaManipulation::Eqdp(m) => self.eqdp.owner(&m.key()),
            MetaManipulation::Est(m) => self.est.owner(&m.key()),
            MetaManipulation::Rsp(m) => self.cmp.owner(&m.key()),
            MetaManipulation::Imc(m) => self.imc.owner(&m.key()),
            MetaManipulation::Unknown => None,
        }
    }

    /// Total number of owned manipulations.
    pub fn count(&self) -> usize {
        self.eqp.len()
            + self.gmp.len()
            + self.eqdp.len()
            + self.est.len()
            + self.cmp.len()
            + self.imc.len()
    }

    /// Number of tables that could not be created from the game files.
    pub fn error_count(&self) -> usize {
        self.eqp.error_count()
            + self.gmp.error_count()
            + self.eqdp.error_count()
            + self.est.error_count()
            + self.cmp.error_count()
            + self.imc.error_count()
    }

    pub fn eqp_file(&self) -> Option<&ExpandedEqpFile> {
        self.eqp.table(&())
    }

    pub fn gmp_file(&self) -> Option<&ExpandedGmpFile> {
        self.gmp.table(&())
    }

    pub fn eqdp_file(&self, gender_race: GenderRace, accessory: bool) -> Option<&ExpandedEqdpFile> {
        self.eqdp.table(&(gender_race, accessory))
    }

    pub fn est_file(&self, est_type: EstType) -> Option<&EstFile> {
        self.est.table(&est_type)
    }

    pub fn cmp_file(&self) -> Option<&CmpFile> {
        self.cmp.table(&())
    }

    pub fn imc_file(&self, path: &str) -> Option<&ImcFile> {
        self.imc.file(path)
    }
}

impl Drop for MetaManager {
    fn drop(&mut self) {
        self.dispose();
    }
}
