// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::bridge::{MetaIndex, ResourceBridge, ResourceSlot};
use crate::buffer::ExpandedTable;
use crate::cmp::CmpFile;
use crate::defaults::GameDefaults;
use crate::eqdp::ExpandedEqdpFile;
use crate::eqp::ExpandedEqpFile;
use crate::est::{EstFile, EstType};
use crate::gmp::ExpandedGmpFile;
use crate::imc::ImcFile;
use crate::meta::manipulation::{
    EqdpKey, EqdpManipulation, EqpKey, EqpManipulation, EstKey, EstManipulation, GmpKey,
    GmpManipulation, ImcKey, ImcManipulation, ModIndex, RspKey, RspManipulation,
};
use crate::race::GenderRace;
use crate::Error;

/// What every kind manager of one collection shares.
#[derive(Clone)]
pub struct ManagerContext {
    pub collection: String,
    pub defaults: Arc<GameDefaults>,
    pub bridge: Arc<dyn ResourceBridge>,
}

/// Ties a manipulation type to the table it edits.
pub trait MetaKind {
    const NAME: &'static str;

    type Manipulation;
    type Key: Clone + Eq + Hash + Debug;
    /// Identifies one table of this kind, such as a gender-race for EQDP.
    type Dimension: Clone + Eq + Hash + Debug;
    type Table: ExpandedTable;

    fn key(manipulation: &Self::Manipulation) -> Self::Key;

    fn dimension(key: &Self::Key) -> Self::Dimension;

    /// Where the table of `dimension` is published to.
    fn slot(dimension: &Self::Dimension) -> ResourceSlot;

    /// Creates the table from the unmodified game file.
    fn materialize(defaults: &GameDefaults, dimension: &Self::Dimension) -> Result<Self::Table, Error>;

    /// The buffer length needed before `key` can be written, if the table has to grow first.
    fn required_len(_table: &Self::Table, _key: &Self::Key) -> Option<usize> {
        None
    }

    fn apply(table: &mut Self::Table, manipulation: &Self::Manipulation) -> bool;

    /// Writes the default value back for `key`.
    fn revert(table: &mut Self::Table, key: &Self::Key) -> bool;
}

pub struct EqpKind;

impl MetaKind for EqpKind {
    const NAME: &'static str = "Eqp";

    type Manipulation = EqpManipulation;
    type Key = EqpKey;
    type Dimension = ();
    type Table = ExpandedEqpFile;

    fn key(manipulation: &EqpManipulation) -> EqpKey {
        manipulation.key()
    }

    fn dimension(_key: &EqpKey) {}

    fn slot(_dimension: &()) -> ResourceSlot {
        ResourceSlot::Character(MetaIndex::Eqp)
    }

    fn materialize(defaults: &GameDefaults, _dimension: &()) -> Result<ExpandedEqpFile, Error> {
        let index = MetaIndex::Eqp;
        ExpandedEqpFile::from_existing(&index.game_path(), defaults.meta_file(index)?)
    }

    fn apply(table: &mut ExpandedEqpFile, manipulation: &EqpManipulation) -> bool {
        table.apply(manipulation.set_id, manipulation.slot, manipulation.entry)
    }

    fn revert(table: &mut ExpandedEqpFile, key: &EqpKey) -> bool {
        table.revert(key.set_id, key.slot)
    }
}

pub struct GmpKind;

impl MetaKind for GmpKind {
    const NAME: &'static str = "Gmp";

    type Manipulation = GmpManipulation;
    type Key = GmpKey;
    type Dimension = ();
    type Table = ExpandedGmpFile;

    fn key(manipulation: &GmpManipulation) -> GmpKey {
        manipulation.key()
    }

    fn dimension(_key: &GmpKey) {}

    fn slot(_dimension: &()) -> ResourceSlot {
        ResourceSlot::Character(MetaIndex::Gmp)
    }

    fn materialize(defaults: &GameDefaults, _dimension: &()) -> Result<ExpandedGmpFile, Error> {
        let index = MetaIndex::Gmp;
        ExpandedGmpFile::from_existing(&index.game_path(), defaults.meta_file(index)?)
    }

    fn apply(table: &mut ExpandedGmpFile, manipulation: &GmpManipulation) -> bool {
        table.apply(manipulation.set_id, manipulation.entry)
    }

    fn revert(table: &mut ExpandedGmpFile, key: &GmpKey) -> bool {
        table.revert(key.set_id)
    }
}

pub struct EqdpKind;

impl MetaKind for EqdpKind {
    const NAME: &'static str = "Eqdp";

    type Manipulation = EqdpManipulation;
    type Key = EqdpKey;
    /// The gender-race, and whether this is the accessory table.
    type Dimension = (GenderRace, bool);
    type Table = ExpandedEqdpFile;

    fn key(manipulation: &EqdpManipulation) -> EqdpKey {
        manipulation.key()
    }

    fn dimension(key: &EqdpKey) -> (GenderRace, bool) {
        (key.gender_race, key.slot.is_accessory())
    }

    fn slot(&(gender_race, accessory): &(GenderRace, bool)) -> ResourceSlot {
        ResourceSlot::Character(MetaIndex::Eqdp {
            gender_race,
            accessory,
        })
    }

    fn materialize(
        defaults: &GameDefaults,
        &(gender_race, accessory): &(GenderRace, bool),
    ) -> Result<ExpandedEqdpFile, Error> {
        let index = MetaIndex::Eqdp {
            gender_race,
            accessory,
        };
        ExpandedEqdpFile::from_existing(&index.game_path(), defaults.meta_file(index)?)
    }

    fn apply(table: &mut ExpandedEqdpFile, manipulation: &EqdpManipulation) -> bool {
        table.apply(manipulation.set_id, manipulation.slot, manipulation.entry)
    }

    fn revert(table: &mut ExpandedEqdpFile, key: &EqdpKey) -> bool {
        table.revert(key.set_id, key.slot)
    }
}

pub struct EstKind;

impl MetaKind for EstKind {
    const NAME: &'static str = "Est";

    type Manipulation = EstManipulation;
    type Key = EstKey;
    type Dimension = EstType;
    type Table = EstFile;

    fn key(manipulation: &EstManipulation) -> EstKey {
        manipulation.key()
    }

    fn dimension(key: &EstKey) -> EstType {
        key.slot
    }

    fn slot(dimension: &EstType) -> ResourceSlot {
        ResourceSlot::Character(MetaIndex::Est(*dimension))
    }

    fn materialize(defaults: &GameDefaults, dimension: &EstType) -> Result<EstFile, Error> {
        let index = MetaIndex::Est(*dimension);
        EstFile::from_existing(&index.game_path(), defaults.meta_file(index)?)
    }

    fn required_len(table: &EstFile, key: &EstKey) -> Option<usize> {
        table.required_len(key.gender_race, key.set_id)
    }

    fn apply(table: &mut EstFile, manipulation: &EstManipulation) -> bool {
        table.apply(
            manipulation.gender_race,
            manipulation.set_id,
            manipulation.entry,
        )
    }

    fn revert(table: &mut EstFile, key: &EstKey) -> bool {
        table.revert(key.gender_race, key.set_id)
    }
}

pub struct CmpKind;

impl MetaKind for CmpKind {
    const NAME: &'static str = "Rsp";

    type Manipulation = RspManipulation;
    type Key = RspKey;
    type Dimension = ();
    type Table = CmpFile;

    fn key(manipulation: &RspManipulation) -> RspKey {
        manipulation.key()
    }

    fn dimension(_key: &RspKey) {}

    fn slot(_dimension: &()) -> ResourceSlot {
        ResourceSlot::Character(MetaIndex::HumanCmp)
    }

    fn materialize(defaults: &GameDefaults, _dimension: &()) -> Result<CmpFile, Error> {
        let index = MetaIndex::HumanCmp;
        CmpFile::from_existing(&index.game_path(), defaults.meta_file(index)?)
    }

    fn apply(table: &mut CmpFile, manipulation: &RspManipulation) -> bool {
        table.apply(
            manipulation.sub_race,
            manipulation.attribute,
            manipulation.entry,
        )
    }

    fn revert(table: &mut CmpFile, key: &RspKey) -> bool {
        table.revert(key.sub_race, key.attribute)
    }
}

pub struct ImcKind;

impl MetaKind for ImcKind {
    const NAME: &'static str = "Imc";

    type Manipulation = ImcManipulation;
    type Key = ImcKey;
    /// The game path of the file.
    type Dimension = String;
    type Table = ImcFile;

    fn key(manipulation: &ImcManipulation) -> ImcKey {
        manipulation.key()
    }

    fn dimension(key: &ImcKey) -> String {
        key.path.clone()
    }

    fn slot(dimension: &String) -> ResourceSlot {
        ResourceSlot::Imc(dimension.clone())
    }

    fn materialize(defaults: &GameDefaults, dimension: &String) -> Result<ImcFile, Error> {
        ImcFile::from_existing(dimension, defaults.file(dimension)?)
    }

    fn apply(table: &mut ImcFile, manipulation: &ImcManipulation) -> bool {
        table.apply(
            manipulation.variant,
            manipulation.part(),
            manipulation.entry,
        )
    }

    fn revert(table: &mut ImcFile, key: &ImcKey) -> bool {
        table.revert(key.variant, key.part)
    }
}

/// Grows a table in place of its publication: the old buffer is withdrawn before it is released.
fn grow_table<K: MetaKind>(
    context: &ManagerContext,
    dimension: &K::Dimension,
    table: &mut K::Table,
    len: usize,
) -> bool {
    let slot = K::slot(dimension);
    let published = match table.buffer_mut().unpublish() {
        Some(buffer) => {
            context.bridge.reset_file(&slot, buffer);
            true
        }
        None => false,
    };

    debug!(kind = K::NAME, ?dimension, len, "Growing meta table");
    let grown = table.buffer_mut().resize(len);

    if published {
        let buffer = table.buffer_mut().publish();
        context.bridge.set_file(&slot, buffer);
    }

    grown
}

/// Owns every table of one kind for a collection, and which mod owns which entry in them.
pub struct MetaKindManager<K: MetaKind> {
    enabled: bool,
    manipulations: HashMap<K::Key, ModIndex>,
    tables: HashMap<K::Dimension, K::Table>,
    unavailable: HashSet<K::Dimension>,
    files_set: bool,
    errors: usize,
}

impl<K: MetaKind> MetaKindManager<K> {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            manipulations: HashMap::new(),
            tables: HashMap::new(),
            unavailable: HashSet::new(),
            files_set: false,
            errors: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of owned manipulations.
    pub fn len(&self) -> usize {
        self.manipulations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manipulations.is_empty()
    }

    /// Number of tables whose unmodified game file could not be loaded.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn owner(&self, key: &K::Key) -> Option<ModIndex> {
        self.manipulations.get(key).copied()
    }

    pub fn table(&self, dimension: &K::Dimension) -> Option<&K::Table> {
        self.tables.get(dimension)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&K::Dimension, &K::Table)> {
        self.tables.iter()
    }

    /// Makes sure the table for `dimension` exists, publishing it right away if files are currently set.
    fn materialize(
        &mut self,
        context: &ManagerContext,
        dimension: &K::Dimension,
    ) -> Result<(), Error> {
        if self.tables.contains_key(dimension) {
            return Ok(());
        }
        if self.unavailable.contains(dimension) {
            return Err(Error::TableUnavailable {
                path: K::slot(dimension).game_path(),
            });
        }

        match K::materialize(&context.defaults, dimension) {
            Ok(mut table) => {
                debug!(
                    collection = context.collection.as_str(),
                    kind = K::NAME,
                    ?dimension,
                    "Created meta table"
                );
                if self.files_set {
                    let buffer = table.buffer_mut().publish();
                    context.bridge.set_file(&K::slot(dimension), buffer);
                }
                self.tables.insert(dimension.clone(), table);
                Ok(())
            }
            Err(err) => {
                error!(
                    collection = context.collection.as_str(),
                    kind = K::NAME,
                    ?dimension,
                    "Could not create meta table: {err}"
                );
                self.errors += 1;
                self.unavailable.insert(dimension.clone());
                Err(err)
            }
        }
    }

    /// Writes the manipulation and records `mod_index` as its owner.
    ///
    /// Ownership is only recorded if the write succeeded, a failed write leaves any previous owner in place.
    pub fn apply_mod(
        &mut self,
        context: &ManagerContext,
        manipulation: &K::Manipulation,
        mod_index: ModIndex,
    ) -> bool {
        if !self.enabled {
            return false;
        }

        let key = K::key(manipulation);
        let dimension = K::dimension(&key);
        if let Err(err) = self.materialize(context, &dimension) {
            debug!(
                collection = context.collection.as_str(),
                kind = K::NAME,
                mod_index,
                "Skipping meta manipulation: {err}"
            );
            return false;
        }

        let Some(table) = self.tables.get_mut(&dimension) else {
            return false;
        };

        if let Some(len) = K::required_len(table, &key) {
            grow_table::<K>(context, &dimension, table, len);
        }

        if K::apply(table, manipulation) {
            self.manipulations.insert(key, mod_index);
            true
        } else {
            warn!(
                collection = context.collection.as_str(),
                kind = K::NAME,
                ?key,
                mod_index,
                "Could not apply meta manipulation"
            );
            false
        }
    }

    /// Restores the default value for the manipulation's entry. The table itself stays.
    pub fn revert_mod(&mut self, context: &ManagerContext, manipulation: &K::Manipulation) -> bool {
        if !self.enabled {
            return false;
        }

        let key = K::key(manipulation);
        if self.manipulations.remove(&key).is_none() {
            return false;
        }

        self.revert_key(context, &key)
    }

    fn revert_key(&mut self, context: &ManagerContext, key: &K::Key) -> bool {
        let dimension = K::dimension(key);
        let Some(table) = self.tables.get_mut(&dimension) else {
            return false;
        };

        if let Some(len) = K::required_len(table, key) {
            grow_table::<K>(context, &dimension, table, len);
        }

        K::revert(table, key)
    }

    /// Restores every owned entry and forgets all owners.
    pub fn reset(&mut self, context: &ManagerContext) {
        let keys: Vec<K::Key> = self.manipulations.drain().map(|(key, _)| key).collect();
        for key in &keys {
            self.revert_key(context, key);
        }
    }

    /// Publishes every table.
    pub fn set_files(&mut self, context: &ManagerContext) {
        if !self.enabled {
            return;
        }

        self.files_set = true;
        for (dimension, table) in &mut self.tables {
            if !table.buffer().is_published() {
                let buffer = table.buffer_mut().publish();
                context.bridge.set_file(&K::slot(dimension), buffer);
            }
        }
    }

    /// Withdraws every published table.
    pub fn reset_files(&mut self, context: &ManagerContext) {
        self.files_set = false;
        self.unpublish_tables(context);
    }

    fn unpublish_tables(&mut self, context: &ManagerContext) {
        for (dimension, table) in &mut self.tables {
            if let Some(buffer) = table.buffer_mut().unpublish() {
                context.bridge.reset_file(&K::slot(dimension), buffer);
            }
        }
    }

    /// Withdraws and releases every table, without touching the file publication state.
    pub(crate) fn drop_tables(&mut self, context: &ManagerContext) {
        self.unpublish_tables(context);
        self.tables.clear();
        self.unavailable.clear();
    }

    /// Unpublishes, then releases everything.
    pub fn dispose(&mut self, context: &ManagerContext) {
        self.reset_files(context);
        self.manipulations.clear();
        self.tables.clear();
        self.unavailable.clear();
    }
}
