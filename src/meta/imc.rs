// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use tracing::debug;

use crate::imc::ImcFile;
use crate::meta::kind::{ImcKind, ManagerContext, MetaKindManager};
use crate::meta::manipulation::{ImcKey, ImcManipulation, ModIndex};

/// IMC tables are keyed by path and are additionally served through the load hook.
///
/// Holds one reference on the hook for as long as it has any table.
pub struct ImcManager {
    inner: MetaKindManager<ImcKind>,
    hook_acquired: bool,
}

impl ImcManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: MetaKindManager::new(enabled),
            hook_acquired: false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.inner.error_count()
    }

    pub fn owner(&self, key: &ImcKey) -> Option<ModIndex> {
        self.inner.owner(key)
    }

    pub fn file(&self, path: &str) -> Option<&ImcFile> {
        self.inner.table(&path.to_string())
    }

    /// Hands the current contents of `path` to the load hook.
    fn refresh(&mut self, context: &ManagerContext, path: &str) {
        if !self.hook_acquired && self.inner.tables().next().is_some() {
            context.bridge.imc_hook().acquire();
            self.hook_acquired = true;
        }

        if let Some(file) = self.file(path) {
            debug!(
                collection = context.collection.as_str(),
                path, "Updating patched IMC file"
            );
            context
                .bridge
                .imc_hook()
                .register(&context.collection, path, file.snapshot());
        }
    }

    pub fn apply_mod(
        &mut self,
        context: &ManagerContext,
        manipulation: &ImcManipulation,
        mod_index: ModIndex,
    ) -> bool {
        let applied = self.inner.apply_mod(context, manipulation, mod_index);
        if applied {
            self.refresh(context, &manipulation.path);
        }
        applied
    }

    pub fn revert_mod(&mut self, context: &ManagerContext, manipulation: &ImcManipulation) -> bool {
        let reverted = self.inner.revert_mod(context, manipulation);
        if reverted {
            self.refresh(context, &manipulation.path);
        }
        reverted
    }

    /// Withdraws every table from the bridge and the hook, then lets go of the hook.
    fn release_tables(&mut self, context: &ManagerContext) {
        let hook = context.bridge.imc_hook();
        for (path, _) in self.inner.tables() {
            hook.unregister(&context.collection, path);
        }

        if self.hook_acquired {
            hook.release();
            self.hook_acquired = false;
        }
    }

    /// Restores and drops every table.
    pub fn reset(&mut self, context: &ManagerContext) {
        self.inner.reset(context);
        self.release_tables(context);
        self.inner.drop_tables(context);
    }

    pub fn set_files(&mut self, context: &ManagerContext) {
        self.inner.set_files(context);
    }

    pub fn reset_files(&mut self, context: &ManagerContext) {
        self.inner.reset_files(context);
    }

    pub fn dispose(&mut self, context: &ManagerContext) {
        self.release_tables(context);
        self.inner.dispose(context);
    }
}
