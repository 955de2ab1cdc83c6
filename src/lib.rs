// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Collection-scoped meta manipulations for XIV game tables.
//!
//! Mods describe small edits ("manipulations") to a handful of fixed-format game tables. A [`MetaManager`](meta::MetaManager) keeps
//! an expanded copy of every table a collection edits, tracks which mod owns which entry, and publishes the tables to a
//! [`ResourceBridge`](bridge::ResourceBridge) that serves them to the game.

/// The contents of a file, read into memory.
pub type ByteBuffer = Vec<u8>;

#[macro_use]
mod macros;

/// All of the races in Eorzea in a nice enum package.
pub mod race;

/// Equipment slots, object types and their game paths.
pub mod equipment;

/// Table buffers and how they are handed out.
pub mod buffer;

/// Equipment parameter tables (EQP).
pub mod eqp;

/// Gimmick parameter tables (GMP).
pub mod gmp;

/// Equipment deformer parameter tables (EQDP).
pub mod eqdp;

/// Extra skeleton tables (EST).
pub mod est;

/// Reading character parameter files (CMP)
pub mod cmp;

/// Image change data (IMC).
pub mod imc;

/// Publishing tables to the resource loader, and the IMC load hook.
pub mod bridge;

/// The unmodified game files defaults are computed from.
pub mod defaults;

/// Sources of game files.
pub mod resource;

/// Switches for each kind of table.
pub mod config;

/// Manipulations and their managers.
pub mod meta;

mod error;
pub use error::Error;
