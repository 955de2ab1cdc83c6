// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

/// Failures while loading the pristine game data that defaults are computed from.
///
/// Problems with a single manipulation are never reported through this, they are plain `false` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The specified path was not found in any resources.
    FileNotFound {
        /// The path to the file that wasn't found.
        path: String,
    },
    /// There was an error while parsing this file.
    FileParsingFailed {
        /// The path to the file that failed to parse.
        path: String,
    },
    /// A previous failure disabled the table backed by this file.
    TableUnavailable {
        /// The path to the file backing the table.
        path: String,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::FileNotFound { path } => write!(f, "file not found: {path}"),
            Error::FileParsingFailed { path } => write!(f, "file parsing failed: {path}"),
            Error::TableUnavailable { path } => write!(f, "table unavailable: {path}"),
        }
    }
}

impl std::error::Error for Error {}
