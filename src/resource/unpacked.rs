// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use crate::ByteBuffer;

use super::Resource;

/// Used to read unpacked files from a directory.
///
/// In most cases, you probably want to use this inside of a `ResourceResolver`.
pub struct UnpackedResource {
    base_directory: String,
}

impl UnpackedResource {
    pub fn from_existing(base_directory: &str) -> Self {
        Self {
            base_directory: base_directory.to_string(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        let mut new_path = PathBuf::from(&self.base_directory);
        new_path.push(path.to_lowercase());
        new_path
    }
}

impl Resource for UnpackedResource {
    fn read(&mut self, path: &str) -> Option<ByteBuffer> {
        std::fs::read(self.full_path(path)).ok()
    }

    fn exists(&mut self, path: &str) -> bool {
        self.full_path(path).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common_setup_data() -> (tempfile::TempDir, UnpackedResource) {
        let dir = tempfile::tempdir().unwrap();

        let mut d = dir.path().to_path_buf();
        d.push("chara/xls/charamake");
        std::fs::create_dir_all(&d).unwrap();
        d.push("human.cmp");
        std::fs::write(&d, [1u8, 2, 3]).unwrap();

        let resource = UnpackedResource::from_existing(dir.path().to_str().unwrap());
        (dir, resource)
    }

    #[test]
    fn read_files() {
        let (_dir, mut data) = common_setup_data();

        assert_eq!(data.read("chara/xls/charamake/human.cmp"), Some(vec![1, 2, 3]));
        assert!(data.read("chara/xls/charamake/missing.cmp").is_none());
    }

    #[test]
    fn exist_files() {
        let (_dir, mut data) = common_setup_data();

        // game paths are case-insensitive, and stored lowercase on disk
        assert!(data.exists("chara/xls/charamake/HUMAN.cmp"));
        assert!(!data.exists("chara/xls/charamake/missing.cmp"));
    }
}
