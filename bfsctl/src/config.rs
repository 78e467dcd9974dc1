// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::Path;

use anyhow::Context;
use bfs::prelude::BfsParams;

/// Geometry read from a `format --config` TOML file.
///
/// ```toml
/// [disk]
/// block_size = 512
/// blocks = 4096
/// inodes = 32
/// ```
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DiskConfig {
    #[serde(default)]
    pub disk: DiskSection,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DiskSection {
    pub block_size: Option<u32>,
    pub blocks: Option<u32>,
    pub inodes: Option<u32>,
}

impl DiskConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Applies the file values, then `overrides`, on top of the defaults.
    pub fn to_params(&self, overrides: &DiskSection) -> BfsParams {
        let mut params = BfsParams::default();
        for section in [&self.disk, overrides] {
            if let Some(bs) = section.block_size {
                params = params.with_block_size(bs);
            }
            if let Some(n) = section.blocks {
                params = params.with_total_blocks(n);
            }
            if let Some(n) = section.inodes {
                params = params.with_inode_count(n);
            }
        }
        params
    }
}
