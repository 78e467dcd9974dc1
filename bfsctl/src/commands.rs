// SPDX-License-Identifier: MIT

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, bail};
use bfs::core::utils::time_utils::from_unix;
use bfs::prelude::*;
use colored::Colorize;
use time::format_description::well_known::Rfc3339;

use crate::config::{DiskConfig, DiskSection};
use crate::utils::{pretty_bytes, sep_u64};
use crate::{log_info, log_verbose, log_warn};

fn timestamp(secs: i64) -> String {
    from_unix(secs)
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| secs.to_string())
}

fn mount(disk: &Path) -> anyhow::Result<HostBfs> {
    HostBfs::mount_path(disk).with_context(|| format!("mounting {}", disk.display()))
}

pub fn format(disk: &Path, config: Option<&Path>, overrides: &DiskSection) -> anyhow::Result<()> {
    let cfg = match config {
        Some(path) => DiskConfig::from_file(path)?,
        None => DiskConfig::default(),
    };
    let params = cfg.to_params(overrides);
    log_verbose!(
        "Geometry: {} blocks of {} bytes, {} inodes",
        params.total_blocks,
        params.block_size,
        params.inode_count
    );

    let fs = HostBfs::format_path(disk, &params)
        .with_context(|| format!("formatting {}", disk.display()))?;
    let free = fs.store().free_blocks();
    fs.unmount()?;

    log_info!(
        "Formatted {} ({}, {} data blocks free)",
        disk.display(),
        pretty_bytes(params.size_bytes()),
        sep_u64(free as u64)
    );
    Ok(())
}

pub fn info(disk: &Path) -> anyhow::Result<()> {
    let fs = mount(disk)?;
    let store = fs.store();
    let meta = store.meta();

    println!("{}", disk.display().to_string().bold());
    println!("  created      {}", timestamp(store.created_at()));
    println!("  block size   {} B", meta.block_size);
    println!(
        "  blocks       {} ({})",
        sep_u64(meta.total_blocks as u64),
        pretty_bytes(meta.size_bytes())
    );
    println!("  inodes       {}", meta.inode_count);
    println!(
        "  layout       inodes@{} dir@{} bitmap@{} data@{}",
        meta.inode_start, meta.dir_start, meta.bitmap_start, meta.data_start
    );
    println!(
        "  data         {} used, {} free",
        sep_u64(store.used_blocks() as u64),
        sep_u64(store.free_blocks() as u64).green()
    );
    println!("  max file     {}", pretty_bytes(meta.max_file_blocks() as u64 * meta.block_size as u64));
    Ok(())
}

pub fn ls(disk: &Path) -> anyhow::Result<()> {
    let mut fs = mount(disk)?;
    let entries = fs.store_mut().entries()?;

    if entries.is_empty() {
        log_info!("No files on {}", disk.display());
        return Ok(());
    }
    for e in &entries {
        println!(
            "{:>12}  {:>5}  {}  {}",
            sep_u64(e.size),
            e.block_count,
            timestamp(e.mtime),
            e.name.bold()
        );
    }
    log_verbose!("{} file(s)", entries.len());
    Ok(())
}

pub fn write(disk: &Path, name: &str, offset: u64, data: &[u8]) -> anyhow::Result<()> {
    let mut fs = mount(disk)?;

    let fd = match fs.open(name) {
        Ok(fd) => fd,
        Err(BfsError::FileNotFound) => {
            log_verbose!("Creating '{name}'");
            fs.create(name)?
        }
        Err(e) => return Err(e).with_context(|| format!("opening '{name}'")),
    };

    let offset = i64::try_from(offset).context("offset too large")?;
    fs.seek(fd, offset, Whence::Set)?;
    let written = fs
        .write(fd, data)
        .with_context(|| format!("writing '{name}'"))?;
    let size = fs.size(fd)?;
    fs.close(fd)?;
    fs.unmount()?;

    log_info!(
        "Wrote {} to '{name}' at offset {offset} (size now {})",
        pretty_bytes(written as u64),
        pretty_bytes(size)
    );
    Ok(())
}

pub fn read(
    disk: &Path,
    name: &str,
    offset: u64,
    len: Option<u64>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut fs = mount(disk)?;
    let fd = fs.open(name).with_context(|| format!("opening '{name}'"))?;

    let size = fs.size(fd)?;
    let want = len.unwrap_or(size.saturating_sub(offset));
    let Ok(want) = usize::try_from(want) else {
        bail!("read length {want} does not fit in memory");
    };

    fs.seek(fd, i64::try_from(offset).context("offset too large")?, Whence::Set)?;
    let data = fs.read_to_vec(fd, want)?;
    fs.close(fd)?;
    if data.len() < want {
        log_warn!("'{name}' ends early: read {} of {want} bytes", data.len());
    }

    match output {
        Some(path) => {
            fs::write(path, &data).with_context(|| format!("writing {}", path.display()))?;
            log_info!("Read {} from '{name}' into {}", pretty_bytes(data.len() as u64), path.display());
        }
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(&data)?;
            out.flush()?;
        }
    }
    Ok(())
}
