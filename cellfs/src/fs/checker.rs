// SPDX-License-Identifier: MIT

use std::collections::{HashMap, HashSet};

use cellio::prelude::*;
use zerocopy::FromBytes;

pub use crate::core::checker::*;

use crate::core::utils::bitmap::BitmapOps;
use crate::fs::{constant::*, types::*};

#[derive(Clone, Debug)]
pub struct CellCheckOptions {
    pub phases: VerifyPhases,
    pub fail_fast: bool,
    /// Report table slots left behind by released identifiers
    pub report_stale: bool,
    /// Report tombstone counts per container
    pub report_tombstones: bool,
}

impl Default for CellCheckOptions {
    fn default() -> Self {
        Self {
            phases: VerifyPhases::ALL,
            fail_fast: false,
            report_stale: true,
            report_tombstones: true,
        }
    }
}

impl VerifierOptionsLike for CellCheckOptions {
    fn phases(&self) -> VerifyPhases {
        self.phases
    }
    fn fail_fast(&self) -> bool {
        self.fail_fast
    }
}

/// Read-only consistency checker over a formatted image.
///
/// Later phases depend on the superblock; when it is unusable they are
/// skipped rather than reporting noise.
pub struct CellChecker<'a, IO: CellIO + ?Sized> {
    io: &'a mut IO,
    sb: Option<CellSuperblock>,
    /// Records whose identifier is in use, by id.
    live: HashMap<u64, CellInode>,
}

impl<'a, IO: CellIO + ?Sized> CellChecker<'a, IO> {
    pub fn new(io: &'a mut IO) -> Self {
        Self {
            io,
            sb: None,
            live: HashMap::new(),
        }
    }

    fn superblock(&mut self) -> FsCheckerResult<CellSuperblock> {
        if let Some(sb) = self.sb {
            return Ok(sb);
        }
        let sb: CellSuperblock = self
            .io
            .read_struct(CELLFS_SUPERBLOCK_BLOCK * CELLFS_BLOCK_SIZE as u64)?;
        self.sb = Some(sb);
        Ok(sb)
    }

    fn superblock_usable(&mut self) -> FsCheckerResult<Option<CellSuperblock>> {
        let sb = self.superblock()?;
        let ok = sb.magic == CELLFS_MAGIC && sb.block_size == CELLFS_BLOCK_SIZE as u64;
        Ok(ok.then_some(sb))
    }

    fn table_slots(&mut self, sb: &CellSuperblock) -> FsCheckerResult<Vec<CellInode>> {
        let mut block = [0u8; CELLFS_BLOCK_SIZE];
        self.io.read_block(CELLFS_INODE_TABLE_BLOCK, &mut block)?;
        let count = sb.object_count.min(CELLFS_MAX_OBJECTS) as usize;
        Ok(block
            .chunks_exact(CELLFS_INODE_SIZE)
            .take(count)
            .filter_map(|raw| CellInode::read_from_bytes(raw).ok())
            .collect())
    }

    /// Live records, loaded once.
    fn live_records(&mut self, sb: &CellSuperblock) -> FsCheckerResult<&HashMap<u64, CellInode>> {
        if self.live.is_empty() {
            for rec in self.table_slots(sb)? {
                if rec.id == CELLFS_ROOT_ID || !sb.is_id_free(rec.id) {
                    self.live.entry(rec.id).or_insert(rec);
                }
            }
        }
        Ok(&self.live)
    }

    fn entries_of(&mut self, container: &CellInode) -> FsCheckerResult<Vec<CellDirent>> {
        let mut block = vec![0u8; CELLFS_BLOCK_SIZE];
        self.io.read_block(container.data_block, &mut block)?;
        let bound = (container.child_slots as usize).min(CELLFS_DIRENTS_PER_BLOCK);
        Ok(block
            .chunks_exact(CELLFS_DIRENT_SIZE)
            .take(bound)
            .filter_map(|raw| CellDirent::read_from_bytes(raw).ok())
            .collect())
    }
}

impl<IO: CellIO + ?Sized> FsChecker for CellChecker<'_, IO> {
    type Options = CellCheckOptions;

    fn check_superblock(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult<()> {
        let sb = self.superblock()?;
        if sb.magic != CELLFS_MAGIC {
            rep.push(Finding::err(
                "SB.MAGIC",
                format!("magic {:#x}, expected {:#x}", sb.magic, CELLFS_MAGIC),
            ));
        }
        if sb.block_size != CELLFS_BLOCK_SIZE as u64 {
            rep.push(Finding::err(
                "SB.BLOCK_SIZE",
                format!("block size {}, expected {}", sb.block_size, CELLFS_BLOCK_SIZE),
            ));
        }
        if sb.version != CELLFS_VERSION {
            rep.push(Finding::err(
                "SB.VERSION",
                format!("version {}, expected {}", sb.version, CELLFS_VERSION),
            ));
        }
        if sb.object_count == 0 || sb.object_count > CELLFS_MAX_OBJECTS {
            rep.push(Finding::err(
                "SB.COUNT",
                format!("object count {} outside 1..={}", sb.object_count, CELLFS_MAX_OBJECTS),
            ));
        }
        Ok(())
    }

    fn check_bitmaps(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult<()> {
        let Some(sb) = self.superblock_usable()? else {
            return Ok(());
        };
        for bit in 0..CELLFS_FIRST_ALLOCATABLE as usize {
            if sb.free_blocks.get_bit(bit) {
                rep.push(Finding::err("BMP.RESERVED", format!("reserved block {bit} marked free")));
            }
            if sb.free_ids.get_bit(bit) {
                rep.push(Finding::err("BMP.RESERVED", format!("reserved id {bit} marked free")));
            }
        }
        if sb.is_block_free(CELLFS_ROOT_DATA_BLOCK) {
            rep.push(Finding::err("BMP.ROOT_BLOCK", "root data block marked free"));
        }
        rep.push(Finding::info(
            "BMP.FREE",
            format!(
                "{} blocks free, {} ids free",
                sb.free_blocks.count_ones(),
                sb.free_ids.count_ones()
            ),
        ));
        Ok(())
    }

    fn check_table(&mut self, opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult<()> {
        let Some(sb) = self.superblock_usable()? else {
            return Ok(());
        };

        let mut live_ids = HashSet::new();
        let mut blocks: HashMap<u64, u64> = HashMap::new();
        let mut stale = 0usize;

        for rec in self.table_slots(&sb)? {
            if rec.id != CELLFS_ROOT_ID && sb.is_id_free(rec.id) {
                stale += 1;
                continue;
            }
            if !live_ids.insert(rec.id) {
                rep.push(Finding::err("TBL.DUP", format!("id {} appears twice", rec.id)));
                continue;
            }
            if rec.object_kind().is_none() {
                rep.push(Finding::err("TBL.KIND", format!("id {} has kind {}", rec.id, rec.kind)));
            }
            if rec.data_block < CELLFS_FIRST_ALLOCATABLE || rec.data_block >= CELLFS_BITMAP_WIDTH {
                rep.push(Finding::err(
                    "TBL.BLOCK_RANGE",
                    format!("id {} points at block {}", rec.id, rec.data_block),
                ));
            } else if sb.is_block_free(rec.data_block) {
                rep.push(Finding::err(
                    "TBL.BLOCK_FREE",
                    format!("id {} uses free block {}", rec.id, rec.data_block),
                ));
            }
            if let Some(other) = blocks.insert(rec.data_block, rec.id) {
                rep.push(Finding::err(
                    "TBL.BLOCK_SHARED",
                    format!("block {} owned by ids {} and {}", rec.data_block, other, rec.id),
                ));
            }
        }

        for id in CELLFS_FIRST_ALLOCATABLE..CELLFS_BITMAP_WIDTH {
            if !sb.is_id_free(id) && !live_ids.contains(&id) {
                rep.push(Finding::warn("TBL.LEAKED_ID", format!("id {id} in use but has no record")));
            }
        }
        for block in CELLFS_ROOT_DATA_BLOCK + 1..CELLFS_BITMAP_WIDTH {
            // Blocks past the device end also read as used.
            if !sb.is_block_free(block) && !blocks.contains_key(&block) {
                rep.push(Finding::info("BMP.UNOWNED", format!("block {block} used by no live record")));
            }
        }

        if opt.report_stale && stale > 0 {
            rep.push(Finding::info("TBL.STALE", format!("{stale} stale slot(s)")));
        }
        Ok(())
    }

    fn check_root(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult<()> {
        let Some(sb) = self.superblock_usable()? else {
            return Ok(());
        };
        match self.live_records(&sb)?.get(&CELLFS_ROOT_ID) {
            None => rep.push(Finding::err("ROOT.MISSING", "no record for the root container")),
            Some(root) if !root.is_container() => {
                rep.push(Finding::err("ROOT.KIND", "root is not a container"))
            }
            Some(root) if root.data_block != CELLFS_ROOT_DATA_BLOCK => rep.push(Finding::err(
                "ROOT.BLOCK",
                format!("root data block is {}", root.data_block),
            )),
            Some(_) => {}
        }
        Ok(())
    }

    fn check_cross_reference(&mut self, opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult<()> {
        let Some(sb) = self.superblock_usable()? else {
            return Ok(());
        };
        let live = self.live_records(&sb)?.clone();
        let mut refs: HashMap<u64, usize> = HashMap::new();

        let mut containers: Vec<&CellInode> = live.values().filter(|r| r.is_container()).collect();
        containers.sort_by_key(|r| r.id);

        for dir in containers {
            if dir.child_slots > CELLFS_DIRENTS_PER_BLOCK as u64 {
                rep.push(Finding::err(
                    "DIR.CURSOR",
                    format!("container {} cursor {} past block end", dir.id, dir.child_slots),
                ));
            }

            let entries = self.entries_of(dir)?;
            let mut names = HashSet::new();
            let mut tombstones = 0usize;

            for d in &entries {
                if d.is_tombstone() {
                    tombstones += 1;
                    continue;
                }
                if !d.is_live() {
                    rep.push(Finding::err(
                        "DIR.UNWRITTEN",
                        format!("container {} has an unwritten slot below its cursor", dir.id),
                    ));
                    continue;
                }
                match live.get(&d.id) {
                    None => rep.push(Finding::err(
                        "DIR.DANGLING",
                        format!("'{}' in {} points at dead id {}", d.name_lossy(), dir.id, d.id),
                    )),
                    Some(target) if target.object_kind().is_none() => rep.push(Finding::err(
                        "DIR.TARGET_KIND",
                        format!("'{}' in {} points at an object of unknown kind", d.name_lossy(), dir.id),
                    )),
                    Some(_) => *refs.entry(d.id).or_default() += 1,
                }
                if !names.insert(d.name_bytes().to_vec()) {
                    rep.push(Finding::warn(
                        "DIR.DUP_NAME",
                        format!("'{}' listed twice in {}", d.name_lossy(), dir.id),
                    ));
                }
            }

            if opt.report_tombstones && tombstones > 0 {
                rep.push(Finding::info(
                    "DIR.TOMBSTONES",
                    format!("container {} holds {tombstones} tombstone(s)", dir.id),
                ));
            }
        }

        let mut ids: Vec<u64> = live.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let n = refs.get(&id).copied().unwrap_or(0);
            if id == CELLFS_ROOT_ID {
                if n != 0 {
                    rep.push(Finding::err("XREF.ROOT", "root is listed inside a container"));
                }
            } else if n == 0 {
                rep.push(Finding::err("XREF.ORPHAN", format!("id {id} is in no container")));
            } else if n > 1 {
                rep.push(Finding::err("XREF.MULTI", format!("id {id} is listed {n} times")));
            }
        }
        Ok(())
    }

    fn check_content(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult<()> {
        let Some(sb) = self.superblock_usable()? else {
            return Ok(());
        };
        let mut oversized: Vec<u64> = self
            .live_records(&sb)?
            .values()
            .filter(|r| r.object_kind() == Some(ObjectKind::Leaf) && r.size > CELLFS_BLOCK_SIZE as u64)
            .map(|r| r.id)
            .collect();
        oversized.sort_unstable();
        for id in oversized {
            rep.push(Finding::err("LEAF.SIZE", format!("leaf {id} larger than one block")));
        }
        Ok(())
    }
}
