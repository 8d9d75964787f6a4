// SPDX-License-Identifier: MIT
#![allow(dead_code)]

use cellfs::prelude::*;

pub const IMAGE_BLOCKS: usize = 64;

/// Quick-formatted in-memory image of `blocks` blocks.
pub fn formatted_image(blocks: usize) -> Vec<u8> {
    let mut buf = vec![0u8; blocks * CELLFS_BLOCK_SIZE];
    let mut io = MemCellIO::new(&mut buf);
    CellFormatter::new(&mut io, FormatOptions::default().with_label("TEST"))
        .format(false)
        .expect("format failed");
    buf
}

pub fn mount(buf: &mut [u8]) -> CellFs<MemCellIO<'_>> {
    CellFs::mount(MemCellIO::new(buf)).expect("mount failed")
}

pub fn names(fs: &CellFs<MemCellIO<'_>>, parent: u64) -> Vec<String> {
    fs.list_children(parent)
        .expect("list failed")
        .map(|e| e.name)
        .collect()
}
