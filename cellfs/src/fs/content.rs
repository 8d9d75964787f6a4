// SPDX-License-Identifier: MIT

use cellio::prelude::*;
use tracing::debug;

use crate::core::errors::*;
use crate::fs::constant::*;
use crate::fs::inode_table::InodeTable;
use crate::fs::superblock::SuperblockStore;
use crate::fs::types::CellInode;

#[inline]
fn data_offset(rec: &CellInode, offset: u64) -> u64 {
    rec.data_block * CELLFS_BLOCK_SIZE as u64 + offset
}

/// At most `len` bytes from `offset`. Empty at or past end of content.
pub fn read<IO: CellIO + ?Sized>(io: &mut IO, rec: &CellInode, offset: u64, len: usize) -> FsResult<Vec<u8>> {
    if offset >= rec.size {
        return Ok(Vec::new());
    }
    let size = rec.size.min(CELLFS_BLOCK_SIZE as u64);
    let n = (size.saturating_sub(offset)).min(len as u64) as usize;
    let mut out = vec![0u8; n];
    if n > 0 {
        io.read_at(data_offset(rec, offset), &mut out)?;
    }
    Ok(out)
}

/// Writes `bytes` at `offset` and sets the size to `offset + bytes.len()`.
///
/// Content never leaves the object's single block: anything reaching
/// past it fails with `NoSpace` before a byte is written. Returns the
/// count written and the record as persisted.
pub fn write<IO: CellIO + ?Sized>(
    io: &mut IO,
    store: &mut SuperblockStore,
    rec: &CellInode,
    offset: u64,
    bytes: &[u8],
    now: u64,
) -> FsResult<(usize, CellInode)> {
    let end = offset
        .checked_add(bytes.len() as u64)
        .ok_or(FsError::NoSpace)?;
    if end > CELLFS_BLOCK_SIZE as u64 {
        return Err(FsError::NoSpace);
    }

    if !bytes.is_empty() {
        io.write_at(data_offset(rec, offset), bytes)?;
        io.flush()?;
    }

    let mut next = *rec;
    next.size = end;
    next.modified_at = now;
    InodeTable::new(io, store).update(&next)?;

    debug!(id = rec.id, offset, len = bytes.len(), size = end, "content write");
    Ok((bytes.len(), next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::types::{CellSuperblock, ObjectKind};
    use zerocopy::IntoBytes;

    fn setup(buf: &mut Vec<u8>) -> CellInode {
        buf.resize(4 * CELLFS_BLOCK_SIZE, 0);
        let sb = CellSuperblock::new(4, 0, [0; 16], [0; CELLFS_LABEL_LEN]);
        buf[..CELLFS_BLOCK_SIZE].copy_from_slice(sb.as_bytes());
        let leaf = CellInode::new(CELLFS_ROOT_ID, ObjectKind::Leaf, 3, 0);
        buf[CELLFS_BLOCK_SIZE..CELLFS_BLOCK_SIZE + CELLFS_INODE_SIZE].copy_from_slice(leaf.as_bytes());
        leaf
    }

    #[test]
    fn test_write_then_read() {
        let mut buf = Vec::new();
        let leaf = setup(&mut buf);
        let mut io = MemCellIO::new(&mut buf);
        let mut store = SuperblockStore::load(&mut io).unwrap();

        let (n, rec) = write(&mut io, &mut store, &leaf, 0, b"hello", 7).unwrap();
        assert_eq!(n, 5);
        assert_eq!(rec.size, 5);
        assert_eq!(rec.modified_at, 7);
        assert_eq!(read(&mut io, &rec, 0, 5).unwrap(), b"hello");
        assert_eq!(read(&mut io, &rec, 3, 10).unwrap(), b"lo");
        assert!(read(&mut io, &rec, 5, 10).unwrap().is_empty());
        assert!(read(&mut io, &rec, 500, 1).unwrap().is_empty());
    }

    #[test]
    fn test_short_write_truncates() {
        let mut buf = Vec::new();
        let leaf = setup(&mut buf);
        let mut io = MemCellIO::new(&mut buf);
        let mut store = SuperblockStore::load(&mut io).unwrap();

        let (_, rec) = write(&mut io, &mut store, &leaf, 0, b"hello world", 0).unwrap();
        let (_, rec) = write(&mut io, &mut store, &rec, 0, b"bye", 0).unwrap();
        assert_eq!(rec.size, 3);
        assert_eq!(read(&mut io, &rec, 0, 64).unwrap(), b"bye");
    }

    #[test]
    fn test_write_past_block_is_no_space_and_untouched() {
        let mut buf = Vec::new();
        let leaf = setup(&mut buf);
        let mut io = MemCellIO::new(&mut buf);
        let mut store = SuperblockStore::load(&mut io).unwrap();

        let (_, rec) = write(&mut io, &mut store, &leaf, 0, b"keep", 0).unwrap();
        let big = vec![0xEE; 10];
        assert_eq!(
            write(&mut io, &mut store, &rec, CELLFS_BLOCK_SIZE as u64 - 5, &big, 0),
            Err(FsError::NoSpace)
        );
        assert_eq!(
            write(&mut io, &mut store, &rec, u64::MAX, b"x", 0),
            Err(FsError::NoSpace)
        );
        let stored = InodeTable::new(&mut io, &mut store).find(CELLFS_ROOT_ID).unwrap();
        assert_eq!(stored.size, 4);
        drop(io);
        let tail = 4 * CELLFS_BLOCK_SIZE - 5;
        assert!(buf[tail..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_exactly_one_block() {
        let mut buf = Vec::new();
        let leaf = setup(&mut buf);
        let mut io = MemCellIO::new(&mut buf);
        let mut store = SuperblockStore::load(&mut io).unwrap();

        let full = vec![0xAB; CELLFS_BLOCK_SIZE];
        let (n, rec) = write(&mut io, &mut store, &leaf, 0, &full, 0).unwrap();
        assert_eq!(n, CELLFS_BLOCK_SIZE);
        assert_eq!(read(&mut io, &rec, 0, usize::MAX).unwrap().len(), CELLFS_BLOCK_SIZE);
    }
}
