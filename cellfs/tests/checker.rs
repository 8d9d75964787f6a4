// SPDX-License-Identifier: MIT

mod common;

use cellfs::prelude::*;
use common::*;

const TABLE: usize = CELLFS_BLOCK_SIZE;

/// Byte offset of field `field_off` in table slot `slot`.
fn slot_field(slot: usize, field_off: usize) -> usize {
    TABLE + slot * CELLFS_INODE_SIZE + field_off
}

fn check(buf: &mut [u8], opts: &CellCheckOptions) -> VerifyReport {
    let mut io = MemCellIO::new(buf);
    CellChecker::new(&mut io).check_with(opts).expect("check failed")
}

fn populated() -> Vec<u8> {
    let mut buf = formatted_image(IMAGE_BLOCKS);
    {
        let fs = mount(&mut buf);
        let dir = fs
            .create_object(CELLFS_ROOT_ID, "dir", ObjectKind::Container)
            .unwrap();
        let f = fs.create_object(dir, "file", ObjectKind::Leaf).unwrap();
        fs.write_content(f, 0, b"payload").unwrap();
        let gone = fs.create_object(dir, "gone", ObjectKind::Leaf).unwrap();
        fs.remove_object(dir, gone, "gone").unwrap();
    }
    buf
}

#[test]
fn test_fresh_and_populated_images_are_clean() {
    let mut fresh = formatted_image(IMAGE_BLOCKS);
    let report = check(&mut fresh, &CellCheckOptions::default());
    assert!(report.ok(), "{report}");
    assert_eq!(report.count(Severity::Warn), 0);

    let mut buf = populated();
    let report = check(&mut buf, &CellCheckOptions::default());
    assert!(report.ok(), "{report}");
    assert!(report.has_code("DIR.TOMBSTONES"));
    assert!(report.has_code("TBL.STALE"));
}

#[test]
fn test_check_through_mounted_handle() {
    let mut buf = populated();
    let fs = mount(&mut buf);
    let report = fs.check().unwrap();
    assert!(report.ok(), "{}", report.errors_only());
}

#[test]
fn test_bad_magic_reported_and_rest_skipped() {
    let mut buf = formatted_image(IMAGE_BLOCKS);
    buf[8..16].copy_from_slice(&0xDEADu64.to_ne_bytes());

    let report = check(&mut buf, &CellCheckOptions::default());
    assert!(report.has_code("SB.MAGIC"));
    assert!(!report.has_code("BMP.FREE"));
}

#[test]
fn test_root_block_marked_free() {
    let mut buf = formatted_image(IMAGE_BLOCKS);
    // free_blocks lives at byte 32 of the superblock.
    let mut word = u64::from_ne_bytes(buf[32..40].try_into().unwrap());
    word |= 1 << CELLFS_ROOT_DATA_BLOCK;
    buf[32..40].copy_from_slice(&word.to_ne_bytes());

    let report = check(&mut buf, &CellCheckOptions::default());
    assert!(report.has_code("BMP.ROOT_BLOCK"));
    assert!(report.has_code("TBL.BLOCK_FREE"));
}

#[test]
fn test_dangling_entry() {
    let mut buf = populated();
    // free_ids at byte 40: mark the live file (id 3) as free.
    let mut word = u64::from_ne_bytes(buf[40..48].try_into().unwrap());
    word |= 1 << 3;
    buf[40..48].copy_from_slice(&word.to_ne_bytes());

    let report = check(&mut buf, &CellCheckOptions::default());
    assert!(report.has_code("DIR.DANGLING"), "{report}");
}

#[test]
fn test_oversized_leaf_and_fail_fast() {
    let mut buf = populated();
    // Slot 2 holds the file; size is at byte 24 of the record.
    let off = slot_field(2, 24);
    buf[off..off + 8].copy_from_slice(&(CELLFS_BLOCK_SIZE as u64 * 2).to_ne_bytes());
    // And a reserved identifier marked free.
    let mut word = u64::from_ne_bytes(buf[40..48].try_into().unwrap());
    word |= 1;
    buf[40..48].copy_from_slice(&word.to_ne_bytes());

    let full = check(&mut buf, &CellCheckOptions::default());
    assert!(full.has_code("BMP.RESERVED"));
    assert!(full.has_code("LEAF.SIZE"));

    let fast = check(
        &mut buf,
        &CellCheckOptions {
            fail_fast: true,
            ..CellCheckOptions::default()
        },
    );
    assert!(fast.has_code("BMP.RESERVED"));
    assert!(!fast.has_code("LEAF.SIZE"));

    let content_only = check(
        &mut buf,
        &CellCheckOptions {
            phases: VerifyPhases::CONTENT,
            ..CellCheckOptions::default()
        },
    );
    assert!(content_only.has_code("LEAF.SIZE"));
    assert!(!content_only.has_code("BMP.RESERVED"));
}

#[test]
fn test_orphan_object() {
    let mut buf = populated();
    // Tombstone the live "file" entry (slot 0 of dir's block) by hand.
    let dir_block = 3;
    let state = dir_block * CELLFS_BLOCK_SIZE + 8;
    assert_eq!(buf[state], 1);
    buf[state] = 2;

    let report = check(&mut buf, &CellCheckOptions::default());
    assert!(report.has_code("XREF.ORPHAN"), "{report}");
}
