use criterion::{BatchSize, Criterion, criterion_group, criterion_main};

use cellfs::prelude::*;

criterion_group!(benches, format_bench, object_bench, file_bench);
criterion_main!(benches);

const BLOCKS: usize = 64;

fn fresh() -> Vec<u8> {
    let mut buf = vec![0u8; BLOCKS * CELLFS_BLOCK_SIZE];
    let mut io = MemCellIO::new(&mut buf);
    CellFormatter::new(&mut io, FormatOptions::default())
        .format(false)
        .expect("format failed");
    buf
}

pub fn format_bench(c: &mut Criterion) {
    let mut buf = vec![0u8; BLOCKS * CELLFS_BLOCK_SIZE];

    c.bench_function("cellfs_quick_format_mem", |b| {
        b.iter(|| {
            let mut io = MemCellIO::new(&mut buf);
            CellFormatter::new(&mut io, FormatOptions::default())
                .format(false)
                .expect("format failed");
        });
    });

    c.bench_function("cellfs_full_format_mem", |b| {
        b.iter(|| {
            let mut io = MemCellIO::new(&mut buf);
            CellFormatter::new(&mut io, FormatOptions::default())
                .format(true)
                .expect("format failed");
        });
    });
}

pub fn object_bench(c: &mut Criterion) {
    c.bench_function("cellfs_fill_root_mem", |b| {
        b.iter_batched(
            fresh,
            |mut buf| {
                let fs = CellFs::mount(MemCellIO::new(&mut buf)).expect("mount failed");
                let mut i = 0;
                while fs
                    .create_object(CELLFS_ROOT_ID, &format!("f{i}"), ObjectKind::Leaf)
                    .is_ok()
                {
                    i += 1;
                }
            },
            BatchSize::SmallInput,
        );
    });

    let mut buf = fresh();
    let fs = CellFs::mount(MemCellIO::new(&mut buf)).expect("mount failed");
    for i in 0..48 {
        fs.create_object(CELLFS_ROOT_ID, &format!("f{i}"), ObjectKind::Leaf)
            .expect("create failed");
    }

    c.bench_function("cellfs_lookup_last_of_48", |b| {
        b.iter(|| fs.lookup(CELLFS_ROOT_ID, "f47").expect("lookup failed"));
    });

    c.bench_function("cellfs_list_root_48", |b| {
        b.iter(|| fs.list_children(CELLFS_ROOT_ID).expect("list failed").count());
    });

    // Each create consumes a root entry slot for good, so start fresh.
    c.bench_function("cellfs_mount_create_remove", |b| {
        b.iter_batched(
            fresh,
            |mut buf| {
                let fs = CellFs::mount(MemCellIO::new(&mut buf)).expect("mount failed");
                let id = fs
                    .create_object(CELLFS_ROOT_ID, "tmp", ObjectKind::Leaf)
                    .expect("create failed");
                fs.remove_object(CELLFS_ROOT_ID, id, "tmp").expect("remove failed");
            },
            BatchSize::SmallInput,
        );
    });
}

pub fn file_bench(c: &mut Criterion) {
    const IMAGE_BYTES: u64 = BLOCKS as u64 * CELLFS_BLOCK_SIZE as u64;

    let mut file = tempfile::tempfile().expect("tempfile failed");
    file.set_len(IMAGE_BYTES).expect("set_len failed");
    let mut io = StdCellIO::new(&mut file);
    CellFormatter::new(&mut io, FormatOptions::default().with_device_blocks(BLOCKS as u64))
        .format(false)
        .expect("format failed");
    let fs = CellFs::mount(io).expect("mount failed");
    let id = fs
        .create_object(CELLFS_ROOT_ID, "data", ObjectKind::Leaf)
        .expect("create failed");
    let payload = vec![0x5Au8; CELLFS_BLOCK_SIZE];

    c.bench_function("cellfs_write_block_file", |b| {
        b.iter(|| fs.write_content(id, 0, &payload).expect("write failed"));
    });

    c.bench_function("cellfs_read_block_file", |b| {
        b.iter(|| fs.read_content(id, 0, CELLFS_BLOCK_SIZE).expect("read failed"));
    });
}
