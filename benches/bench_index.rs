// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Index and array IO Benchmarks

use criterion::*;
use lofar_dal::{
    index::{flat_index, unravel_index},
    ArrayDesc, ArrayOrder, DalFile, ElementType, FileType, Hyperslab, IoMode, SelectionOp,
};
use tempfile::tempdir;

// //////////////// //
// Index Benchmarks //
// //////////////// //

fn index(c: &mut Criterion) {
    let shape = [20, 128, 384];

    c.bench_function("flat_index row-major", |b| {
        b.iter(|| {
            for i in 0..shape[0] {
                for j in 0..shape[1] {
                    black_box(flat_index(&shape, ArrayOrder::RowMajor, &[i, j, 7]).unwrap());
                }
            }
        })
    });

    c.bench_function("flat_index column-major", |b| {
        b.iter(|| {
            for i in 0..shape[0] {
                for j in 0..shape[1] {
                    black_box(flat_index(&shape, ArrayOrder::ColumnMajor, &[i, j, 7]).unwrap());
                }
            }
        })
    });

    c.bench_function("unravel_index", |b| {
        b.iter(|| {
            for offset in (0..shape.iter().product::<usize>()).step_by(97) {
                black_box(unravel_index(&shape, ArrayOrder::RowMajor, offset).unwrap());
            }
        })
    });
}

// ///////////// //
// IO Benchmarks //
// ///////////// //

/// A dipole dataset the length of one TBB dump.
const DUMP_LEN: usize = 200_000;

fn array_io(c: &mut Criterion) {
    let samples: Vec<i16> = (0..DUMP_LEN).map(|i| (i % 2048) as i16).collect();

    c.bench_function("in-memory extend and write", |b| {
        b.iter(|| {
            let file = DalFile::in_memory();
            let dipole = file
                .root()
                .create_array(
                    "000000000",
                    &ArrayDesc::new(ElementType::Short, vec![0]).chunked(vec![5000]),
                )
                .unwrap();
            dipole.extend(&[DUMP_LEN]).unwrap();
            dipole.write(0, &samples).unwrap();
        })
    });

    let file = DalFile::in_memory();
    let mut dipole = file
        .root()
        .create_array_with_data("000000000", vec![DUMP_LEN], vec![5000], &samples)
        .unwrap();

    c.bench_function("in-memory read", |b| {
        b.iter(|| black_box(dipole.read().unwrap()))
    });

    dipole
        .set_hyperslab(
            Hyperslab::new(vec![0], Some(vec![4]), Some(vec![DUMP_LEN / 8]), Some(vec![2])).unwrap(),
            SelectionOp::Set,
            false,
        )
        .unwrap();
    c.bench_function("in-memory strided selection read", |b| {
        b.iter(|| black_box(dipole.read_selection().unwrap()))
    });

    if cfg!(feature = "hdf5") {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bench.h5");
        let file = DalFile::create(&path, FileType::Hdf5, IoMode::Create).unwrap();
        let dipole = file
            .root()
            .create_array_with_data("000000000", vec![DUMP_LEN], vec![5000], &samples)
            .unwrap();
        c.bench_function("hdf5 read", |b| b.iter(|| black_box(dipole.read().unwrap())));
    }
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(30);
    targets = index, array_io
);

criterion_main!(benches);
