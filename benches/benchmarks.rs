// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::{fs, path::Path};

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use target_inventory::{Inventory, InventoryConfig, NameStrategy, scan_targets};
use tempfile::TempDir;

fn build_inventory(targets: usize,) -> TempDir
{
    let temp = tempfile::tempdir().expect("failed to create tempdir",);
    let root = temp.path();
    write(root, "classes/common.yml", "parameters:\n  region: eu\n  labels: [common]\n",);
    write(
        root,
        "classes/web/init.yml",
        "classes: [common]\napplications: [nginx]\nparameters:\n  labels: [web]\n",
    );
    for i in 0..targets {
        write(
            root,
            &format!("targets/env{}/target{i}.yml", i % 10),
            &format!("classes: [web]\nparameters:\n  replicas: {i}\n"),
        );
    }
    temp
}

fn write(root: &Path, relative: &str, contents: &str,)
{
    let path = root.join(relative,);
    if let Some(parent,) = path.parent() {
        fs::create_dir_all(parent,).expect("failed to create directories",);
    }
    fs::write(path, contents,).expect("failed to write file",);
}

fn benchmark_discovery(c: &mut Criterion,)
{
    let temp = build_inventory(200,);
    let targets = temp.path().join("targets",);

    c.bench_function("scan_200_targets_compact", |b| {
        b.iter(|| scan_targets(black_box(&targets,), NameStrategy::Compact,).expect("scan failed",),)
    },);

    c.bench_function("scan_200_targets_composed", |b| {
        b.iter(|| {
            scan_targets(black_box(&targets,), NameStrategy::Composed {
                joiner: '.',
            },)
            .expect("scan failed",)
        },)
    },);
}

fn benchmark_render(c: &mut Criterion,)
{
    let temp = build_inventory(200,);
    let config = InventoryConfig::new(temp.path(),);

    c.bench_function("render_200_targets_yaml_backend", |b| {
        b.iter(|| {
            let inventory = Inventory::new(&config,);
            let targets =
                inventory.get_targets::<&str,>(&[], false,).expect("render failed",);
            black_box(targets.len(),)
        },)
    },);

    c.bench_function("lookup_rendered_target", |b| {
        let inventory = Inventory::new(&config,);
        inventory.get_targets::<&str,>(&[], false,).expect("render failed",);
        b.iter(|| inventory.get_parameters(black_box("target42",), false,).expect("lookup failed",),)
    },);
}

criterion_group!(benches, benchmark_discovery, benchmark_render);
criterion_main!(benches);
