//! Performance benchmarks for flowstrip

use criterion::{Criterion, criterion_group, criterion_main};
use flowstrip::test_utils::TestTree;
use flowstrip::{
    FileProcessor, OutputMode, PathClassifier, Pipeline, SilentReporter, Walker, WalkerConfig,
};
use std::hint::black_box;

const FLOW_MODULE: &str = r#"/**
 * Button component
 * @flow strict
 */

import type { Node } from 'react';
import typeof ReactType from 'react';
import * as React from 'react';
import { useState, type SetStateAction } from 'react';

type Props = {|
  +label: string,
  +onPress: () => void,
|};

export function Button({ label, onPress }: Props): Node {
  // $FlowFixMe[incompatible-return]
  const [pressed, setPressed] = useState(false);
  return <button onClick={onPress}>{label}</button>;
}

export type { Props };
export { Button as default };
"#;

const PLAIN_MODULE: &str = r#"import React from 'react';

export default function App() {
  const items = [1, 2, 3].map((n) => n * 2);
  return items.length > 0 ? `count: ${items.length}` : null;
}
"#;

/// A module with `n` copies of the component body.
fn large_module(n: usize) -> String {
    let mut out = String::from(FLOW_MODULE);
    for i in 0..n {
        out.push_str(&format!(
            "\nimport type {{ T{i} }} from './t{i}';\nexport function f{i}(x: T{i}): T{i} {{\n  return x;\n}}\n"
        ));
    }
    out
}

fn create_tree(file_count: usize) -> TestTree {
    let tree = TestTree::new();
    for i in 0..file_count {
        let path = format!("pkg{}/src/module_{}.js", i % 8, i);
        tree.add_file(&path, FLOW_MODULE);
    }
    tree.add_file("node_modules/dep/index.js", PLAIN_MODULE);
    tree
}

fn bench_pipeline(c: &mut Criterion) {
    let pipeline = Pipeline::standard();
    let large = large_module(200);

    let mut group = c.benchmark_group("pipeline");

    group.bench_function("flow_module", |b| {
        b.iter(|| pipeline.run(black_box(FLOW_MODULE)))
    });

    group.bench_function("plain_module", |b| {
        b.iter(|| pipeline.run(black_box(PLAIN_MODULE)))
    });

    group.bench_function("large_module_200_decls", |b| {
        b.iter(|| pipeline.run(black_box(&large)))
    });

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let large = large_module(200);

    let mut group = c.benchmark_group("parse");

    group.bench_function("flow_module", |b| {
        b.iter(|| flowstrip::syntax::parse(black_box(FLOW_MODULE)))
    });

    group.bench_function("large_module_200_decls", |b| {
        b.iter(|| flowstrip::syntax::parse(black_box(&large)))
    });

    group.finish();
}

fn walker(tree: &TestTree, jobs: usize) -> Walker<FileProcessor> {
    let config = WalkerConfig {
        base_dir: Some(tree.path().to_path_buf()),
        dry_run: true,
        jobs,
        ..Default::default()
    };
    let classifier = PathClassifier::new(&config).unwrap();
    let processor = FileProcessor::new(Pipeline::standard(), OutputMode::InPlace).dry_run(true);
    Walker::new(classifier, processor).with_jobs(jobs)
}

fn bench_walk(c: &mut Criterion) {
    let small = create_tree(10);
    let medium = create_tree(100);
    let large = create_tree(500);

    let mut group = c.benchmark_group("walk_dry_run");

    group.bench_function("small_tree_10_files", |b| {
        let w = walker(&small, 1);
        b.iter(|| w.walk(black_box(small.path()), 0, &mut SilentReporter))
    });

    group.bench_function("medium_tree_100_files", |b| {
        let w = walker(&medium, 1);
        b.iter(|| w.walk(black_box(medium.path()), 0, &mut SilentReporter))
    });

    group.bench_function("large_tree_500_files", |b| {
        let w = walker(&large, 1);
        b.iter(|| w.walk(black_box(large.path()), 0, &mut SilentReporter))
    });

    group.bench_function("large_tree_500_files_parallel", |b| {
        let w = walker(&large, 0);
        b.iter(|| w.walk(black_box(large.path()), 0, &mut SilentReporter))
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_parse, bench_walk);
criterion_main!(benches);
