use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use org_chart_rs::config::ChartConfig;
use org_chart_rs::hierarchy::Hierarchy;
use org_chart_rs::ir::{Orientation, Record};
use org_chart_rs::layout::flextree::FlexTree;
use org_chart_rs::OrgChart;
use std::hint::black_box;

/// Every node gets `fanout` children until `nodes` records exist.
fn wide_org(nodes: usize, fanout: usize) -> Vec<Record> {
    let mut records = Vec::with_capacity(nodes);
    records.push(Record::new("n0", None));
    for i in 1..nodes {
        let parent = format!("n{}", (i - 1) / fanout);
        records.push(Record::new(format!("n{i}"), Some(parent.as_str())));
    }
    records
}

/// A single reporting line.
fn deep_org(nodes: usize) -> Vec<Record> {
    let mut records = Vec::with_capacity(nodes);
    records.push(Record::new("n0", None));
    for i in 1..nodes {
        let parent = format!("n{}", i - 1);
        records.push(Record::new(format!("n{i}"), Some(parent.as_str())));
    }
    records
}

fn bench_hierarchy(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchy");
    for nodes in [100usize, 1_000, 10_000] {
        let records = wide_org(nodes, 6);
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &records, |b, data| {
            b.iter(|| {
                let hierarchy = Hierarchy::build(black_box(data)).expect("build failed");
                black_box(hierarchy.len());
            });
        });
    }
    group.finish();
}

fn bench_flextree(c: &mut Criterion) {
    let mut group = c.benchmark_group("flextree");
    for nodes in [1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::new("wide", nodes), &nodes, |b, &n| {
            b.iter(|| {
                let mut tree = FlexTree::with_capacity(n);
                tree.add(None, [270.0, 210.0]);
                for i in 1..n {
                    let width = 200.0 + (i % 7) as f32 * 15.0;
                    tree.add(Some((i - 1) / 4), [width, 210.0]);
                }
                tree.layout(|_, _| 0.0);
                black_box(tree.position(n - 1));
            });
        });
        group.bench_with_input(BenchmarkId::new("chain", nodes), &nodes, |b, &n| {
            b.iter(|| {
                let mut tree = FlexTree::with_capacity(n);
                tree.add(None, [270.0, 210.0]);
                for i in 1..n {
                    tree.add(Some(i - 1), [270.0, 210.0]);
                }
                tree.layout(|_, _| 0.0);
                black_box(tree.position(n - 1));
            });
        });
    }
    group.finish();
}

fn bench_chart_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("chart_layout");
    let cases = [
        ("wide_500", wide_org(500, 8)),
        ("wide_5000", wide_org(5_000, 8)),
        ("deep_2000", deep_org(2_000)),
    ];
    for (name, records) in cases {
        for (mode, compact) in [("plain", false), ("compact", true)] {
            let mut config = ChartConfig::default();
            config.compact.enabled = compact;
            config.layout.orientation = Orientation::Top;
            let mut chart = OrgChart::new(records.clone(), config).expect("valid org");
            chart.expand_all();
            group.bench_function(BenchmarkId::new(mode, name), |b| {
                b.iter(|| {
                    let layout = chart.layout().expect("layout");
                    black_box(layout.nodes.len());
                });
            });
        }
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_hierarchy, bench_flextree, bench_chart_layout
);
criterion_main!(benches);
