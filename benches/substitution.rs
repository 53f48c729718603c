// Macro pass benchmark - literal substitution and orphan validation
//
// Templates grow with the number of resources; the token map grows with the
// parameter namespace. Both sizes matter because every string leaf is tried
// against every token.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use phoenix_core::source::StoredParameter;
use phoenix_core::substitution::substitute_literals;
use phoenix_core::validation::find_orphans;
use phoenix_core::SubstitutionMap;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy)]
enum WorkloadSize {
    Small,
    Medium,
}

impl WorkloadSize {
    fn resources(self) -> usize {
        match self {
            WorkloadSize::Small => 20,
            WorkloadSize::Medium => 400,
        }
    }

    fn parameters(self) -> usize {
        match self {
            WorkloadSize::Small => 10,
            WorkloadSize::Medium => 200,
        }
    }
}

fn generate_template(size: WorkloadSize) -> Value {
    let mut resources = Map::new();
    for i in 0..size.resources() {
        let token = i % size.parameters();
        resources.insert(
            format!("Function{}PHX_RANDOM_SUFFIX", i),
            json!({
                "Type": "AWS::Lambda::Function",
                "Properties": {
                    "FunctionName": format!("PHX_MACRO_PROJECT_NAME-fn-{}", i),
                    "Environment": {"Variables": {
                        "SETTING": format!("PHX_MACRO_SETTING_{}", token),
                        "STATIC": "unchanged"
                    }},
                    "Tags": [{"Key": "index", "Value": i.to_string()}]
                }
            }),
        );
    }
    json!({"AWSTemplateFormatVersion": "2010-09-09", "Resources": resources})
}

fn generate_map(size: WorkloadSize) -> SubstitutionMap {
    let mut map = SubstitutionMap::new();
    map.insert("PHX_MACRO_PROJECT_NAME", "shop");
    for i in 0..size.parameters() {
        map.insert_parameter(
            "PHX_MACRO_",
            "/shop/",
            StoredParameter::plain(format!("/shop/setting-{}", i), format!("value-{}", i)),
        );
    }
    map
}

fn bench_substitute_literals(c: &mut Criterion) {
    let mut group = c.benchmark_group("substitute_literals");

    for size in [WorkloadSize::Small, WorkloadSize::Medium] {
        let template = generate_template(size);
        let map = generate_map(size);

        group.throughput(Throughput::Elements(size.resources() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", size)),
            &template,
            |b, template| {
                b.iter(|| {
                    let mut fragment = template.clone();
                    let replaced = substitute_literals(&mut fragment, &map);
                    black_box((fragment, replaced));
                });
            },
        );
    }

    group.finish();
}

fn bench_find_orphans(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_orphans");

    for size in [WorkloadSize::Small, WorkloadSize::Medium] {
        let template = generate_template(size);

        group.throughput(Throughput::Elements(size.resources() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", size)),
            &template,
            |b, template| {
                b.iter(|| black_box(find_orphans(template, "PHX_MACRO_").unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_substitute_literals, bench_find_orphans);
criterion_main!(benches);
