use criterion::{Criterion, black_box, criterion_group, criterion_main};
use prag_core::model::spec::DomainSpec;
use prag_core::reasoner::{OutputSpace, RsaEngine};

const DOMAIN: &str = r#"{
    "worlds": {
        "w0": "Olympic-caliber sprinter",
        "w1": "retired sprinter turned pundit",
        "w2": "office clerk",
        "w3": "surgeon"
    },
    "utterances": {
        "Olympic sprinter": [1, 0, 0, 0],
        "works indoors": [0, 1, 1, 1]
    },
    "quds": {
        "profession": {
            "athlete": [1, 0, 0, 0],
            "non-athlete": [0, 1, 1, 1]
        }
    }
}"#;

fn bench_pragmatic_listener(c: &mut Criterion) {
    let mut group = c.benchmark_group("pragmatic_listener");
    // cold: every nested posterior is enumerated; warm: served from cache
    group.bench_function("cold_cache", |b| {
        b.iter(|| {
            let engine = RsaEngine::new(DomainSpec::from_json_str(DOMAIN).expect("parse domain"));
            black_box(
                engine
                    .pragmatic_listener("Olympic sprinter", "profession", OutputSpace::World)
                    .expect("pragmatic listener"),
            )
        })
    });

    let engine = RsaEngine::new(DomainSpec::from_json_str(DOMAIN).expect("parse domain"));
    group.bench_function("warm_cache", |b| {
        b.iter(|| {
            black_box(
                engine
                    .pragmatic_listener("Olympic sprinter", "profession", OutputSpace::World)
                    .expect("pragmatic listener"),
            )
        })
    });
    group.finish();
}

criterion_group!(benches, bench_pragmatic_listener);
criterion_main!(benches);
