// Criterion benchmarks for Coffind Algo

use coffind_algo::catalog::{Catalog, ALL_TAGS};
use coffind_algo::core::{rank, score_venue};
use coffind_algo::models::{SocketLevel, UserPreferences, Venue, VenueAttributes, WifiLevel};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn create_venue(id: usize) -> Venue {
    // Rotate through the tag vocabulary so venues differ in overlap
    let tags = ALL_TAGS
        .iter()
        .enumerate()
        .filter(|(i, _)| (i + id) % 3 != 0)
        .map(|(_, t)| t.to_string())
        .collect();

    Venue {
        id: format!("bench_{}", id),
        name: format!("Cafe {}", id),
        tags,
        distance: 100 + (id as u32 * 37) % 3000,
        location: "大安區".to_string(),
        address: None,
        attributes: VenueAttributes {
            quietness: 1 + (id % 5) as u8,
            sockets: SocketLevel::Few,
            wifi: WifiLevel::Strong,
            time_limit: "Unlimited".to_string(),
            food: vec![],
            closing_time: "22:00".to_string(),
        },
    }
}

fn create_preferences() -> UserPreferences {
    UserPreferences {
        location: "忠孝敦化".to_string(),
        must_have_tags: ["插座多".to_string()].into(),
        nice_to_have_tags: ["Wi-Fi強".to_string(), "不限時".to_string()].into(),
    }
}

fn bench_score_venue(c: &mut Criterion) {
    let venue = create_venue(1);
    let preferences = create_preferences();

    c.bench_function("score_venue", |b| {
        b.iter(|| score_venue(black_box(&venue), black_box(&preferences)));
    });
}

fn bench_rank_seed_catalog(c: &mut Criterion) {
    let catalog = Catalog::seed();
    let preferences = create_preferences();

    c.bench_function("rank_seed_catalog", |b| {
        b.iter(|| rank(black_box(&catalog), black_box(&preferences)));
    });
}

fn bench_rank_scaling(c: &mut Criterion) {
    let preferences = create_preferences();

    let mut group = c.benchmark_group("ranking");

    for venue_count in [10, 50, 100, 500].iter() {
        let catalog = Catalog::from_venues((0..*venue_count).map(create_venue).collect());

        group.bench_with_input(
            BenchmarkId::new("rank", venue_count),
            venue_count,
            |b, _| {
                b.iter(|| rank(black_box(&catalog), black_box(&preferences)));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_score_venue,
    bench_rank_seed_catalog,
    bench_rank_scaling
);

criterion_main!(benches);
