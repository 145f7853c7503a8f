use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{Duration, Utc};

use adsim_analytics::benchmark::{analyze_benchmarks, percentile_rank};
use adsim_analytics::competitors::analyze_competitors;
use adsim_analytics::dataset::{
    BenchmarkPoints, BenchmarkTable, CampaignDataset, CampaignSnapshot, CompetitorActivity,
    MarketDataset, MetricObservation,
};
use adsim_analytics::CalibrationTable;
use adsim_core::{CampaignId, Channel, MetricKind};

fn campaign_dataset(history_len: usize) -> CampaignDataset {
    let now = Utc::now();
    let history = (0..history_len)
        .map(|i| MetricObservation {
            metric: MetricKind::ALL[i % MetricKind::ALL.len()],
            channel: if i % 2 == 0 {
                Channel::Search
            } else {
                Channel::Social
            },
            value: 0.5 + (i % 40) as f64 * 0.05,
            observed_at: now - Duration::days((i % 30) as i64),
        })
        .collect();

    CampaignDataset {
        campaign: CampaignSnapshot {
            campaign_id: CampaignId::new(),
            name: "bench campaign".to_string(),
            budget: 25_000.0,
            currency: "USD".to_string(),
            channels: vec![Channel::Search, Channel::Social],
            industry: "technology".to_string(),
            region: "us".to_string(),
        },
        history,
        fetched_at: now,
    }
}

fn benchmark_table() -> BenchmarkTable {
    let mut table = BenchmarkTable::new();
    for channel in Channel::standard() {
        for metric in MetricKind::ALL {
            table.insert(
                "technology",
                channel.clone(),
                "us",
                metric,
                BenchmarkPoints {
                    p25: 0.8,
                    p50: 1.2,
                    p75: 1.8,
                    sample_size: 500,
                },
            );
        }
    }
    table
}

fn market_dataset(observations: usize, competitors: usize) -> MarketDataset {
    let now = Utc::now();
    let sources = ["google_ads", "meta", "display", "youtube", "email"];
    let activity = (0..observations)
        .map(|i| CompetitorActivity {
            competitor: format!("competitor-{}", i % competitors),
            metric: MetricKind::ALL[i % MetricKind::ALL.len()],
            value: 50.0 + (i % 100) as f64,
            observed_at: now - Duration::days((i % 14) as i64),
            source: sources[i % sources.len()].to_string(),
        })
        .collect();

    MarketDataset {
        activity,
        benchmarks: BenchmarkTable::new(),
        fetched_at: now,
    }
}

fn bench_percentile_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("percentile_rank");
    group.sample_size(1000);

    let points = BenchmarkPoints {
        p25: 0.8,
        p50: 1.2,
        p75: 1.8,
        sample_size: 500,
    };

    group.bench_function("interpolation_sweep", |b| {
        b.iter(|| {
            let mut total = 0.0;
            let mut v = 0.0;
            while v < 3.0 {
                total += percentile_rank(black_box(v), &points);
                v += 0.01;
            }
            black_box(total)
        });
    });

    group.finish();
}

fn bench_benchmark_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("benchmark_analysis");
    let table = benchmark_table();
    let requested = MetricKind::ALL.to_vec();

    for history_len in [10usize, 100, 1000].iter() {
        let dataset = campaign_dataset(*history_len);
        let quality = dataset.quality(&requested, Utc::now());
        group.throughput(Throughput::Elements(*history_len as u64));
        group.bench_with_input(
            BenchmarkId::new("full_analysis", history_len),
            history_len,
            |b, _| {
                b.iter(|| {
                    black_box(analyze_benchmarks(
                        black_box(&dataset),
                        &table,
                        "technology",
                        "us",
                        &requested,
                        quality,
                    ))
                });
            },
        );
    }

    group.finish();
}

fn bench_competitive_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("competitive_analysis");
    let dataset = campaign_dataset(100);
    let calibration = CalibrationTable::default();

    for observations in [50usize, 500, 5000].iter() {
        let market = market_dataset(*observations, 8);
        group.throughput(Throughput::Elements(*observations as u64));
        group.bench_with_input(
            BenchmarkId::new("full_analysis", observations),
            observations,
            |b, _| {
                b.iter(|| {
                    black_box(analyze_competitors(
                        black_box(&dataset),
                        &market,
                        &calibration,
                        Utc::now(),
                    ))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_percentile_rank,
    bench_benchmark_analysis,
    bench_competitive_analysis
);
criterion_main!(benches);
