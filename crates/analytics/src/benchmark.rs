//! Benchmark scorer: compares realized campaign metrics against reference
//! distributions and grades the result.

use serde::{Deserialize, Serialize};

use adsim_core::MetricKind;

use crate::dataset::{BenchmarkPoints, BenchmarkTable, CampaignDataset, DatasetQuality};
use crate::types::{
    sort_insights, sort_recommendations, Effort, Impact, Insight, InsightKind, Performance,
    Recommendation, Significance,
};

/// Deviation percentage below which a value counts as "at benchmark".
const AT_BENCHMARK_BAND_PCT: f64 = 5.0;

/// One metric's evaluation against its reference distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub metric: MetricKind,
    pub campaign_value: f64,
    /// The benchmark median (50th percentile).
    pub benchmark_value: f64,
    /// Interpolated percentile rank in `[0, 100]`.
    pub percentile: f64,
    pub deviation: f64,
    pub deviation_percentage: f64,
    pub performance: Performance,
    pub significance: Significance,
}

/// Full benchmark analysis for a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkAnalysis {
    /// Average percentile across compared metrics; 0 when nothing compared.
    pub overall_score: f64,
    pub grade: String,
    pub summary: String,
    pub comparisons: Vec<BenchmarkComparison>,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
    pub data_quality: DatasetQuality,
}

/// Interpolate a value's percentile rank against a three-point distribution.
///
/// Piecewise linear through (p25, p50, p75), with the tail above p75 mapped
/// onto `[75, 100]` over half the p75 value. Monotonic in `v` for any fixed
/// distribution with `0 < p25 <= p50 <= p75`.
pub fn percentile_rank(v: f64, points: &BenchmarkPoints) -> f64 {
    let BenchmarkPoints { p25, p50, p75, .. } = *points;

    if v <= p25 {
        if p25 <= 0.0 {
            return 25.0;
        }
        return 25.0 * (v / p25).max(0.0);
    }
    if v <= p50 {
        if p50 - p25 <= 0.0 {
            return 50.0;
        }
        return 25.0 + 25.0 * (v - p25) / (p50 - p25);
    }
    if v <= p75 {
        if p75 - p50 <= 0.0 {
            return 75.0;
        }
        return 50.0 + 25.0 * (v - p50) / (p75 - p50);
    }

    let half_p75 = 0.5 * p75;
    if half_p75 <= 0.0 {
        return 100.0;
    }
    75.0 + 25.0 * ((v - p75) / half_p75).min(1.0)
}

/// Map an average percentile to a letter grade.
pub fn letter_grade(average_percentile: f64) -> &'static str {
    if average_percentile >= 95.0 {
        "A+"
    } else if average_percentile >= 90.0 {
        "A"
    } else if average_percentile >= 85.0 {
        "B+"
    } else if average_percentile >= 80.0 {
        "B"
    } else if average_percentile >= 75.0 {
        "C+"
    } else if average_percentile >= 70.0 {
        "C"
    } else if average_percentile >= 60.0 {
        "D"
    } else {
        "F"
    }
}

fn compare_metric(metric: MetricKind, value: f64, points: &BenchmarkPoints) -> BenchmarkComparison {
    let percentile = percentile_rank(value, points);
    let deviation = value - points.p50;
    let deviation_percentage = if points.p50.abs() > f64::EPSILON {
        deviation / points.p50 * 100.0
    } else {
        0.0
    };

    let performance = if deviation_percentage.abs() < AT_BENCHMARK_BAND_PCT {
        Performance::At
    } else if deviation_percentage > 0.0 {
        Performance::Above
    } else {
        Performance::Below
    };

    BenchmarkComparison {
        metric,
        campaign_value: value,
        benchmark_value: points.p50,
        percentile,
        deviation,
        deviation_percentage,
        performance,
        significance: Significance::from_percentile(percentile),
    }
}

fn build_insights(comparisons: &[BenchmarkComparison]) -> Vec<Insight> {
    let mut insights = Vec::new();

    for c in comparisons {
        match c.significance {
            Significance::Excellent => insights.push(
                Insight::new(
                    InsightKind::Strength,
                    Impact::High,
                    format!("{} outperforms its benchmark", c.metric),
                    format!(
                        "{} sits at the {:.0}th percentile ({:+.1}% vs median)",
                        c.metric, c.percentile, c.deviation_percentage
                    ),
                )
                .for_metric(c.metric),
            ),
            Significance::Critical => insights.push(
                Insight::new(
                    InsightKind::Weakness,
                    Impact::High,
                    format!("{} is far below its benchmark", c.metric),
                    format!(
                        "{} sits at the {:.0}th percentile ({:+.1}% vs median)",
                        c.metric, c.percentile, c.deviation_percentage
                    ),
                )
                .for_metric(c.metric),
            ),
            Significance::Poor => insights.push(
                Insight::new(
                    InsightKind::Weakness,
                    Impact::Medium,
                    format!("{} trails its benchmark", c.metric),
                    format!("{} sits at the {:.0}th percentile", c.metric, c.percentile),
                )
                .for_metric(c.metric),
            ),
            // Good but with headroom before excellent.
            Significance::Good => insights.push(
                Insight::new(
                    InsightKind::Opportunity,
                    Impact::Low,
                    format!("{} has room to reach the top tier", c.metric),
                    format!(
                        "{} is at the {:.0}th percentile; the 90th is within reach",
                        c.metric, c.percentile
                    ),
                )
                .for_metric(c.metric),
            ),
            Significance::Average => {}
        }
    }

    let excellent = comparisons
        .iter()
        .filter(|c| c.significance == Significance::Excellent)
        .count();
    let critical = comparisons
        .iter()
        .filter(|c| c.significance == Significance::Critical)
        .count();
    let average_percentile = if comparisons.is_empty() {
        0.0
    } else {
        comparisons.iter().map(|c| c.percentile).sum::<f64>() / comparisons.len() as f64
    };

    if excellent >= 2 {
        insights.push(Insight::new(
            InsightKind::Strength,
            Impact::High,
            "broad outperformance",
            format!("{excellent} metrics rank in the excellent tier"),
        ));
    }
    if critical >= 2 {
        insights.push(Insight::new(
            InsightKind::Threat,
            Impact::High,
            "broad underperformance",
            format!("{critical} metrics rank in the critical tier"),
        ));
    }
    if !comparisons.is_empty() && average_percentile < 40.0 {
        insights.push(Insight::new(
            InsightKind::Opportunity,
            Impact::Medium,
            "substantial headroom across the board",
            format!("average percentile is {average_percentile:.0}; most metrics can improve"),
        ));
    }

    sort_insights(&mut insights);
    insights
}

fn build_recommendations(comparisons: &[BenchmarkComparison]) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    for c in comparisons {
        match c.significance {
            Significance::Critical | Significance::Poor => {
                let priority = if c.significance == Significance::Critical {
                    90
                } else {
                    70
                };
                recommendations.push(Recommendation {
                    priority,
                    effort: Effort::Medium,
                    action: format!(
                        "lift {} from {:.2} to at least {:.2} (10% above benchmark)",
                        c.metric,
                        c.campaign_value,
                        1.1 * c.benchmark_value
                    ),
                    metric: Some(c.metric),
                    target_value: Some(1.1 * c.benchmark_value),
                });
            }
            Significance::Good => {
                recommendations.push(Recommendation {
                    priority: 50,
                    effort: Effort::Low,
                    action: format!(
                        "push {} toward {:.2} (25% above benchmark) to reach the top tier",
                        c.metric,
                        1.25 * c.benchmark_value
                    ),
                    metric: Some(c.metric),
                    target_value: Some(1.25 * c.benchmark_value),
                });
            }
            _ => {}
        }
    }

    sort_recommendations(&mut recommendations);
    recommendations
}

fn summary_line(comparisons: &[BenchmarkComparison], average_percentile: f64) -> String {
    if comparisons.is_empty() {
        return "no historical data available to benchmark this campaign".to_string();
    }
    let excellent = comparisons
        .iter()
        .filter(|c| c.significance == Significance::Excellent)
        .count();
    let critical = comparisons
        .iter()
        .filter(|c| c.significance == Significance::Critical)
        .count();

    if excellent >= 2 && critical == 0 {
        format!(
            "campaign outperforms its industry benchmarks (average percentile {average_percentile:.0})"
        )
    } else if critical >= 2 {
        format!(
            "campaign underperforms across several metrics (average percentile {average_percentile:.0})"
        )
    } else {
        format!(
            "campaign performs broadly in line with its industry (average percentile {average_percentile:.0})"
        )
    }
}

/// Score a campaign's realized metrics against reference distributions.
///
/// Metrics with no historical observations or no reference distribution are
/// skipped. With nothing to compare, the result is a valid-but-empty
/// analysis (score 0, grade F), never an error.
pub fn analyze_benchmarks(
    dataset: &CampaignDataset,
    benchmarks: &BenchmarkTable,
    industry: &str,
    region: &str,
    requested: &[MetricKind],
    quality: DatasetQuality,
) -> BenchmarkAnalysis {
    let channels = &dataset.campaign.channels;

    let mut comparisons = Vec::new();
    for metric in requested {
        let Some(value) = dataset.mean_metric(*metric) else {
            continue;
        };
        let Some(points) = benchmarks.combined(industry, channels, region, *metric) else {
            continue;
        };
        comparisons.push(compare_metric(*metric, value, &points));
    }

    let overall_score = if comparisons.is_empty() {
        0.0
    } else {
        comparisons.iter().map(|c| c.percentile).sum::<f64>() / comparisons.len() as f64
    };

    let insights = build_insights(&comparisons);
    let recommendations = build_recommendations(&comparisons);
    let summary = summary_line(&comparisons, overall_score);

    BenchmarkAnalysis {
        overall_score,
        grade: letter_grade(overall_score).to_string(),
        summary,
        comparisons,
        insights,
        recommendations,
        data_quality: quality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsim_core::{CampaignId, Channel};
    use chrono::{DateTime, TimeZone, Utc};

    use crate::dataset::{CampaignSnapshot, MetricObservation};

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn points(p25: f64, p50: f64, p75: f64) -> BenchmarkPoints {
        BenchmarkPoints {
            p25,
            p50,
            p75,
            sample_size: 100,
        }
    }

    fn tech_dataset(history: Vec<MetricObservation>) -> CampaignDataset {
        CampaignDataset {
            campaign: CampaignSnapshot {
                campaign_id: CampaignId::new(),
                name: "launch".to_string(),
                budget: 10_000.0,
                currency: "USD".to_string(),
                channels: vec![Channel::Search],
                industry: "technology".to_string(),
                region: "us".to_string(),
            },
            history,
            fetched_at: utc(2026, 1, 20),
        }
    }

    fn ctr_obs(value: f64) -> MetricObservation {
        MetricObservation {
            metric: MetricKind::Ctr,
            channel: Channel::Search,
            value,
            observed_at: utc(2026, 1, 10),
        }
    }

    fn full_quality() -> DatasetQuality {
        DatasetQuality {
            completeness: 1.0,
            freshness: 1.0,
            accuracy: 1.0,
            consistency: 1.0,
        }
    }

    #[test]
    fn percentile_interpolation_hits_anchor_points() {
        let p = points(1.0, 2.0, 3.0);
        assert!((percentile_rank(1.0, &p) - 25.0).abs() < 1e-9);
        assert!((percentile_rank(2.0, &p) - 50.0).abs() < 1e-9);
        assert!((percentile_rank(3.0, &p) - 75.0).abs() < 1e-9);
        // Midpoints interpolate linearly.
        assert!((percentile_rank(1.5, &p) - 37.5).abs() < 1e-9);
        assert!((percentile_rank(2.5, &p) - 62.5).abs() < 1e-9);
        // Below p25 scales toward zero.
        assert!((percentile_rank(0.5, &p) - 12.5).abs() < 1e-9);
        // The tail above p75 saturates at 100 at 1.5x p75.
        assert!((percentile_rank(3.75, &p) - 87.5).abs() < 1e-9);
        assert!((percentile_rank(4.5, &p) - 100.0).abs() < 1e-9);
        assert!((percentile_rank(9.0, &p) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn at_band_is_five_percent_of_median() {
        let p = points(1.0, 2.0, 3.0);
        let c = compare_metric(MetricKind::Ctr, 2.05, &p);
        assert_eq!(c.performance, Performance::At);
        let c = compare_metric(MetricKind::Ctr, 2.2, &p);
        assert_eq!(c.performance, Performance::Above);
        let c = compare_metric(MetricKind::Ctr, 1.7, &p);
        assert_eq!(c.performance, Performance::Below);
    }

    #[test]
    fn strong_ctr_yields_strength_insight() {
        // CTR history [1.8, 2.1] (mean 1.95) against a median of 1.2.
        let dataset = tech_dataset(vec![ctr_obs(1.8), ctr_obs(2.1)]);
        let mut table = BenchmarkTable::new();
        table.insert(
            "technology",
            Channel::Search,
            "us",
            MetricKind::Ctr,
            points(0.8, 1.2, 1.5),
        );

        let analysis = analyze_benchmarks(
            &dataset,
            &table,
            "technology",
            "us",
            &[MetricKind::Ctr],
            full_quality(),
        );

        assert_eq!(analysis.comparisons.len(), 1);
        let c = &analysis.comparisons[0];
        assert!((c.campaign_value - 1.95).abs() < 1e-9);
        assert_eq!(c.performance, Performance::Above);
        assert!(matches!(
            c.significance,
            Significance::Good | Significance::Excellent
        ));
        // percentile = 75 + 25*min(1, (1.95-1.5)/0.75) = 90 => excellent
        assert!(c.percentile >= 90.0 - 1e-9);
        assert!(analysis
            .insights
            .iter()
            .any(|i| i.kind == InsightKind::Strength));
    }

    #[test]
    fn empty_history_yields_grade_f_not_error() {
        let dataset = tech_dataset(Vec::new());
        let mut table = BenchmarkTable::new();
        table.insert(
            "technology",
            Channel::Search,
            "us",
            MetricKind::Ctr,
            points(0.8, 1.2, 1.6),
        );

        let analysis = analyze_benchmarks(
            &dataset,
            &table,
            "technology",
            "us",
            &[MetricKind::Ctr],
            DatasetQuality::missing(),
        );

        assert!(analysis.comparisons.is_empty());
        assert_eq!(analysis.overall_score, 0.0);
        assert_eq!(analysis.grade, "F");
        assert!(analysis.insights.is_empty());
    }

    #[test]
    fn critical_metrics_drive_high_priority_recommendations() {
        let dataset = tech_dataset(vec![ctr_obs(0.1)]);
        let mut table = BenchmarkTable::new();
        table.insert(
            "technology",
            Channel::Search,
            "us",
            MetricKind::Ctr,
            points(0.8, 1.2, 1.6),
        );

        let analysis = analyze_benchmarks(
            &dataset,
            &table,
            "technology",
            "us",
            &[MetricKind::Ctr],
            full_quality(),
        );

        let rec = &analysis.recommendations[0];
        assert_eq!(rec.priority, 90);
        assert!((rec.target_value.unwrap() - 1.32).abs() < 1e-9);
    }

    #[test]
    fn recommendations_are_sorted_by_priority() {
        let dataset = tech_dataset(vec![
            ctr_obs(0.1),
            MetricObservation {
                metric: MetricKind::Cpc,
                channel: Channel::Search,
                value: 1.1,
                observed_at: utc(2026, 1, 10),
            },
        ]);
        let mut table = BenchmarkTable::new();
        table.insert(
            "technology",
            Channel::Search,
            "us",
            MetricKind::Ctr,
            points(0.8, 1.2, 1.6),
        );
        // CPC of 1.1 lands in the good tier of this distribution.
        table.insert(
            "technology",
            Channel::Search,
            "us",
            MetricKind::Cpc,
            points(0.5, 0.8, 1.1),
        );

        let analysis = analyze_benchmarks(
            &dataset,
            &table,
            "technology",
            "us",
            &[MetricKind::Ctr, MetricKind::Cpc],
            full_quality(),
        );

        assert!(analysis.recommendations.len() >= 2);
        let priorities: Vec<u8> = analysis.recommendations.iter().map(|r| r.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn grade_scale_boundaries() {
        assert_eq!(letter_grade(96.0), "A+");
        assert_eq!(letter_grade(95.0), "A+");
        assert_eq!(letter_grade(90.0), "A");
        assert_eq!(letter_grade(80.0), "B");
        assert_eq!(letter_grade(60.0), "D");
        assert_eq!(letter_grade(59.9), "F");
        assert_eq!(letter_grade(0.0), "F");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// For any fixed distribution, a larger value never ranks lower.
            #[test]
            fn percentile_is_monotonic(
                p25 in 0.1f64..100.0,
                d1 in 0.0f64..50.0,
                d2 in 0.0f64..50.0,
                v1 in 0.0f64..500.0,
                delta in 0.0f64..500.0,
            ) {
                let p = BenchmarkPoints {
                    p25,
                    p50: p25 + d1,
                    p75: p25 + d1 + d2,
                    sample_size: 100,
                };
                let lo = percentile_rank(v1, &p);
                let hi = percentile_rank(v1 + delta, &p);
                prop_assert!(hi >= lo - 1e-9, "lo={lo}, hi={hi}");
            }

            /// Percentiles always land in [0, 100].
            #[test]
            fn percentile_is_bounded(
                p25 in 0.1f64..100.0,
                d1 in 0.0f64..50.0,
                d2 in 0.0f64..50.0,
                v in 0.0f64..1000.0,
            ) {
                let p = BenchmarkPoints {
                    p25,
                    p50: p25 + d1,
                    p75: p25 + d1 + d2,
                    sample_size: 100,
                };
                let rank = percentile_rank(v, &p);
                prop_assert!((0.0..=100.0).contains(&rank));
            }
        }
    }
}
