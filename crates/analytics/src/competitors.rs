//! Competitive positioning analyzer: market shares, rank, threats,
//! opportunities, and activity impact estimation from observed competitor
//! activity.
//!
//! Shares here are estimates over *observed* activity volume, not ground
//! truth. The subject campaign's own share in particular is a conservative
//! placeholder (`min(remaining share, 5%)`); positioning grades and
//! concentration figures inherit that approximation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adsim_core::{Channel, MetricKind};

use crate::calibration::CalibrationTable;
use crate::dataset::{channel_for_source, CampaignDataset, DatasetQuality, MarketDataset};
use crate::types::{
    sort_insights, sort_recommendations, Effort, Impact, Insight, InsightKind, Recommendation,
};

/// Cap on the subject's own estimated share (percent).
const SUBJECT_SHARE_CAP_PCT: f64 = 5.0;
/// Margin over a competitor average that counts as an advantage.
const ADVANTAGE_MARGIN_PCT: f64 = 10.0;
const ADVANTAGE_CONFIDENCE: f64 = 0.8;
/// Competitors profiled in depth (by observed volume).
const PROFILED_COMPETITORS: usize = 10;
/// "Top" competitors considered for overlap threats and channel gaps.
const TOP_COMPETITORS: usize = 3;

/// A named market participant derived from activity observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorProfile {
    pub name: String,
    /// Share of observed competitor activity volume, in percent.
    pub market_share: f64,
    pub estimated_budget: f64,
    pub channels: BTreeSet<Channel>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub computed_at: DateTime<Utc>,
}

/// Severity band of a competitive threat.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatSeverity {
    High,
    Medium,
    Low,
}

/// A competitor-driven risk with an expected relevance window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitiveThreat {
    pub competitor: String,
    pub severity: ThreatSeverity,
    pub description: String,
    pub window_days: u32,
    /// Likelihood the threat materializes, in `[0, 1]`.
    pub probability: f64,
    /// Expected impact if it does, in `[0, 1]`.
    pub impact: f64,
    pub mitigations: Vec<String>,
}

/// A metric the subject beats the competitor field on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitiveAdvantage {
    pub metric: MetricKind,
    pub subject_value: f64,
    pub competitor_average: f64,
    pub margin_percentage: f64,
    pub confidence: f64,
}

/// Estimated pressure one competitor's activity puts on the subject's metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityImpact {
    pub competitor: String,
    /// `min(total volume / divisor, cap)` from the calibration table.
    pub multiplier: f64,
    pub effects: Vec<MetricEffect>,
}

/// Expected relative change of one metric under competitive pressure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEffect {
    pub metric: MetricKind,
    /// Signed expected change as a fraction (e.g. +0.045 = +4.5%).
    pub expected_change: f64,
}

/// Market position grade.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionGrade {
    Leader,
    Challenger,
    Follower,
    Niche,
}

/// Where the subject sits in the observed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Positioning {
    /// 1-based rank among all players (competitors + subject).
    pub rank: usize,
    pub total_players: usize,
    /// Composite score in `[0, 100]`.
    pub score: f64,
    pub grade: PositionGrade,
    pub summary: String,
}

/// Competitive intensity classification from the HHI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitiveIntensity {
    Low,
    Medium,
    High,
    Extreme,
}

/// Herfindahl-Hirschman concentration of the observed market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketConcentration {
    /// Sum of squared shares (shares in percent, so the ceiling is 10000).
    pub hhi: f64,
    pub intensity: CompetitiveIntensity,
}

impl MarketConcentration {
    pub fn from_shares(shares: impl IntoIterator<Item = f64>) -> Self {
        let hhi: f64 = shares.into_iter().map(|s| s * s).sum();
        let intensity = if hhi < 1500.0 {
            CompetitiveIntensity::Low
        } else if hhi < 2500.0 {
            CompetitiveIntensity::Medium
        } else if hhi < 5000.0 {
            CompetitiveIntensity::High
        } else {
            CompetitiveIntensity::Extreme
        };
        Self { hhi, intensity }
    }
}

/// Full competitive analysis output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitiveAnalysis {
    pub positioning: Positioning,
    /// Subject's estimated market share, percent.
    pub market_share: f64,
    pub concentration: MarketConcentration,
    pub competitor_profiles: Vec<CompetitorProfile>,
    pub advantages: Vec<CompetitiveAdvantage>,
    pub threats: Vec<CompetitiveThreat>,
    pub opportunities: Vec<Insight>,
    pub activity_impacts: Vec<ActivityImpact>,
    pub recommendations: Vec<Recommendation>,
    pub data_quality: DatasetQuality,
}

struct CompetitorRollup {
    name: String,
    total_volume: f64,
    channels: BTreeSet<Channel>,
    spend: f64,
    metric_sums: BTreeMap<MetricKind, (f64, usize)>,
}

fn roll_up(market: &MarketDataset) -> Vec<CompetitorRollup> {
    let mut by_name: BTreeMap<String, CompetitorRollup> = BTreeMap::new();

    for obs in &market.activity {
        if !obs.value.is_finite() || obs.value < 0.0 {
            continue;
        }
        let entry = by_name
            .entry(obs.competitor.clone())
            .or_insert_with(|| CompetitorRollup {
                name: obs.competitor.clone(),
                total_volume: 0.0,
                channels: BTreeSet::new(),
                spend: 0.0,
                metric_sums: BTreeMap::new(),
            });
        entry.total_volume += obs.value;
        entry.channels.insert(channel_for_source(&obs.source));
        if matches!(obs.metric, MetricKind::Cpc | MetricKind::Cpm) {
            // Cost observations double as spend signals.
            entry.spend += obs.value;
        }
        let slot = entry.metric_sums.entry(obs.metric).or_insert((0.0, 0));
        slot.0 += obs.value;
        slot.1 += 1;
    }

    let mut rollups: Vec<CompetitorRollup> = by_name.into_values().collect();
    rollups.sort_by(|a, b| {
        b.total_volume
            .partial_cmp(&a.total_volume)
            .unwrap_or(core::cmp::Ordering::Equal)
    });
    rollups.truncate(PROFILED_COMPETITORS);
    rollups
}

fn build_profiles(
    rollups: &[CompetitorRollup],
    total_volume: f64,
    calibration: &CalibrationTable,
    now: DateTime<Utc>,
) -> Vec<CompetitorProfile> {
    rollups
        .iter()
        .map(|r| {
            let market_share = if total_volume > 0.0 {
                r.total_volume / total_volume * 100.0
            } else {
                0.0
            };
            let estimated_budget = if r.spend > 0.0 {
                r.spend
            } else {
                r.total_volume * calibration.budget_per_volume_unit
            };

            let mut strengths = Vec::new();
            let mut weaknesses = Vec::new();
            if r.channels.len() >= 3 {
                strengths.push(format!("active across {} channels", r.channels.len()));
            }
            if market_share > 25.0 {
                strengths.push("dominant share of observed activity".to_string());
            }
            if r.channels.len() < 2 {
                weaknesses.push("low channel diversity".to_string());
            }

            CompetitorProfile {
                name: r.name.clone(),
                market_share,
                estimated_budget,
                channels: r.channels.clone(),
                strengths,
                weaknesses,
                computed_at: now,
            }
        })
        .collect()
}

fn build_advantages(
    dataset: &CampaignDataset,
    rollups: &[CompetitorRollup],
) -> Vec<CompetitiveAdvantage> {
    let mut advantages = Vec::new();

    for metric in MetricKind::ALL {
        let Some(subject) = dataset.mean_metric(metric) else {
            continue;
        };

        let mut sum = 0.0;
        let mut n = 0usize;
        for r in rollups {
            if let Some((total, count)) = r.metric_sums.get(&metric) {
                if *count > 0 {
                    sum += total / *count as f64;
                    n += 1;
                }
            }
        }
        if n == 0 {
            continue;
        }
        let competitor_average = sum / n as f64;
        if competitor_average.abs() <= f64::EPSILON {
            continue;
        }

        // For cost metrics, being *below* the field is the advantage.
        let margin = if metric.higher_is_better() {
            (subject - competitor_average) / competitor_average * 100.0
        } else {
            (competitor_average - subject) / competitor_average * 100.0
        };

        if margin > ADVANTAGE_MARGIN_PCT {
            advantages.push(CompetitiveAdvantage {
                metric,
                subject_value: subject,
                competitor_average,
                margin_percentage: margin,
                confidence: ADVANTAGE_CONFIDENCE,
            });
        }
    }

    advantages
}

fn build_threats(
    dataset: &CampaignDataset,
    profiles: &[CompetitorProfile],
) -> Vec<CompetitiveThreat> {
    let subject_budget = dataset.campaign.budget;
    let subject_channels: BTreeSet<&Channel> = dataset.campaign.channels.iter().collect();
    let mut threats = Vec::new();

    for (i, profile) in profiles.iter().enumerate() {
        if subject_budget > 0.0 && profile.estimated_budget > 2.0 * subject_budget {
            threats.push(CompetitiveThreat {
                competitor: profile.name.clone(),
                severity: ThreatSeverity::High,
                description: format!(
                    "{} is outspending this campaign more than 2:1 (~{:.0} vs {:.0})",
                    profile.name, profile.estimated_budget, subject_budget
                ),
                window_days: 90,
                probability: 0.7,
                impact: 0.8,
                mitigations: vec![
                    "concentrate budget on the best-converting channel".to_string(),
                    "differentiate creative rather than matching spend".to_string(),
                ],
            });
        }

        if i < TOP_COMPETITORS {
            let overlap = profile
                .channels
                .iter()
                .filter(|c| subject_channels.contains(c))
                .count();
            if overlap >= 2 {
                threats.push(CompetitiveThreat {
                    competitor: profile.name.clone(),
                    severity: ThreatSeverity::Medium,
                    description: format!(
                        "{} competes head-on in {} of this campaign's channels",
                        profile.name, overlap
                    ),
                    window_days: 60,
                    probability: 0.5,
                    impact: 0.5,
                    mitigations: vec![
                        "adjust bidding windows to avoid peak auction pressure".to_string(),
                    ],
                });
            }
        }
    }

    threats
}

fn build_opportunities(
    dataset: &CampaignDataset,
    profiles: &[CompetitorProfile],
) -> Vec<Insight> {
    let mut opportunities = Vec::new();

    let mut taken: BTreeSet<Channel> = dataset.campaign.channels.iter().cloned().collect();
    for profile in profiles.iter().take(TOP_COMPETITORS) {
        taken.extend(profile.channels.iter().cloned());
    }
    for channel in Channel::standard() {
        if !taken.contains(&channel) {
            opportunities.push(Insight::new(
                InsightKind::Opportunity,
                Impact::Medium,
                format!("{channel} is an uncontested channel"),
                format!(
                    "neither this campaign nor the top {TOP_COMPETITORS} competitors are active on {channel}"
                ),
            ));
        }
    }

    for profile in profiles {
        if profile.weaknesses.iter().any(|w| w.contains("diversity")) {
            opportunities.push(Insight::new(
                InsightKind::Opportunity,
                Impact::Low,
                format!("{} is concentrated in few channels", profile.name),
                format!(
                    "{} runs on only {} channel(s); broader presence wins uncontested reach",
                    profile.name,
                    profile.channels.len()
                ),
            ));
        }
    }

    sort_insights(&mut opportunities);
    opportunities
}

fn build_activity_impacts(
    rollups: &[CompetitorRollup],
    calibration: &CalibrationTable,
) -> Vec<ActivityImpact> {
    rollups
        .iter()
        .map(|r| {
            let multiplier = calibration.activity_multiplier(r.total_volume);
            let effects = MetricKind::ALL
                .iter()
                .filter_map(|metric| {
                    let coefficient = calibration.impact_coefficient(*metric);
                    if coefficient == 0.0 {
                        return None;
                    }
                    Some(MetricEffect {
                        metric: *metric,
                        expected_change: coefficient * multiplier,
                    })
                })
                .collect();
            ActivityImpact {
                competitor: r.name.clone(),
                multiplier,
                effects,
            }
        })
        .collect()
}

fn position_grade(rank: usize, share: f64) -> PositionGrade {
    if rank == 1 && share > 25.0 {
        PositionGrade::Leader
    } else if rank <= 3 && share > 10.0 {
        PositionGrade::Challenger
    } else if share > 5.0 {
        PositionGrade::Follower
    } else {
        PositionGrade::Niche
    }
}

fn positioning_score(
    rank: usize,
    total_players: usize,
    share: f64,
    advantage_count: usize,
    severe_threats: usize,
) -> f64 {
    let n = total_players.max(1) as f64;
    let rank_score = 40.0 * (n - rank as f64) / n;
    let share_score = (2.0 * share).min(30.0);
    let advantage_score = (5.0 * advantage_count as f64).min(20.0);
    let threat_penalty = 5.0 * severe_threats as f64;
    (rank_score + share_score + advantage_score - threat_penalty).clamp(0.0, 100.0)
}

/// Analyze the subject campaign's competitive position from observed market
/// activity.
pub fn analyze_competitors(
    dataset: &CampaignDataset,
    market: &MarketDataset,
    calibration: &CalibrationTable,
    now: DateTime<Utc>,
) -> CompetitiveAnalysis {
    let rollups = roll_up(market);
    let total_volume: f64 = rollups.iter().map(|r| r.total_volume).sum();

    let profiles = build_profiles(&rollups, total_volume, calibration, now);

    // Subject share: whatever observed activity leaves unclaimed, capped at
    // 5%. A placeholder policy, not a measurement.
    let competitor_share_sum: f64 = profiles.iter().map(|p| p.market_share).sum();
    let remaining = (100.0 - competitor_share_sum).max(0.0);
    let subject_share = remaining.min(SUBJECT_SHARE_CAP_PCT);

    // Rank: all shares (competitors + subject) descending, subject located.
    let mut shares: Vec<f64> = profiles.iter().map(|p| p.market_share).collect();
    shares.push(subject_share);
    shares.sort_by(|a, b| b.partial_cmp(a).unwrap_or(core::cmp::Ordering::Equal));
    let rank = shares
        .iter()
        .position(|s| (*s - subject_share).abs() < 1e-12)
        .map_or(shares.len(), |i| i + 1);
    let total_players = shares.len();

    let advantages = build_advantages(dataset, &rollups);
    let threats = build_threats(dataset, &profiles);
    let opportunities = build_opportunities(dataset, &profiles);
    let activity_impacts = build_activity_impacts(&rollups, calibration);

    let severe_threats = threats
        .iter()
        .filter(|t| t.severity == ThreatSeverity::High)
        .count();
    let score = positioning_score(rank, total_players, subject_share, advantages.len(), severe_threats);
    let grade = position_grade(rank, subject_share);

    let concentration = MarketConcentration::from_shares(shares.iter().copied());

    let positioning = Positioning {
        rank,
        total_players,
        score,
        grade,
        summary: format!(
            "estimated rank {rank} of {total_players} with ~{subject_share:.1}% share of tracked activity \
             (subject share is a conservative placeholder estimate)"
        ),
    };

    let mut recommendations = Vec::new();
    for threat in &threats {
        let priority = match threat.severity {
            ThreatSeverity::High => 80,
            ThreatSeverity::Medium => 60,
            ThreatSeverity::Low => 40,
        };
        for mitigation in &threat.mitigations {
            recommendations.push(Recommendation {
                priority,
                effort: Effort::Medium,
                action: format!("{} ({})", mitigation, threat.competitor),
                metric: None,
                target_value: None,
            });
        }
    }
    for opportunity in &opportunities {
        if opportunity.impact == Impact::Medium {
            recommendations.push(Recommendation {
                priority: 50,
                effort: Effort::Medium,
                action: opportunity.detail.clone(),
                metric: None,
                target_value: None,
            });
        }
    }
    sort_recommendations(&mut recommendations);

    CompetitiveAnalysis {
        positioning,
        market_share: subject_share,
        concentration,
        competitor_profiles: profiles,
        advantages,
        threats,
        opportunities,
        activity_impacts,
        recommendations,
        data_quality: market.quality(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsim_core::CampaignId;
    use chrono::TimeZone;

    use crate::dataset::{BenchmarkTable, CampaignSnapshot, CompetitorActivity, MetricObservation};

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn subject(budget: f64, channels: Vec<Channel>) -> CampaignDataset {
        CampaignDataset {
            campaign: CampaignSnapshot {
                campaign_id: CampaignId::new(),
                name: "subject".to_string(),
                budget,
                currency: "USD".to_string(),
                channels,
                industry: "technology".to_string(),
                region: "us".to_string(),
            },
            history: vec![MetricObservation {
                metric: MetricKind::Ctr,
                channel: Channel::Search,
                value: 2.4,
                observed_at: utc(2026, 1, 10),
            }],
            fetched_at: utc(2026, 1, 20),
        }
    }

    fn activity(competitor: &str, metric: MetricKind, value: f64, source: &str) -> CompetitorActivity {
        CompetitorActivity {
            competitor: competitor.to_string(),
            metric,
            value,
            observed_at: utc(2026, 1, 15),
            source: source.to_string(),
        }
    }

    fn market(activity: Vec<CompetitorActivity>) -> MarketDataset {
        MarketDataset {
            activity,
            benchmarks: BenchmarkTable::new(),
            fetched_at: utc(2026, 1, 20),
        }
    }

    #[test]
    fn shares_follow_observed_volume() {
        let ds = subject(10_000.0, vec![Channel::Search]);
        let mk = market(vec![
            activity("acme", MetricKind::Impressions, 3000.0, "google_ads"),
            activity("globex", MetricKind::Impressions, 1000.0, "google_ads"),
        ]);

        let analysis = analyze_competitors(&ds, &mk, &CalibrationTable::default(), utc(2026, 1, 21));

        let acme = analysis
            .competitor_profiles
            .iter()
            .find(|p| p.name == "acme")
            .unwrap();
        assert!((acme.market_share - 75.0).abs() < 1e-9);
        // Nothing left over, so the subject's placeholder share floors at 0.
        assert!(analysis.market_share.abs() < 1e-9);
        assert_eq!(analysis.positioning.total_players, 3);
        assert_eq!(analysis.positioning.rank, 3);
    }

    #[test]
    fn empty_market_still_produces_an_analysis() {
        let ds = subject(10_000.0, vec![Channel::Search]);
        let mk = market(Vec::new());

        let analysis = analyze_competitors(&ds, &mk, &CalibrationTable::default(), utc(2026, 1, 21));

        assert!(analysis.competitor_profiles.is_empty());
        // With no observed competitors, all 100% is "remaining" but the
        // placeholder cap keeps the estimate conservative.
        assert!((analysis.market_share - 5.0).abs() < 1e-9);
        assert_eq!(analysis.positioning.rank, 1);
        assert_eq!(analysis.positioning.grade, PositionGrade::Niche);
        assert_eq!(analysis.data_quality.overall(), 0.0);
    }

    #[test]
    fn big_spender_raises_high_severity_threat() {
        let ds = subject(1_000.0, vec![Channel::Search]);
        // Spend signal: CPC observations summing far past 2x subject budget.
        let mk = market(vec![
            activity("acme", MetricKind::Cpc, 2_500.0, "google_ads"),
            activity("acme", MetricKind::Impressions, 500.0, "google_ads"),
        ]);

        let analysis = analyze_competitors(&ds, &mk, &CalibrationTable::default(), utc(2026, 1, 21));

        let threat = analysis
            .threats
            .iter()
            .find(|t| t.severity == ThreatSeverity::High)
            .expect("budget threat");
        assert_eq!(threat.competitor, "acme");
        assert_eq!(threat.window_days, 90);
        assert!(!threat.mitigations.is_empty());
    }

    #[test]
    fn channel_overlap_with_top_competitor_is_a_medium_threat() {
        let ds = subject(1_000_000.0, vec![Channel::Search, Channel::Social]);
        let mk = market(vec![
            activity("acme", MetricKind::Impressions, 800.0, "google_ads"),
            activity("acme", MetricKind::Impressions, 700.0, "meta"),
        ]);

        let analysis = analyze_competitors(&ds, &mk, &CalibrationTable::default(), utc(2026, 1, 21));

        let threat = analysis
            .threats
            .iter()
            .find(|t| t.severity == ThreatSeverity::Medium)
            .expect("overlap threat");
        assert_eq!(threat.window_days, 60);
    }

    #[test]
    fn unused_channels_surface_as_opportunities() {
        let ds = subject(1_000.0, vec![Channel::Search]);
        let mk = market(vec![activity(
            "acme",
            MetricKind::Impressions,
            500.0,
            "google_ads",
        )]);

        let analysis = analyze_competitors(&ds, &mk, &CalibrationTable::default(), utc(2026, 1, 21));

        // Social/display/video/email are all untouched by subject and acme.
        let gaps = analysis
            .opportunities
            .iter()
            .filter(|o| o.title.contains("uncontested"))
            .count();
        assert_eq!(gaps, 4);
    }

    #[test]
    fn activity_impacts_use_capped_multiplier_and_signed_coefficients() {
        let calibration = CalibrationTable::default();
        let ds = subject(1_000.0, vec![Channel::Search]);
        let mk = market(vec![activity(
            "acme",
            MetricKind::Impressions,
            200.0,
            "google_ads",
        )]);

        let analysis = analyze_competitors(&ds, &mk, &calibration, utc(2026, 1, 21));

        let impact = &analysis.activity_impacts[0];
        assert!((impact.multiplier - 0.2).abs() < 1e-9);
        let cpc = impact
            .effects
            .iter()
            .find(|e| e.metric == MetricKind::Cpc)
            .unwrap();
        assert!((cpc.expected_change - 0.15 * 0.2).abs() < 1e-9);
        let impressions = impact
            .effects
            .iter()
            .find(|e| e.metric == MetricKind::Impressions)
            .unwrap();
        assert!(impressions.expected_change < 0.0);
    }

    #[test]
    fn subject_ctr_advantage_over_field_average() {
        let ds = subject(1_000.0, vec![Channel::Search]);
        let mk = market(vec![
            activity("acme", MetricKind::Ctr, 1.0, "google_ads"),
            activity("globex", MetricKind::Ctr, 1.4, "google_ads"),
        ]);

        let analysis = analyze_competitors(&ds, &mk, &CalibrationTable::default(), utc(2026, 1, 21));

        let adv = analysis
            .advantages
            .iter()
            .find(|a| a.metric == MetricKind::Ctr)
            .expect("ctr advantage");
        // Subject 2.4 vs field average 1.2 = +100%.
        assert!((adv.margin_percentage - 100.0).abs() < 1e-9);
        assert!((adv.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn hhi_classifies_concentration() {
        assert_eq!(
            MarketConcentration::from_shares([10.0; 10]).intensity,
            CompetitiveIntensity::Low
        );
        assert_eq!(
            MarketConcentration::from_shares([40.0, 30.0, 30.0]).intensity,
            CompetitiveIntensity::High
        );
        assert_eq!(
            MarketConcentration::from_shares([90.0, 10.0]).intensity,
            CompetitiveIntensity::Extreme
        );
    }

    #[test]
    fn positioning_score_stays_in_bounds() {
        // Rank term vanishes for a sole player; share and advantage caps bind.
        assert_eq!(positioning_score(1, 1, 100.0, 10, 0), 50.0);
        assert_eq!(positioning_score(5, 5, 0.0, 0, 10), 0.0);
        let mid = positioning_score(2, 4, 8.0, 1, 1);
        assert!((0.0..=100.0).contains(&mid));
    }
}
