//! Passing-lane scoring between same-team identities in one frame.
//!
//! Positions are box centers in natural pixels. The left team attacks
//! toward increasing x and the right team toward decreasing x.

use serde::{Deserialize, Serialize};

use crate::classification::classification_registry::ClassificationRegistry;
use crate::classification::role::Team;
use crate::shared::bounding_box::{BoundingBox, TrackId};
use crate::shared::resolution::Resolution;
use crate::transform::coordinate_transform::TransformError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub interceptors: f64,
    pub receiver_pressure: f64,
    pub pass_distance: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            interceptors: 0.4,
            receiver_pressure: 0.3,
            pass_distance: 0.3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    pub horizontal_progress: f64,
    pub space_gained: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            horizontal_progress: 0.6,
            space_gained: 0.4,
        }
    }
}

/// Distances are in natural pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassingConfig {
    pub max_pass_distance: f64,
    /// Interceptor band half-width as a fraction of the lane length.
    pub interceptor_band: f64,
    pub pressure_radius: f64,
    /// Space gain that saturates the space reward.
    pub space_gain_norm: f64,
    pub min_success_probability: f64,
    pub risk_weights: RiskWeights,
    pub reward_weights: RewardWeights,
}

impl Default for PassingConfig {
    fn default() -> Self {
        Self {
            max_pass_distance: 600.0,
            interceptor_band: 0.2,
            pressure_radius: 100.0,
            space_gain_norm: 200.0,
            min_success_probability: 0.0,
            risk_weights: RiskWeights::default(),
            reward_weights: RewardWeights::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Interceptor {
    pub id: TrackId,
    /// Distance from the lane segment.
    pub distance: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PassingLane {
    pub passer: TrackId,
    pub receiver: TrackId,
    pub team: Team,
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub distance: f64,
    /// Sorted nearest first.
    pub interceptors: Vec<Interceptor>,
    pub defensive_pressure: f64,
    pub horizontal_progress: f64,
    pub space_gained: f64,
    pub success_probability: f64,
    pub risk_score: f64,
    pub reward_score: f64,
    pub total_score: f64,
}

struct Placed {
    id: TrackId,
    team: Team,
    pos: (f64, f64),
}

/// Scores every ordered (passer, receiver) pair of same-team identities
/// present in `boxes`.
pub fn passing_lanes(
    boxes: &[BoundingBox],
    registry: &ClassificationRegistry,
    natural: Resolution,
    config: &PassingConfig,
) -> Result<Vec<PassingLane>, TransformError> {
    if !natural.is_usable() {
        return Err(TransformError::DegenerateResolution {
            natural,
            rendered: natural,
        });
    }

    let placed: Vec<Placed> = boxes
        .iter()
        .filter_map(|b| {
            registry.team_of(b.id).map(|team| Placed {
                id: b.id,
                team,
                pos: b.center(),
            })
        })
        .collect();

    let mut lanes = Vec::new();
    for passer in &placed {
        let opponents: Vec<(TrackId, (f64, f64))> = placed
            .iter()
            .filter(|p| p.team == passer.team.opponent())
            .map(|p| (p.id, p.pos))
            .collect();
        for receiver in &placed {
            if receiver.team != passer.team || receiver.id == passer.id {
                continue;
            }
            lanes.push(score_lane(passer, receiver, &opponents, natural, config));
        }
    }
    Ok(lanes)
}

fn score_lane(
    passer: &Placed,
    receiver: &Placed,
    opponents: &[(TrackId, (f64, f64))],
    natural: Resolution,
    config: &PassingConfig,
) -> PassingLane {
    let distance = dist(passer.pos, receiver.pos);
    let band = config.interceptor_band * distance;

    let mut interceptors: Vec<Interceptor> = opponents
        .iter()
        .map(|&(id, pos)| Interceptor {
            id,
            distance: point_to_segment(pos, passer.pos, receiver.pos),
        })
        .filter(|i| i.distance <= band)
        .collect();
    interceptors.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let defensive_pressure: f64 = opponents
        .iter()
        .map(|&(_, pos)| (-dist(receiver.pos, pos) / config.pressure_radius).exp())
        .sum();

    let dx = receiver.pos.0 - passer.pos.0;
    let forward = match passer.team {
        Team::Left => dx,
        Team::Right => -dx,
    };
    let horizontal_progress = (forward / natural.width).clamp(-1.0, 1.0);
    let space_gained = space_gained(passer.pos, receiver.pos, opponents);

    let success_probability =
        success_probability(distance, &interceptors, defensive_pressure, config);

    let w = &config.risk_weights;
    let risk_score = (w.interceptors * (interceptors.len() as f64 / 3.0).min(1.0)
        + w.receiver_pressure * (defensive_pressure / 3.0).min(1.0)
        + w.pass_distance * (distance / config.max_pass_distance).min(1.0))
    .min(1.0);

    let w = &config.reward_weights;
    let reward_score = (w.horizontal_progress * (horizontal_progress + 1.0) / 2.0
        + w.space_gained * (space_gained / config.space_gain_norm).min(1.0))
    .min(1.0);

    PassingLane {
        passer: passer.id,
        receiver: receiver.id,
        team: passer.team,
        start: passer.pos,
        end: receiver.pos,
        distance,
        interceptors,
        defensive_pressure,
        horizontal_progress,
        space_gained,
        success_probability,
        risk_score,
        reward_score,
        total_score: reward_score * (1.0 - risk_score),
    }
}

/// Product of a distance decay, an interceptor factor and a receiver
/// pressure factor. Every interceptor and every nearby opponent strictly
/// lowers the result.
fn success_probability(
    distance: f64,
    interceptors: &[Interceptor],
    defensive_pressure: f64,
    config: &PassingConfig,
) -> f64 {
    let base = (-distance / config.max_pass_distance).exp();
    let lane_scale = distance.max(1.0);
    let interceptor_risk: f64 = interceptors
        .iter()
        .map(|i| 1.0 / (1.0 + 2.0 * i.distance / lane_scale))
        .sum();
    base * (-interceptor_risk).exp() * (-defensive_pressure / 2.0).exp()
}

/// Increase in mean opponent distance from passer to receiver, floored at zero.
fn space_gained(
    start: (f64, f64),
    end: (f64, f64),
    opponents: &[(TrackId, (f64, f64))],
) -> f64 {
    if opponents.is_empty() {
        return 0.0;
    }
    let n = opponents.len() as f64;
    let mean_from = |p: (f64, f64)| opponents.iter().map(|&(_, o)| dist(p, o)).sum::<f64>() / n;
    (mean_from(end) - mean_from(start)).max(0.0)
}

fn dist(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

fn point_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (vx, vy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = vx * vx + vy * vy;
    if len_sq == 0.0 {
        return dist(p, a);
    }
    let t = (((p.0 - a.0) * vx + (p.1 - a.1) * vy) / len_sq).clamp(0.0, 1.0);
    dist(p, (a.0 + t * vx, a.1 + t * vy))
}

/// Highest total score.
pub fn best_opportunity(lanes: &[PassingLane]) -> Option<&PassingLane> {
    lanes
        .iter()
        .max_by(|a, b| a.total_score.total_cmp(&b.total_score))
}

/// Lanes meeting the configured success threshold.
pub fn viable_opportunities<'a>(
    lanes: &'a [PassingLane],
    config: &PassingConfig,
) -> Vec<&'a PassingLane> {
    lanes
        .iter()
        .filter(|l| l.success_probability >= config.min_success_probability)
        .collect()
}
