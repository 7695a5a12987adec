//! Possession timeline from per-frame possessor inference.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::annotation::annotation_store::AnnotationStore;
use crate::classification::classification_registry::ClassificationRegistry;
use crate::classification::role::{Role, Team};
use crate::shared::bounding_box::{BoundingBox, FrameIndex};
use crate::shared::resolution::Resolution;
use crate::transform::coordinate_transform::TransformError;

/// A contiguous run of observed frames attributed to one team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PossessionSegment {
    pub start: FrameIndex,
    /// In frame-index units: `last - start + 1`.
    pub duration: usize,
    pub team: Team,
}

impl PossessionSegment {
    pub fn end(&self) -> FrameIndex {
        self.start + self.duration - 1
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PossessionShare {
    pub left: f64,
    pub right: f64,
}

/// Third of the pitch relative to the possessing team's attack direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Defensive,
    Middle,
    Attacking,
}

impl Zone {
    /// Zone of a natural-space x coordinate for `team`. The left team
    /// attacks toward increasing x, the right team toward decreasing x.
    pub fn of(x: f64, team: Team, natural: Resolution) -> Zone {
        let third = natural.width / 3.0;
        let depth = match team {
            Team::Left => x,
            Team::Right => natural.width - x,
        };
        if depth < third {
            Zone::Defensive
        } else if depth < 2.0 * third {
            Zone::Middle
        } else {
            Zone::Attacking
        }
    }
}

/// Fraction of possessed frames with the ball in each zone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ZoneShare {
    pub defensive: f64,
    pub middle: f64,
    pub attacking: f64,
}

/// Builds non-overlapping segments from per-frame possessors.
///
/// A segment extends across consecutive entries with the same team and
/// ends at a frame with no possessor or the other team. Segments spanning
/// fewer than `min_frames` frames are dropped.
pub fn possession_timeline(
    possessors: &BTreeMap<FrameIndex, Option<Team>>,
    min_frames: usize,
) -> Vec<PossessionSegment> {
    let mut segments = Vec::new();
    let mut open: Option<(FrameIndex, FrameIndex, Team)> = None;

    for (&frame, &team) in possessors {
        open = match (open, team) {
            (Some((start, _, current)), Some(t)) if t == current => Some((start, frame, current)),
            (previous, next) => {
                if let Some(run) = previous {
                    push_segment(&mut segments, run, min_frames);
                }
                next.map(|t| (frame, frame, t))
            }
        };
    }
    if let Some(run) = open {
        push_segment(&mut segments, run, min_frames);
    }
    segments
}

fn push_segment(
    segments: &mut Vec<PossessionSegment>,
    (start, last, team): (FrameIndex, FrameIndex, Team),
    min_frames: usize,
) {
    let duration = last - start + 1;
    if duration >= min_frames {
        segments.push(PossessionSegment {
            start,
            duration,
            team,
        });
    }
}

/// Fraction of possessed frames per team; zero for both when nothing is
/// possessed.
pub fn possession_share(segments: &[PossessionSegment]) -> PossessionShare {
    let (left, right) = segments.iter().fold((0usize, 0usize), |(l, r), s| match s.team {
        Team::Left => (l + s.duration, r),
        Team::Right => (l, r + s.duration),
    });
    let total = (left + right) as f64;
    if total == 0.0 {
        return PossessionShare::default();
    }
    PossessionShare {
        left: left as f64 / total,
        right: right as f64 / total,
    }
}

/// Splits possessed frames by the zone the ball is in, seen from the
/// possessing team. Frames without a possessor or a visible ball do not
/// count.
pub fn possession_zones(
    store: &AnnotationStore,
    registry: &ClassificationRegistry,
    possessors: &BTreeMap<FrameIndex, Option<Team>>,
    natural: Resolution,
) -> Result<ZoneShare, TransformError> {
    if !natural.is_usable() {
        return Err(TransformError::DegenerateResolution {
            natural,
            rendered: natural,
        });
    }

    let mut counts = [0usize; 3];
    for (&frame, team) in possessors {
        let Some(team) = *team else {
            continue;
        };
        let Some(ball) = ball_box(store.get_frame(frame), registry) else {
            continue;
        };
        let idx = match Zone::of(ball.center().0, team, natural) {
            Zone::Defensive => 0,
            Zone::Middle => 1,
            Zone::Attacking => 2,
        };
        counts[idx] += 1;
    }

    let total = counts.iter().sum::<usize>() as f64;
    if total == 0.0 {
        return Ok(ZoneShare::default());
    }
    Ok(ZoneShare {
        defensive: counts[0] as f64 / total,
        middle: counts[1] as f64 / total,
        attacking: counts[2] as f64 / total,
    })
}

fn ball_box<'a>(
    boxes: &'a [BoundingBox],
    registry: &ClassificationRegistry,
) -> Option<&'a BoundingBox> {
    boxes
        .iter()
        .find(|b| registry.role_of(b.id) == Some(Role::Ball))
}

/// Default possessor inference: the team of the classified player whose
/// box center is nearest the ball's center, if within `control_radius`
/// natural pixels. Equal distances favour the left team.
pub fn infer_possession(
    store: &AnnotationStore,
    registry: &ClassificationRegistry,
    control_radius: f64,
) -> BTreeMap<FrameIndex, Option<Team>> {
    store
        .frames()
        .map(|(frame, boxes)| {
            let ball = ball_box(boxes, registry);
            let possessor = ball.and_then(|ball| {
                let (bx, by) = ball.center();
                boxes
                    .iter()
                    .filter_map(|b| {
                        let team = registry.team_of(b.id)?;
                        let (px, py) = b.center();
                        Some((team, (px - bx).hypot(py - by)))
                    })
                    .filter(|(_, d)| *d <= control_radius)
                    .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
                    .map(|(team, _)| team)
            });
            (frame, possessor)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn possessors(entries: &[(FrameIndex, Option<Team>)]) -> BTreeMap<FrameIndex, Option<Team>> {
        entries.iter().copied().collect()
    }

    fn seg(start: FrameIndex, duration: usize, team: Team) -> PossessionSegment {
        PossessionSegment {
            start,
            duration,
            team,
        }
    }

    #[test]
    fn test_runs_become_segments() {
        let p = possessors(&[
            (0, Some(Team::Left)),
            (1, Some(Team::Left)),
            (2, Some(Team::Right)),
            (3, None),
            (4, Some(Team::Right)),
            (5, Some(Team::Right)),
        ]);
        assert_eq!(
            possession_timeline(&p, 1),
            vec![
                seg(0, 2, Team::Left),
                seg(2, 1, Team::Right),
                seg(4, 2, Team::Right)
            ]
        );
    }

    #[test]
    fn test_dropped_frames_do_not_split_a_run() {
        let p = possessors(&[(10, Some(Team::Left)), (13, Some(Team::Left))]);
        let timeline = possession_timeline(&p, 1);
        assert_eq!(timeline, vec![seg(10, 4, Team::Left)]);
        assert_eq!(timeline[0].end(), 13);
    }

    #[test]
    fn test_segments_never_overlap() {
        let p = possessors(&[
            (0, Some(Team::Left)),
            (1, Some(Team::Right)),
            (2, Some(Team::Left)),
            (3, Some(Team::Left)),
            (4, Some(Team::Right)),
        ]);
        let timeline = possession_timeline(&p, 1);
        for pair in timeline.windows(2) {
            assert!(pair[0].end() < pair[1].start);
        }
    }

    #[test]
    fn test_min_frames_drops_short_segments() {
        let p = possessors(&[
            (0, Some(Team::Left)),
            (1, Some(Team::Right)),
            (2, Some(Team::Right)),
            (3, Some(Team::Right)),
        ]);
        assert_eq!(possession_timeline(&p, 2), vec![seg(1, 3, Team::Right)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(possession_timeline(&BTreeMap::new(), 1).is_empty());
        assert_eq!(possession_share(&[]), PossessionShare::default());
    }

    #[test]
    fn test_share() {
        let share = possession_share(&[seg(0, 3, Team::Left), seg(3, 1, Team::Right)]);
        assert_relative_eq!(share.left, 0.75);
        assert_relative_eq!(share.right, 0.25);
    }

    fn classified_registry() -> ClassificationRegistry {
        let mut registry = ClassificationRegistry::new();
        registry.classify(1, Role::LeftTeam);
        registry.classify(2, Role::RightTeam);
        registry.classify(99, Role::Ball);
        registry
    }

    #[test]
    fn test_infer_possession_nearest_player_within_radius() {
        let mut store = AnnotationStore::new();
        // ball center (105, 105); left center (125, 105); right center (165, 105)
        store.upsert_frame(
            0,
            vec![
                BoundingBox::new(99, 100.0, 100.0, 10.0, 10.0),
                BoundingBox::new(1, 120.0, 100.0, 10.0, 10.0),
                BoundingBox::new(2, 160.0, 100.0, 10.0, 10.0),
            ],
        );
        // only the right player is close
        store.upsert_frame(
            1,
            vec![
                BoundingBox::new(99, 100.0, 100.0, 10.0, 10.0),
                BoundingBox::new(1, 500.0, 100.0, 10.0, 10.0),
                BoundingBox::new(2, 110.0, 100.0, 10.0, 10.0),
            ],
        );
        // no ball
        store.upsert_frame(2, vec![BoundingBox::new(1, 0.0, 0.0, 10.0, 10.0)]);
        // ball but nobody in range
        store.upsert_frame(
            3,
            vec![
                BoundingBox::new(99, 0.0, 0.0, 10.0, 10.0),
                BoundingBox::new(1, 900.0, 900.0, 10.0, 10.0),
            ],
        );

        let inferred = infer_possession(&store, &classified_registry(), 40.0);
        assert_eq!(
            inferred,
            possessors(&[
                (0, Some(Team::Left)),
                (1, Some(Team::Right)),
                (2, None),
                (3, None)
            ])
        );
    }

    #[test]
    fn test_infer_possession_tie_favours_left() {
        let mut store = AnnotationStore::new();
        store.upsert_frame(
            0,
            vec![
                BoundingBox::new(2, 120.0, 100.0, 10.0, 10.0),
                BoundingBox::new(99, 100.0, 100.0, 10.0, 10.0),
                BoundingBox::new(1, 80.0, 100.0, 10.0, 10.0),
            ],
        );
        let inferred = infer_possession(&store, &classified_registry(), 40.0);
        assert_eq!(inferred[&0], Some(Team::Left));
    }

    const PITCH: Resolution = Resolution {
        width: 1500.0,
        height: 1000.0,
    };

    #[rstest]
    #[case::left_own_third(100.0, Team::Left, Zone::Defensive)]
    #[case::left_middle(750.0, Team::Left, Zone::Middle)]
    #[case::left_final_third(1400.0, Team::Left, Zone::Attacking)]
    #[case::right_own_third(1400.0, Team::Right, Zone::Defensive)]
    #[case::right_middle(750.0, Team::Right, Zone::Middle)]
    #[case::right_final_third(100.0, Team::Right, Zone::Attacking)]
    #[case::left_boundary(500.0, Team::Left, Zone::Middle)]
    fn test_zone_follows_attack_direction(
        #[case] x: f64,
        #[case] team: Team,
        #[case] expected: Zone,
    ) {
        assert_eq!(Zone::of(x, team, PITCH), expected);
    }

    fn ball_at(store: &mut AnnotationStore, frame: FrameIndex, x: f64) {
        store.upsert_frame(frame, vec![BoundingBox::new(99, x - 5.0, 500.0, 10.0, 10.0)]);
    }

    #[test]
    fn test_possession_zones_split_by_possessor() {
        let mut store = AnnotationStore::new();
        ball_at(&mut store, 0, 100.0);
        ball_at(&mut store, 1, 1400.0);
        ball_at(&mut store, 2, 1400.0);
        ball_at(&mut store, 3, 750.0);
        ball_at(&mut store, 4, 750.0);
        store.upsert_frame(5, vec![]);

        let p = possessors(&[
            (0, Some(Team::Left)),
            (1, Some(Team::Left)),
            // Own third for the right team.
            (2, Some(Team::Right)),
            (3, Some(Team::Right)),
            (4, None),
            // No ball in frame.
            (5, Some(Team::Left)),
        ]);
        let zones = possession_zones(&store, &classified_registry(), &p, PITCH).unwrap();
        assert_relative_eq!(zones.defensive, 0.5);
        assert_relative_eq!(zones.middle, 0.25);
        assert_relative_eq!(zones.attacking, 0.25);
    }

    #[test]
    fn test_possession_zones_empty_and_degenerate() {
        let store = AnnotationStore::new();
        let registry = classified_registry();
        assert_eq!(
            possession_zones(&store, &registry, &BTreeMap::new(), PITCH).unwrap(),
            ZoneShare::default()
        );
        let unknown = Resolution::default();
        assert!(possession_zones(&store, &registry, &BTreeMap::new(), unknown).is_err());
    }
}
