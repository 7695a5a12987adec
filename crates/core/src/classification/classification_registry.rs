use std::collections::{BTreeSet, HashMap};

use crate::classification::highlight::Highlight;
use crate::classification::identification_config::IdentificationConfig;
use crate::classification::role::{Role, Team};
use crate::shared::bounding_box::TrackId;

/// Role assignment per tracking identity plus the current selection.
///
/// Stored as `id -> role`, so an identity holds at most one role. The
/// active identity need not be classified.
#[derive(Clone, Debug, Default)]
pub struct ClassificationRegistry {
    roles: HashMap<TrackId, Role>,
    players: BTreeSet<TrackId>,
    active: Option<TrackId>,
}

impl ClassificationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all assignments with the backend-provided configuration.
    ///
    /// An id listed under several roles keeps the one that comes first in
    /// [`Role::PRIORITY`], which is also the order highlights are chosen in.
    pub fn seed(&mut self, config: &IdentificationConfig) {
        self.roles.clear();
        self.players = config.player_ids.clone();
        for &role in Role::PRIORITY.iter().rev() {
            for &id in role_set(config, role) {
                if let Some(previous) = self.roles.insert(id, role) {
                    log::debug!(
                        "Identity {id} listed as both {previous} and {role}; keeping {role}"
                    );
                }
            }
        }
        for role in [Role::LeftTeam, Role::RightTeam] {
            self.players.extend(role_set(config, role));
        }
    }

    pub fn to_config(&self) -> IdentificationConfig {
        let mut config = IdentificationConfig {
            player_ids: self.players.clone(),
            ..Default::default()
        };
        for (&id, &role) in &self.roles {
            let set = match role {
                Role::Ball => &mut config.ball_ids,
                Role::LeftTeam => &mut config.left_team,
                Role::RightTeam => &mut config.right_team,
                Role::Referee => &mut config.referee,
            };
            set.insert(id);
        }
        config
    }

    /// Assigns `id` to `role`, dropping whatever role it held before.
    ///
    /// Joining a team registers `id` as a player; leaving the teams for a
    /// non-team role withdraws it.
    pub fn classify(&mut self, id: TrackId, role: Role) -> Option<Role> {
        let previous = self.roles.insert(id, role);
        if role.team().is_some() {
            self.players.insert(id);
        } else if previous.and_then(Role::team).is_some() {
            self.players.remove(&id);
        }
        previous
    }

    pub fn unclassify(&mut self, id: TrackId) -> Option<Role> {
        let previous = self.roles.remove(&id);
        if previous.and_then(Role::team).is_some() {
            self.players.remove(&id);
        }
        previous
    }

    pub fn set_active(&mut self, id: Option<TrackId>) {
        self.active = id;
    }

    pub fn active(&self) -> Option<TrackId> {
        self.active
    }

    pub fn role_of(&self, id: TrackId) -> Option<Role> {
        self.roles.get(&id).copied()
    }

    pub fn team_of(&self, id: TrackId) -> Option<Team> {
        self.role_of(id).and_then(Role::team)
    }

    pub fn members(&self, role: Role) -> BTreeSet<TrackId> {
        self.roles
            .iter()
            .filter(|(_, r)| **r == role)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn players(&self) -> &BTreeSet<TrackId> {
        &self.players
    }

    /// Active selection first, then role, then the unclassified default.
    pub fn highlight_for(&self, id: TrackId) -> Highlight {
        if self.active == Some(id) {
            return Highlight::Active;
        }
        match self.role_of(id) {
            Some(role) => Highlight::Role(role),
            None => Highlight::Unclassified,
        }
    }

    pub fn color_for(&self, id: TrackId) -> &'static str {
        self.highlight_for(id).color()
    }
}

fn role_set(config: &IdentificationConfig, role: Role) -> &BTreeSet<TrackId> {
    match role {
        Role::Ball => &config.ball_ids,
        Role::LeftTeam => &config.left_team,
        Role::RightTeam => &config.right_team,
        Role::Referee => &config.referee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_reclassify_moves_identity() {
        let mut registry = ClassificationRegistry::new();
        registry.classify(7, Role::LeftTeam);
        let previous = registry.classify(7, Role::RightTeam);

        assert_eq!(previous, Some(Role::LeftTeam));
        assert_eq!(registry.role_of(7), Some(Role::RightTeam));
        assert!(registry.members(Role::LeftTeam).is_empty());
        assert_eq!(registry.members(Role::RightTeam), BTreeSet::from([7]));
    }

    #[test]
    fn test_unclassify() {
        let mut registry = ClassificationRegistry::new();
        registry.classify(3, Role::Ball);
        assert_eq!(registry.unclassify(3), Some(Role::Ball));
        assert_eq!(registry.role_of(3), None);
        assert_eq!(registry.unclassify(3), None);
    }

    #[test]
    fn test_active_need_not_be_classified() {
        let mut registry = ClassificationRegistry::new();
        registry.set_active(Some(11));
        assert_eq!(registry.active(), Some(11));
        assert_eq!(registry.role_of(11), None);
        assert_eq!(registry.highlight_for(11), Highlight::Active);
        registry.set_active(None);
        assert_eq!(registry.highlight_for(11), Highlight::Unclassified);
    }

    #[test]
    fn test_active_takes_precedence_over_role() {
        let mut registry = ClassificationRegistry::new();
        registry.classify(1, Role::Ball);
        registry.set_active(Some(1));
        assert_eq!(registry.highlight_for(1), Highlight::Active);
        assert_eq!(registry.color_for(1), Highlight::Active.color());
    }

    #[rstest]
    #[case::ball(Role::Ball)]
    #[case::left(Role::LeftTeam)]
    #[case::right(Role::RightTeam)]
    #[case::referee(Role::Referee)]
    fn test_highlight_follows_role(#[case] role: Role) {
        let mut registry = ClassificationRegistry::new();
        registry.classify(5, role);
        assert_eq!(registry.highlight_for(5), Highlight::Role(role));
    }

    #[test]
    fn test_seed_resolves_overlap_by_priority() {
        let config = IdentificationConfig {
            ball_ids: BTreeSet::from([1]),
            left_team: BTreeSet::from([1, 2, 3]),
            right_team: BTreeSet::from([3, 4]),
            referee: BTreeSet::from([4, 5]),
            ..Default::default()
        };
        let mut registry = ClassificationRegistry::new();
        registry.seed(&config);

        assert_eq!(registry.role_of(1), Some(Role::Ball));
        assert_eq!(registry.role_of(2), Some(Role::LeftTeam));
        assert_eq!(registry.role_of(3), Some(Role::LeftTeam));
        assert_eq!(registry.role_of(4), Some(Role::RightTeam));
        assert_eq!(registry.role_of(5), Some(Role::Referee));
    }

    #[test]
    fn test_seed_replaces_previous_assignments() {
        let mut registry = ClassificationRegistry::new();
        registry.classify(9, Role::Referee);
        registry.seed(&IdentificationConfig {
            left_team: BTreeSet::from([1]),
            ..Default::default()
        });
        assert_eq!(registry.role_of(9), None);
        assert_eq!(registry.role_of(1), Some(Role::LeftTeam));
    }

    #[test]
    fn test_to_config_round_trips_disjoint_seed() {
        let config = IdentificationConfig {
            player_ids: BTreeSet::from([1, 2, 3]),
            ball_ids: BTreeSet::from([9]),
            left_team: BTreeSet::from([1, 2]),
            right_team: BTreeSet::from([3]),
            referee: BTreeSet::from([8]),
        };
        let mut registry = ClassificationRegistry::new();
        registry.seed(&config);
        assert_eq!(registry.to_config(), config);
    }

    #[test]
    fn test_team_classification_registers_player() {
        let mut registry = ClassificationRegistry::new();
        registry.classify(4, Role::RightTeam);
        registry.classify(5, Role::Ball);
        assert_eq!(registry.players(), &BTreeSet::from([4]));
        assert_eq!(registry.team_of(4), Some(Team::Right));
        assert_eq!(registry.team_of(5), None);
    }

    #[test]
    fn test_leaving_team_withdraws_player() {
        let mut registry = ClassificationRegistry::new();
        registry.classify(4, Role::LeftTeam);
        registry.classify(6, Role::RightTeam);
        registry.classify(7, Role::LeftTeam);

        registry.classify(4, Role::Referee);
        registry.unclassify(6);
        registry.classify(7, Role::RightTeam);

        let config = registry.to_config();
        assert_eq!(config.player_ids, BTreeSet::from([7]));
        assert_eq!(config.referee, BTreeSet::from([4]));
        assert!(config.left_team.is_empty());
        assert_eq!(config.right_team, BTreeSet::from([7]));
    }

    #[test]
    fn test_seeded_non_team_player_survives_unrelated_changes() {
        let mut registry = ClassificationRegistry::new();
        registry.seed(&IdentificationConfig {
            player_ids: BTreeSet::from([2, 3]),
            left_team: BTreeSet::from([3]),
            ..Default::default()
        });
        registry.classify(5, Role::Ball);
        registry.unclassify(5);
        registry.unclassify(3);
        assert_eq!(registry.players(), &BTreeSet::from([2]));
    }
}
