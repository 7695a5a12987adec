use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Ball,
    LeftTeam,
    RightTeam,
    Referee,
}

impl Role {
    /// Highlight priority order; earlier roles win when sources overlap.
    pub const PRIORITY: &'static [Role] = &[
        Role::Ball,
        Role::LeftTeam,
        Role::RightTeam,
        Role::Referee,
    ];

    pub fn team(self) -> Option<Team> {
        match self {
            Role::LeftTeam => Some(Team::Left),
            Role::RightTeam => Some(Team::Right),
            Role::Ball | Role::Referee => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Ball => write!(f, "ball"),
            Role::LeftTeam => write!(f, "left team"),
            Role::RightTeam => write!(f, "right team"),
            Role::Referee => write!(f, "referee"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Left,
    Right,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Left => Team::Right,
            Team::Right => Team::Left,
        }
    }

    pub fn role(self) -> Role {
        match self {
            Team::Left => Role::LeftTeam,
            Team::Right => Role::RightTeam,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::Left => write!(f, "left"),
            Team::Right => write!(f, "right"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert_eq!(
            Role::PRIORITY,
            &[Role::Ball, Role::LeftTeam, Role::RightTeam, Role::Referee]
        );
    }

    #[test]
    fn test_team_round_trips_through_role() {
        assert_eq!(Team::Left.role().team(), Some(Team::Left));
        assert_eq!(Team::Right.role().team(), Some(Team::Right));
        assert_eq!(Role::Ball.team(), None);
        assert_eq!(Role::Referee.team(), None);
    }

    #[test]
    fn test_opponent() {
        assert_eq!(Team::Left.opponent(), Team::Right);
        assert_eq!(Team::Right.opponent(), Team::Left);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Role::LeftTeam).unwrap(), r#""left_team""#);
        assert_eq!(serde_json::to_string(&Team::Right).unwrap(), r#""right""#);
    }
}
