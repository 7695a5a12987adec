use crate::classification::role::Role;

/// How a box should be highlighted on the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    Active,
    Role(Role),
    Unclassified,
}

impl Highlight {
    /// Stroke colour as a CSS hex string.
    pub fn color(self) -> &'static str {
        match self {
            Highlight::Active => "#ffd400",
            Highlight::Role(Role::Ball) => "#ffffff",
            Highlight::Role(Role::LeftTeam) => "#e53935",
            Highlight::Role(Role::RightTeam) => "#1e88e5",
            Highlight::Role(Role::Referee) => "#212121",
            Highlight::Unclassified => "#9e9e9e",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_colors_are_distinct() {
        let all = [
            Highlight::Active,
            Highlight::Role(Role::Ball),
            Highlight::Role(Role::LeftTeam),
            Highlight::Role(Role::RightTeam),
            Highlight::Role(Role::Referee),
            Highlight::Unclassified,
        ];
        let colors: HashSet<_> = all.iter().map(|h| h.color()).collect();
        assert_eq!(colors.len(), all.len());
    }
}
