//! XP math, the level table and the theme catalog.

/// XP granted for one correct answer before the streak bonus.
pub const BASE_XP: u32 = 10;

/// Streak length at which the XP multiplier stops growing.
pub const MAX_STREAK_MULTIPLIER: u32 = 5;

/// One row of the level table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    pub level: u32,
    pub xp_required: u64,
    pub title: &'static str,
    /// Theme unlocked the first time this level is reached.
    pub unlock_theme: Option<&'static str>,
}

/// Level thresholds, strictly increasing in `xp_required`.
pub const LEVELS: [LevelInfo; 6] = [
    LevelInfo {
        level: 1,
        xp_required: 0,
        title: "Beginner",
        unlock_theme: None,
    },
    LevelInfo {
        level: 2,
        xp_required: 100,
        title: "Student",
        unlock_theme: Some("ocean"),
    },
    LevelInfo {
        level: 3,
        xp_required: 250,
        title: "Scholar",
        unlock_theme: Some("forest"),
    },
    LevelInfo {
        level: 4,
        xp_required: 500,
        title: "Expert",
        unlock_theme: Some("sunset"),
    },
    LevelInfo {
        level: 5,
        xp_required: 800,
        title: "Master",
        unlock_theme: Some("galaxy"),
    },
    LevelInfo {
        level: 6,
        xp_required: 1200,
        title: "Champion",
        unlock_theme: Some("rainbow"),
    },
];

/// Theme every player starts with.
pub const DEFAULT_THEME: &str = "default";

/// Known themes as `(id, display name)`.
pub const THEMES: [(&str, &str); 6] = [
    ("default", "Default"),
    ("ocean", "Ocean"),
    ("forest", "Forest"),
    ("sunset", "Sunset"),
    ("galaxy", "Galaxy"),
    ("rainbow", "Rainbow"),
];

/// Display name for a theme id.
#[must_use]
pub fn theme_name(id: &str) -> Option<&'static str> {
    THEMES
        .iter()
        .find(|(theme, _)| *theme == id)
        .map(|(_, name)| *name)
}

/// XP actually awarded for `base` at the given streak.
///
/// `multiplier = min(streak, 5)`; each step past 1 adds half of `base`.
#[must_use]
pub fn xp_bonus(base: u32, streak: u32) -> u32 {
    let multiplier = streak.min(MAX_STREAK_MULTIPLIER);
    if multiplier > 1 {
        base + base * (multiplier - 1) / 2
    } else {
        base
    }
}

/// Highest level whose requirement is met by `xp`.
#[must_use]
pub fn level_for_xp(xp: u64) -> u32 {
    LEVELS
        .iter()
        .rev()
        .find(|info| xp >= info.xp_required)
        .map_or(1, |info| info.level)
}

/// Table row for `level`, clamped to the last row for unknown levels.
#[must_use]
pub fn level_info(level: u32) -> LevelInfo {
    LEVELS
        .iter()
        .find(|info| info.level == level)
        .copied()
        .unwrap_or(LEVELS[LEVELS.len() - 1])
}

/// Progress toward the next level, for an XP bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: u32,
    pub title: &'static str,
    pub xp: u64,
    pub xp_into_level: u64,
    /// `None` at max level.
    pub xp_to_next: Option<u64>,
    /// 0..=100.
    pub percent: u8,
}

impl LevelProgress {
    #[must_use]
    pub fn for_xp(xp: u64) -> Self {
        let current = level_info(level_for_xp(xp));
        let next = LEVELS.iter().find(|info| info.level == current.level + 1);
        let xp_into_level = xp.saturating_sub(current.xp_required);

        let (xp_to_next, percent) = match next {
            Some(next) => {
                let span = next.xp_required - current.xp_required;
                let pct = (xp_into_level.saturating_mul(100) / span).min(100);
                (
                    Some(next.xp_required.saturating_sub(xp)),
                    u8::try_from(pct).unwrap_or(100),
                )
            }
            None => (None, 100),
        };

        Self {
            level: current.level,
            title: current.title,
            xp,
            xp_into_level,
            xp_to_next,
            percent,
        }
    }
}
