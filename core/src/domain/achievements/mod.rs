//! Achievement catalog and tracking

pub mod catalog;
pub mod tracker;

pub use catalog::AchievementCatalog;
pub use tracker::{AchievementProgress, AchievementTracker, CategoryProgress, EarnedAchievement};
