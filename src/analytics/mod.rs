// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 运动分析 (Court-relative motion analytics)
///
/// 数据流: 球员筛选 → 球轨迹补帧 → 击球检测 → 统计
pub mod carry;
pub mod interpolation;
pub mod player_selector;
pub mod shot_detector;
pub mod statistics;

pub use interpolation::TrajectoryInterpolator;
pub use player_selector::{PlayerId, PlayerSelector, SelectedPlayers};
pub use shot_detector::{centered_rolling_mean, Direction, ShotDetectorConfig, ShotEventDetector};
pub use statistics::{
    PlayerStats, PlayerStatsRecord, ShotInterval, StatisticsAggregator, StatsTable,
};
