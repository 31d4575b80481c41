// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 检测系统 (Detection System)
///
/// 分析引擎的输入边界
/// - types:    检测框、跟踪ID、轨迹
/// - detector: 检测器 / 关键点回归 trait
/// - cache:    检测结果缓存 (stub)
pub mod cache;
pub mod detector;
pub mod types;

pub use cache::{read_stub, DetectionStub, StubCache};
pub use detector::{
    detect_ball_frames, detect_player_frames, BallDetector, KeypointRegressor, PlayerDetector,
};
pub use types::{
    person_tracks, BBox, Lerp, PlayerFrame, Point2, RawDetection, TrackId, Trajectory,
    PERSON_CLASS_ID,
};
