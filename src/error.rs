// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 分析引擎错误类型
//! Error types for the court analytics engine.

use thiserror::Error;

/// 分析结果类型
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Errors raised while turning detections into court-relative facts.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// 首帧中的人物轨迹少于两个
    #[error("need at least two person tracks in the first frame, found {found}")]
    InsufficientPlayers { found: usize },

    /// 关键点无法构建有效的投影
    #[error("court keypoints cannot support a projection: {0}")]
    DegenerateCourtGeometry(String),

    /// 整段视频都没有检测到球
    #[error("ball was never detected in the video")]
    NoBallDetected,

    #[error("video has no frames")]
    EmptyVideo,

    #[error("expected {expected} court keypoints, found {found}")]
    InvalidKeypoints { expected: usize, found: usize },

    #[error("invalid bounding box ({x1}, {y1}, {x2}, {y2})")]
    InvalidBoundingBox { x1: f64, y1: f64, x2: f64, y2: f64 },

    #[error("player detections cover {players} frames but ball detections cover {balls}")]
    FrameCountMismatch { players: usize, balls: usize },

    /// 检测缓存由其他格式版本写入
    #[error("detection stub version {found} is not supported (expected {expected})")]
    StubVersionMismatch { found: u32, expected: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyticsError {
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateCourtGeometry(message.into())
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// 是否需要中止分析 (缺球只跳过球相关统计)
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NoBallDetected)
    }
}
