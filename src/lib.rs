// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod analytics; // 球员筛选、补帧、击球检测、统计
pub mod config; // 分析配置参数
pub mod court; // 球场关键点与投影
pub mod detection; // 检测结果与检测器接口
pub mod error; // 错误类型
pub mod pipeline; // 分析流水线与报告
pub mod render; // 预览叠加绘制

pub use crate::analytics::{
    PlayerId, PlayerSelector, ShotEventDetector, StatisticsAggregator, TrajectoryInterpolator,
};
pub use crate::config::{AnalyticsConfig, Args};
pub use crate::court::{CourtModel, CourtProjector, KeypointSet};
pub use crate::error::{AnalyticsError, AnalyticsResult};
pub use crate::pipeline::{AnalysisReport, CourtAnalyzer, VideoAnalysis, VideoInput};

/// 本地时间戳字符串, 用于输出文件名
pub fn gen_time_string(delimiter: &str) -> String {
    let t_now = chrono::Local::now();
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S",
        delimiter, delimiter, delimiter, delimiter, delimiter
    );
    t_now.format(&fmt).to_string()
}
