// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 分析配置 - 命令行参数与 JSON 配置文件

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analytics::ShotDetectorConfig;
use crate::court::CourtGeometry;
use crate::error::{AnalyticsError, AnalyticsResult};

/// 默认帧率 (视频容器帧率不可靠, 固定配置)
pub const DEFAULT_FRAME_RATE: f64 = 24.0;
/// 俯视小球场宽度 (球场坐标单位)
pub const DEFAULT_MINI_COURT_WIDTH: f64 = 250.0;

/// 命令行参数
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "网球场运动分析 - Tennis court analytics", long_about = None)]
pub struct Args {
    /// 球员检测结果 (JSON stub: frame → track_id → bbox)
    #[arg(long)]
    pub players: PathBuf,

    /// 球检测结果 (JSON stub: frame → bbox | null)
    #[arg(long)]
    pub ball: PathBuf,

    /// 首帧球场关键点 (14 个点, JSON)
    #[arg(long)]
    pub keypoints: PathBuf,

    /// 分析配置文件 (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 覆盖配置中的帧率
    #[arg(long)]
    pub frame_rate: Option<f64>,

    /// 报告输出路径, 默认 output/analysis_<时间>.json
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 预览用的视频帧图片
    #[arg(long)]
    pub preview_frame: Option<PathBuf>,

    /// 预览帧对应的帧索引
    #[arg(long, default_value_t = 0)]
    pub preview_index: usize,

    /// 预览图输出路径
    #[arg(long, default_value = "output/preview.png")]
    pub preview_output: PathBuf,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,
}

/// 分析参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub frame_rate: f64,          // 帧率 (fps)
    pub court: CourtGeometry,     // 真实球场尺寸 (米)
    pub mini_court_width: f64,    // 小球场宽度 (球场坐标单位)
    pub shots: ShotDetectorConfig, // 击球检测参数
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            court: CourtGeometry::default(),
            mini_court_width: DEFAULT_MINI_COURT_WIDTH,
            shots: ShotDetectorConfig::default(),
        }
    }
}

impl AnalyticsConfig {
    /// 从JSON文件加载配置
    pub fn load(path: impl AsRef<Path>) -> AnalyticsResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> AnalyticsResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "config saved");
        Ok(())
    }

    /// 命令行参数覆盖
    pub fn with_args(mut self, args: &Args) -> AnalyticsResult<Self> {
        if let Some(fps) = args.frame_rate {
            self.frame_rate = fps;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(AnalyticsError::invalid_config(format!(
                "frame rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if !self.mini_court_width.is_finite() || self.mini_court_width <= 0.0 {
            return Err(AnalyticsError::invalid_config(
                "mini court width must be positive",
            ));
        }
        self.court.validate()?;
        self.shots.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalyticsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frame_rate, 24.0);
        assert_eq!(config.shots.min_run_length, 25);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg/analytics.json");
        let config = AnalyticsConfig {
            frame_rate: 30.0,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AnalyticsConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{ "shots": { "min_event_gap": 12 } }"#).unwrap();
        let config = AnalyticsConfig::load(&path).unwrap();
        assert_eq!(config.shots.min_event_gap, 12);
        assert_eq!(config.shots.smoothing_window, 5);
        assert_eq!(config.frame_rate, 24.0);
    }

    #[test]
    fn test_negative_frame_rate_rejected() {
        let config = AnalyticsConfig {
            frame_rate: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalyticsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_args_override_frame_rate() {
        let args = Args::parse_from([
            "court-analytics",
            "--players",
            "p.json",
            "--ball",
            "b.json",
            "--keypoints",
            "k.json",
            "--frame-rate",
            "50",
        ]);
        let config = AnalyticsConfig::default().with_args(&args).unwrap();
        assert_eq!(config.frame_rate, 50.0);
    }
}
