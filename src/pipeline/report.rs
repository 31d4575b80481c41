// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 分析报告 (JSON)
//!
//! 逐帧统计行沿用参考统计表的列名, 方便与已有的分析脚本对照。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::VideoAnalysis;
use crate::analytics::{PlayerId, PlayerStatsRecord, ShotInterval};
use crate::detection::{Point2, TrackId};
use crate::error::AnalyticsResult;

/// 逐帧统计行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRow {
    pub frame_num: usize,

    pub player_1_number_of_shots: u32,
    pub player_1_total_shot_speed: f64,
    pub player_1_last_shot_speed: f64,
    pub player_1_total_player_speed: f64,
    pub player_1_last_player_speed: f64,
    pub player_1_average_shot_speed: Option<f64>,
    pub player_1_average_player_speed: Option<f64>,

    pub player_2_number_of_shots: u32,
    pub player_2_total_shot_speed: f64,
    pub player_2_last_shot_speed: f64,
    pub player_2_total_player_speed: f64,
    pub player_2_last_player_speed: f64,
    pub player_2_average_shot_speed: Option<f64>,
    pub player_2_average_player_speed: Option<f64>,
}

impl From<&PlayerStatsRecord> for StatsRow {
    fn from(record: &PlayerStatsRecord) -> Self {
        let p1 = record.player(PlayerId::One);
        let p2 = record.player(PlayerId::Two);
        Self {
            frame_num: record.frame_index,

            player_1_number_of_shots: p1.shot_count,
            player_1_total_shot_speed: p1.total_shot_speed,
            player_1_last_shot_speed: p1.last_shot_speed,
            player_1_total_player_speed: p1.total_movement_speed,
            player_1_last_player_speed: p1.last_movement_speed,
            player_1_average_shot_speed: record.average_shot_speed(PlayerId::One),
            player_1_average_player_speed: record.average_movement_speed(PlayerId::One),

            player_2_number_of_shots: p2.shot_count,
            player_2_total_shot_speed: p2.total_shot_speed,
            player_2_last_shot_speed: p2.last_shot_speed,
            player_2_total_player_speed: p2.total_movement_speed,
            player_2_last_player_speed: p2.last_movement_speed,
            player_2_average_shot_speed: record.average_shot_speed(PlayerId::Two),
            player_2_average_player_speed: record.average_movement_speed(PlayerId::Two),
        }
    }
}

/// 每帧的球场坐标 (小球场单位)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePositions {
    pub frame_num: usize,
    pub player_1: Option<Point2>,
    pub player_2: Option<Point2>,
    pub ball: Option<Point2>,
}

/// 整段视频的分析报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: String,
    pub frame_count: usize,
    pub frame_rate: f64,
    pub frame_size: Option<(u32, u32)>,
    /// [1 号, 2 号] 球员的跟踪ID
    pub player_tracks: [TrackId; 2],
    pub court_width_meters: f64,
    pub reprojection_error: f64,
    pub shot_frames: Vec<usize>,
    pub intervals: Vec<ShotInterval>,
    pub positions: Vec<FramePositions>,
    pub stats: Vec<StatsRow>,
    pub notices: Vec<String>,
}

impl AnalysisReport {
    pub fn new(analysis: &VideoAnalysis) -> Self {
        let projector = &analysis.context.projector;
        let positions = (0..analysis.frame_count())
            .map(|frame| FramePositions {
                frame_num: frame,
                player_1: analysis.player_positions(PlayerId::One).get(frame).copied(),
                player_2: analysis.player_positions(PlayerId::Two).get(frame).copied(),
                ball: analysis.ball_positions.get(frame).copied(),
            })
            .collect();

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            frame_count: analysis.frame_count(),
            frame_rate: analysis.frame_rate,
            frame_size: analysis.frame_size,
            player_tracks: analysis.context.players.track_ids(),
            court_width_meters: projector.court_width_meters(),
            reprojection_error: projector.mean_reprojection_error(),
            shot_frames: analysis.shots.clone(),
            intervals: analysis.stats.intervals().to_vec(),
            positions,
            stats: analysis.stats.rows().iter().map(StatsRow::from).collect(),
            notices: analysis.notices.clone(),
        }
    }

    /// 最后一帧的统计
    pub fn final_stats(&self) -> Option<&StatsRow> {
        self.stats.last()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> AnalyticsResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "analysis report written");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> AnalyticsResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
