// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 分析流水线 (Analytics pipeline)
///
/// 单线程、按帧顺序的一次性转换:
/// 检测结果 → 球员筛选 → 球场投影 → 球轨迹补帧 → 击球检测 → 统计
pub mod report;

pub use report::{AnalysisReport, FramePositions, StatsRow};

use anyhow::Context;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analytics::{
    carry, PlayerId, PlayerSelector, SelectedPlayers, ShotEventDetector, StatisticsAggregator,
    StatsTable, TrajectoryInterpolator,
};
use crate::config::AnalyticsConfig;
use crate::court::{CourtModel, CourtProjector, KeypointSet};
use crate::detection::{
    detect_ball_frames, detect_player_frames, BBox, BallDetector, KeypointRegressor,
    PlayerDetector, PlayerFrame, Point2, StubCache, Trajectory,
};
use crate::error::{AnalyticsError, AnalyticsResult};

// ========== 输入 ==========

/// 一段视频的全部检测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInput {
    /// 首帧尺寸 (宽, 高)
    pub frame_size: Option<(u32, u32)>,
    /// 每帧 跟踪ID → 边界框 (未过滤)
    pub player_detections: Vec<PlayerFrame>,
    /// 每帧最多一个球
    pub ball_detections: Vec<Option<BBox>>,
    /// 首帧球场关键点
    pub court_keypoints: KeypointSet,
}

impl VideoInput {
    pub fn frame_count(&self) -> usize {
        self.player_detections.len()
    }
}

/// 检测缓存文件 (可选)
#[derive(Debug, Clone, Default)]
pub struct DetectionStubs {
    pub players: Option<StubCache>,
    pub ball: Option<StubCache>,
}

/// 对解码后的帧运行外部检测器, 汇总为 `VideoInput`
///
/// 关键点只在首帧回归一次 (摄像机固定)
pub fn collect_input(
    frames: &[DynamicImage],
    player_detector: &mut dyn PlayerDetector,
    ball_detector: &mut dyn BallDetector,
    keypoint_regressor: &mut dyn KeypointRegressor,
    stubs: &DetectionStubs,
) -> anyhow::Result<VideoInput> {
    let first = frames.first().ok_or(AnalyticsError::EmptyVideo)?;

    let player_detections = detect_player_frames(player_detector, frames, stubs.players.as_ref())?;
    let ball_detections = detect_ball_frames(ball_detector, frames, stubs.ball.as_ref())?;
    let court_keypoints = keypoint_regressor
        .locate_keypoints(first)
        .context("court keypoint regression failed on the first frame")?;

    Ok(VideoInput {
        frame_size: Some(first.dimensions()),
        player_detections,
        ball_detections,
        court_keypoints,
    })
}

// ========== 视频级上下文 ==========

/// 每段视频只计算一次的只读决定: 球员身份 + 球场投影
#[derive(Debug, Clone)]
pub struct VideoContext {
    pub players: SelectedPlayers,
    pub projector: CourtProjector,
}

/// 分析结果
#[derive(Debug, Clone)]
pub struct VideoAnalysis {
    pub context: VideoContext,
    /// 本次分析使用的帧率
    pub frame_rate: f64,
    /// 视频帧尺寸 (宽, 高), 预览叠加按此定位
    pub frame_size: Option<(u32, u32)>,
    /// 只保留两个球员的检测
    pub player_detections: Vec<PlayerFrame>,
    /// 补全后的球轨迹 (像素); 从未检测到球时全部缺失
    pub ball_trajectory: Trajectory<BBox>,
    /// 球员球场坐标 (1 号, 2 号)
    pub player_positions: [Trajectory<Point2>; 2],
    /// 球的球场坐标
    pub ball_positions: Trajectory<Point2>,
    pub shots: Vec<usize>,
    pub stats: StatsTable,
    /// 非致命问题 (例如没有检测到球)
    pub notices: Vec<String>,
}

impl VideoAnalysis {
    pub fn frame_count(&self) -> usize {
        self.player_detections.len()
    }

    pub fn player_positions(&self, player: PlayerId) -> &Trajectory<Point2> {
        &self.player_positions[player.index()]
    }
}

// ========== 分析器 ==========

#[derive(Debug, Clone)]
pub struct CourtAnalyzer {
    config: AnalyticsConfig,
    model: CourtModel,
}

impl CourtAnalyzer {
    pub fn new(config: AnalyticsConfig) -> AnalyticsResult<Self> {
        config.validate()?;
        let model = CourtModel::new(config.court, config.mini_court_width)?;
        Ok(Self { config, model })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn model(&self) -> &CourtModel {
        &self.model
    }

    /// 构建视频级上下文: 选择球员并估计投影
    pub fn build_context(
        &self,
        input: &VideoInput,
    ) -> AnalyticsResult<(VideoContext, Vec<PlayerFrame>)> {
        let (players, filtered) =
            PlayerSelector.choose_and_filter(&input.court_keypoints, &input.player_detections)?;
        let projector = CourtProjector::new(&input.court_keypoints, self.model)?;
        info!(
            reprojection_error = projector.mean_reprojection_error(),
            "court projector ready"
        );
        Ok((VideoContext { players, projector }, filtered))
    }

    pub fn analyze(&self, input: &VideoInput) -> AnalyticsResult<VideoAnalysis> {
        let frame_count = input.frame_count();
        if frame_count == 0 {
            return Err(AnalyticsError::EmptyVideo);
        }
        if input.ball_detections.len() != frame_count {
            return Err(AnalyticsError::FrameCountMismatch {
                players: frame_count,
                balls: input.ball_detections.len(),
            });
        }

        let (context, player_detections) = self.build_context(input)?;
        let mut notices = Vec::new();

        // 球员缺帧沿用最近位置
        let player_positions = PlayerId::BOTH.map(|player| {
            let track = context.players.track_of(player);
            let mut slots: Vec<Option<Point2>> = player_detections
                .iter()
                .map(|frame| {
                    frame
                        .get(&track)
                        .and_then(|bbox| context.projector.project_player(bbox))
                })
                .collect();
            carry::hold_nearest(&mut slots);
            Trajectory::new(slots)
        });

        let raw_ball = Trajectory::new(input.ball_detections.clone());
        let ball_trajectory = match TrajectoryInterpolator.interpolate(&raw_ball) {
            Ok(completed) => completed,
            Err(AnalyticsError::NoBallDetected) => {
                warn!("ball never detected, skipping shot statistics");
                notices.push(AnalyticsError::NoBallDetected.to_string());
                Trajectory::absent(frame_count)
            }
            Err(e) => return Err(e),
        };
        let ball_positions = ball_trajectory.map(|bbox| context.projector.project_ball(bbox));

        let shots = ShotEventDetector::new(self.config.shots)?.detect(&ball_trajectory);
        info!(shots = shots.len(), frames = frame_count, "shots detected");

        let aggregator = StatisticsAggregator::new(self.config.frame_rate, &self.model)?;
        let stats = aggregator.aggregate(
            &shots,
            &ball_positions,
            [&player_positions[0], &player_positions[1]],
            frame_count,
        );

        Ok(VideoAnalysis {
            context,
            frame_rate: self.config.frame_rate,
            frame_size: input.frame_size,
            player_detections,
            ball_trajectory,
            player_positions,
            ball_positions,
            shots,
            stats,
            notices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::court::projector::tests::broadcast_keypoints;

    fn player_box(cx: f64, foot_y: f64) -> BBox {
        BBox::new(cx - 10.0, foot_y - 40.0, cx + 10.0, foot_y).unwrap()
    }

    fn input(frames: usize) -> VideoInput {
        let keypoints = broadcast_keypoints();
        let far = keypoints.points()[0];
        let near = keypoints.points()[3];
        let player_detections = (0..frames)
            .map(|_| {
                let mut frame = PlayerFrame::new();
                frame.insert(4, player_box(far.x + 5.0, far.y + 2.0));
                frame.insert(2, player_box(near.x - 5.0, near.y - 2.0));
                frame.insert(99, player_box(far.x - 400.0, far.y - 300.0));
                frame
            })
            .collect();
        VideoInput {
            frame_size: Some((1280, 720)),
            player_detections,
            ball_detections: vec![None; frames],
            court_keypoints: keypoints,
        }
    }

    #[test]
    fn test_empty_video_is_fatal() {
        let analyzer = CourtAnalyzer::new(AnalyticsConfig::default()).unwrap();
        let err = analyzer.analyze(&input(0)).unwrap_err();
        assert!(matches!(err, AnalyticsError::EmptyVideo));
    }

    #[test]
    fn test_frame_count_mismatch() {
        let analyzer = CourtAnalyzer::new(AnalyticsConfig::default()).unwrap();
        let mut video = input(10);
        video.ball_detections.pop();
        let err = analyzer.analyze(&video).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::FrameCountMismatch { players: 10, balls: 9 }
        ));
    }

    #[test]
    fn test_missing_ball_is_a_notice() {
        let analyzer = CourtAnalyzer::new(AnalyticsConfig::default()).unwrap();
        let analysis = analyzer.analyze(&input(30)).unwrap();
        assert_eq!(analysis.notices.len(), 1);
        assert!(analysis.shots.is_empty());
        assert_eq!(analysis.stats.len(), 30);
        assert_eq!(analysis.context.players.track_ids(), [2, 4]);
        assert!(analysis.player_positions(PlayerId::One).is_complete());
    }

    #[test]
    fn test_analysis_carries_frame_rate_and_size() {
        let config = AnalyticsConfig {
            frame_rate: 30.0,
            ..Default::default()
        };
        let analysis = CourtAnalyzer::new(config).unwrap().analyze(&input(12)).unwrap();
        assert_eq!(analysis.frame_rate, 30.0);
        assert_eq!(analysis.frame_size, Some((1280, 720)));

        let report = AnalysisReport::new(&analysis);
        assert_eq!(report.frame_rate, 30.0);
        assert_eq!(report.frame_size, Some((1280, 720)));
    }
}
