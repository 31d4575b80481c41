// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 球员统计 (Per-player shot / movement statistics)
//!
//! 相邻两次击球构成一个区间:
//! - 击球者: 区间开始时离球最近的球员
//! - 球速 = 球的球场距离 (米) / 时间 × 3.6 (km/h)
//! - 对手跑动速度按同样方式计算
//!
//! 每个区间在开始帧生成一条记录, 其余帧沿用上一条记录。

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::carry;
use super::player_selector::PlayerId;
use crate::court::CourtModel;
use crate::detection::{Point2, Trajectory};
use crate::error::{AnalyticsError, AnalyticsResult};

/// m/s → km/h
const MPS_TO_KMH: f64 = 3.6;

/// 单个球员的累计统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub shot_count: u32,
    pub total_shot_speed: f64,
    pub last_shot_speed: f64,
    pub total_movement_speed: f64,
    pub last_movement_speed: f64,
}

/// 某一帧的两名球员统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatsRecord {
    pub frame_index: usize,
    pub players: [PlayerStats; 2],
}

impl PlayerStatsRecord {
    pub fn player(&self, player: PlayerId) -> &PlayerStats {
        &self.players[player.index()]
    }

    fn player_mut(&mut self, player: PlayerId) -> &mut PlayerStats {
        &mut self.players[player.index()]
    }

    /// 平均球速; 该球员尚无击球时为 None
    pub fn average_shot_speed(&self, player: PlayerId) -> Option<f64> {
        let stats = self.player(player);
        (stats.shot_count > 0).then(|| stats.total_shot_speed / stats.shot_count as f64)
    }

    /// 平均跑动速度; 跑动只在对手击球区间内统计, 因此除以对手的击球数
    pub fn average_movement_speed(&self, player: PlayerId) -> Option<f64> {
        let opponent_shots = self.player(player.opponent()).shot_count;
        (opponent_shots > 0)
            .then(|| self.player(player).total_movement_speed / opponent_shots as f64)
    }
}

/// 两次击球之间的区间
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotInterval {
    pub start: usize,
    pub end: usize,
    pub shooter: PlayerId,
    pub ball_distance_m: f64,
    pub shot_speed_kmh: f64,
    pub opponent_distance_m: f64,
    pub opponent_speed_kmh: f64,
}

/// 逐帧统计表 (每帧一行)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsTable {
    rows: Vec<PlayerStatsRecord>,
    intervals: Vec<ShotInterval>,
}

impl StatsTable {
    pub fn rows(&self) -> &[PlayerStatsRecord] {
        &self.rows
    }

    pub fn intervals(&self) -> &[ShotInterval] {
        &self.intervals
    }

    pub fn row(&self, frame: usize) -> Option<&PlayerStatsRecord> {
        self.rows.get(frame)
    }

    pub fn last(&self) -> Option<&PlayerStatsRecord> {
        self.rows.last()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StatisticsAggregator {
    frame_rate: f64,
    meters_per_unit: f64,
}

impl StatisticsAggregator {
    pub fn new(frame_rate: f64, model: &CourtModel) -> AnalyticsResult<Self> {
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(AnalyticsError::invalid_config(format!(
                "frame rate must be positive, got {}",
                frame_rate
            )));
        }
        Ok(Self {
            frame_rate,
            meters_per_unit: model.units_to_meters(1.0),
        })
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// 某帧离球最近的球员; 距离相同时为 1 号
    pub fn shooter_at(
        &self,
        frame: usize,
        ball: &Trajectory<Point2>,
        players: [&Trajectory<Point2>; 2],
    ) -> Option<PlayerId> {
        let ball_pos = ball.get(frame)?;
        let d1 = players[0].get(frame)?.distance(ball_pos);
        let d2 = players[1].get(frame)?.distance(ball_pos);
        Some(if d1 <= d2 { PlayerId::One } else { PlayerId::Two })
    }

    /// 计算一个击球区间; 任一位置缺失时返回 None
    pub fn measure_interval(
        &self,
        start: usize,
        end: usize,
        ball: &Trajectory<Point2>,
        players: [&Trajectory<Point2>; 2],
    ) -> Option<ShotInterval> {
        if end <= start {
            return None;
        }
        let seconds = (end - start) as f64 / self.frame_rate;
        let shooter = self.shooter_at(start, ball, players)?;
        let opponent = shooter.opponent();

        let ball_units = ball.get(start)?.distance(ball.get(end)?);
        let track = players[opponent.index()];
        let opponent_units = track.get(start)?.distance(track.get(end)?);

        let ball_distance_m = ball_units * self.meters_per_unit;
        let opponent_distance_m = opponent_units * self.meters_per_unit;
        Some(ShotInterval {
            start,
            end,
            shooter,
            ball_distance_m,
            shot_speed_kmh: ball_distance_m / seconds * MPS_TO_KMH,
            opponent_distance_m,
            opponent_speed_kmh: opponent_distance_m / seconds * MPS_TO_KMH,
        })
    }

    /// 生成逐帧统计表
    ///
    /// `ball` 和 `players` 为球场坐标轨迹, `shots` 为严格递增的击球帧
    pub fn aggregate(
        &self,
        shots: &[usize],
        ball: &Trajectory<Point2>,
        players: [&Trajectory<Point2>; 2],
        frame_count: usize,
    ) -> StatsTable {
        let mut intervals = Vec::new();
        let mut records = vec![(0, PlayerStatsRecord::default())];
        let mut current = PlayerStatsRecord::default();

        for pair in shots.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let Some(interval) = self.measure_interval(start, end, ball, players) else {
                warn!(start, end, "court positions missing, shot interval skipped");
                continue;
            };

            let opponent = interval.shooter.opponent();
            let shooter_stats = current.player_mut(interval.shooter);
            shooter_stats.shot_count += 1;
            shooter_stats.total_shot_speed += interval.shot_speed_kmh;
            shooter_stats.last_shot_speed = interval.shot_speed_kmh;

            let opponent_stats = current.player_mut(opponent);
            opponent_stats.total_movement_speed += interval.opponent_speed_kmh;
            opponent_stats.last_movement_speed = interval.opponent_speed_kmh;

            debug!(
                start,
                end,
                shooter = interval.shooter.number(),
                shot_speed = interval.shot_speed_kmh,
                opponent_speed = interval.opponent_speed_kmh,
                "shot interval"
            );
            records.push((start, current));
            intervals.push(interval);
        }

        // 区间开始帧之外的帧沿用上一条记录
        let mut slots = carry::scatter(frame_count, records);
        carry::forward_fill(&mut slots);
        let rows = slots
            .into_iter()
            .enumerate()
            .map(|(frame_index, slot)| PlayerStatsRecord {
                frame_index,
                ..slot.unwrap_or_default()
            })
            .collect();

        StatsTable { rows, intervals }
    }
}
