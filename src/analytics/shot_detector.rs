// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 击球事件检测 (Shot event detection)
//!
//! 核心思想:
//! 1. 对球的纵坐标做居中滑动平均, 抑制检测抖动
//! 2. 计算逐帧变化量, 分类为 上升 / 下降 / 平稳
//! 3. 连续保持至少一个平滑窗口的方向记为当前运动方向, 更短的抖动不计
//! 4. 方向翻转且新方向在后续窗口内持续足够帧数 → 击球
//! 5. 相邻事件间隔过近时保留较早的一个

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detection::{BBox, Trajectory};
use crate::error::{AnalyticsError, AnalyticsResult};

/// 击球检测参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotDetectorConfig {
    pub smoothing_window: usize,  // 滑动平均窗口 (帧)
    pub min_run_length: usize,    // 新方向最少持续帧数
    pub lookahead_factor: f64,    // 持续性检查窗口 = min_run_length × 该系数
    pub min_event_gap: usize,     // 相邻击球最小间隔 (帧)
    pub flat_tolerance: f64,      // |Δy| 小于该值视为平稳
}

impl Default for ShotDetectorConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 5,
            min_run_length: 25,
            lookahead_factor: 1.2,
            min_event_gap: 20,
            flat_tolerance: 1e-6,
        }
    }
}

impl ShotDetectorConfig {
    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.smoothing_window == 0 {
            return Err(AnalyticsError::invalid_config("smoothing window must be at least 1 frame"));
        }
        if self.min_run_length == 0 {
            return Err(AnalyticsError::invalid_config("minimum run length must be at least 1 frame"));
        }
        if !self.lookahead_factor.is_finite() || self.lookahead_factor < 1.0 {
            return Err(AnalyticsError::invalid_config("lookahead factor must be >= 1"));
        }
        if !self.flat_tolerance.is_finite() || self.flat_tolerance < 0.0 {
            return Err(AnalyticsError::invalid_config("flat tolerance must be non-negative"));
        }
        Ok(())
    }

    /// 持续性检查窗口长度
    fn lookahead(&self) -> usize {
        ((self.min_run_length as f64 * self.lookahead_factor).ceil() as usize).max(self.min_run_length)
    }
}

/// 纵向运动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Falling,
    Flat,
}

impl Direction {
    fn of(delta: f64, tolerance: f64) -> Self {
        if delta > tolerance {
            Direction::Rising
        } else if delta < -tolerance {
            Direction::Falling
        } else {
            Direction::Flat
        }
    }
}

/// 居中滑动平均 (边缘使用不完整窗口)
pub fn centered_rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 || window == 0 {
        return values.to_vec();
    }
    let left = (window - 1) / 2;
    let right = window / 2;

    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for v in values {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + v);
    }

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(left);
            let hi = (i + right).min(n - 1);
            (prefix[hi + 1] - prefix[lo]) / (hi - lo + 1) as f64
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct ShotEventDetector {
    config: ShotDetectorConfig,
}

impl ShotEventDetector {
    pub fn new(config: ShotDetectorConfig) -> AnalyticsResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ShotDetectorConfig {
        &self.config
    }

    /// 从补全后的球轨迹 (像素坐标) 检测击球帧
    pub fn detect(&self, ball: &Trajectory<BBox>) -> Vec<usize> {
        let ys: Option<Vec<f64>> = ball
            .samples()
            .iter()
            .map(|s| s.as_ref().map(|bbox| bbox.center().y))
            .collect();
        match ys {
            Some(ys) => self.detect_signal(&ys),
            None => {
                debug!("ball trajectory has gaps, skipping shot detection");
                Vec::new()
            }
        }
    }

    /// 对纵坐标序列检测方向翻转, 返回严格递增的帧索引
    pub fn detect_signal(&self, ys: &[f64]) -> Vec<usize> {
        let cfg = &self.config;
        let n = ys.len();
        if n < cfg.smoothing_window || n < 3 {
            debug!(frames = n, "trajectory shorter than smoothing window, no shots");
            return Vec::new();
        }

        let smoothed = centered_rolling_mean(ys, cfg.smoothing_window);
        let mut directions = vec![Direction::Flat; n];
        for i in 1..n {
            directions[i] = Direction::of(smoothed[i] - smoothed[i - 1], cfg.flat_tolerance);
        }

        let lookahead = cfg.lookahead();
        // 当前运动方向: 最近一次连续保持 >= smoothing_window 帧的方向
        let mut prior: Option<Direction> = None;
        let mut run = (Direction::Flat, 0usize);
        let mut events: Vec<usize> = Vec::new();

        for i in 1..n {
            let dir = directions[i];
            if dir != Direction::Flat && prior.is_some() && prior != Some(dir) {
                // 后续帧不足, 无法确认
                if i.saturating_add(lookahead) > n {
                    break;
                }
                let support = directions[i..i + lookahead]
                    .iter()
                    .filter(|d| **d == dir)
                    .count();
                if support >= cfg.min_run_length {
                    prior = Some(dir);
                    match events.last() {
                        Some(&last) if i - last < cfg.min_event_gap => {
                            debug!(frame = i, previous = last, "shot too close to previous, collapsed");
                        }
                        _ if i + 1 < n => events.push(i),
                        _ => {}
                    }
                }
            }

            run = if run.0 == dir { (dir, run.1 + 1) } else { (dir, 1) };
            if dir != Direction::Flat && run.1 >= cfg.smoothing_window {
                prior = Some(dir);
            }
        }

        debug!(shots = events.len(), frames = n, "shot detection finished");
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ShotEventDetector {
        ShotEventDetector::default()
    }

    #[test]
    fn test_rolling_mean_centered_with_partial_edges() {
        let smoothed = centered_rolling_mean(&[0.0, 3.0, 6.0, 9.0, 12.0], 3);
        assert_eq!(smoothed, vec![1.5, 3.0, 6.0, 9.0, 10.5]);
    }

    #[test]
    fn test_straight_line_has_no_shots() {
        let ys: Vec<f64> = (0..120).map(|i| 400.0 - 2.5 * i as f64).collect();
        assert!(detector().detect_signal(&ys).is_empty());
    }

    #[test]
    fn test_single_reversal_is_one_shot() {
        let ys: Vec<f64> = (0..100)
            .map(|i| if i <= 50 { i as f64 } else { 100.0 - i as f64 })
            .collect();
        let shots = detector().detect_signal(&ys);
        assert_eq!(shots.len(), 1);
        assert!((shots[0] as i64 - 50).abs() <= 5, "shot at {}", shots[0]);
    }

    #[test]
    fn test_single_frame_spike_is_ignored() {
        let mut ys: Vec<f64> = (0..100).map(|i| 2.0 * i as f64).collect();
        ys[40] += 30.0;
        assert!(detector().detect_signal(&ys).is_empty());
    }

    #[test]
    fn test_close_reversals_collapse_to_earlier() {
        let config = ShotDetectorConfig {
            min_run_length: 5,
            min_event_gap: 30,
            ..Default::default()
        };
        // 上升 40 帧, 下降 12 帧, 再上升
        let mut y = 0.0;
        let ys: Vec<f64> = (0..120)
            .map(|i| {
                y += if i < 40 || i >= 52 { 3.0 } else { -3.0 };
                y
            })
            .collect();
        let shots = ShotEventDetector::new(config).unwrap().detect_signal(&ys);
        assert_eq!(shots.len(), 1);
        assert!((shots[0] as i64 - 40).abs() <= 3);
    }

    #[test]
    fn test_events_strictly_increasing_and_spaced() {
        let config = ShotDetectorConfig {
            min_run_length: 10,
            min_event_gap: 15,
            ..Default::default()
        };
        // 周期 40 帧的三角波
        let ys: Vec<f64> = (0..240)
            .map(|i| {
                let phase = i % 40;
                if phase < 20 {
                    phase as f64
                } else {
                    40.0 - phase as f64
                }
            })
            .collect();
        let shots = ShotEventDetector::new(config).unwrap().detect_signal(&ys);
        assert!(shots.len() >= 5);
        for pair in shots.windows(2) {
            assert!(pair[1] > pair[0]);
            assert!(pair[1] - pair[0] >= 15);
        }
        assert!(shots.iter().all(|&f| f > 0 && f < ys.len() - 1));
    }

    #[test]
    fn test_strike_early_in_clip_is_detected() {
        // 0..15 帧下降, 之后上升到 99 帧
        let ys: Vec<f64> = (0..100)
            .map(|i| if i <= 15 { 200.0 - 4.0 * i as f64 } else { 140.0 + 4.0 * (i - 15) as f64 })
            .collect();
        let shots = detector().detect_signal(&ys);
        assert_eq!(shots.len(), 1);
        assert!((shots[0] as i64 - 15).abs() <= 3, "shot at {}", shots[0]);
    }

    #[test]
    fn test_strike_after_short_return_is_detected() {
        // 上升 40 帧, 下降 20 帧, 再上升 60 帧
        let mut y = 0.0;
        let ys: Vec<f64> = (0..120)
            .map(|i| {
                y += if (40..60).contains(&i) { -3.0 } else { 3.0 };
                y
            })
            .collect();
        let shots = detector().detect_signal(&ys);
        // 40 帧处的下降不足 min_run_length, 不算击球
        assert_eq!(shots.len(), 1);
        assert!((shots[0] as i64 - 60).abs() <= 3, "shot at {}", shots[0]);
    }

    #[test]
    fn test_huge_lookahead_factor_does_not_overflow() {
        let config = ShotDetectorConfig {
            lookahead_factor: 1e300,
            ..Default::default()
        };
        let detector = ShotEventDetector::new(config).unwrap();
        let ys: Vec<f64> = (0..100)
            .map(|i| if i <= 50 { i as f64 } else { 100.0 - i as f64 })
            .collect();
        assert!(detector.detect_signal(&ys).is_empty());
    }

    #[test]
    fn test_short_trajectory_has_no_shots() {
        assert!(detector().detect_signal(&[1.0, 2.0, 1.0]).is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ShotDetectorConfig {
            smoothing_window: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(ShotEventDetector::new(config).is_err());
        let config = ShotDetectorConfig {
            lookahead_factor: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            ShotEventDetector::new(config),
            Err(AnalyticsError::InvalidConfig(_))
        ));
    }
}
