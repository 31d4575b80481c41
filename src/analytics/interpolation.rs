// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 球轨迹补帧 (Ball trajectory gap filling)
//!
//! - 内部缺口: 前后已知点线性插值
//! - 首尾缺口: 保持最近已知值, 不外推

use tracing::debug;

use super::carry;
use crate::detection::{Lerp, Trajectory};
use crate::error::{AnalyticsError, AnalyticsResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct TrajectoryInterpolator;

impl TrajectoryInterpolator {
    /// 补全轨迹; 整段都没有检测到时返回 `NoBallDetected`
    pub fn interpolate<T: Lerp + Clone>(
        &self,
        trajectory: &Trajectory<T>,
    ) -> AnalyticsResult<Trajectory<T>> {
        if trajectory.known_count() == 0 {
            return Err(AnalyticsError::NoBallDetected);
        }

        let mut slots: Vec<Option<T>> = trajectory.samples().to_vec();
        let mut filled = 0usize;
        let mut prev: Option<usize> = None;

        for idx in 0..slots.len() {
            if slots[idx].is_none() {
                continue;
            }
            if let Some(start) = prev {
                if idx - start > 1 {
                    filled += idx - start - 1;
                    fill_linear(&mut slots, start, idx);
                }
            }
            prev = Some(idx);
        }

        // 首尾缺口沿用最近已知值
        carry::hold_nearest(&mut slots);

        debug!(
            frames = slots.len(),
            detected = trajectory.known_count(),
            interpolated = filled,
            "ball trajectory completed"
        );
        Ok(Trajectory::new(slots))
    }
}

/// 在 (start, end) 开区间内线性插值; 两端必须已知
fn fill_linear<T: Lerp + Clone>(slots: &mut [Option<T>], start: usize, end: usize) {
    let (Some(a), Some(b)) = (slots[start].clone(), slots[end].clone()) else {
        return;
    };
    let span = (end - start) as f64;
    for (offset, slot) in slots[start + 1..end].iter_mut().enumerate() {
        let t = (offset + 1) as f64 / span;
        *slot = Some(a.lerp(&b, t));
    }
}
