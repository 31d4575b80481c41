// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 检测器接口 (Detector interfaces)
//!
//! 推理模型是外部协作者: 分析引擎只依赖下面三个 trait,
//! 具体实现可以是 ONNX 模型、缓存回放或测试替身。

use anyhow::{Context, Result};
use image::DynamicImage;
use tracing::{debug, info};

use super::cache::StubCache;
use super::types::{BBox, PlayerFrame};
use crate::court::KeypointSet;

/// 人物检测 + 跟踪: 每帧输出 跟踪ID → 边界框 ("person" 类别)
pub trait PlayerDetector {
    fn detect(&mut self, frame: &DynamicImage) -> Result<PlayerFrame>;
}

/// 球检测: 每帧最多一个球
pub trait BallDetector {
    fn detect(&mut self, frame: &DynamicImage) -> Result<Option<BBox>>;
}

/// 球场关键点回归: 每段视频只在首帧调用一次
pub trait KeypointRegressor {
    fn locate_keypoints(&mut self, frame: &DynamicImage) -> Result<KeypointSet>;
}

/// 逐帧运行人物检测 (可选缓存)
pub fn detect_player_frames<D: PlayerDetector + ?Sized>(
    detector: &mut D,
    frames: &[DynamicImage],
    cache: Option<&StubCache>,
) -> Result<Vec<PlayerFrame>> {
    let run = |detector: &mut D| -> Result<Vec<PlayerFrame>> {
        info!(frames = frames.len(), "running player detector");
        frames
            .iter()
            .enumerate()
            .map(|(idx, frame)| {
                detector
                    .detect(frame)
                    .with_context(|| format!("player detection failed on frame {}", idx))
            })
            .collect()
    };

    match cache {
        Some(cache) => cache.get_or_compute(frames.len(), || run(detector)),
        None => run(detector),
    }
}

/// 逐帧运行球检测 (可选缓存)
pub fn detect_ball_frames<D: BallDetector + ?Sized>(
    detector: &mut D,
    frames: &[DynamicImage],
    cache: Option<&StubCache>,
) -> Result<Vec<Option<BBox>>> {
    let run = |detector: &mut D| -> Result<Vec<Option<BBox>>> {
        info!(frames = frames.len(), "running ball detector");
        let detections = frames
            .iter()
            .enumerate()
            .map(|(idx, frame)| {
                detector
                    .detect(frame)
                    .with_context(|| format!("ball detection failed on frame {}", idx))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(
            detected = detections.iter().filter(|d| d.is_some()).count(),
            "ball detector finished"
        );
        Ok(detections)
    };

    match cache {
        Some(cache) => cache.get_or_compute(frames.len(), || run(detector)),
        None => run(detector),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    /// 固定输出的测试替身
    struct ScriptedBalls {
        calls: usize,
    }

    impl BallDetector for ScriptedBalls {
        fn detect(&mut self, _frame: &DynamicImage) -> Result<Option<BBox>> {
            self.calls += 1;
            if self.calls % 2 == 0 {
                Ok(None)
            } else {
                Ok(Some(BBox::new(0.0, 0.0, 4.0, 4.0)?))
            }
        }
    }

    struct FailingPlayers;

    impl PlayerDetector for FailingPlayers {
        fn detect(&mut self, _frame: &DynamicImage) -> Result<PlayerFrame> {
            anyhow::bail!("model not loaded")
        }
    }

    fn blank_frames(n: usize) -> Vec<DynamicImage> {
        (0..n)
            .map(|_| DynamicImage::ImageRgb8(RgbImage::new(8, 8)))
            .collect()
    }

    #[test]
    fn test_ball_frames_keep_frame_order() {
        let mut detector = ScriptedBalls { calls: 0 };
        let balls = detect_ball_frames(&mut detector, &blank_frames(4), None).unwrap();
        assert_eq!(balls.len(), 4);
        assert!(balls[0].is_some());
        assert!(balls[1].is_none());
        assert_eq!(detector.calls, 4);
    }

    #[test]
    fn test_detector_error_names_frame() {
        let err = detect_player_frames(&mut FailingPlayers, &blank_frames(2), None).unwrap_err();
        assert!(format!("{:#}", err).contains("frame 0"));
    }

    #[test]
    fn test_cached_run_reuses_stub() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StubCache::new(dir.path().join("balls.json"), true);
        let frames = blank_frames(3);

        let mut first = ScriptedBalls { calls: 0 };
        let fresh = detect_ball_frames(&mut first, &frames, Some(&cache)).unwrap();

        let mut second = ScriptedBalls { calls: 0 };
        let cached = detect_ball_frames(&mut second, &frames, Some(&cache)).unwrap();
        assert_eq!(fresh, cached);
        assert_eq!(second.calls, 0);
    }
}
