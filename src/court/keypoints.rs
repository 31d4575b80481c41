// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 球场关键点 (Court keypoints)
//!
//! 关键点回归模型输出 14 个点, 顺序固定:
//! ```text
//!  0 ────── 4 ──────── 6 ────── 1     远端底线
//!  │        │          │        │
//!  │        8 ─── 12 ─ 9        │     远端发球线
//!  │        │    │     │        │
//!  │        10 ── 13 ─ 11       │     近端发球线
//!  │        │          │        │
//!  2 ────── 5 ──────── 7 ────── 3     近端底线
//! ```

use serde::{Deserialize, Serialize};

use crate::detection::Point2;
use crate::error::{AnalyticsError, AnalyticsResult};

/// 关键点数量
pub const KEYPOINT_COUNT: usize = 14;

/// 关键点模型的输入尺寸
pub const KEYPOINT_INPUT_SIZE: u32 = 224;

/// 关键点语义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourtKeypoint {
    FarDoublesLeft = 0,
    FarDoublesRight = 1,
    NearDoublesLeft = 2,
    NearDoublesRight = 3,
    FarSinglesLeft = 4,
    NearSinglesLeft = 5,
    FarSinglesRight = 6,
    NearSinglesRight = 7,
    FarServiceLeft = 8,
    FarServiceRight = 9,
    NearServiceLeft = 10,
    NearServiceRight = 11,
    FarCenterService = 12,
    NearCenterService = 13,
}

impl CourtKeypoint {
    pub const ALL: [CourtKeypoint; KEYPOINT_COUNT] = [
        CourtKeypoint::FarDoublesLeft,
        CourtKeypoint::FarDoublesRight,
        CourtKeypoint::NearDoublesLeft,
        CourtKeypoint::NearDoublesRight,
        CourtKeypoint::FarSinglesLeft,
        CourtKeypoint::NearSinglesLeft,
        CourtKeypoint::FarSinglesRight,
        CourtKeypoint::NearSinglesRight,
        CourtKeypoint::FarServiceLeft,
        CourtKeypoint::FarServiceRight,
        CourtKeypoint::NearServiceLeft,
        CourtKeypoint::NearServiceRight,
        CourtKeypoint::FarCenterService,
        CourtKeypoint::NearCenterService,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// 一段视频的球场关键点 (像素坐标), 首帧计算后不再变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point2>", into = "Vec<Point2>")]
pub struct KeypointSet {
    points: [Point2; KEYPOINT_COUNT],
}

impl KeypointSet {
    pub fn from_points(points: Vec<Point2>) -> AnalyticsResult<Self> {
        let found = points.len();
        let points: [Point2; KEYPOINT_COUNT] =
            points
                .try_into()
                .map_err(|_| AnalyticsError::InvalidKeypoints {
                    expected: KEYPOINT_COUNT,
                    found,
                })?;
        Ok(Self { points })
    }

    /// 从扁平数组 [x0, y0, x1, y1, ...] 创建
    pub fn from_flat(values: &[f64]) -> AnalyticsResult<Self> {
        if values.len() != KEYPOINT_COUNT * 2 {
            return Err(AnalyticsError::InvalidKeypoints {
                expected: KEYPOINT_COUNT,
                found: values.len() / 2,
            });
        }
        Self::from_points(
            values
                .chunks_exact(2)
                .map(|xy| Point2::new(xy[0], xy[1]))
                .collect(),
        )
    }

    /// 将模型输出 (input_size × input_size 坐标系) 还原到原图尺寸
    ///
    /// # 参数
    /// - `raw`: 模型输出 [x0, y0, x1, y1, ...]
    /// - `frame_width` / `frame_height`: 原图尺寸
    /// - `input_size`: 模型输入边长 (默认 224)
    pub fn from_model_output(
        raw: &[f32],
        frame_width: u32,
        frame_height: u32,
        input_size: u32,
    ) -> AnalyticsResult<Self> {
        if input_size == 0 {
            return Err(AnalyticsError::invalid_config("keypoint input size must be positive"));
        }
        let scale_x = frame_width as f64 / input_size as f64;
        let scale_y = frame_height as f64 / input_size as f64;
        let scaled: Vec<f64> = raw
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if i % 2 == 0 {
                    *v as f64 * scale_x
                } else {
                    *v as f64 * scale_y
                }
            })
            .collect();
        Self::from_flat(&scaled)
    }

    pub fn points(&self) -> &[Point2; KEYPOINT_COUNT] {
        &self.points
    }

    pub fn get(&self, keypoint: CourtKeypoint) -> Point2 {
        self.points[keypoint.index()]
    }

    /// 点到最近关键点的距离
    pub fn min_distance(&self, point: &Point2) -> f64 {
        self.points
            .iter()
            .map(|kp| kp.distance(point))
            .fold(f64::INFINITY, f64::min)
    }
}

impl TryFrom<Vec<Point2>> for KeypointSet {
    type Error = AnalyticsError;

    fn try_from(points: Vec<Point2>) -> Result<Self, Self::Error> {
        Self::from_points(points)
    }
}

impl From<KeypointSet> for Vec<Point2> {
    fn from(set: KeypointSet) -> Self {
        set.points.to_vec()
    }
}
