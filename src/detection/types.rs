// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 检测数据结构定义
/// Data structures shared by detectors and the analytics engine
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, AnalyticsResult};

// ========== 公共常量 ==========

/// COCO "person" 类别ID
pub const PERSON_CLASS_ID: u32 = 0;

// ========== 类型别名 ==========

/// 跟踪ID (检测器分配,跨帧稳定)
pub type TrackId = u32;

/// 单帧人物检测: 跟踪ID → 边界框
pub type PlayerFrame = BTreeMap<TrackId, BBox>;

// ========== 数据结构 ==========

/// 二维点 (像素坐标或球场坐标)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 欧氏距离
    pub fn distance(&self, other: &Point2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// 检测框 (Detection bounding box), 像素坐标 x1<x2, y1<y2
///
/// 反序列化同样经过 `BBox::new` 校验
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BBoxRepr", into = "BBoxRepr")]
pub struct BBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// 序列化格式 (未校验)
#[derive(Serialize, Deserialize)]
struct BBoxRepr {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl TryFrom<BBoxRepr> for BBox {
    type Error = AnalyticsError;

    fn try_from(raw: BBoxRepr) -> Result<Self, Self::Error> {
        Self::new(raw.x1, raw.y1, raw.x2, raw.y2)
    }
}

impl From<BBox> for BBoxRepr {
    fn from(bbox: BBox) -> Self {
        Self {
            x1: bbox.x1,
            y1: bbox.y1,
            x2: bbox.x2,
            y2: bbox.y2,
        }
    }
}

impl BBox {
    /// 创建并校验边界框
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> AnalyticsResult<Self> {
        let bbox = Self { x1, y1, x2, y2 };
        if bbox.is_valid() {
            Ok(bbox)
        } else {
            Err(AnalyticsError::InvalidBoundingBox { x1, y1, x2, y2 })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// 中心点 (球的锚点)
    pub fn center(&self) -> Point2 {
        Point2::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// 底边中点 (球员脚下位置)
    pub fn foot_point(&self) -> Point2 {
        Point2::new((self.x1 + self.x2) / 2.0, self.y2)
    }
}

/// 检测器原始输出 (含类别)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub track_id: TrackId,
    pub class_id: u32,
    pub confidence: f32,
    pub bbox: BBox,
}

/// 只保留 "person" 类别的跟踪框
pub fn person_tracks(detections: &[RawDetection]) -> PlayerFrame {
    detections
        .iter()
        .filter(|det| det.class_id == PERSON_CLASS_ID)
        .map(|det| (det.track_id, det.bbox))
        .collect()
}

// ========== 插值 ==========

/// 线性插值 (t ∈ [0, 1])
pub trait Lerp {
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

fn lerp_f64(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

impl Lerp for Point2 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Point2::new(lerp_f64(self.x, other.x, t), lerp_f64(self.y, other.y, t))
    }
}

impl Lerp for BBox {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        BBox {
            x1: lerp_f64(self.x1, other.x1, t),
            y1: lerp_f64(self.y1, other.y1, t),
            x2: lerp_f64(self.x2, other.x2, t),
            y2: lerp_f64(self.y2, other.y2, t),
        }
    }
}

// ========== 轨迹 ==========

/// 按帧索引的轨迹, `None` 表示该帧未检测到
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trajectory<T> {
    samples: Vec<Option<T>>,
}

impl<T> Trajectory<T> {
    pub fn new(samples: Vec<Option<T>>) -> Self {
        Self { samples }
    }

    /// 全部缺失的轨迹
    pub fn absent(len: usize) -> Self {
        Self {
            samples: (0..len).map(|_| None).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, frame: usize) -> Option<&T> {
        self.samples.get(frame).and_then(Option::as_ref)
    }

    pub fn samples(&self) -> &[Option<T>] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Option<T>> {
        self.samples
    }

    pub fn known_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_some()).count()
    }

    /// 第一个已知帧索引
    pub fn first_known(&self) -> Option<usize> {
        self.samples.iter().position(Option::is_some)
    }

    /// 最后一个已知帧索引
    pub fn last_known(&self) -> Option<usize> {
        self.samples.iter().rposition(Option::is_some)
    }

    /// 每一帧都有值
    pub fn is_complete(&self) -> bool {
        self.samples.iter().all(Option::is_some)
    }

    pub fn map<U, F: FnMut(&T) -> Option<U>>(&self, mut f: F) -> Trajectory<U> {
        Trajectory {
            samples: self
                .samples
                .iter()
                .map(|s| s.as_ref().and_then(&mut f))
                .collect(),
        }
    }
}

impl<T> FromIterator<Option<T>> for Trajectory<T> {
    fn from_iter<I: IntoIterator<Item = Option<T>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_bbox_rejected_on_deserialize() {
        let inverted = serde_json::from_str::<BBox>(r#"{"x1":10,"y1":10,"x2":5,"y2":5}"#);
        assert!(inverted.is_err());
        let flat = serde_json::from_str::<BBox>(r#"{"x1":10,"y1":10,"x2":20,"y2":10}"#);
        assert!(flat.is_err());

        let bbox: BBox = serde_json::from_str(r#"{"x1":1.5,"y1":2,"x2":8,"y2":9.25}"#).unwrap();
        assert_eq!(bbox, BBox::new(1.5, 2.0, 8.0, 9.25).unwrap());
        let json = serde_json::to_value(bbox).unwrap();
        assert_eq!(json["x2"], 8.0);
    }

    #[test]
    fn test_bbox_anchors() {
        let bbox = BBox::new(10.0, 20.0, 30.0, 60.0).unwrap();
        assert_eq!(bbox.center(), Point2::new(20.0, 40.0));
        assert_eq!(bbox.foot_point(), Point2::new(20.0, 60.0));
        assert_eq!(bbox.width(), 20.0);
        assert_eq!(bbox.height(), 40.0);
    }

    #[test]
    fn test_bbox_rejects_inverted_corners() {
        assert!(BBox::new(30.0, 20.0, 10.0, 60.0).is_err());
        assert!(BBox::new(10.0, 20.0, 30.0, 20.0).is_err());
    }

    #[test]
    fn test_person_tracks_drops_other_classes() {
        let bbox = BBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let dets = vec![
            RawDetection {
                track_id: 3,
                class_id: PERSON_CLASS_ID,
                confidence: 0.9,
                bbox,
            },
            RawDetection {
                track_id: 4,
                class_id: 32,
                confidence: 0.8,
                bbox,
            },
        ];
        let frame = person_tracks(&dets);
        assert_eq!(frame.len(), 1);
        assert!(frame.contains_key(&3));
    }

    #[test]
    fn test_trajectory_known_range() {
        let traj: Trajectory<Point2> = vec![None, Some(Point2::new(1.0, 1.0)), None, Some(Point2::default()), None]
            .into_iter()
            .collect();
        assert_eq!(traj.first_known(), Some(1));
        assert_eq!(traj.last_known(), Some(3));
        assert_eq!(traj.known_count(), 2);
        assert!(!traj.is_complete());
        assert!(traj.get(2).is_none());
    }

    #[test]
    fn test_bbox_lerp_midpoint() {
        let a = BBox::new(0.0, 0.0, 2.0, 2.0).unwrap();
        let b = BBox::new(10.0, 20.0, 12.0, 22.0).unwrap();
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid, BBox::new(5.0, 10.0, 7.0, 12.0).unwrap());
    }
}
