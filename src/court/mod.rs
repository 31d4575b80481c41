// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 球场标定 (Court calibration)
///
/// - keypoints:  关键点回归输出 (14 点)
/// - geometry:   标准球场尺寸 + 俯视小球场
/// - homography: 单应性矩阵估计
/// - projector:  像素 ↔ 球场坐标
pub mod geometry;
pub mod homography;
pub mod keypoints;
pub mod projector;

pub use geometry::{CourtGeometry, CourtModel};
pub use homography::{estimate_homography, Homography};
pub use keypoints::{CourtKeypoint, KeypointSet, KEYPOINT_COUNT, KEYPOINT_INPUT_SIZE};
pub use projector::{Anchor, CourtProjector};
