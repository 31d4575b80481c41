// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 像素 → 球场坐标投影 (Pixel to court-space projection)

use tracing::debug;

use super::geometry::CourtModel;
use super::homography::{estimate_homography, Homography};
use super::keypoints::KeypointSet;
use crate::detection::{BBox, Point2};
use crate::error::{AnalyticsError, AnalyticsResult};

/// 检测框投影锚点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// 底边中点 (球员脚下)
    Foot,
    /// 中心点 (球)
    Center,
}

impl Anchor {
    pub fn point(self, bbox: &BBox) -> Point2 {
        match self {
            Anchor::Foot => bbox.foot_point(),
            Anchor::Center => bbox.center(),
        }
    }
}

/// 整段视频共享的不可变投影
#[derive(Debug, Clone)]
pub struct CourtProjector {
    model: CourtModel,
    to_court: Homography,
    to_pixel: Homography,
    reprojection_error: f64,
}

impl CourtProjector {
    /// 由检测到的关键点和标准球场几何构建投影
    pub fn new(keypoints: &KeypointSet, model: CourtModel) -> AnalyticsResult<Self> {
        let reference = model.reference_points();
        let to_court = estimate_homography(keypoints.points(), &reference)?;
        let to_pixel = to_court
            .inverse()
            .ok_or_else(|| AnalyticsError::degenerate("court projection is not invertible"))?;

        let residuals: Vec<f64> = keypoints
            .points()
            .iter()
            .zip(reference.iter())
            .map(|(px, court)| {
                to_court
                    .apply(*px)
                    .map(|p| p.distance(court))
                    .unwrap_or(f64::INFINITY)
            })
            .collect();
        if residuals.iter().any(|r| !r.is_finite()) {
            return Err(AnalyticsError::degenerate(
                "a court keypoint projects to infinity",
            ));
        }
        let reprojection_error = residuals.iter().sum::<f64>() / residuals.len() as f64;
        debug!(
            reprojection_error = reprojection_error,
            "court projection estimated"
        );

        Ok(Self {
            model,
            to_court,
            to_pixel,
            reprojection_error,
        })
    }

    pub fn model(&self) -> &CourtModel {
        &self.model
    }

    /// 关键点平均重投影误差 (球场坐标单位)
    pub fn mean_reprojection_error(&self) -> f64 {
        self.reprojection_error
    }

    /// 像素点 → 球场坐标
    pub fn project(&self, point: Point2) -> Option<Point2> {
        self.to_court.apply(point)
    }

    /// 球场坐标 → 像素点 (绘制/调试用)
    pub fn unproject(&self, court_point: Point2) -> Option<Point2> {
        self.to_pixel.apply(court_point)
    }

    /// 检测框锚点 → 球场坐标
    pub fn project_bbox_center(&self, bbox: &BBox, anchor: Anchor) -> Option<Point2> {
        self.project(anchor.point(bbox))
    }

    /// 球员位置 (脚下)
    pub fn project_player(&self, bbox: &BBox) -> Option<Point2> {
        self.project_bbox_center(bbox, Anchor::Foot)
    }

    /// 球位置 (中心)
    pub fn project_ball(&self, bbox: &BBox) -> Option<Point2> {
        self.project_bbox_center(bbox, Anchor::Center)
    }

    pub fn court_width_pixels(&self) -> f64 {
        self.model.court_width_pixels()
    }

    pub fn court_width_meters(&self) -> f64 {
        self.model.court_width_meters()
    }

    /// 球场坐标距离 → 米
    pub fn distance_meters(&self, a: &Point2, b: &Point2) -> f64 {
        self.model.units_to_meters(a.distance(b))
    }
}
