// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 标准球场几何 (ITF doubles court) 与俯视小球场模型

use serde::{Deserialize, Serialize};

use super::keypoints::KEYPOINT_COUNT;
use crate::detection::Point2;
use crate::error::{AnalyticsError, AnalyticsResult};

/// 双打边线间宽度 (米)
pub const DOUBLE_LINE_WIDTH: f64 = 10.97;
/// 单打边线间宽度 (米)
pub const SINGLE_LINE_WIDTH: f64 = 8.23;
/// 底线到球网 (米)
pub const HALF_COURT_LINE_HEIGHT: f64 = 11.88;
/// 底线到发球线 (米)
pub const NO_MANS_LAND_HEIGHT: f64 = 5.48;

/// 真实球场尺寸 (米)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtGeometry {
    pub doubles_width: f64,
    pub singles_width: f64,
    pub half_court_length: f64,
    pub service_line_from_baseline: f64,
}

impl Default for CourtGeometry {
    fn default() -> Self {
        Self {
            doubles_width: DOUBLE_LINE_WIDTH,
            singles_width: SINGLE_LINE_WIDTH,
            half_court_length: HALF_COURT_LINE_HEIGHT,
            service_line_from_baseline: NO_MANS_LAND_HEIGHT,
        }
    }
}

impl CourtGeometry {
    pub fn validate(&self) -> AnalyticsResult<()> {
        let dims = [
            self.doubles_width,
            self.singles_width,
            self.half_court_length,
            self.service_line_from_baseline,
        ];
        if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(AnalyticsError::invalid_config("court dimensions must be positive"));
        }
        if self.singles_width >= self.doubles_width {
            return Err(AnalyticsError::invalid_config(
                "singles width must be narrower than doubles width",
            ));
        }
        if self.service_line_from_baseline >= self.half_court_length {
            return Err(AnalyticsError::invalid_config(
                "service line must lie between baseline and net",
            ));
        }
        Ok(())
    }

    /// 球场全长
    pub fn length(&self) -> f64 {
        self.half_court_length * 2.0
    }

    /// 双打边线与单打边线间距
    pub fn alley_width(&self) -> f64 {
        (self.doubles_width - self.singles_width) / 2.0
    }

    /// 14 个关键点的真实坐标 (米)
    ///
    /// 原点为远端双打左角, x 沿底线, y 指向近端底线
    pub fn reference_points(&self) -> [Point2; KEYPOINT_COUNT] {
        let w = self.doubles_width;
        let l = self.length();
        let alley = self.alley_width();
        let service = self.service_line_from_baseline;
        let mid = w / 2.0;

        [
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(0.0, l),
            Point2::new(w, l),
            Point2::new(alley, 0.0),
            Point2::new(alley, l),
            Point2::new(w - alley, 0.0),
            Point2::new(w - alley, l),
            Point2::new(alley, service),
            Point2::new(w - alley, service),
            Point2::new(alley, l - service),
            Point2::new(w - alley, l - service),
            Point2::new(mid, service),
            Point2::new(mid, l - service),
        ]
    }
}

/// 俯视小球场 (mini court): 球场坐标系
///
/// 球场坐标单位 = `width_units / doubles_width` 每米
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourtModel {
    geometry: CourtGeometry,
    width_units: f64,
}

impl CourtModel {
    pub fn new(geometry: CourtGeometry, width_units: f64) -> AnalyticsResult<Self> {
        geometry.validate()?;
        if !width_units.is_finite() || width_units <= 0.0 {
            return Err(AnalyticsError::invalid_config("mini court width must be positive"));
        }
        Ok(Self {
            geometry,
            width_units,
        })
    }

    pub fn geometry(&self) -> &CourtGeometry {
        &self.geometry
    }

    /// 小球场宽度 (球场坐标单位)
    pub fn court_width_pixels(&self) -> f64 {
        self.width_units
    }

    /// 小球场长度 (球场坐标单位)
    pub fn court_length_pixels(&self) -> f64 {
        self.meters_to_units(self.geometry.length())
    }

    /// 双打宽度 (米)
    pub fn court_width_meters(&self) -> f64 {
        self.geometry.doubles_width
    }

    pub fn units_to_meters(&self, units: f64) -> f64 {
        units * self.geometry.doubles_width / self.width_units
    }

    pub fn meters_to_units(&self, meters: f64) -> f64 {
        meters * self.width_units / self.geometry.doubles_width
    }

    /// 关键点在球场坐标系中的位置
    pub fn reference_points(&self) -> [Point2; KEYPOINT_COUNT] {
        self.geometry.reference_points().map(|p| {
            Point2::new(self.meters_to_units(p.x), self.meters_to_units(p.y))
        })
    }
}
