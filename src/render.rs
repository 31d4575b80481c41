// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 预览叠加绘制 (Overlay rendering)
//!
//! 在视频帧上绘制球员框、球框、球场关键点, 并在右上角绘制俯视小球场。
//! 只用于预览, 不参与分析。

use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect;

use crate::analytics::PlayerId;
use crate::court::{CourtKeypoint, CourtModel, KeypointSet};
use crate::detection::{BBox, Point2, TrackId};
use crate::pipeline::VideoAnalysis;

const BALL_COLOR: Rgb<u8> = Rgb([255, 230, 0]);
const KEYPOINT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const PANEL_COLOR: Rgb<u8> = Rgb([245, 245, 245]);
const LINE_COLOR: Rgb<u8> = Rgb([20, 20, 20]);
const NET_COLOR: Rgb<u8> = Rgb([0, 90, 200]);

/// 小球场面板外边距 / 内边距 (像素)
const PANEL_MARGIN: i32 = 20;
const PANEL_PADDING: i32 = 15;

/// 小球场上的线段 (关键点索引对)
const COURT_LINES: [(CourtKeypoint, CourtKeypoint); 9] = [
    (CourtKeypoint::FarDoublesLeft, CourtKeypoint::FarDoublesRight),
    (CourtKeypoint::NearDoublesLeft, CourtKeypoint::NearDoublesRight),
    (CourtKeypoint::FarDoublesLeft, CourtKeypoint::NearDoublesLeft),
    (CourtKeypoint::FarDoublesRight, CourtKeypoint::NearDoublesRight),
    (CourtKeypoint::FarSinglesLeft, CourtKeypoint::NearSinglesLeft),
    (CourtKeypoint::FarSinglesRight, CourtKeypoint::NearSinglesRight),
    (CourtKeypoint::FarServiceLeft, CourtKeypoint::FarServiceRight),
    (CourtKeypoint::NearServiceLeft, CourtKeypoint::NearServiceRight),
    (CourtKeypoint::FarCenterService, CourtKeypoint::NearCenterService),
];

/// 根据跟踪ID生成不同颜色
pub fn track_color(id: TrackId) -> Rgb<u8> {
    let hue = (id as f32 * 137.508) % 360.0; // 黄金角度采样
    let (r, g, b) = hsv_to_rgb(hue, 0.8, 0.9);
    Rgb([r, g, b])
}

/// HSV转RGB
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h as u32 {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}

fn bbox_rect(bbox: &BBox) -> Rect {
    Rect::at(bbox.x1.round() as i32, bbox.y1.round() as i32).of_size(
        (bbox.width().round() as u32).max(1),
        (bbox.height().round() as u32).max(1),
    )
}

fn to_pixel(p: Point2) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

// ========== 视频帧叠加 ==========

/// 绘制球员框和球框
pub fn draw_detections(image: &mut RgbImage, players: &[(TrackId, BBox)], ball: Option<&BBox>) {
    for (track, bbox) in players {
        let color = track_color(*track);
        draw_hollow_rect_mut(image, bbox_rect(bbox), color);
        // 加粗一像素
        let inner = BBox {
            x1: bbox.x1 + 1.0,
            y1: bbox.y1 + 1.0,
            x2: bbox.x2 - 1.0,
            y2: bbox.y2 - 1.0,
        };
        if inner.is_valid() {
            draw_hollow_rect_mut(image, bbox_rect(&inner), color);
        }
    }
    if let Some(ball) = ball {
        draw_hollow_rect_mut(image, bbox_rect(ball), BALL_COLOR);
    }
}

/// 绘制球场关键点
pub fn draw_keypoints(image: &mut RgbImage, keypoints: &KeypointSet) {
    for point in keypoints.points() {
        draw_filled_circle_mut(image, to_pixel(*point), 4, KEYPOINT_COLOR);
    }
}

// ========== 小球场面板 ==========

/// 俯视小球场: 球场坐标 → 面板像素
#[derive(Debug, Clone, Copy)]
pub struct MiniCourtPanel {
    model: CourtModel,
    origin: (i32, i32),
}

impl MiniCourtPanel {
    /// 放在图像右上角
    pub fn top_right(model: CourtModel, image_width: u32) -> Self {
        let panel_width = model.court_width_pixels().round() as i32 + 2 * PANEL_PADDING;
        Self {
            model,
            origin: (image_width as i32 - PANEL_MARGIN - panel_width, PANEL_MARGIN),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        let w = self.model.court_width_pixels().round() as i32 + 2 * PANEL_PADDING;
        let h = self.model.court_length_pixels().round() as i32 + 2 * PANEL_PADDING;
        (w.max(1) as u32, h.max(1) as u32)
    }

    /// 球场坐标 → 图像像素
    pub fn to_image(&self, court: Point2) -> Point2 {
        Point2::new(
            self.origin.0 as f64 + PANEL_PADDING as f64 + court.x,
            self.origin.1 as f64 + PANEL_PADDING as f64 + court.y,
        )
    }

    /// 面板背景 + 球场线 + 球网
    pub fn draw_court(&self, image: &mut RgbImage) {
        let (w, h) = self.size();
        draw_filled_rect_mut(image, Rect::at(self.origin.0, self.origin.1).of_size(w, h), PANEL_COLOR);

        let reference = self.model.reference_points();
        for (a, b) in COURT_LINES {
            let p = self.to_image(reference[a.index()]);
            let q = self.to_image(reference[b.index()]);
            draw_line_segment_mut(image, (p.x as f32, p.y as f32), (q.x as f32, q.y as f32), LINE_COLOR);
        }

        let net_y = self.model.court_length_pixels() / 2.0;
        let left = self.to_image(Point2::new(0.0, net_y));
        let right = self.to_image(Point2::new(self.model.court_width_pixels(), net_y));
        draw_line_segment_mut(
            image,
            (left.x as f32, left.y as f32),
            (right.x as f32, right.y as f32),
            NET_COLOR,
        );
    }

    /// 球场坐标上的标记点
    pub fn draw_marker(&self, image: &mut RgbImage, court: Point2, radius: i32, color: Rgb<u8>) {
        draw_filled_circle_mut(image, to_pixel(self.to_image(court)), radius, color);
    }
}

/// 绘制某一帧的完整预览
pub fn draw_frame_overlay(
    image: &mut RgbImage,
    frame: usize,
    analysis: &VideoAnalysis,
    keypoints: &KeypointSet,
) {
    let players: Vec<(TrackId, BBox)> = analysis
        .player_detections
        .get(frame)
        .map(|f| f.iter().map(|(t, b)| (*t, *b)).collect())
        .unwrap_or_default();
    draw_detections(image, &players, analysis.ball_trajectory.get(frame));
    draw_keypoints(image, keypoints);

    // 检测框是视频帧坐标, 面板也按视频帧宽度定位
    let frame_width = analysis.frame_size.map_or(image.width(), |(width, _)| width);
    let panel = MiniCourtPanel::top_right(*analysis.context.projector.model(), frame_width);
    panel.draw_court(image);
    for player in PlayerId::BOTH {
        if let Some(pos) = analysis.player_positions(player).get(frame) {
            let color = track_color(analysis.context.players.track_of(player));
            panel.draw_marker(image, *pos, 5, color);
        }
    }
    if let Some(ball) = analysis.ball_positions.get(frame) {
        panel.draw_marker(image, *ball, 3, BALL_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyticsConfig;
    use crate::court::projector::tests::broadcast_keypoints;
    use crate::court::CourtGeometry;
    use crate::detection::PlayerFrame;
    use crate::pipeline::{CourtAnalyzer, VideoInput};

    #[test]
    fn test_track_colors_differ() {
        assert_ne!(track_color(1), track_color(2));
    }

    #[test]
    fn test_player_box_is_drawn() {
        let mut image = RgbImage::new(200, 200);
        let bbox = BBox::new(50.0, 60.0, 90.0, 140.0).unwrap();
        draw_detections(&mut image, &[(3, bbox)], None);
        assert_eq!(*image.get_pixel(50, 100), track_color(3));
        assert_eq!(*image.get_pixel(70, 100), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_panel_maps_court_origin_inside_panel() {
        let model = CourtModel::new(CourtGeometry::default(), 250.0).unwrap();
        let panel = MiniCourtPanel::top_right(model, 1280);
        let (w, _) = panel.size();
        let origin = panel.to_image(Point2::new(0.0, 0.0));
        assert!(origin.x > 1280.0 - w as f64 - PANEL_MARGIN as f64);
        assert!(origin.x < 1280.0);

        let mut image = RgbImage::new(1280, 720);
        panel.draw_court(&mut image);
        // 面板左上角是背景色
        let corner = (1280 - PANEL_MARGIN as u32 - w + 2, PANEL_MARGIN as u32 + 2);
        assert_eq!(*image.get_pixel(corner.0, corner.1), PANEL_COLOR);
    }

    #[test]
    fn test_overlay_panel_follows_frame_size() {
        let keypoints = broadcast_keypoints();
        let far = keypoints.points()[0];
        let near = keypoints.points()[3];
        let mut frame = PlayerFrame::new();
        frame.insert(1, BBox::new(far.x - 10.0, far.y - 40.0, far.x + 10.0, far.y).unwrap());
        frame.insert(2, BBox::new(near.x - 10.0, near.y - 40.0, near.x + 10.0, near.y).unwrap());
        let input = VideoInput {
            frame_size: Some((1280, 720)),
            player_detections: vec![frame; 4],
            ball_detections: vec![None; 4],
            court_keypoints: keypoints,
        };
        let analysis = CourtAnalyzer::new(AnalyticsConfig::default())
            .unwrap()
            .analyze(&input)
            .unwrap();

        // 预览图比视频帧宽: 面板仍贴着视频帧右边缘
        let mut image = RgbImage::new(1600, 900);
        draw_frame_overlay(&mut image, 0, &analysis, &input.court_keypoints);
        let top = PANEL_MARGIN as u32 + 2;
        assert_eq!(*image.get_pixel(1280 - PANEL_MARGIN as u32 - 2, top), PANEL_COLOR);
        assert_eq!(*image.get_pixel(1600 - PANEL_MARGIN as u32 - 2, top), Rgb([0, 0, 0]));
    }
}
