// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 球员筛选 (Player selection)
//!
//! 首帧中离球场关键点最近的两个 "person" 轨迹即为球员,
//! 球童、裁判、观众通常离球场更远。选择结果在整段视频中固定。

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::court::KeypointSet;
use crate::detection::{PlayerFrame, TrackId};
use crate::error::{AnalyticsError, AnalyticsResult};

/// 球员编号 (1 / 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const BOTH: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    pub fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }

    /// 对外编号 1 / 2
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn opponent(self) -> PlayerId {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }
}

/// 选定的两个球员轨迹ID; 较小的跟踪ID为 1 号球员
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedPlayers {
    tracks: [TrackId; 2],
}

impl SelectedPlayers {
    pub fn new(a: TrackId, b: TrackId) -> Self {
        Self {
            tracks: [a.min(b), a.max(b)],
        }
    }

    pub fn track_of(&self, player: PlayerId) -> TrackId {
        self.tracks[player.index()]
    }

    pub fn player_of(&self, track: TrackId) -> Option<PlayerId> {
        PlayerId::BOTH
            .into_iter()
            .find(|p| self.tracks[p.index()] == track)
    }

    pub fn track_ids(&self) -> [TrackId; 2] {
        self.tracks
    }

    /// 只保留两个球员的检测
    pub fn filter_frame(&self, frame: &PlayerFrame) -> PlayerFrame {
        frame
            .iter()
            .filter(|(track, _)| self.tracks.contains(*track))
            .map(|(track, bbox)| (*track, *bbox))
            .collect()
    }
}

/// 球员筛选器
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerSelector;

impl PlayerSelector {
    /// 从首帧选择两个球员
    ///
    /// 按检测框中心到最近关键点的距离升序, 距离相同时跟踪ID小者优先
    pub fn choose(
        &self,
        keypoints: &KeypointSet,
        first_frame: &PlayerFrame,
    ) -> AnalyticsResult<SelectedPlayers> {
        if first_frame.len() < 2 {
            return Err(AnalyticsError::InsufficientPlayers {
                found: first_frame.len(),
            });
        }

        let mut ranked: Vec<(TrackId, f64)> = first_frame
            .iter()
            .map(|(track, bbox)| (*track, keypoints.min_distance(&bbox.center())))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        for (track, distance) in &ranked {
            debug!(track, distance, "player candidate");
        }

        let selected = SelectedPlayers::new(ranked[0].0, ranked[1].0);
        info!(
            player_1 = selected.track_of(PlayerId::One),
            player_2 = selected.track_of(PlayerId::Two),
            candidates = ranked.len(),
            "players selected"
        );
        Ok(selected)
    }

    /// 首帧选择球员并过滤所有帧
    pub fn choose_and_filter(
        &self,
        keypoints: &KeypointSet,
        detections: &[PlayerFrame],
    ) -> AnalyticsResult<(SelectedPlayers, Vec<PlayerFrame>)> {
        let first = detections.first().ok_or(AnalyticsError::EmptyVideo)?;
        let selected = self.choose(keypoints, first)?;
        let filtered = detections
            .iter()
            .map(|frame| selected.filter_frame(frame))
            .collect();
        Ok((selected, filtered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::court::KEYPOINT_COUNT;
    use crate::detection::{BBox, Point2};

    fn keypoints() -> KeypointSet {
        // 关键点集中在 (100..230, 100) 一条线附近
        KeypointSet::from_points(
            (0..KEYPOINT_COUNT)
                .map(|i| Point2::new(100.0 + 10.0 * i as f64, 100.0 + (i % 2) as f64))
                .collect(),
        )
        .unwrap()
    }

    fn boxed(cx: f64, cy: f64) -> BBox {
        BBox::new(cx - 5.0, cy - 10.0, cx + 5.0, cy + 10.0).unwrap()
    }

    #[test]
    fn test_nearest_tracks_are_players() {
        let mut frame = PlayerFrame::new();
        frame.insert(9, boxed(150.0, 110.0)); // 球员
        frame.insert(3, boxed(600.0, 600.0)); // 观众
        frame.insert(5, boxed(200.0, 95.0)); // 球员
        frame.insert(1, boxed(20.0, 400.0)); // 球童

        let selected = PlayerSelector.choose(&keypoints(), &frame).unwrap();
        assert_eq!(selected.track_ids(), [5, 9]);
        assert_eq!(selected.player_of(5), Some(PlayerId::One));
        assert_eq!(selected.player_of(9), Some(PlayerId::Two));
        assert_eq!(selected.player_of(3), None);
    }

    #[test]
    fn test_ties_prefer_lower_track_id() {
        let mut frame = PlayerFrame::new();
        frame.insert(8, boxed(150.0, 120.0));
        frame.insert(4, boxed(150.0, 120.0));
        frame.insert(6, boxed(150.0, 120.0));

        let selected = PlayerSelector.choose(&keypoints(), &frame).unwrap();
        assert_eq!(selected.track_ids(), [4, 6]);
    }

    #[test]
    fn test_single_person_is_insufficient() {
        let mut frame = PlayerFrame::new();
        frame.insert(1, boxed(150.0, 110.0));
        let err = PlayerSelector.choose(&keypoints(), &frame).unwrap_err();
        assert!(matches!(err, AnalyticsError::InsufficientPlayers { found: 1 }));
    }

    #[test]
    fn test_every_frame_is_subset_of_players() {
        let mut first = PlayerFrame::new();
        first.insert(1, boxed(150.0, 110.0));
        first.insert(2, boxed(160.0, 110.0));
        first.insert(3, boxed(900.0, 900.0));
        let mut later = PlayerFrame::new();
        later.insert(2, boxed(170.0, 110.0));
        later.insert(3, boxed(150.0, 110.0));
        later.insert(11, boxed(150.0, 110.0));

        let (selected, filtered) = PlayerSelector
            .choose_and_filter(&keypoints(), &[first, later])
            .unwrap();
        for frame in &filtered {
            assert!(frame.keys().all(|t| selected.track_ids().contains(t)));
        }
        assert_eq!(filtered[1].len(), 1);
        assert!(filtered[1].contains_key(&2));
    }

    #[test]
    fn test_player_numbers() {
        assert_eq!(PlayerId::One.number(), 1);
        assert_eq!(PlayerId::Two.opponent(), PlayerId::One);
    }
}
