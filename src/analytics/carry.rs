// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 沿用上一已知值 (carry-forward) 的帧序列工具
//!
//! 轨迹插值、球员位置缺帧和统计表前向填充共用同一套实现。

/// 前向填充: 缺失帧沿用之前最近的已知值
///
/// 第一个已知值之前的缺失帧保持不变
pub fn forward_fill<T: Clone>(slots: &mut [Option<T>]) {
    let mut last: Option<T> = None;
    for slot in slots.iter_mut() {
        match slot {
            Some(value) => last = Some(value.clone()),
            None => *slot = last.clone(),
        }
    }
}

/// 后向填充: 缺失帧取之后最近的已知值
pub fn backward_fill<T: Clone>(slots: &mut [Option<T>]) {
    let mut next: Option<T> = None;
    for slot in slots.iter_mut().rev() {
        match slot {
            Some(value) => next = Some(value.clone()),
            None => *slot = next.clone(),
        }
    }
}

/// 两端保持最近已知值 (不外推)
pub fn hold_nearest<T: Clone>(slots: &mut [Option<T>]) {
    forward_fill(slots);
    backward_fill(slots);
}

/// 稀疏 (帧, 值) 列表展开为长度 `len` 的帧序列; 越界项忽略
pub fn scatter<T>(len: usize, entries: impl IntoIterator<Item = (usize, T)>) -> Vec<Option<T>> {
    let mut slots: Vec<Option<T>> = (0..len).map(|_| None).collect();
    for (frame, value) in entries {
        if let Some(slot) = slots.get_mut(frame) {
            *slot = Some(value);
        }
    }
    slots
}
