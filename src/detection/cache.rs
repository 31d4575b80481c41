// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 检测结果缓存 (stub 文件)
//! Memoizes per-frame detector output to a JSON file so inference runs once per video.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AnalyticsError, AnalyticsResult};

/// 缓存格式版本
pub const STUB_VERSION: u32 = 1;

/// 磁盘上的缓存格式: 每帧一项, 与实时检测输出完全相同
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionStub<T> {
    pub version: u32,
    pub frames: Vec<T>,
}

impl<T> DetectionStub<T> {
    pub fn new(frames: Vec<T>) -> Self {
        Self {
            version: STUB_VERSION,
            frames,
        }
    }

    /// 取出逐帧结果; 版本不同则拒绝
    pub fn into_frames(self) -> AnalyticsResult<Vec<T>> {
        if self.version != STUB_VERSION {
            return Err(AnalyticsError::StubVersionMismatch {
                found: self.version,
                expected: STUB_VERSION,
            });
        }
        Ok(self.frames)
    }
}

/// 读取缓存文件并校验版本
pub fn read_stub<T: DeserializeOwned>(path: impl AsRef<Path>) -> AnalyticsResult<Vec<T>> {
    let json = fs::read_to_string(path)?;
    let stub: DetectionStub<T> = serde_json::from_str(&json)?;
    stub.into_frames()
}

#[derive(Serialize)]
struct StubRef<'a, T> {
    version: u32,
    frames: &'a [T],
}

/// 缓存文件句柄
#[derive(Debug, Clone)]
pub struct StubCache {
    path: PathBuf,
    read_from_stub: bool,
}

impl StubCache {
    /// - `path`: 缓存文件路径
    /// - `read_from_stub`: false 时总是重新检测并覆盖缓存
    pub fn new(path: impl Into<PathBuf>, read_from_stub: bool) -> Self {
        Self {
            path: path.into(),
            read_from_stub,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取缓存; 禁用读取、文件不存在或版本不同时返回 None
    pub fn load<T: DeserializeOwned>(&self) -> AnalyticsResult<Option<Vec<T>>> {
        if !self.read_from_stub || !self.path.exists() {
            return Ok(None);
        }
        match read_stub(&self.path) {
            Ok(frames) => Ok(Some(frames)),
            Err(AnalyticsError::StubVersionMismatch { found, .. }) => {
                warn!(path = %self.path.display(), version = found, "stub version mismatch, ignoring cache");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// 写入缓存 (自动创建父目录)
    pub fn store<T: Serialize>(&self, frames: &[T]) -> AnalyticsResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let stub = StubRef {
            version: STUB_VERSION,
            frames,
        };
        fs::write(&self.path, serde_json::to_string(&stub)?)?;
        debug!(path = %self.path.display(), frames = frames.len(), "stub written");
        Ok(())
    }

    /// 命中缓存直接返回; 否则调用 `compute` 并写入缓存
    ///
    /// 缓存帧数与 `expected_frames` 不一致时视为过期
    pub fn get_or_compute<T, F>(&self, expected_frames: usize, compute: F) -> anyhow::Result<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> anyhow::Result<Vec<T>>,
    {
        match self.load::<T>() {
            Ok(Some(frames)) if frames.len() == expected_frames => {
                info!(path = %self.path.display(), frames = frames.len(), "detection stub hit");
                return Ok(frames);
            }
            Ok(Some(frames)) => warn!(
                path = %self.path.display(),
                cached = frames.len(),
                expected = expected_frames,
                "stale detection stub, recomputing"
            ),
            Ok(None) => debug!(path = %self.path.display(), "detection stub miss"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "unreadable detection stub, recomputing"),
        }

        let frames = compute()?;
        self.store(&frames)?;
        Ok(frames)
    }
}
