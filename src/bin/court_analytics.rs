// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 网球场分析 (Court analytics)
//!
//! 输入: 逐帧检测缓存 (球员 / 球) + 首帧球场关键点
//! 输出: JSON 分析报告, 可选预览图
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tennis_analytics_rs::analytics::PlayerId;
use tennis_analytics_rs::court::KeypointSet;
use tennis_analytics_rs::detection::{read_stub, BBox, PlayerFrame};
use tennis_analytics_rs::pipeline::{AnalysisReport, CourtAnalyzer, VideoInput};
use tennis_analytics_rs::render::draw_frame_overlay;
use tennis_analytics_rs::{gen_time_string, AnalyticsConfig, Args};

/// 关键点文件: 点列表 或 扁平 [x0, y0, x1, y1, ...]
#[derive(Deserialize)]
#[serde(untagged)]
enum KeypointFile {
    Points(KeypointSet),
    Flat(Vec<f64>),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("failed to parse {}", path.display()))
}

fn read_detections<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    read_stub(path).with_context(|| format!("failed to load detection stub {}", path.display()))
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // ========== 配置 ==========
    let config = match &args.config {
        Some(path) => AnalyticsConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnalyticsConfig::default(),
    }
    .with_args(&args)?;
    info!(frame_rate = config.frame_rate, "court analytics starting");

    // ========== 输入 ==========
    let player_detections: Vec<PlayerFrame> = read_detections(&args.players)?;
    let ball_detections: Vec<Option<BBox>> = read_detections(&args.ball)?;
    let court_keypoints = match read_json::<KeypointFile>(&args.keypoints)? {
        KeypointFile::Points(set) => set,
        KeypointFile::Flat(values) => KeypointSet::from_flat(&values)?,
    };

    let preview = match &args.preview_frame {
        Some(path) => Some(
            image::open(path)
                .with_context(|| format!("failed to open preview frame {}", path.display()))?
                .to_rgb8(),
        ),
        None => None,
    };

    let input = VideoInput {
        frame_size: preview.as_ref().map(|img| img.dimensions()),
        player_detections,
        ball_detections,
        court_keypoints,
    };
    info!(frames = input.frame_count(), "detections loaded");

    // ========== 分析 ==========
    let analyzer = CourtAnalyzer::new(config.clone())?;
    let analysis = analyzer.analyze(&input).context("court analytics failed")?;
    for notice in &analysis.notices {
        warn!("{}", notice);
    }

    let report = AnalysisReport::new(&analysis);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("output/analysis_{}.json", gen_time_string("-"))));
    report.save(&output)?;

    if let Some(last) = analysis.stats.last() {
        for player in PlayerId::BOTH {
            let stats = last.player(player);
            info!(
                player = player.number(),
                track = analysis.context.players.track_of(player),
                shots = stats.shot_count,
                average_shot_speed = last.average_shot_speed(player).unwrap_or(0.0),
                average_player_speed = last.average_movement_speed(player).unwrap_or(0.0),
                "final statistics"
            );
        }
    }

    // ========== 预览 ==========
    if let Some(mut image) = preview {
        draw_frame_overlay(&mut image, args.preview_index, &analysis, &input.court_keypoints);
        if let Some(parent) = args.preview_output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        image
            .save(&args.preview_output)
            .with_context(|| format!("failed to save preview {}", args.preview_output.display()))?;
        info!(path = %args.preview_output.display(), "preview written");
    }

    info!(report = %output.display(), shots = analysis.shots.len(), "done");
    Ok(())
}
