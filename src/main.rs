// src/main.rs

mod compositor;
mod config;
mod contour_classification;
mod edge_extraction;
mod entity_tracker;
mod finale;
mod interface;
mod pipeline;
mod sprite_animator;
mod sprites;
mod types;

use anyhow::Result;
use image::DynamicImage;
use interface::{
    DirectoryPresenter, FrameSequenceSource, FrameSource, NullPresenter, Presenter,
    StillImageSource,
};
use pipeline::{Pipeline, PipelineStatus};
use sprites::SpriteLibrary;
use std::path::Path;
use tracing::{info, warn};
use types::{Config, SourceMode};

fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(config.logging.level.clone())
        .init();

    info!("🥋 Sprite duel starting");
    info!("✓ Configuration loaded from {}", config_path);

    let sprites = SpriteLibrary::load(&config.sprites);

    let source_path = Path::new(&config.source.path);
    let mut source: Box<dyn FrameSource> = match config.source.mode {
        SourceMode::Still => Box::new(StillImageSource::open(source_path)?),
        SourceMode::Sequence => Box::new(FrameSequenceSource::discover(source_path)?),
    };

    let mut presenter: Box<dyn Presenter> = if config.output.save_frames {
        Box::new(DirectoryPresenter::new(Path::new(&config.output.dir))?)
    } else {
        Box::new(NullPresenter)
    };

    let delay = config.source.display_delay_ms;
    let mut pipeline = Pipeline::new(&config, sprites);

    loop {
        let Some(mut frame) = source.next_frame()? else {
            info!("End of stream");
            break;
        };

        let outcome = pipeline.process_frame(&mut frame);

        if let Some(edges) = &outcome.edges {
            let edges_rgb = DynamicImage::ImageLuma8(edges.clone()).to_rgb8();
            presenter.show("edges", &edges_rgb, 0)?;
        }
        presenter.show("duel", &frame, delay)?;

        if outcome.status == PipelineStatus::Finished {
            info!("Finale rendered, freezing on the final pose");
            break;
        }
    }

    let stats = pipeline.stats();
    info!("========================================");
    info!("✓ Run complete");
    info!("  Frames processed: {}", stats.total_frames);
    if stats.skipped_frames > 0 {
        warn!("  Skipped (empty) frames: {}", stats.skipped_frames);
    }
    info!("  Markers classified: {}", stats.markers_classified);
    info!("  Frames with both fighters: {}", stats.frames_both_visible);
    info!(
        "  💥 Finale: {}",
        if stats.finale_rendered { "rendered" } else { "not reached" }
    );

    Ok(())
}
