// src/config.rs

use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DetectionChannel, SourceMode};

    const SAMPLE: &str = r#"
source:
  mode: still
  path: image.png
  display_delay_ms: 30
detection:
  channels: [gray, red]
  blur_sigma: 1.4
  canny_low: 50.0
  canny_high: 150.0
  min_area: 2000.0
  approx_epsilon_frac: 0.02
classify:
  red_hue_below: 40.0
  red_hue_above: 310.0
  blue_hue_min: 170.0
  blue_hue_max: 280.0
  sample_radius_divisor: 4.0
tracking:
  disappear_after: 20
animation:
  cadence: 1
  idle_start: 1
  idle_end: 3
  fight_start: 4
  fight_after: 50
composite:
  size_scale: 0.66
  chroma_green_min: 200
  chroma_red_max: 100
  chroma_blue_max: 100
finale:
  slant_correction: 0.92
  black_threshold: 12
sprites:
  dir: assets/
  red_prefix: red_
  blue_prefix: blue_
  frame_count: 7
  beam_file: beam.png
output:
  dir: output/
  save_frames: false
logging:
  level: info
"#;

    #[test]
    fn parses_full_config() {
        let config: Config = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(config.source.mode, SourceMode::Still);
        assert_eq!(
            config.detection.channels,
            vec![DetectionChannel::Gray, DetectionChannel::Red]
        );
        assert_eq!(config.tracking.disappear_after, 20);
        assert_eq!(config.animation.fight_after, 50);
        assert_eq!(config.sprites.frame_count, 7);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load("definitely/not/here.yaml").is_err());
    }
}
