//! Command-line argument parsing.

use clap::Parser;

use crate::params::{RecordingConfig, SceneKind};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Sawcube")]
#[command(about = "Detune-driven rotating cube demo", long_about = None)]
pub struct Args {
    /// Scene variant: cube (default), triangle, point, noise
    #[arg(long, value_name = "SCENE", default_value = "cube")]
    pub scene: String,

    /// Override the oscillator voice count for the variant
    #[arg(long, value_name = "N")]
    pub voices: Option<usize>,

    /// Record frames and audio to disk (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,
}

impl Args {
    /// Parse scene variant from command-line arguments
    pub fn parse_scene(&self) -> SceneKind {
        match self.scene.to_lowercase().as_str() {
            "cube" => SceneKind::Cube,
            "triangle" => SceneKind::Triangle,
            "point" => SceneKind::Point,
            "noise" => SceneKind::Noise,
            other => {
                eprintln!("Warning: Unknown scene '{}', using cube", other);
                SceneKind::Cube
            }
        }
    }

    /// Voice count: explicit override or the variant's default
    pub fn voice_count(&self, scene: SceneKind) -> usize {
        self.voices.unwrap_or_else(|| scene.default_voices())
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> Option<RecordingConfig> {
        self.record.map(|duration| {
            let config = RecordingConfig::new(duration);

            // Create output directories
            std::fs::create_dir_all(config.frames_dir())
                .expect("Failed to create frames directory");
            std::fs::create_dir_all(&config.output_dir).expect("Failed to create output directory");

            config
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_parsing() {
        let mut args = Args {
            scene: "triangle".to_string(),
            voices: None,
            record: None,
        };
        assert_eq!(args.parse_scene(), SceneKind::Triangle);

        args.scene = "CUBE".to_string();
        assert_eq!(args.parse_scene(), SceneKind::Cube);

        args.scene = "noise".to_string();
        assert_eq!(args.parse_scene(), SceneKind::Noise);

        args.scene = "nonsense".to_string();
        assert_eq!(args.parse_scene(), SceneKind::Cube);
    }

    #[test]
    fn test_voice_count_override() {
        let args = Args {
            scene: "cube".to_string(),
            voices: Some(42),
            record: None,
        };
        assert_eq!(args.voice_count(SceneKind::Cube), 42);

        let args = Args {
            scene: "cube".to_string(),
            voices: None,
            record: None,
        };
        assert_eq!(args.voice_count(SceneKind::Cube), 100);
        assert_eq!(args.voice_count(SceneKind::Point), 20);
    }
}
