use std::path::Path;

use artpaint_filters::{
    BlurSettings, DitherAlgorithm, DitherOptions, EqualizeSettings, Manipulation, Palette,
    PaletteSettings, PaletteSource, TraceSettings,
};
use serde::Deserialize;

use crate::error::AppError;

/// Filter pipeline loaded from a YAML file
///
/// ```yaml
/// preview: false
/// steps:
///   - filter: blur
///     radius: 4
///   - filter: dither
///     algorithm: n-candidate
///     palette_size: 16
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Run every step in preview mode (box blur, no progress reporting)
    #[serde(default)]
    pub preview: bool,

    /// Manipulations applied in order
    pub steps: Vec<StepConfig>,
}

/// One pipeline step, selected by its `filter` key
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum StepConfig {
    Blur(BlurStep),
    Dither(DitherStep),
    Equalize(EqualizeStep),
    Trace(TraceStep),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BlurStep {
    pub radius: f32,
    pub fast: bool,
    pub threads: Option<usize>,
}

impl Default for BlurStep {
    fn default() -> Self {
        let settings = BlurSettings::default();
        Self {
            radius: settings.radius,
            fast: settings.fast,
            threads: settings.threads,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DitherStep {
    /// `nearest`, `floyd-steinberg`, `preserve-solids` or `n-candidate`
    pub algorithm: String,

    /// Fixed palette as hex colors; empty generates one from the image
    pub colors: Vec<String>,

    /// Entries to generate when `colors` is empty
    pub palette_size: usize,

    /// Seed for palette generation and N-candidate draws
    pub seed: u64,

    pub candidates: usize,
    pub edge_threshold: u32,
    pub max_iterations: usize,
}

impl Default for DitherStep {
    fn default() -> Self {
        let options = DitherOptions::default();
        Self {
            algorithm: options.algorithm.name().to_string(),
            colors: Vec::new(),
            palette_size: default_palette_size(),
            seed: options.seed,
            candidates: options.candidates,
            edge_threshold: options.edge_threshold,
            max_iterations: PaletteSettings::default().max_iterations,
        }
    }
}

fn default_palette_size() -> usize {
    16
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EqualizeStep {
    pub tile_size: u32,
    pub clip_limit: Option<u32>,
}

impl Default for EqualizeStep {
    fn default() -> Self {
        let settings = EqualizeSettings::default();
        Self {
            tile_size: settings.tile_size,
            clip_limit: settings.clip_limit,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TraceStep {
    /// Luminance a pixel needs to count as selected (ignored with a mask)
    pub threshold: u8,
    pub include_holes: bool,
    pub min_points: usize,
}

impl Default for TraceStep {
    fn default() -> Self {
        let settings = TraceSettings::default();
        Self {
            threshold: default_threshold(),
            include_holes: settings.include_holes,
            min_points: settings.min_points,
        }
    }
}

fn default_threshold() -> u8 {
    128
}

impl PipelineConfig {
    /// Parse a pipeline from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, AppError> {
        let config: Self = serde_yaml::from_str(content)?;
        if config.steps.is_empty() {
            return Err(AppError::Config("pipeline has no steps".to_string()));
        }
        tracing::debug!(steps = config.steps.len(), preview = config.preview, "Parsed pipeline");
        Ok(config)
    }

    /// Load a pipeline file
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        tracing::info!(path = %path.display(), steps = config.steps.len(), "Loaded pipeline");
        Ok(config)
    }

    /// Resolve every step into an engine manipulation
    pub fn manipulations(&self) -> Result<Vec<Manipulation>, AppError> {
        self.steps.iter().map(StepConfig::to_manipulation).collect()
    }
}

impl StepConfig {
    pub fn to_manipulation(&self) -> Result<Manipulation, AppError> {
        match self {
            StepConfig::Blur(step) => Ok(step.to_manipulation()),
            StepConfig::Dither(step) => step.to_manipulation(),
            StepConfig::Equalize(step) => Ok(step.to_manipulation()),
            StepConfig::Trace(step) => Ok(step.to_manipulation()),
        }
    }
}

impl BlurStep {
    pub fn to_manipulation(&self) -> Manipulation {
        let mut settings = BlurSettings::new(self.radius).fast(self.fast);
        if let Some(threads) = self.threads {
            settings = settings.threads(threads);
        }
        Manipulation::Blur(settings)
    }
}

impl DitherStep {
    pub fn to_manipulation(&self) -> Result<Manipulation, AppError> {
        let algorithm = self
            .algorithm
            .parse::<DitherAlgorithm>()
            .map_err(AppError::Config)?;
        let options = DitherOptions::new()
            .algorithm(algorithm)
            .candidates(self.candidates)
            .seed(self.seed)
            .edge_threshold(self.edge_threshold);

        let palette = if self.colors.is_empty() {
            PaletteSource::Generated {
                colors: self.palette_size,
                settings: PaletteSettings::new()
                    .seed(self.seed)
                    .max_iterations(self.max_iterations),
            }
        } else {
            let hex: Vec<&str> = self.colors.iter().map(String::as_str).collect();
            let palette = Palette::from_hex(&hex)
                .map_err(|e| AppError::Config(format!("invalid palette: {e}")))?;
            PaletteSource::Fixed(palette)
        };

        Ok(Manipulation::Dither { options, palette })
    }
}

impl EqualizeStep {
    pub fn to_manipulation(&self) -> Manipulation {
        Manipulation::Equalize(EqualizeSettings::new(self.tile_size).clip_limit(self.clip_limit))
    }
}

impl TraceStep {
    pub fn to_manipulation(&self) -> Manipulation {
        Manipulation::Trace {
            settings: TraceSettings::new()
                .include_holes(self.include_holes)
                .min_points(self.min_points),
            threshold: self.threshold,
        }
    }
}

/// Split a comma-separated color list (`"#000,#FFFFFF"`) into entries
pub fn parse_color_list(colors: &str) -> Vec<String> {
    colors
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_pipeline() {
        let yaml = r##"
preview: true
steps:
  - filter: blur
    radius: 4.5
    fast: true
  - filter: dither
    algorithm: n-candidate
    colors: ["#000", "#fff"]
    candidates: 2
  - filter: equalize
    tile_size: 32
    clip_limit: 40
  - filter: trace
    threshold: 10
    include_holes: false
"##;
        let config = PipelineConfig::from_yaml(yaml).unwrap();

        assert!(config.preview);
        assert_eq!(config.steps.len(), 4);
        assert_eq!(
            config.steps[0],
            StepConfig::Blur(BlurStep {
                radius: 4.5,
                fast: true,
                threads: None,
            })
        );
        match &config.steps[1] {
            StepConfig::Dither(step) => {
                assert_eq!(step.algorithm, "n-candidate");
                assert_eq!(step.colors, vec!["#000", "#fff"]);
                assert_eq!(step.candidates, 2);
                assert_eq!(step.palette_size, 16);
            }
            other => panic!("Expected dither step, got {other:?}"),
        }
        assert_eq!(
            config.steps[2],
            StepConfig::Equalize(EqualizeStep {
                tile_size: 32,
                clip_limit: Some(40),
            })
        );
        assert_eq!(
            config.steps[3],
            StepConfig::Trace(TraceStep {
                threshold: 10,
                include_holes: false,
                min_points: 1,
            })
        );
    }

    #[test]
    fn test_step_defaults() {
        let config = PipelineConfig::from_yaml("steps:\n  - filter: equalize\n").unwrap();

        assert!(!config.preview);
        assert_eq!(config.steps, vec![StepConfig::Equalize(EqualizeStep::default())]);
        assert_eq!(EqualizeStep::default().tile_size, 64);
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let err = PipelineConfig::from_yaml("steps: []\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_unknown_filter_rejected() {
        let err = PipelineConfig::from_yaml("steps:\n  - filter: sharpen\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_dither_without_colors_generates_palette() {
        let step = DitherStep {
            palette_size: 8,
            seed: 5,
            ..DitherStep::default()
        };
        match step.to_manipulation().unwrap() {
            Manipulation::Dither {
                options,
                palette: PaletteSource::Generated { colors, settings },
            } => {
                assert_eq!(options.algorithm, DitherAlgorithm::FloydSteinberg);
                assert_eq!(colors, 8);
                assert_eq!(settings.seed, 5);
            }
            other => panic!("Expected generated palette, got {other:?}"),
        }
    }

    #[test]
    fn test_dither_bad_algorithm() {
        let step = DitherStep {
            algorithm: "ordered".to_string(),
            ..DitherStep::default()
        };
        assert!(matches!(step.to_manipulation(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_dither_bad_color() {
        let step = DitherStep {
            colors: vec!["#12".to_string()],
            ..DitherStep::default()
        };
        assert!(matches!(step.to_manipulation(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_blur_step_threads() {
        let step = BlurStep {
            radius: 3.0,
            fast: false,
            threads: Some(2),
        };
        assert_eq!(
            step.to_manipulation(),
            Manipulation::Blur(BlurSettings::new(3.0).threads(2))
        );
    }

    #[test]
    fn test_parse_color_list() {
        assert_eq!(
            parse_color_list("#000, #FFFFFF,,ff0000 "),
            vec!["#000", "#FFFFFF", "ff0000"]
        );
        assert!(parse_color_list("").is_empty());
    }
}
