pub mod config;
pub mod trace;

pub use config::{
    parse_color_list, BlurStep, DitherStep, EqualizeStep, PipelineConfig, StepConfig, TraceStep,
};
pub use trace::{TraceReport, TracedPolygon};
