pub mod engine;
pub mod model;
pub mod overlay;
pub mod raster;
pub mod surface;
pub mod toolbar;

pub use engine::SketchEngine;
pub use model::{Color, DrawingState, SketchTool, StrokeStyle};
pub use overlay::{AttachOutcome, SurfaceLifecycle};
pub use surface::{decode_data_url, RasterSurface};
