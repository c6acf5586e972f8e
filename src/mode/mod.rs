pub mod controller;
pub mod cursor;
pub mod exclusion;
pub mod state;

pub use controller::{ClickOutcome, ModeController, SurfaceClick};
pub use cursor::DesiredCursor;
pub use exclusion::{ClickTarget, ExclusionSet, SurfaceTarget};
pub use state::{can_transition, InteractionMode};
