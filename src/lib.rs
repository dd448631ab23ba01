// Fog eraser core: a per-pixel fog mask over live video that the user
// scratches away with a circular brush, with undo.
//
// Data flow: input → brush → mask store (history snapshot on stroke start)
// → compositor reads the mask every frame.

pub mod brush;
#[cfg(feature = "camera")]
pub mod camera;
pub mod compositor;
pub mod config;
pub mod error;
pub mod geometry;
pub mod history;
pub mod input;
pub mod mask;
pub mod scheduler;
pub mod session;
pub mod surface;
pub mod types;
pub mod video;

pub use compositor::FrameOutcome;
pub use config::Config;
pub use error::Error;
pub use geometry::{DisplayGeometry, Viewport};
pub use session::{FogSession, InputResponse, PointerEvent, SessionState};
