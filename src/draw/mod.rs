pub mod assets;
pub mod compile;
pub mod composite;
pub mod generation;
pub mod geometry;
pub mod history;
pub mod input;
pub mod keyboard;
pub mod model;
pub mod preview;
pub mod render;
pub mod save;
pub mod session;
pub mod settings;
pub mod settings_store;
pub mod strokes;

pub use compile::{compile_request, plan_payload, CompileError, RequestPayload};
pub use geometry::{ScreenPoint, ViewTransform};
pub use input::{GestureDispatcher, GestureOutcome, PointerEvent};
pub use model::{Color, LayerKind, Point, Stroke, StrokeKind};
pub use session::AnnotationSession;
pub use settings::EngineSettings;
