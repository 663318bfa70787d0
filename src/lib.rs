pub mod draw;
pub mod logging;

pub use draw::{AnnotationSession, EngineSettings};
