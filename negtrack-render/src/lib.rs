pub mod layout;
pub mod render;
pub mod scene;

pub use layout::{Layout, Region, Target};
pub use render::{FrameStats, SkiaRenderer, TextStyle, measure_text, render_text_pixmap, wrap_words};
pub use scene::Scene;
