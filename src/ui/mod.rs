pub mod log_line;
pub mod plain_renderer;
pub mod renderer;
pub mod theme;
pub mod widgets;

pub use plain_renderer::PlainRenderer;
pub use renderer::{Renderer, UiError, UiResult};
pub use theme::OutputMode;
pub use widgets::{MessageBlock, NoticeLevel, SessionSummary};
