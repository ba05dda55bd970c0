pub mod icons;
pub mod output;
pub mod progress;
pub mod progress_message;
pub mod table;
pub mod theme;

pub use icons::{scope_icon, Icons};
pub use output::{dim, error, header, info, location, muted, occurrence, success, warn};
pub use progress::ProgressManager;
pub use progress_message::ProgressMessage;
pub use table::{render, TableBuilder};
pub use theme::{theme, Theme};
