pub mod icons;
pub mod output;
pub mod progress;
pub mod progress_message;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{header, info, section, status, success, timing, warn};
pub use progress::{ProgressManager, Spinner};
pub use progress_message::ProgressMessage;
pub use table::{TableBuilder, people_table};
pub use theme::{Theme, theme};
