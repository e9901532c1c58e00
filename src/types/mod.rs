mod extension;
mod metadata;
mod progress;
mod request;
mod timestamp;

pub use extension::Extension;
pub use metadata::VideoMetadata;
pub use progress::{ProgressEvent, RawProgress, PROGRESS_TEMPLATE};
pub use request::{MediaKind, MediaRequest, RangeMode};
pub use timestamp::parse_time;
