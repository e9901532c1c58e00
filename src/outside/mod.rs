mod command;
mod ffmpeg;
mod ytdl;

pub use command::{FFMPEG, YT_DLP};
pub use ffmpeg::Ffmpeg;
pub use ytdl::{MediaExtractor, Ytdlp};
