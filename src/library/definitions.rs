use std::time::Duration;

// Fingerprint definitions. Frames are resized to (HASH_SIZE + 1) x HASH_SIZE
// before the horizontal gradient is taken, giving HASH_SIZE * HASH_SIZE bits.
pub const HASH_SIZE: u32 = 8;

//At user-level the similarity threshold is a real in (0, 1]. A candidate whose similarity
//to the previous candidate is at least this value is dropped.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.98;

// Encoder definitions
pub const JPEG_QUALITY: u8 = 75;
pub const SAVE_INDEX_WIDTH: usize = 6;
pub const IMAGE_FILE_PREFIX: &str = "frame_";
pub const IMAGE_FILE_EXT: &str = "jpg";

// Concurrency definitions
pub const DEFAULT_ENCODE_WORKERS: usize = 4;
//each batch holds this many frames per encode worker.
pub const BATCH_FRAMES_PER_WORKER: usize = 2;

// Interactive input
pub const DEFAULT_FRAME_INTERVAL: u64 = 1;
pub const DEFAULT_PROMPT_TIMEOUT: Duration = Duration::from_secs(10);

// Input discovery
pub const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "avi", "mov", "mkv", "flv", "wmv"];
pub const DEFAULT_INPUT_DIR: &str = "input";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

pub const BYTES_PER_MB: f64 = (1024 * 1024) as f64;

pub fn image_file_name(save_index: u64) -> String {
    format!(
        "{}{:0width$}.{}",
        IMAGE_FILE_PREFIX,
        save_index,
        IMAGE_FILE_EXT,
        width = SAVE_INDEX_WIDTH
    )
}
