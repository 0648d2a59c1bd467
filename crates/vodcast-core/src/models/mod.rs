pub mod video;

pub use video::{HlsStatus, StorageTier, VideoRecord};
