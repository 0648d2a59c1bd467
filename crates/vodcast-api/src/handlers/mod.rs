pub mod health;
pub mod signed_url;
pub mod video_delete;
pub mod video_get;
pub mod video_hls;
pub mod video_stream;
pub mod video_upload;
