//! Shared key generation for storage tiers.
//!
//! Key format: source bytes under `videos/{video_id}/{filename}`, HLS
//! artifacts under `hls/{video_id}/{filename}`.

use uuid::Uuid;

/// Filename of the HLS manifest within a video's artifact namespace.
pub const HLS_PLAYLIST_NAME: &str = "playlist.m3u8";

/// Strip any path components from a client-supplied filename so it can be
/// embedded in a storage key.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        "video".to_string()
    } else {
        name.to_string()
    }
}

/// Storage key for a video's source bytes. All tiers use this format.
pub fn source_key(video_id: Uuid, filename: &str) -> String {
    format!("videos/{}/{}", video_id, sanitize_filename(filename))
}

/// Key prefix holding every HLS artifact of a video (trailing slash
/// included, suitable for prefix deletion).
pub fn hls_prefix(video_id: Uuid) -> String {
    format!("hls/{}/", video_id)
}

/// Storage key for one HLS artifact (manifest or segment).
pub fn hls_key(video_id: Uuid, filename: &str) -> String {
    format!("hls/{}/{}", video_id, sanitize_filename(filename))
}

/// Key of a video's HLS manifest.
pub fn hls_playlist_key(video_id: Uuid) -> String {
    hls_key(video_id, HLS_PLAYLIST_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_strips_paths() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("dir\\evil.mp4"), "evil.mp4");
        assert_eq!(sanitize_filename("  talk.mp4  "), "talk.mp4");
        assert_eq!(sanitize_filename(".."), "video");
        assert_eq!(sanitize_filename(""), "video");
    }

    #[test]
    fn test_key_layout() {
        let id = Uuid::new_v4();
        assert_eq!(
            source_key(id, "talk.mp4"),
            format!("videos/{}/talk.mp4", id)
        );
        assert_eq!(hls_prefix(id), format!("hls/{}/", id));
        assert_eq!(
            hls_playlist_key(id),
            format!("hls/{}/playlist.m3u8", id)
        );
    }
}
