/// Extensions of images, video, audio, archives and documents we never crawl
const MEDIA_EXTENSIONS: &[&str] = &[
    // images
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg", ".ico", ".tif", ".tiff",
    // video
    ".mp4", ".avi", ".mov", ".wmv", ".flv", ".mkv", ".webm",
    // audio
    ".mp3", ".ogg", ".wav", ".flac", ".m4a",
    // archives
    ".zip", ".rar", ".7z", ".tar", ".gz",
    // documents
    ".pdf",
];

/// Checks whether a URL path points at a media or binary file
///
/// The check is a case-insensitive suffix match on the path only, so query
/// strings and fragments never affect it.
///
/// # Examples
///
/// ```
/// use sumi_index::url::is_media_path;
///
/// assert!(is_media_path("/images/Logo.PNG"));
/// assert!(!is_media_path("/articles/png-format"));
/// ```
pub fn is_media_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    MEDIA_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
