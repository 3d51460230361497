use url::Url;

use super::error::StorageError;

/// Extract the store identifier from a public media URL.
///
/// The identifier is the path after the first `v<digits>` segment with the
/// extension of the last segment removed. Query strings and fragments never
/// take part. Returns `None` when the URL does not parse or has no version
/// segment; callers treat that as "nothing to clean up".
pub fn identifier_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segments: Vec<&str> = parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();

    let version_at = segments.iter().position(|s| is_version_segment(s))?;
    let (last, dirs) = segments[version_at + 1..].split_last()?;

    let stem = strip_extension(last);
    if stem.is_empty() {
        return None;
    }

    let mut identifier = dirs.join("/");
    if !identifier.is_empty() {
        identifier.push('/');
    }
    identifier.push_str(stem);
    Some(identifier)
}

/// Build the public URL for a stored blob.
pub fn media_url(base_url: &str, version: i64, identifier: &str, extension: Option<&str>) -> String {
    let base = base_url.trim_end_matches('/');
    match extension {
        Some(ext) => format!("{base}/v{version}/{identifier}.{ext}"),
        None => format!("{base}/v{version}/{identifier}"),
    }
}

/// Pick the file extension for an upload, from its file name first and its
/// content type second.
pub fn upload_extension(file_name: &str, content_type: Option<&str>) -> Option<String> {
    let from_name = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name.or_else(|| {
        content_type
            .and_then(mime_guess::get_mime_extensions_str)
            .and_then(|exts| exts.first())
            .map(|ext| ext.to_string())
    })
}

/// Check that a folder hint or identifier is a relative path made of plain
/// segments (`[A-Za-z0-9_-]`, no `..`).
pub fn validate_relative_path(path: &str) -> Result<(), StorageError> {
    if path.is_empty() {
        return Err(StorageError::InvalidPath("path is empty".into()));
    }
    for segment in path.split('/') {
        let plain = !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !plain {
            return Err(StorageError::InvalidPath(format!(
                "'{path}' contains an invalid segment"
            )));
        }
    }
    Ok(())
}

fn is_version_segment(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].bytes().all(|b| b.is_ascii_digit())
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}
