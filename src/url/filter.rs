/// File extensions that are never worth fetching
pub const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".webp", ".ico",
];

/// Returns true if the address ends in an image file extension
///
/// The match is case-insensitive and runs against the whole address string,
/// so `/logo.PNG` is excluded while `/logo.png?size=2` is not.
pub fn has_image_extension(address: &str) -> bool {
    let lower = address.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Returns true if a raw link may ever enter the frontier or visited registry
pub fn is_eligible(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.is_empty() || has_image_extension(raw) {
        return false;
    }

    match url::Url::parse(raw) {
        Ok(parsed) => parsed.scheme() == "http" || parsed.scheme() == "https",
        Err(_) => false,
    }
}
