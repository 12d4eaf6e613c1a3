//! Wix media URL helpers.
//!
//! The eCommerce APIs return images as media URIs
//! (`wix:image://v1/<media-id>/<file-name>#originWidth=..`), while the
//! Stores Reader returns static URLs
//! (`https://static.wixstatic.com/media/<media-id>`). Both are rewritten to
//! CDN URLs that crop-and-scale to the requested size.

const STATIC_MEDIA_ROOT: &str = "https://static.wixstatic.com/media/";
const MEDIA_URI_PREFIX: &str = "wix:image://v1/";

/// Split a media reference into `(media_id, file_name)`.
fn parse(reference: &str) -> Option<(&str, &str)> {
    if let Some(rest) = reference.strip_prefix(MEDIA_URI_PREFIX) {
        let rest = rest.split('#').next().unwrap_or(rest);
        let mut parts = rest.splitn(2, '/');
        let id = parts.next().filter(|s| !s.is_empty())?;
        let name = parts.next().filter(|s| !s.is_empty()).unwrap_or(id);
        return Some((id, name));
    }

    let rest = reference.strip_prefix(STATIC_MEDIA_ROOT)?;
    let id = rest.split('/').next().filter(|s| !s.is_empty())?;
    Some((id, id))
}

/// Plain CDN URL for a media reference; unknown references pass through.
#[must_use]
pub fn static_url(reference: &str) -> String {
    parse(reference).map_or_else(
        || reference.to_string(),
        |(id, _)| format!("{STATIC_MEDIA_ROOT}{id}"),
    )
}

/// CDN URL that fills a `width`×`height` box, cropping from the centre.
///
/// References that are not Wix media are returned unchanged.
#[must_use]
pub fn scaled_to_fill(reference: &str, width: u32, height: u32) -> String {
    parse(reference).map_or_else(
        || reference.to_string(),
        |(id, name)| {
            format!("{STATIC_MEDIA_ROOT}{id}/v1/fill/w_{width},h_{height},al_c,q_80/{name}")
        },
    )
}
