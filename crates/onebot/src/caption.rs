//! Outbound caption rendering.
//!
//! Rendering is pure: a notification (plus its list payload) becomes one
//! caption string. Sending is the delivery engine's job.

use onebridge_channels::{Error, Result};
use onebridge_common::{
    types::{MediaItem, Notification, TorrentContext, TorrentMeta},
    util::format_size,
};

/// Image attachment marker understood by OneBot peers.
fn image_marker(url: &str) -> String {
    format!("[CQ:image,url={url}]")
}

/// Ordered-line caption builder.
///
/// Lines join with `\n`; the trailer, when set, is appended to the rendered
/// text with no separating newline (list captions attach their link that
/// way).
#[derive(Debug, Default)]
struct Caption {
    lines: Vec<String>,
    trailer: Option<String>,
}

impl Caption {
    fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    fn opt_line(&mut self, line: Option<&str>) -> &mut Self {
        if let Some(line) = line {
            self.lines.push(line.to_string());
        }
        self
    }

    fn trailer(&mut self, trailer: impl Into<String>) -> &mut Self {
        self.trailer = Some(trailer.into());
        self
    }

    fn render(&self) -> String {
        let mut text = self.lines.join("\n");
        if let Some(trailer) = &self.trailer {
            text.push_str(trailer);
        }
        text
    }
}

/// Plain notification: attachment marker slot, title, optional body text,
/// optional link, each on its own line in that order. The marker slot
/// renders as an empty leading line when there is no image.
#[must_use]
pub fn plain_caption(notification: &Notification) -> String {
    let mut caption = Caption::default();
    caption
        .line(
            notification
                .image
                .as_deref()
                .map(image_marker)
                .unwrap_or_default(),
        )
        .line(notification.title.clone())
        .opt_line(notification.text.as_deref())
        .opt_line(notification.link.as_deref());
    caption.render()
}

/// Ranked media list: emphasized title, then per item an enumerated display
/// line, its category, and its rating when one is present. The first item
/// carrying an image contributes the attachment marker.
#[must_use]
pub fn media_list_caption(notification: &Notification, medias: &[MediaItem]) -> String {
    let mut caption = Caption::default();
    if let Some(image) = medias.iter().find_map(|m| m.image.as_deref()) {
        caption.line(image_marker(image));
    }
    caption.line(format!("*{}*", notification.title));
    for (index, media) in medias.iter().enumerate() {
        caption.line(format!("{}.{}", index + 1, media.title));
        caption.line(format!("Category: {}", media.category));
        if let Some(rating) = media.rating {
            caption.line(format!("Rating: {rating}"));
        }
    }
    if let Some(link) = notification.link.as_deref() {
        caption.trailer(link);
    }
    caption.render()
}

/// Ranked torrent list: emphasized title, then one enumerated line per
/// torrent linking its descriptor to the details page. An empty list is a
/// caller error, not a transient failure.
pub fn torrent_list_caption(
    notification: &Notification,
    torrents: &[TorrentContext],
) -> Result<String> {
    if torrents.is_empty() {
        return Err(Error::invalid_input("torrent list is empty"));
    }

    let mut caption = Caption::default();
    caption.line(format!("*{}*", notification.title));
    for (index, torrent) in torrents.iter().enumerate() {
        caption.line(format!(
            "{}.[{}] [{}]({}) {} {} {}↑",
            index + 1,
            torrent.site,
            descriptor(&torrent.meta),
            torrent.page_url,
            format_size(torrent.size),
            torrent.volume_factor,
            torrent.seeders,
        ));
    }
    if let Some(link) = notification.link.as_deref() {
        caption.trailer(link);
    }
    Ok(caption.render())
}

/// Assemble the parsed title tokens into one display descriptor, collapsing
/// internal whitespace and trimming the ends.
fn descriptor(meta: &TorrentMeta) -> String {
    let raw = format!(
        "{} {} {} {}",
        meta.season_episode, meta.resource_term, meta.video_term, meta.release_group
    );
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
