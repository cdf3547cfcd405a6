//! Wire models for the catalog provider's token and search endpoints.

use serde::{Deserialize, Serialize};

/// Short-lived opaque bearer credential for catalog API calls.
///
/// Fetched fresh for every submission; never cached.
#[derive(Clone)]
pub struct AccessToken(pub String);

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log the credential itself
        write!(f, "AccessToken(..)")
    }
}

/// A recommendable track, with everything the result page needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub url: String,
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchResponse {
    pub tracks: Option<TracksPage>,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct TracksPage {
    #[serde(default)]
    pub items: Vec<TrackItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TrackItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistItem>,
    pub album: Option<AlbumItem>,
    pub external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ArtistItem {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct AlbumItem {
    #[serde(default)]
    pub images: Vec<ImageItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ImageItem {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ExternalUrls {
    pub spotify: Option<String>,
}

impl TrackItem {
    /// Map a catalog item to a renderable track. Items missing any field the
    /// result page needs (first artist, external link, first album image) are
    /// omitted rather than rendered half-empty.
    pub(super) fn into_track(self) -> Option<Track> {
        let artist = self.artists.into_iter().next()?.name;
        let url = self.external_urls?.spotify?;
        let image_url = self.album?.images.into_iter().next()?.url;
        Some(Track {
            id: self.id,
            name: self.name,
            artist,
            url,
            image_url,
        })
    }
}
