use serde::{Deserialize, Serialize};

use common::Track;

/// A MusicBrainz release, as returned by the lookup endpoint with
/// `inc=recordings`.
///
/// Only the fields the catalog needs are modeled; everything else in the
/// provider's response is ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub media: Vec<Media>,
}

/// One medium of a release (a disc, a cassette side, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub tracks: Vec<MediaTrack>,
}

/// One track as printed on a medium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaTrack {
    pub id: String,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub length: Option<u32>,
    pub recording: Recording,
}

/// The recording behind a track; titles can differ between the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub disambiguation: String,
    #[serde(rename = "first-release-date", default)]
    pub first_release_date: String,
    #[serde(default)]
    pub video: bool,
}

impl Release {
    /// Flattens the media/track/recording nesting into the track list stored
    /// on a catalog record, in medium order.
    pub fn track_list(&self) -> Vec<Track> {
        self.media
            .iter()
            .flat_map(|medium| &medium.tracks)
            .map(|track| Track {
                id: track.id.clone(),
                title: track.title.clone(),
                length: track.length,
                first_release_date: track.recording.first_release_date.clone(),
                disambiguation: track.recording.disambiguation.clone(),
                title_in_the_recording: track.recording.title.clone(),
                video: track.recording.video,
            })
            .collect()
    }
}
