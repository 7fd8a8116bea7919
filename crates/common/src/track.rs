use serde::{Deserialize, Serialize};

/// One track of a release, flattened from the metadata provider's
/// media/track/recording nesting into the shape stored on a catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Provider-assigned track identifier.
    pub id: String,

    /// Track title as printed on the release, when known.
    pub title: Option<String>,

    /// Track length in milliseconds, when known.
    pub length: Option<u32>,

    /// First release date of the underlying recording.
    pub first_release_date: String,

    /// Disambiguation comment from the recording.
    pub disambiguation: String,

    /// Title of the recording itself, which can differ from the track title.
    pub title_in_the_recording: Option<String>,

    /// Whether the recording is a video.
    pub video: bool,
}
