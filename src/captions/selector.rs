use super::{CaptionCatalog, CaptionTrack};
use crate::{FetchResult, TranscriptError};

/// Pick exactly one track from the catalog.
///
/// With preferences, the first requested code that any track carries wins, and within that
/// code the first track in catalog order. Without preferences, the first human-authored track
/// wins, falling back to the first track of any kind.
pub fn select_track<'a, S: AsRef<str>>(
    catalog: &'a CaptionCatalog,
    preferred_codes: &[S],
) -> FetchResult<&'a CaptionTrack> {
    if !preferred_codes.is_empty() {
        return preferred_codes
            .iter()
            .find_map(|code| {
                catalog
                    .iter()
                    .find(|track| track.language_code == code.as_ref())
            })
            .ok_or_else(|| TranscriptError::NoMatchingTrack {
                requested: preferred_codes
                    .iter()
                    .map(|code| code.as_ref().to_string())
                    .collect(),
            });
    }

    catalog
        .iter()
        .find(|track| !track.is_generated)
        .or_else(|| catalog.tracks().first())
        .ok_or_else(|| TranscriptError::TranscriptsDisabled {
            video_id: catalog.video_id().to_string(),
        })
}
