//! Matching of declared application names against live playback streams.

use crate::pactl::SinkInput;

/// Select every stream whose application name contains `declared`, ignoring case.
///
/// Substring rather than exact match, so "firefox" also catches
/// "Firefox Developer Edition" or a localized process title. Streams without
/// an application name never match.
pub fn match_streams<'a>(declared: &str, streams: &'a [SinkInput]) -> Vec<&'a SinkInput> {
    let needle = declared.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    streams.iter().filter(|s| !s.application_name.is_empty() && s.application_name.to_lowercase().contains(&needle)).collect()
}
