use crate::error::ExtractionError;
use crate::source::RawAnimationSet;

/// Public API: parse a raw animation set from JSON.
///
/// Shape:
/// `{ "animations": [{ "name", "duration", "tracks": [{ "name", "times", "values" }] }] }`
///
/// Notes:
/// - `duration` is in seconds.
/// - Track names are `"<node>.<property>"`; they are kept verbatim and
///   interpreted by the extractor.
/// - `source_id` always comes from the caller, overriding any id in the payload.
pub fn parse_raw_animation_set_json(
    source_id: &str,
    s: &str,
) -> Result<RawAnimationSet, ExtractionError> {
    let mut set: RawAnimationSet =
        serde_json::from_str(s).map_err(|e| ExtractionError::Parse {
            source_id: source_id.to_string(),
            reason: e.to_string(),
        })?;
    set.source_id = source_id.to_string();

    for anim in &set.animations {
        if !anim.duration.is_finite() || anim.duration < 0.0 {
            return Err(ExtractionError::Parse {
                source_id: source_id.to_string(),
                reason: format!("animation '{}' has invalid duration", anim.name),
            });
        }
    }
    Ok(set)
}
