use xml::attribute::OwnedAttribute;
use xml::reader::{ParserConfig, XmlEvent};

use super::Snippet;
use crate::{FetchResult, TranscriptError};

const ROOT_ELEMENT: &str = "transcript";
const CUE_ELEMENT: &str = "text";

/// A `<text>` cue whose closing tag has not been reached yet
struct PendingCue {
    start: f64,
    duration: f64,
    text: String,
}

impl PendingCue {
    fn from_attributes(attributes: &[OwnedAttribute]) -> FetchResult<Self> {
        let attribute = |name: &str| {
            attributes
                .iter()
                .find(|attr| attr.name.local_name == name)
                .map(|attr| attr.value.as_str())
        };

        let start = match attribute("start") {
            Some(raw) => parse_seconds("start", raw)?,
            None => {
                return Err(TranscriptError::TranscriptDecode(
                    "cue without a start attribute".to_string(),
                ))
            }
        };
        let duration = attribute("dur")
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_seconds("dur", raw))
            .transpose()?
            .unwrap_or(0.0);

        Ok(Self {
            start,
            duration,
            text: String::new(),
        })
    }

    fn finish(self) -> Snippet {
        Snippet {
            text: self.text,
            start: self.start,
            duration: self.duration,
        }
    }
}

fn parse_seconds(attribute: &str, raw: &str) -> FetchResult<f64> {
    match raw.trim().parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds),
        _ => Err(TranscriptError::TranscriptDecode(format!(
            "invalid {} attribute: {:?}",
            attribute, raw
        ))),
    }
}

/// Decode a timed-text document into snippets, in document order.
///
/// Only `<text>` children of a `<transcript>` root count as cues. A body with no root, a
/// different root, or no cues yields no snippets; a malformed document is an error. Cue text
/// is kept verbatim apart from XML entity decoding.
pub fn decode_timed_text(body: &str) -> FetchResult<Vec<Snippet>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let reader = ParserConfig::new()
        .trim_whitespace(false)
        .whitespace_to_characters(true)
        .cdata_to_characters(true)
        .ignore_comments(true)
        .create_reader(body.as_bytes());

    let mut snippets = Vec::new();
    let mut depth = 0usize;
    let mut in_transcript = false;
    let mut cue: Option<PendingCue> = None;

    for event in reader {
        let event = event.map_err(|e| TranscriptError::TranscriptDecode(e.to_string()))?;

        match event {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                depth += 1;
                if depth == 1 {
                    in_transcript = name.local_name == ROOT_ELEMENT;
                } else if depth == 2 && in_transcript && name.local_name == CUE_ELEMENT {
                    cue = Some(PendingCue::from_attributes(&attributes)?);
                }
            }
            XmlEvent::Characters(text) => {
                if let Some(cue) = cue.as_mut() {
                    cue.text.push_str(&text);
                }
            }
            XmlEvent::EndElement { .. } => {
                if depth == 2 {
                    if let Some(done) = cue.take() {
                        snippets.push(done.finish());
                    }
                }
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    Ok(snippets)
}
