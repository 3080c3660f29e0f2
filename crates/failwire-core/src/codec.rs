//! Body encoding and content negotiation.

use failwire_model::ErrorBody;

use crate::error::PipelineError;
use crate::Result;

/// Content type of [`JsonCodec`] output.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Encodes an [`ErrorBody`] for the wire.
pub trait Codec: Send + Sync {
    /// The content type written alongside the body.
    fn content_type(&self) -> &str;

    /// Encode `body`.
    fn encode(&self, body: &ErrorBody) -> Result<Vec<u8>>;
}

/// JSON through `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &str {
        JSON_CONTENT_TYPE
    }

    fn encode(&self, body: &ErrorBody) -> Result<Vec<u8>> {
        serde_json::to_vec(body).map_err(|e| PipelineError::Codec {
            content_type: JSON_CONTENT_TYPE.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Registered codecs, in registration order.
///
/// Always holds at least one codec; JSON is registered first.
pub struct Codecs {
    codecs: Vec<Box<dyn Codec>>,
}

impl Default for Codecs {
    fn default() -> Self {
        Self {
            codecs: vec![Box::new(JsonCodec)],
        }
    }
}

impl std::fmt::Debug for Codecs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.codecs.iter().map(|c| c.content_type()))
            .finish()
    }
}

impl Codecs {
    /// Add a codec after the existing ones.
    pub fn register(&mut self, codec: Box<dyn Codec>) {
        self.codecs.push(codec);
    }

    /// Number of codecs.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Whether no codecs are registered.
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Codec for an `Accept` header value.
    ///
    /// Media ranges are tried in the order the client listed them. Quality
    /// values are ignored. Falls back to the first registered codec.
    pub fn negotiate(&self, accept: Option<&str>) -> &dyn Codec {
        if let Some(accept) = accept {
            for range in accept.split(',').filter_map(media_type) {
                if range == "*/*" {
                    break;
                }
                if let Some(codec) = self.codecs.iter().find(|c| matches_range(c.content_type(), range)) {
                    return &**codec;
                }
            }
        }
        &*self.codecs[0]
    }
}

/// The media type of one `Accept` entry, without parameters.
pub(crate) fn media_type(entry: &str) -> Option<&str> {
    let media = entry.split(';').next()?.trim();
    if media.is_empty() {
        None
    } else {
        Some(media)
    }
}

fn matches_range(content_type: &str, range: &str) -> bool {
    let content_type = media_type(content_type).unwrap_or(content_type);
    match range.strip_suffix("/*") {
        Some(top) => content_type
            .split_once('/')
            .map_or(false, |(ct_top, _)| ct_top.eq_ignore_ascii_case(top)),
        None => content_type.eq_ignore_ascii_case(range),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use failwire_model::ResponseStatus;

    struct PlainCodec;

    impl Codec for PlainCodec {
        fn content_type(&self) -> &str {
            "text/plain; charset=utf-8"
        }

        fn encode(&self, body: &ErrorBody) -> Result<Vec<u8>> {
            let message = body
                .response_status()
                .map(|s| s.message.clone())
                .unwrap_or_default();
            Ok(message.into_bytes())
        }
    }

    fn codecs() -> Codecs {
        let mut codecs = Codecs::default();
        codecs.register(Box::new(PlainCodec));
        codecs
    }

    #[test]
    fn test_json_encoding() {
        let body = ErrorBody::generic(ResponseStatus::new("NotFound", "missing"));
        let bytes = JsonCodec.encode(&body).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["responseStatus"]["errorCode"], "NotFound");
    }

    #[test]
    fn test_default_is_json() {
        let codecs = codecs();
        assert_eq!(codecs.negotiate(None).content_type(), JSON_CONTENT_TYPE);
        assert_eq!(codecs.negotiate(Some("*/*")).content_type(), JSON_CONTENT_TYPE);
        assert_eq!(codecs.negotiate(Some("image/png")).content_type(), JSON_CONTENT_TYPE);
    }

    #[test]
    fn test_negotiate_by_accept() {
        let codecs = codecs();
        let chosen = codecs.negotiate(Some("text/plain;q=0.9, application/json"));
        assert_eq!(chosen.content_type(), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_negotiate_wildcard_subtype() {
        let codecs = codecs();
        assert_eq!(
            codecs.negotiate(Some("text/*")).content_type(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_media_type() {
        assert_eq!(media_type(" text/html ; q=1"), Some("text/html"));
        assert_eq!(media_type("  "), None);
    }
}
