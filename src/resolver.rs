//! Redirect-link resolution.
//!
//! Google News RSS links point at `news.google.com/rss/articles/<id>`. The id
//! is a base64url-encoded protobuf envelope that, for most articles, embeds
//! the publisher URL directly, so it can be decoded without a network call.
//!
//! [`resolve_redirect`] never fails: any decode problem, or a decoded URL
//! outside the publisher's domain, yields [`Resolution::Fallback`] carrying
//! the original link.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use thiserror::Error;
use tracing::debug;
use url::Url;

const REDIRECT_HOST: &str = "news.google.com";
const ENVELOPE_PREFIX: [u8; 3] = [0x08, 0x13, 0x22];
const ENVELOPE_SUFFIX: [u8; 3] = [0xd2, 0x01, 0x00];
const OPAQUE_TOKEN_PREFIX: &str = "AU_yqL";

const ARTICLE_ID: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("not a news.google.com article link")]
    NotARedirect,
    #[error("article id is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("article id envelope is truncated")]
    Truncated,
    #[error("article id carries an opaque token that needs an online lookup")]
    OpaqueToken,
    #[error("embedded payload is not an http(s) URL")]
    NotAUrl,
}

/// Turns an intermediary redirect link into the link it points at.
pub trait RedirectDecoder {
    fn decode(&self, redirect_url: &str) -> Result<String, DecodeError>;
}

/// Offline decoder for Google News article links.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoogleNewsDecoder;

impl RedirectDecoder for GoogleNewsDecoder {
    fn decode(&self, redirect_url: &str) -> Result<String, DecodeError> {
        let parsed = Url::parse(redirect_url)?;
        if parsed.host_str() != Some(REDIRECT_HOST) {
            return Err(DecodeError::NotARedirect);
        }

        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let id = match segments.as_slice() {
            [.., "articles", id] => *id,
            _ => return Err(DecodeError::NotARedirect),
        };

        let bytes = ARTICLE_ID.decode(id.trim_end_matches('='))?;
        let payload = embedded_payload(&bytes)?;
        let text = String::from_utf8_lossy(payload);

        if text.starts_with(OPAQUE_TOKEN_PREFIX) {
            return Err(DecodeError::OpaqueToken);
        }
        if !(text.starts_with("https://") || text.starts_with("http://")) {
            return Err(DecodeError::NotAUrl);
        }
        Ok(text.into_owned())
    }
}

// Envelope: 08 13 22 <varint len> <payload> [d2 01 00 ...]
fn embedded_payload(bytes: &[u8]) -> Result<&[u8], DecodeError> {
    let body = bytes.strip_prefix(&ENVELOPE_PREFIX[..]).unwrap_or(bytes);
    let body = body.strip_suffix(&ENVELOPE_SUFFIX[..]).unwrap_or(body);

    let mut len = 0usize;
    let mut shift = 0u32;
    let mut consumed = 0usize;
    loop {
        let byte = *body.get(consumed).ok_or(DecodeError::Truncated)?;
        consumed += 1;
        len |= usize::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
        if shift > 28 {
            return Err(DecodeError::Truncated);
        }
    }

    body.get(consumed..consumed + len)
        .ok_or(DecodeError::Truncated)
}

/// Outcome of resolving one redirect link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Decoded URL that belongs to the publisher.
    Publisher(String),
    /// Decoding failed or led elsewhere; the original link, verbatim.
    Fallback(String),
}

impl Resolution {
    /// `true` when the link was decoded to a publisher URL.
    pub fn is_publisher(&self) -> bool {
        matches!(self, Resolution::Publisher(_))
    }

    /// Consume the resolution.
    ///
    /// # Returns
    ///
    /// The decoded publisher URL for [`Resolution::Publisher`], otherwise the
    /// original redirect link exactly as it was given.
    pub fn into_url(self) -> String {
        match self {
            Resolution::Publisher(url) | Resolution::Fallback(url) => url,
        }
    }
}

/// Resolve `redirect_url`, adopting the decoded URL only if it contains
/// `domain`.
///
/// # Arguments
///
/// * `decoder` - Offline decoder for the redirect link
/// * `redirect_url` - The feed item's link
/// * `domain` - Publisher domain the decoded URL must contain
///
/// # Returns
///
/// Never fails. Decode errors and off-domain results both become
/// [`Resolution::Fallback`] carrying `redirect_url` unchanged.
pub fn resolve_redirect<D: RedirectDecoder + ?Sized>(
    decoder: &D,
    redirect_url: &str,
    domain: &str,
) -> Resolution {
    match decoder.decode(redirect_url) {
        Ok(decoded) if decoded.contains(domain) => Resolution::Publisher(decoded),
        Ok(decoded) => {
            debug!(%redirect_url, %decoded, "Decoded URL is outside the publisher domain");
            Resolution::Fallback(redirect_url.to_string())
        }
        Err(e) => {
            debug!(%redirect_url, error = %e, "Redirect decode failed; keeping original link");
            Resolution::Fallback(redirect_url.to_string())
        }
    }
}
