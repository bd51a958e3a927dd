//! Shaping of the model's raw reply into SVG markup.

use crate::utils::constants::RAW_PREFIX_CHARS;
use regex::Regex;
use std::sync::LazyLock;

static LEADING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*```[A-Za-z0-9_+-]*[ \t]*(?:\r?\n)?").unwrap());
static TRAILING_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*```\s*$").unwrap());

const ANIMATION_MARKERS: [&str; 5] = [
    "<animate",
    "<animateTransform",
    "<animateMotion",
    "<set",
    "@keyframes",
];

/// Result of validating a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapedReply {
    Svg { markup: String, animated: bool },
    Invalid { raw_prefix: String },
}

/// Removes a surrounding markdown code fence, if any, and trims whitespace.
pub fn strip_code_fences(raw: &str) -> &str {
    let start = LEADING_FENCE.find(raw).map(|m| m.end()).unwrap_or(0);
    let body = &raw[start..];
    let end = TRAILING_FENCE
        .find(body)
        .map(|m| m.start())
        .unwrap_or(body.len());
    body[..end].trim()
}

pub fn is_svg_root(markup: &str) -> bool {
    markup.starts_with("<svg")
}

pub fn has_animation(markup: &str) -> bool {
    ANIMATION_MARKERS.iter().any(|marker| markup.contains(marker))
}

/// First [`RAW_PREFIX_CHARS`] characters of `raw`, never splitting a char.
pub fn diagnostic_prefix(raw: &str) -> String {
    raw.chars().take(RAW_PREFIX_CHARS).collect()
}

pub fn shape_reply(raw: &str) -> ShapedReply {
    let markup = strip_code_fences(raw);
    if !is_svg_root(markup) {
        return ShapedReply::Invalid {
            raw_prefix: diagnostic_prefix(raw),
        };
    }
    ShapedReply::Svg {
        markup: markup.to_string(),
        animated: has_animation(markup),
    }
}
