//! Allow-list sanitizer for model-generated SVG.
//!
//! The markup is tokenized into a small element tree, then re-serialized
//! keeping only known drawing, styling and animation vocabulary. Anything
//! that can execute or fetch (scripts, foreign objects, event handlers,
//! non-fragment references, `@import`) is dropped.

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|<!\[CDATA\[(.*?)\]\]>|<[?!][^>]*>|<(/?)([A-Za-z][A-Za-z0-9:._-]*)((?:\s+[^\s=/>"']+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*(/?)>"#,
    )
    .unwrap()
});
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=/>"']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#).unwrap()
});
static CSS_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)url\(\s*['"]?([^'")]*)"#).unwrap());

const MAX_DEPTH: usize = 128;

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

const ALLOWED_ELEMENTS: &[&str] = &[
    "svg", "g", "defs", "title", "desc", "symbol", "use", "path", "rect", "circle", "ellipse",
    "line", "polyline", "polygon", "text", "tspan", "textPath", "linearGradient",
    "radialGradient", "stop", "clipPath", "mask", "pattern", "marker", "filter", "feBlend",
    "feColorMatrix", "feComponentTransfer", "feComposite", "feDisplacementMap", "feDropShadow",
    "feFlood", "feFuncA", "feFuncB", "feFuncG", "feFuncR", "feGaussianBlur", "feMerge",
    "feMergeNode", "feMorphology", "feOffset", "feTurbulence", "animate", "animateTransform",
    "animateMotion", "mpath", "set", "style",
];

const ANIMATION_ELEMENTS: &[&str] = &["animate", "animateTransform", "animateMotion", "set"];

const ALLOWED_ATTRIBUTES: &[&str] = &[
    // core and layout
    "id", "class", "style", "viewBox", "width", "height", "x", "y", "x1", "y1", "x2", "y2",
    "cx", "cy", "r", "rx", "ry", "fx", "fy", "fr", "d", "points", "pathLength", "transform",
    "transform-origin", "preserveAspectRatio", "version", "xml:space",
    // presentation
    "fill", "fill-opacity", "fill-rule", "stroke", "stroke-width", "stroke-opacity",
    "stroke-linecap", "stroke-linejoin", "stroke-dasharray", "stroke-dashoffset",
    "stroke-miterlimit", "opacity", "color", "display", "visibility", "clip-path", "clip-rule",
    "mask", "filter", "mix-blend-mode", "vector-effect", "shape-rendering",
    "stop-color", "stop-opacity", "flood-color", "flood-opacity",
    "marker-start", "marker-mid", "marker-end",
    // text
    "font-family", "font-size", "font-weight", "font-style", "text-anchor",
    "dominant-baseline", "letter-spacing", "dx", "dy", "rotate", "textLength", "lengthAdjust",
    "startOffset",
    // paint servers, clipping, markers
    "gradientUnits", "gradientTransform", "spreadMethod", "offset", "patternUnits",
    "patternContentUnits", "patternTransform", "clipPathUnits", "maskUnits",
    "maskContentUnits", "markerWidth", "markerHeight", "markerUnits", "refX", "refY",
    "orient",
    // filters
    "filterUnits", "primitiveUnits", "in", "in2", "result", "stdDeviation", "mode", "type",
    "values", "operator", "k1", "k2", "k3", "k4", "baseFrequency", "numOctaves", "seed",
    "stitchTiles", "scale", "xChannelSelector", "yChannelSelector", "radius", "tableValues",
    "slope", "intercept", "amplitude", "exponent",
    // animation
    "attributeName", "attributeType", "from", "to", "by", "begin", "dur", "end",
    "repeatCount", "repeatDur", "calcMode", "keyTimes", "keySplines", "keyPoints",
    "additive", "accumulate", "restart", "min", "max", "path",
    // references, checked separately
    "href", "xlink:href", "xmlns", "xmlns:xlink",
];

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn new(name: &str, attributes: Vec<(String, String)>) -> Self {
        Self {
            name: name.to_string(),
            attributes,
            children: Vec::new(),
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Returns the sanitized document, or `None` when the markup has no `<svg>` root.
pub fn sanitize_svg(markup: &str) -> Option<String> {
    let nodes = parse(markup);
    let root = nodes.into_iter().find_map(|node| match node {
        Node::Element(element) => Some(element),
        Node::Text(_) => None,
    })?;

    if root.name != "svg" {
        return None;
    }

    let root = filter_element(root)?;
    let mut out = String::with_capacity(markup.len());
    write_element(&root, &mut out);
    Some(out)
}

fn parse(markup: &str) -> Vec<Node> {
    let mut stack: Vec<Element> = vec![Element::new("#document", Vec::new())];
    let mut cursor = 0;

    for token in TOKEN.captures_iter(markup) {
        let Some(whole) = token.get(0) else {
            continue;
        };
        push_text(&mut stack, &markup[cursor..whole.start()], true);
        cursor = whole.end();

        if let Some(cdata) = token.get(1) {
            push_text(&mut stack, cdata.as_str(), false);
            continue;
        }
        let Some(name) = token.get(3).map(|m| m.as_str()) else {
            // comment, doctype or processing instruction
            continue;
        };

        let closing = token.get(2).is_some_and(|m| !m.as_str().is_empty());
        if closing {
            close_element(&mut stack, name);
            continue;
        }

        let element = Element::new(name, parse_attributes(&token));
        let self_closing = token.get(5).is_some_and(|m| !m.as_str().is_empty());
        if self_closing {
            append(&mut stack, Node::Element(element));
        } else if stack.len() <= MAX_DEPTH {
            stack.push(element);
        }
    }
    push_text(&mut stack, &markup[cursor..], true);

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop().map(|document| document.children).unwrap_or_default()
}

fn parse_attributes(token: &Captures<'_>) -> Vec<(String, String)> {
    let Some(raw) = token.get(4) else {
        return Vec::new();
    };
    ATTRIBUTE
        .captures_iter(raw.as_str())
        .filter_map(|attr| {
            let name = attr.get(1)?.as_str().to_string();
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map(|m| decode_html_entities(m.as_str()).into_owned())
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

fn push_text(stack: &mut [Element], text: &str, decode: bool) {
    if text.is_empty() {
        return;
    }
    let text = if decode {
        decode_html_entities(text).into_owned()
    } else {
        text.to_string()
    };
    append(stack, Node::Text(text));
}

fn append(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

fn close_element(stack: &mut Vec<Element>, name: &str) {
    // stray closing tags are ignored
    let Some(depth) = stack.iter().skip(1).rposition(|el| el.name == name) else {
        return;
    };
    while stack.len() > depth + 1 {
        close_top(stack);
    }
}

fn close_top(stack: &mut Vec<Element>) {
    if let Some(element) = stack.pop() {
        append(stack, Node::Element(element));
    }
}

fn filter_element(element: Element) -> Option<Element> {
    if !ALLOWED_ELEMENTS.contains(&element.name.as_str()) {
        return None;
    }
    if ANIMATION_ELEMENTS.contains(&element.name.as_str()) && animates_unsafe_target(&element) {
        return None;
    }

    let is_style = element.name == "style";
    let attributes = element
        .attributes
        .into_iter()
        .filter(|(name, value)| attribute_is_safe(name, value))
        .collect();
    let children = element
        .children
        .into_iter()
        .filter_map(|child| match child {
            Node::Element(child) => filter_element(child).map(Node::Element),
            Node::Text(text) if is_style && !css_is_safe(&text) => None,
            Node::Text(text) => Some(Node::Text(text)),
        })
        .collect();

    Some(Element {
        name: element.name,
        attributes,
        children,
    })
}

fn animates_unsafe_target(element: &Element) -> bool {
    element
        .attribute("attributeName")
        .map(|target| {
            let target = target.trim().to_ascii_lowercase();
            target.ends_with("href") || target.starts_with("on")
        })
        .unwrap_or(false)
}

fn attribute_is_safe(name: &str, value: &str) -> bool {
    if name.to_ascii_lowercase().starts_with("on") || !ALLOWED_ATTRIBUTES.contains(&name) {
        return false;
    }
    match name {
        "href" | "xlink:href" => value.trim().starts_with('#'),
        "xmlns" => value == SVG_NS,
        "xmlns:xlink" => value == XLINK_NS,
        _ => !has_script_scheme(value) && css_is_safe(value),
    }
}

fn has_script_scheme(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.contains("javascript:") || compact.contains("vbscript:")
}

/// CSS may only reference fragments in the same document. Checks run on the
/// escape-decoded text, since `\75 rl(` is `url(` to a browser.
fn css_is_safe(css: &str) -> bool {
    let decoded = decode_css_escapes(css);
    let lowered = decoded.to_ascii_lowercase();
    if ["@import", "@font-face", "expression(", "image-set(", "src("]
        .iter()
        .any(|needle| lowered.contains(needle))
        || has_script_scheme(&decoded)
    {
        return false;
    }
    CSS_URL
        .captures_iter(&decoded)
        .all(|url| url.get(1).is_some_and(|m| m.as_str().trim().starts_with('#')))
}

/// Resolves CSS escapes: `\` + 1-6 hex digits (one trailing whitespace
/// swallowed), `\` + newline (dropped), `\` + any other char (that char).
fn decode_css_escapes(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut chars = css.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(h) if h.is_ascii_hexdigit() => {
                    hex.push(*h);
                    chars.next();
                }
                _ => break,
            }
        }
        if !hex.is_empty() {
            let decoded = u32::from_str_radix(&hex, 16)
                .ok()
                .filter(|code| *code != 0)
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            out.push(decoded);
            if chars.peek().is_some_and(|w| w.is_whitespace()) {
                chars.next();
            }
            continue;
        }
        match chars.next() {
            Some('\n') | Some('\x0c') => {}
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some(other) => out.push(other),
            None => out.push(char::REPLACEMENT_CHARACTER),
        }
    }
    out
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&encode_double_quoted_attribute(value));
        out.push('"');
    }
    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(child, out),
            Node::Text(text) => out.push_str(&encode_text(text)),
        }
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_drawing_and_animation_vocabulary() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><defs><linearGradient id="g"><stop offset="0" stop-color="#f00"/></linearGradient></defs><circle cx="5" cy="5" r="4" fill="url(#g)"><animate attributeName="r" values="4;5;4" dur="2s" repeatCount="indefinite"/></circle></svg>"##;
        assert_eq!(sanitize_svg(svg).as_deref(), Some(svg));
    }

    #[test]
    fn drops_scripts_and_foreign_content() {
        let svg = r#"<svg><script>alert(1)</script><foreignObject><div>hi</div></foreignObject><rect width="1"/></svg>"#;
        assert_eq!(
            sanitize_svg(svg).as_deref(),
            Some(r#"<svg><rect width="1"/></svg>"#)
        );
    }

    #[test]
    fn drops_event_handlers_and_external_references() {
        let svg = r##"<svg onload="alert(1)"><use href="https://evil.example/x.svg#a"/><use xlink:href="#local"/><a href="javascript:alert(1)"><rect/></a><rect fill="url(https://evil.example/p)" ONCLICK="x()"/></svg>"##;
        assert_eq!(
            sanitize_svg(svg).as_deref(),
            Some(r##"<svg><use/><use xlink:href="#local"/><rect/></svg>"##)
        );
    }

    #[test]
    fn drops_animations_that_rewrite_links_or_handlers() {
        let svg = r##"<svg><set attributeName="href" to="javascript:alert(1)"/><animate attributeName="onbegin" values="x"/><set attributeName="fill" to="red"/></svg>"##;
        assert_eq!(
            sanitize_svg(svg).as_deref(),
            Some(r#"<svg><set attributeName="fill" to="red"/></svg>"#)
        );
    }

    #[test]
    fn filters_style_sheets() {
        let safe = "<svg><style>@keyframes spin { to { transform: rotate(360deg); } } .a { fill: url(#g); }</style></svg>";
        assert_eq!(sanitize_svg(safe).as_deref(), Some(safe));

        let unsafe_css = r#"<svg><style>@import url("https://evil.example/x.css");</style><g style="background:url(https://evil.example/p.png)"/></svg>"#;
        assert_eq!(
            sanitize_svg(unsafe_css).as_deref(),
            Some("<svg><style/><g/></svg>")
        );
    }

    #[test]
    fn escaped_css_cannot_smuggle_fetches() {
        let svg = r#"<svg><style>@\69mport "https://evil.example/x.css"; .a { fill: \75 rl(https://evil.example/beacon) }</style><rect style="background:\75 rl(https://evil.example/p.png)"/><g fill="u\rl(https://evil.example/q)"/></svg>"#;
        assert_eq!(
            sanitize_svg(svg).as_deref(),
            Some("<svg><style/><rect/><g/></svg>")
        );

        let image_set = r#"<svg><rect style="background: image-set('https://evil.example/a.png' 1x)"/></svg>"#;
        assert_eq!(sanitize_svg(image_set).as_deref(), Some("<svg><rect/></svg>"));

        let font = r#"<svg><style>@font-face { font-family: x; src: "https://evil.example/f.woff"; }</style></svg>"#;
        assert_eq!(sanitize_svg(font).as_deref(), Some("<svg><style/></svg>"));
    }

    #[test]
    fn escaped_fragment_references_still_pass() {
        let svg = r#"<svg><style>.a { fill: \75 rl(#g); content: "\2014"; }</style></svg>"#;
        assert_eq!(sanitize_svg(svg).as_deref(), Some(svg));
    }

    #[test]
    fn decodes_css_escapes() {
        assert_eq!(decode_css_escapes(r"@\69mport"), "@import");
        assert_eq!(decode_css_escapes(r"\75 rl("), "url(");
        assert_eq!(decode_css_escapes(r"\000075rl("), "url(");
        assert_eq!(decode_css_escapes(r"u\rl\("), "url(");
        assert_eq!(decode_css_escapes("a\\\nb"), "ab");
        assert_eq!(decode_css_escapes(r"\0"), "\u{FFFD}");
        assert_eq!(decode_css_escapes("plain"), "plain");
    }

    #[test]
    fn preserves_entities_and_cdata_text() {
        let svg = r#"<svg><text x="1">Tom &amp; Jerry &lt;3</text><style><![CDATA[.a > .b { fill: red; }]]></style></svg>"#;
        assert_eq!(
            sanitize_svg(svg).as_deref(),
            Some("<svg><text x=\"1\">Tom &amp; Jerry &lt;3</text><style>.a &gt; .b { fill: red; }</style></svg>")
        );
    }

    #[test]
    fn requires_svg_root() {
        assert!(sanitize_svg("<div><svg></svg></div>").is_none());
        assert!(sanitize_svg("just text").is_none());
        assert!(sanitize_svg("").is_none());
        assert_eq!(
            sanitize_svg("<?xml version=\"1.0\"?>\n<!-- art --><svg/>").as_deref(),
            Some("<svg/>")
        );
    }

    #[test]
    fn recovers_from_unbalanced_markup() {
        assert_eq!(
            sanitize_svg("<svg><g><rect width=\"2\"></svg>").as_deref(),
            Some(r#"<svg><g><rect width="2"/></g></svg>"#)
        );
        assert_eq!(
            sanitize_svg("<svg><rect/></circle></svg>").as_deref(),
            Some("<svg><rect/></svg>")
        );
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let depth = MAX_DEPTH * 4;
        let markup = format!("<svg>{}{}</svg>", "<g>".repeat(depth), "</g>".repeat(depth));
        let out = sanitize_svg(&markup).unwrap();
        assert!(out.matches("<g").count() < depth);
    }
}
