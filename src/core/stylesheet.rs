//! Stylesheet parsing for fontdl
//!
//! Extracts downloadable font descriptors from the `@font-face` blocks served
//! by Google Fonts. Only that narrow block shape is understood; everything else
//! in the stylesheet is ignored.

use std::borrow::Cow;

const FONT_FACE_MARKER: &str = "@font-face";

/// Font file extensions accepted in `url(...)` references, in canonical form
pub const FONT_EXTENSIONS: &[&str] = &["woff2", "woff", "ttf", "otf"];

/// One downloadable font variant extracted from a `@font-face` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontDescriptor {
    family: String,
    weight: String,
    style: String,
    source_url: String,
    target_filename: String,
}

impl FontDescriptor {
    /// Create a descriptor, deriving its target filename.
    ///
    /// Returns `None` when `source_url` does not end in a known font extension.
    pub fn new(
        family: impl Into<String>,
        weight: impl Into<String>,
        style: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Option<Self> {
        let source_url = source_url.into();
        let extension = font_extension(&source_url)?;
        let family = family.into();
        let weight = weight.into();
        let style = style.into();
        let target_filename = font_filename(&family, &weight, &style, extension);

        Some(Self {
            family,
            weight,
            style,
            source_url,
            target_filename,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn weight(&self) -> &str {
        &self.weight
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// On-disk name of the font file, also used as the dedup key
    pub fn target_filename(&self) -> &str {
        &self.target_filename
    }
}

/// Maps a numeric weight code to the label used in file names
pub fn weight_label(weight: &str) -> Cow<'static, str> {
    match weight {
        "100" => Cow::Borrowed("Thin"),
        "200" => Cow::Borrowed("ExtraLight"),
        "300" => Cow::Borrowed("Light"),
        "400" => Cow::Borrowed("Regular"),
        "500" => Cow::Borrowed("Medium"),
        "600" => Cow::Borrowed("SemiBold"),
        "700" => Cow::Borrowed("Bold"),
        "800" => Cow::Borrowed("ExtraBold"),
        "900" => Cow::Borrowed("Black"),
        other => Cow::Owned(format!("W{other}")),
    }
}

/// Builds `<Family>-<WeightLabel>[-<Style>].<ext>`
///
/// Spaces are removed from the family; the style suffix is omitted for `normal`.
pub fn font_filename(family: &str, weight: &str, style: &str, extension: &str) -> String {
    let style_suffix = if style.eq_ignore_ascii_case("normal") {
        String::new()
    } else {
        format!("-{}", capitalize(style))
    };

    format!(
        "{}-{}{}.{}",
        family.replace(' ', ""),
        weight_label(weight),
        style_suffix,
        extension
    )
}

/// Returns the canonical font extension of a URL, ignoring query and fragment
pub fn font_extension(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let (stem, extension) = path.rsplit_once('.')?;
    if stem.is_empty() || extension.contains('/') {
        return None;
    }

    FONT_EXTENSIONS
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(extension))
}

/// Extracts all usable font descriptors from a stylesheet, in order of appearance.
///
/// Blocks without a family name or without a font file reference are skipped.
/// Duplicates are kept.
pub fn parse_stylesheet(css: &str) -> Vec<FontDescriptor> {
    FontFaceBlocks::new(css).filter_map(parse_font_face).collect()
}

/// Parses the body of a single `@font-face` block
pub fn parse_font_face(body: &str) -> Option<FontDescriptor> {
    let family = declarations(body)
        .filter(|(name, _)| name.eq_ignore_ascii_case("font-family"))
        .find_map(|(_, value)| quoted_name(value))?;

    // Families end up in file names
    if family.contains(['/', '\\']) {
        return None;
    }

    let weight = declarations(body)
        .filter(|(name, _)| name.eq_ignore_ascii_case("font-weight"))
        .find_map(|(_, value)| leading(value, |c| c.is_ascii_digit()))
        .unwrap_or("400");

    let style = declarations(body)
        .filter(|(name, _)| name.eq_ignore_ascii_case("font-style"))
        .find_map(|(_, value)| leading(value, |c| c.is_alphanumeric() || c == '_'))
        .unwrap_or("normal");

    let source_url = font_source(body)?;

    FontDescriptor::new(family, weight, style, source_url)
}

/// Lazy scan over the bodies of `@font-face` blocks.
///
/// Block boundaries are found by brace matching. A marker not followed by `{`
/// is ignored, and a block that runs into another marker before closing is
/// abandoned so the scan resumes at the inner marker. A clone taken before
/// iterating replays the same blocks.
#[derive(Debug, Clone)]
pub struct FontFaceBlocks<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> FontFaceBlocks<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for FontFaceBlocks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let rest = self.text.get(self.pos..)?;
            let marker = rest.find(FONT_FACE_MARKER)?;
            let after_marker = self.pos + marker + FONT_FACE_MARKER.len();

            let tail = &self.text[after_marker..];
            let trimmed = tail.trim_start();
            if !trimmed.starts_with('{') {
                self.pos = after_marker;
                continue;
            }

            let body_start = after_marker + (tail.len() - trimmed.len()) + 1;
            let Some(body_len) = matching_brace(&self.text[body_start..]) else {
                // Unterminated; a later marker may still open a valid block
                self.pos = after_marker;
                continue;
            };

            let body = &self.text[body_start..body_start + body_len];
            if let Some(inner) = body.find(FONT_FACE_MARKER) {
                self.pos = body_start + inner;
                continue;
            }

            self.pos = body_start + body_len + 1;
            return Some(body);
        }
    }
}

/// Offset of the `}` closing an already opened block
fn matching_brace(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in body.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(idx),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// `name: value` pairs of a block body.
///
/// The name is the last word before the colon so leading comments do not hide it.
fn declarations(body: &str) -> impl Iterator<Item = (&str, &str)> {
    body.split(';').filter_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        let name = name.split_whitespace().next_back()?;
        Some((name, value.trim()))
    })
}

fn quoted_name(value: &str) -> Option<&str> {
    let rest = value.strip_prefix(['\'', '"'])?;
    let end = rest.find(['\'', '"'])?;
    let name = &rest[..end];
    (!name.is_empty()).then_some(name)
}

fn leading(value: &str, accept: impl Fn(char) -> bool) -> Option<&str> {
    let end = value.find(|c: char| !accept(c)).unwrap_or(value.len());
    (end > 0).then(|| &value[..end])
}

/// First absolute `url(...)` reference pointing at a known font format
fn font_source(body: &str) -> Option<&str> {
    let mut rest = body;
    while let Some(start) = rest.find("url(") {
        let after = &rest[start + "url(".len()..];
        let end = after.find(')')?;
        let url = after[..end].trim().trim_matches(|c| c == '\'' || c == '"');

        if is_absolute_http(url) && font_extension(url).is_some() {
            return Some(url);
        }
        rest = &after[end + 1..];
    }
    None
}

fn is_absolute_http(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
