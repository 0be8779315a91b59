//! Block glyph font for nimbus text masks.
//!
//! Glyphs are 7 rows tall and drawn with full-block characters. Two block
//! characters make one square cell, so a glyph that is 6 characters wide
//! covers 3 cells horizontally and 7 cells vertically.

use thiserror::Error;

/// Number of rows in every glyph.
pub const GLYPH_HEIGHT: usize = 7;

/// Character that marks a filled position in a glyph row.
pub const FILL: char = '█';

/// A single glyph, one string per row.
pub type Glyph = [&'static str; GLYPH_HEIGHT];

/// Errors raised while resolving text against the font.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FontError {
    /// The font has no glyph for this character.
    #[error("no glyph for character {0:?}")]
    MissingGlyph(char),
}

const SPACE: Glyph = ["    ", "    ", "    ", "    ", "    ", "    ", "    "];

/// Digits 0-9 (7 lines tall, 6 chars wide)
const DIGITS: [Glyph; 10] = [
    [" ████ ", "██  ██", "██  ██", "██  ██", "██  ██", "██  ██", " ████ "],
    ["  ██  ", " ███  ", "  ██  ", "  ██  ", "  ██  ", "  ██  ", " ████ "],
    [" ████ ", "██  ██", "    ██", "  ██  ", " ██   ", "██    ", "██████"],
    [" ████ ", "██  ██", "    ██", "  ███ ", "    ██", "██  ██", " ████ "],
    ["██  ██", "██  ██", "██  ██", "██████", "    ██", "    ██", "    ██"],
    ["██████", "██    ", "██    ", "█████ ", "    ██", "██  ██", " ████ "],
    [" ████ ", "██    ", "██    ", "█████ ", "██  ██", "██  ██", " ████ "],
    ["██████", "    ██", "   ██ ", "  ██  ", "  ██  ", "  ██  ", "  ██  "],
    [" ████ ", "██  ██", "██  ██", " ████ ", "██  ██", "██  ██", " ████ "],
    [" ████ ", "██  ██", "██  ██", " █████", "    ██", "    ██", " ████ "],
];

/// Letters A-Z
const LETTERS: [Glyph; 26] = [
    // A
    [" ████ ", "██  ██", "██  ██", "██████", "██  ██", "██  ██", "██  ██"],
    // B
    ["█████ ", "██  ██", "██  ██", "█████ ", "██  ██", "██  ██", "█████ "],
    // C
    [" ████ ", "██  ██", "██    ", "██    ", "██    ", "██  ██", " ████ "],
    // D
    ["█████ ", "██  ██", "██  ██", "██  ██", "██  ██", "██  ██", "█████ "],
    // E
    ["██████", "██    ", "██    ", "█████ ", "██    ", "██    ", "██████"],
    // F
    ["██████", "██    ", "██    ", "█████ ", "██    ", "██    ", "██    "],
    // G
    [" ████ ", "██  ██", "██    ", "██ ███", "██  ██", "██  ██", " ████ "],
    // H
    ["██  ██", "██  ██", "██  ██", "██████", "██  ██", "██  ██", "██  ██"],
    // I
    ["██████", "  ██  ", "  ██  ", "  ██  ", "  ██  ", "  ██  ", "██████"],
    // J
    ["  ████", "    ██", "    ██", "    ██", "██  ██", "██  ██", " ████ "],
    // K
    ["██  ██", "██ ██ ", "████  ", "███   ", "████  ", "██ ██ ", "██  ██"],
    // L
    ["██    ", "██    ", "██    ", "██    ", "██    ", "██    ", "██████"],
    // M
    ["██   ██", "███ ███", "███████", "██ █ ██", "██   ██", "██   ██", "██   ██"],
    // N
    ["██   ██", "███  ██", "████ ██", "██ ████", "██  ███", "██   ██", "██   ██"],
    // O
    [" ████ ", "██  ██", "██  ██", "██  ██", "██  ██", "██  ██", " ████ "],
    // P
    ["█████ ", "██  ██", "██  ██", "█████ ", "██    ", "██    ", "██    "],
    // Q
    [" ████ ", "██  ██", "██  ██", "██  ██", "██ ███", "██  ██", " ███ █"],
    // R
    ["█████ ", "██  ██", "██  ██", "█████ ", "████  ", "██ ██ ", "██  ██"],
    // S
    [" ████ ", "██  ██", "██    ", " ████ ", "    ██", "██  ██", " ████ "],
    // T
    ["██████", "  ██  ", "  ██  ", "  ██  ", "  ██  ", "  ██  ", "  ██  "],
    // U
    ["██  ██", "██  ██", "██  ██", "██  ██", "██  ██", "██  ██", " ████ "],
    // V
    ["██  ██", "██  ██", "██  ██", "██  ██", "██  ██", " ████ ", "  ██  "],
    // W
    ["██   ██", "██   ██", "██   ██", "██ █ ██", "███████", "███ ███", "██   ██"],
    // X
    ["██  ██", "██  ██", " ████ ", "  ██  ", " ████ ", "██  ██", "██  ██"],
    // Y
    ["██  ██", "██  ██", " ████ ", "  ██  ", "  ██  ", "  ██  ", "  ██  "],
    // Z
    ["██████", "    ██", "   ██ ", "  ██  ", " ██   ", "██    ", "██████"],
];

const COLON: Glyph = ["  ", "██", "  ", "  ", "  ", "██", "  "];
const PERIOD: Glyph = ["  ", "  ", "  ", "  ", "  ", "  ", "██"];
const BANG: Glyph = ["██", "██", "██", "██", "██", "  ", "██"];
const DASH: Glyph = ["    ", "    ", "    ", "████", "    ", "    ", "    "];

/// Look up the glyph for a character. Lowercase letters use the uppercase glyph.
pub fn glyph(c: char) -> Option<&'static Glyph> {
    let c = c.to_ascii_uppercase();
    match c {
        ' ' => Some(&SPACE),
        '0'..='9' => Some(&DIGITS[c as usize - '0' as usize]),
        'A'..='Z' => Some(&LETTERS[c as usize - 'A' as usize]),
        ':' => Some(&COLON),
        '.' => Some(&PERIOD),
        '!' => Some(&BANG),
        '-' => Some(&DASH),
        _ => None,
    }
}

/// Width of a glyph in block characters.
pub fn glyph_width(glyph: &Glyph) -> usize {
    glyph[0].chars().count()
}

/// Resolve every character of `text` to its glyph.
///
/// Fails on the first character the font cannot draw, so callers can
/// validate text once before any frame is rendered.
pub fn glyphs_for(text: &str) -> Result<Vec<&'static Glyph>, FontError> {
    text.chars()
        .map(|c| glyph(c).ok_or(FontError::MissingGlyph(c)))
        .collect()
}

/// Build the block-character rows for a line of text.
///
/// # Arguments
/// * `text` - Text to render
/// * `gap` - Number of blank characters between glyphs
///
/// # Returns
/// A vector of 7 strings, each representing one row of the banner.
pub fn build_banner(text: &str, gap: usize) -> Result<Vec<String>, FontError> {
    let glyphs = glyphs_for(text)?;
    let spacer = " ".repeat(gap);

    let mut lines = Vec::with_capacity(GLYPH_HEIGHT);
    for row in 0..GLYPH_HEIGHT {
        let mut line = String::new();
        for (i, g) in glyphs.iter().enumerate() {
            if i > 0 {
                line.push_str(&spacer);
            }
            line.push_str(g[row]);
        }
        lines.push(line);
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_rows_are_rectangular() {
        let all = DIGITS
            .iter()
            .chain(LETTERS.iter())
            .chain([SPACE, COLON, PERIOD, BANG, DASH].iter());
        for g in all {
            let w = glyph_width(g);
            assert!(g.iter().all(|row| row.chars().count() == w), "{g:?}");
            assert!(g.iter().all(|row| row.chars().all(|c| c == FILL || c == ' ')));
        }
    }

    #[test]
    fn test_lowercase_maps_to_uppercase() {
        assert_eq!(glyph('a'), glyph('A'));
        assert_eq!(glyph('z'), Some(&LETTERS[25]));
    }

    #[test]
    fn test_missing_glyph() {
        assert_eq!(glyphs_for("OPEN?"), Err(FontError::MissingGlyph('?')));
        assert_eq!(glyphs_for("OPEN").map(|g| g.len()), Ok(4));
    }

    #[test]
    fn test_build_banner() {
        let lines = build_banner("HI", 1).unwrap();
        assert_eq!(lines.len(), GLYPH_HEIGHT);
        assert_eq!(lines[0], "██  ██ ██████");
        assert_eq!(lines[3], "██████   ██  ");
    }
}
