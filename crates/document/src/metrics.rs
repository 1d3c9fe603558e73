//! Glyph widths for the two standard fonts the renderer uses.
//!
//! The base-14 Helvetica faces are not embedded, so layout relies on their published
//! advance widths (thousandths of an em) to right-align amounts and wrap terms.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    pub fn base_font(self) -> &'static [u8] {
        match self {
            Self::Regular => b"Helvetica",
            Self::Bold => b"Helvetica-Bold",
        }
    }

    pub fn resource_name(self) -> &'static [u8] {
        match self {
            Self::Regular => b"F1",
            Self::Bold => b"F2",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            Self::Regular => &HELVETICA_WIDTHS,
            Self::Bold => &HELVETICA_BOLD_WIDTHS,
        }
    }
}

const FALLBACK_WIDTH: u16 = 556;

// Printable ASCII, space (0x20) through tilde (0x7E).
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn char_width(font: Font, ch: char) -> u16 {
    let code = ch as u32;
    if (0x20..=0x7E).contains(&code) {
        font.widths()[(code - 0x20) as usize]
    } else {
        FALLBACK_WIDTH
    }
}

/// Advance width of `text` in points at `size`.
pub fn text_width(font: Font, size: f32, text: &str) -> f32 {
    let units: u32 = text.chars().map(|ch| u32::from(char_width(font, ch))).sum();
    units as f32 * size / 1000.0
}

/// Greedy word wrap. Explicit newlines start a new line; a single word wider than
/// `max_width` is placed on its own line rather than split.
pub fn wrap_text(font: Font, size: f32, text: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }

            let candidate = format!("{current} {word}");
            if text_width(font, size, &candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_owned()));
            }
        }
        lines.push(current);
    }

    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

/// Shortens `text` with a trailing `...` until it fits `max_width`; text that already fits
/// is returned unchanged.
pub fn truncate_to_width(font: Font, size: f32, text: &str, max_width: f32) -> String {
    if text_width(font, size, text) <= max_width {
        return text.to_owned();
    }
    elide(font, size, text, max_width)
}

/// Like [`truncate_to_width`] but always marks the text as cut.
pub fn elide(font: Font, size: f32, text: &str, max_width: f32) -> String {
    let mut kept: Vec<char> = text.trim_end().chars().collect();
    loop {
        let candidate = format!("{}...", kept.iter().collect::<String>().trim_end());
        if kept.is_empty() || text_width(font, size, &candidate) <= max_width {
            return candidate;
        }
        kept.pop();
    }
}

/// Encodes `text` for the fonts' WinAnsiEncoding. Characters outside it become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' => ch as u8,
            '\u{A0}'..='\u{FF}' => ch as u32 as u8,
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{elide, encode_win_ansi, text_width, truncate_to_width, wrap_text, Font};

    #[test]
    fn width_scales_with_size() {
        let at_ten = text_width(Font::Regular, 10.0, "Total");
        let at_twenty = text_width(Font::Regular, 20.0, "Total");

        assert!((at_twenty - 2.0 * at_ten).abs() < f32::EPSILON * 100.0);
    }

    #[test]
    fn bold_digits_match_regular_digits() {
        assert_eq!(text_width(Font::Regular, 12.0, "1234"), text_width(Font::Bold, 12.0, "1234"));
        assert!(text_width(Font::Bold, 12.0, "Terms") > text_width(Font::Regular, 12.0, "Terms"));
    }

    #[test]
    fn wrap_respects_max_width() {
        let text = "Pricing is valid for thirty days from the issue date and excludes hardware.";
        let lines = wrap_text(Font::Regular, 11.0, text, 150.0);

        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| text_width(Font::Regular, 11.0, line) <= 150.0));
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_keeps_paragraph_breaks() {
        let lines = wrap_text(Font::Regular, 11.0, "Net 30\n\nLate fees apply\n", 500.0);

        assert_eq!(lines, vec!["Net 30", "", "Late fees apply"]);
    }

    #[test]
    fn overlong_word_gets_its_own_line() {
        let text = "see https://example.com/a/very/long/path";
        let lines = wrap_text(Font::Regular, 11.0, text, 60.0);

        assert_eq!(lines, vec!["see", "https://example.com/a/very/long/path"]);
    }

    #[test]
    fn win_ansi_maps_common_symbols() {
        assert_eq!(encode_win_ansi("$1"), b"$1".to_vec());
        assert_eq!(encode_win_ansi("\u{20AC}5"), vec![0x80, b'5']);
        assert_eq!(encode_win_ansi("\u{A3}"), vec![0xA3]);
        assert_eq!(encode_win_ansi("\u{4E2D}"), b"?".to_vec());
    }

    #[test]
    fn truncation_keeps_short_text_and_cuts_long_text_to_width() {
        assert_eq!(truncate_to_width(Font::Regular, 12.0, "Servers", 200.0), "Servers");

        let long = "Managed Workstation Backup With Extended Retention";
        let cut = truncate_to_width(Font::Regular, 12.0, long, 120.0);
        assert!(cut.ends_with("..."));
        assert!(text_width(Font::Regular, 12.0, &cut) <= 120.0);
        assert!(long.starts_with(cut.trim_end_matches("...")));
    }

    #[test]
    fn elide_marks_fitting_text_too() {
        assert_eq!(elide(Font::Bold, 24.0, "Acme", 500.0), "Acme...");
    }
}
