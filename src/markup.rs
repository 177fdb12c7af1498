//! Tooltip text composition and color markup.
//!
//! Tooltip text uses a small tag language understood by [`RichText::from_markup`](crate::rich_text::RichText::from_markup):
//! `<size=N>..</size>` and `<color=#RRGGBB>..</color>`.

use bevy_color::{Color, Srgba};
use bevy_ecs::resource::Resource;
use regex::Regex;

use crate::palette::{Chroma, to_hex};

/// The font size used for tooltip titles.
pub const TITLE_SIZE: u16 = 16;

/// Combine a title and body into tooltip markup.
///
/// A title that is blank after trimming is omitted. The title and body are separated by a newline
/// only if both are present.
pub fn compose(title: &str, body: &str) -> String {
    let mut text = String::new();
    if !title.trim().is_empty() {
        text.push_str(&format!("<size={TITLE_SIZE}>{title}</size>"));
        if !body.is_empty() {
            text.push('\n');
        }
    }
    text.push_str(body);
    text
}

/// The colors applied by [`ColorMarkup`].
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub struct MarkupColors {
    /// The color of bracketed spans like `[Fire]`.
    pub bracket: Color,
    /// The color of gains like `+Armor` or `+5 (2)`.
    pub gain: Color,
    /// The color of losses like `-Speed`.
    pub loss: Color,
}

impl Default for MarkupColors {
    fn default() -> Self {
        Self {
            bracket: Chroma::Yellow.shade(400).into(),
            gain: Chroma::Blue.shade(400).into(),
            loss: Chroma::Red.shade(400).into(),
        }
    }
}

/// A [`Resource`] that wraps notable spans of tooltip text in color tags.
///
/// Three passes run in order, each over the output of the previous one:
///
/// 1. Bracketed spans: `.\[.+\]`
/// 2. Gains: `[^\w]\+\w+\b( \(\d+\))*`
/// 3. Losses: `[^\w]-\w+\b( \(\d+\))*`
///
/// The first character of every match only anchors the pattern, so the tag opens after it.
#[derive(Resource, Clone, Debug)]
pub struct ColorMarkup {
    passes: Vec<ColorPass>,
}

#[derive(Clone, Debug)]
struct ColorPass {
    pattern: Regex,
    open_tag: String,
}

impl ColorMarkup {
    const BRACKET: &'static str = r".\[.+\]";
    const GAIN: &'static str = r"[^\w]\+\w+\b( \(\d+\))*";
    const LOSS: &'static str = r"[^\w]-\w+\b( \(\d+\))*";

    /// Build the color passes for the given colors.
    pub fn new(colors: MarkupColors) -> Self {
        Self {
            passes: [
                (Self::BRACKET, colors.bracket),
                (Self::GAIN, colors.gain),
                (Self::LOSS, colors.loss),
            ]
            .into_iter()
            .map(|(pattern, color)| ColorPass {
                pattern: Regex::new(pattern).expect("color markup patterns are valid"),
                open_tag: format!("<color={}>", to_hex(Srgba::from(color))),
            })
            .collect(),
        }
    }

    /// Apply every color pass to the given text.
    pub fn apply(&self, text: &str) -> String {
        self.passes
            .iter()
            .fold(text.to_owned(), |text, pass| pass.apply(&text))
    }
}

impl Default for ColorMarkup {
    fn default() -> Self {
        Self::new(MarkupColors::default())
    }
}

impl ColorPass {
    fn apply(&self, text: &str) -> String {
        let mut colored = String::with_capacity(text.len());
        let mut last = 0;
        for m in self.pattern.find_iter(text) {
            let lead = m.as_str().chars().next().map_or(0, char::len_utf8);
            let start = m.start() + lead;
            colored.push_str(&text[last..start]);
            colored.push_str(&self.open_tag);
            colored.push_str(&text[start..m.end()]);
            colored.push_str("</color>");
            last = m.end();
        }
        colored.push_str(&text[last..]);
        colored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markup() -> ColorMarkup {
        ColorMarkup::new(MarkupColors {
            bracket: Color::srgb_u8(0xff, 0xff, 0x00),
            gain: Color::srgb_u8(0x00, 0x00, 0xff),
            loss: Color::srgb_u8(0xff, 0x00, 0x00),
        })
    }

    fn strip_color_tags(text: &str) -> String {
        Regex::new(r"<color=#[0-9A-Fa-f]+>|</color>")
            .unwrap()
            .replace_all(text, "")
            .into_owned()
    }

    #[test]
    fn every_color_pass_is_built() {
        let markup = ColorMarkup::default();
        assert_eq!(markup.passes.len(), 3);
        assert!(markup.passes.iter().all(|pass| pass.open_tag.starts_with("<color=#")));
    }

    #[test]
    fn compose_title_and_body() {
        assert_eq!(compose("Sword", "Sharp."), "<size=16>Sword</size>\nSharp.");
        assert_eq!(compose("Sword", ""), "<size=16>Sword</size>");
        assert_eq!(compose("   ", "Sharp."), "Sharp.");
        assert_eq!(compose("", ""), "");
    }

    #[test]
    fn bracket_span_skips_its_lead_character() {
        let colored = markup().apply("Deals [Fire] damage");
        assert!(
            colored.eq_ignore_ascii_case("Deals <color=#ffff00>[Fire]</color> damage"),
            "{colored}",
        );
    }

    #[test]
    fn bracket_at_start_of_text_is_not_colored() {
        assert_eq!(markup().apply("[Fire]"), "[Fire]");
    }

    #[test]
    fn gains_and_losses_include_stack_counts() {
        let colored = markup().apply("Grants +Armor (2) and -Speed.");
        assert!(
            colored.eq_ignore_ascii_case(
                "Grants <color=#0000ff>+Armor (2)</color> and <color=#ff0000>-Speed</color>."
            ),
            "{colored}",
        );
    }

    #[test]
    fn each_match_is_wrapped_once() {
        let colored = markup().apply("a +1 b +2 c -3");
        assert_eq!(colored.matches("</color>").count(), 3);
        assert_eq!(colored.matches("<color=").count(), 3);
    }

    #[test]
    fn hyphenated_words_are_not_losses() {
        assert_eq!(markup().apply("well-known"), "well-known");
    }

    #[test]
    fn unmatched_text_is_preserved() {
        let inputs = [
            "",
            "plain text",
            "<size=16>Title</size>\nBody with [tag] and +gain (3) -loss",
            "ünïcödé +wörd [brâcket]",
            "nested [a [b] c] +x -y",
        ];
        for input in inputs {
            assert_eq!(strip_color_tags(&markup().apply(input)), input);
        }
    }

    #[test]
    fn multibyte_lead_character_stays_outside_tag() {
        let colored = markup().apply("→+gain");
        assert_eq!(strip_color_tags(&colored), "→+gain");
        assert!(colored.starts_with("→<color="), "{colored}");
    }
}
