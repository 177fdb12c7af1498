#![allow(missing_docs)]

use bevy_app::{App, PostUpdate};
use bevy_asset::Handle;
use bevy_color::{Color, Srgba};
use bevy_ecs::{
    component::Component,
    entity::Entity,
    hierarchy::Children,
    query::{Changed, With},
    schedule::IntoScheduleConfigs as _,
    system::{Commands, Query},
};
use bevy_text::{Font, LineBreak, TextColor, TextFont, TextLayout, TextSpan};
use bevy_ui::widget::Text;

use crate::TooltipSystems;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        PostUpdate,
        sync_rich_text_spans.in_set(TooltipSystems::Content),
    );
}

fn sync_rich_text_spans(
    mut commands: Commands,
    rich_text_query: Query<(Entity, Option<&Children>, &RichText), Changed<RichText>>,
    text_span_query: Query<(), With<TextSpan>>,
) {
    for (entity, children, rich_text) in &rich_text_query {
        // Despawn old `TextSpan` children.
        for &child in children.into_iter().flatten() {
            if text_span_query.contains(child) {
                commands.entity(child).despawn();
            }
        }

        commands
            .entity(entity)
            .insert((
                Text::default(),
                TextLayout::new_with_linebreak(rich_text.linebreak_behavior),
            ))
            .with_children(|parent| {
                // Spawn new `TextSpan` children.
                for section in &rich_text.sections {
                    parent.spawn((
                        TextSpan(section.value.clone()),
                        TextColor(section.style.color),
                        TextFont {
                            font: section.style.font.clone(),
                            font_size: section.style.font_size,
                            ..Default::default()
                        },
                    ));
                }
            });
    }
}

/// A rich text string made of independently styled sections.
#[derive(Component, Clone, Default, PartialEq, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub struct RichText {
    pub sections: Vec<TextSection>,
    pub linebreak_behavior: LineBreak,
}

impl RichText {
    pub fn from_sections(sections: impl IntoIterator<Item = TextSection>) -> Self {
        Self {
            sections: sections.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Parse tooltip markup into sections, starting from the given base style.
    ///
    /// Recognizes `<size=N>`, `<color=#hex>`, and their closing tags. Tags that don't parse are
    /// kept as literal text, and a closing tag never pops the base style.
    pub fn from_markup(markup: &str, base: &TextStyle) -> Self {
        let mut sections = Vec::new();
        let mut styles = vec![base.clone()];
        let mut value = String::new();
        let mut rest = markup;

        while let Some(open) = rest.find('<') {
            value.push_str(&rest[..open]);
            rest = &rest[open..];

            let Some(close) = rest.find('>') else {
                break;
            };
            let tag = &rest[1..close];
            let top = styles.last().cloned().unwrap_or_else(|| base.clone());
            let next = match tag {
                "/size" | "/color" => Tag::Close,
                _ => match tag.split_once('=') {
                    Some(("size", size)) => size
                        .parse::<f32>()
                        .ok()
                        .filter(|size| size.is_finite() && *size > 0.0)
                        .map_or(Tag::Literal, |font_size| {
                            Tag::Open(TextStyle { font_size, ..top })
                        }),
                    Some(("color", hex)) => Srgba::hex(hex).map_or(Tag::Literal, |color| {
                        Tag::Open(TextStyle {
                            color: color.into(),
                            ..top
                        })
                    }),
                    _ => Tag::Literal,
                },
            };

            match next {
                Tag::Literal => {
                    value.push('<');
                    rest = &rest[1..];
                    continue;
                }
                Tag::Open(style) => {
                    flush(&mut sections, &mut value, &styles);
                    styles.push(style);
                }
                Tag::Close => {
                    flush(&mut sections, &mut value, &styles);
                    if styles.len() > 1 {
                        styles.pop();
                    }
                }
            }
            rest = &rest[close + 1..];
        }

        value.push_str(rest);
        flush(&mut sections, &mut value, &styles);
        Self::from_sections(sections)
    }

    /// The plain text of every section joined together.
    pub fn plain_text(&self) -> String {
        self.sections
            .iter()
            .map(|section| section.value.as_str())
            .collect()
    }
}

enum Tag {
    Open(TextStyle),
    Close,
    Literal,
}

fn flush(sections: &mut Vec<TextSection>, value: &mut String, styles: &[TextStyle]) {
    if value.is_empty() {
        return;
    }
    let Some(style) = styles.last() else {
        return;
    };
    sections.push(TextSection::new(core::mem::take(value), style.clone()));
}

/// A section of [`RichText`].
#[derive(Clone, Default, PartialEq, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub struct TextSection {
    pub value: String,
    pub style: TextStyle,
}

impl TextSection {
    pub fn new(value: impl Into<String>, style: TextStyle) -> Self {
        Self {
            value: value.into(),
            style,
        }
    }
}

/// The style of a [`TextSection`].
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub struct TextStyle {
    pub font: Handle<Font>,
    pub font_size: f32,
    pub color: Color,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: Default::default(),
            font_size: 14.0,
            color: Color::WHITE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(markup: &str) -> Vec<(String, f32, Srgba)> {
        RichText::from_markup(markup, &TextStyle::default())
            .sections
            .into_iter()
            .map(|section| {
                (
                    section.value,
                    section.style.font_size,
                    section.style.color.to_srgba(),
                )
            })
            .collect()
    }

    #[test]
    fn plain_text_is_one_section() {
        assert_eq!(
            parse("just text"),
            vec![("just text".to_owned(), 14.0, Srgba::WHITE)],
        );
    }

    #[test]
    fn title_and_colored_body() {
        let red = Srgba::rgb_u8(0xff, 0x00, 0x00);
        assert_eq!(
            parse("<size=16>Title</size>\nLose <color=#FF0000>-Speed</color>."),
            vec![
                ("Title".to_owned(), 16.0, Srgba::WHITE),
                ("\nLose ".to_owned(), 14.0, Srgba::WHITE),
                ("-Speed".to_owned(), 14.0, red),
                (".".to_owned(), 14.0, Srgba::WHITE),
            ],
        );
    }

    #[test]
    fn nested_tags_inherit_outer_style() {
        let sections = parse("<size=20><color=#00FF00>big green</color> big</size>");
        assert_eq!(sections[0].1, 20.0);
        assert_eq!(sections[0].2, Srgba::rgb_u8(0x00, 0xff, 0x00));
        assert_eq!(sections[1], (" big".to_owned(), 20.0, Srgba::WHITE));
    }

    #[test]
    fn malformed_tags_stay_literal() {
        let rich_text = RichText::from_markup(
            "a < b <size=huge> <color=nope> <b>c</b> <unclosed",
            &TextStyle::default(),
        );
        assert_eq!(rich_text.sections.len(), 1);
        assert_eq!(
            rich_text.plain_text(),
            "a < b <size=huge> <color=nope> <b>c</b> <unclosed",
        );
    }

    fn span_values(app: &App, entity: Entity) -> Vec<String> {
        let world = app.world();
        world
            .get::<Children>(entity)
            .into_iter()
            .flatten()
            .filter_map(|&child| world.get::<TextSpan>(child))
            .map(|span| span.0.clone())
            .collect()
    }

    #[test]
    fn sync_replaces_text_spans() {
        let mut app = App::new();
        app.add_plugins(plugin);
        let entity = app
            .world_mut()
            .spawn(RichText::from_markup(
                "Gain <color=#0000FF>+Armor</color>",
                &TextStyle::default(),
            ))
            .id();

        app.update();
        assert_eq!(span_values(&app, entity), ["Gain ", "+Armor"]);
        assert!(app.world().get::<Text>(entity).is_some());

        *app.world_mut().get_mut::<RichText>(entity).unwrap() =
            RichText::from_markup("Plain", &TextStyle::default());
        app.update();
        assert_eq!(span_values(&app, entity), ["Plain"]);
    }

    #[test]
    fn stray_closing_tags_keep_base_style() {
        assert_eq!(
            parse("</color>text</size>"),
            vec![("text".to_owned(), 14.0, Srgba::WHITE)],
        );
    }
}
