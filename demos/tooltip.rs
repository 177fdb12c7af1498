//! A demonstration of tooltip directions, color markup, and the tooltips preference.

use bevy::prelude::*;
use bevy::ui::Val::*;
use generic_tooltip::prelude::*;

fn main() -> AppExit {
    App::new()
        .add_plugins((DefaultPlugins, TooltipPlugin::default()))
        .add_systems(Startup, spawn_scene)
        .add_systems(Update, (highlight_hovered_tile, toggle_tooltips))
        .run()
}

fn spawn_scene(mut commands: Commands) {
    commands.spawn(Camera2d);
    commands.spawn((
        Name::new("GUI Main"),
        Node {
            width: Percent(100.0),
            height: Percent(100.0),
            align_items: AlignItems::Center,
            justify_content: JustifyContent::Center,
            column_gap: Px(96.0),
            ..default()
        },
        children![
            tile(
                GenericTooltip::new("Above", "Opens [above] the tile.")
                    .with_direction(TooltipDirection::Above)
            ),
            tile(
                GenericTooltip::new("Below", "Grants +Armor (2).")
                    .with_direction(TooltipDirection::Below)
            ),
            tile(
                GenericTooltip::new("Left", "Costs -Speed.")
                    .with_direction(TooltipDirection::Left)
            ),
            tile(
                GenericTooltip::new("Right", "Slow and detached.")
                    .with_direction(TooltipDirection::Right)
                    .with_timing(TooltipTiming {
                        wait_delay: 1.0,
                        fade_in: 0.5,
                        fade_out: 0.5,
                    })
                    .detached()
            ),
        ],
    ));
    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            bottom: Px(16.0),
            left: Px(16.0),
            ..default()
        },
        Text::new("Press T to toggle tooltips"),
    ));
}

fn tile(tooltip: GenericTooltip) -> impl Bundle {
    (
        Node {
            width: Px(64.0),
            height: Px(64.0),
            border: UiRect::all(Px(4.0)),
            ..default()
        },
        BackgroundColor(Color::WHITE),
        BorderColor::all(Color::BLACK),
        BorderRadius::all(Px(8.0)),
        tooltip,
    )
}

fn highlight_hovered_tile(
    mut tile_query: Query<(&Interaction, &mut BackgroundColor), With<GenericTooltip>>,
) {
    for (interaction, mut background_color) in &mut tile_query {
        background_color.0 = match interaction {
            Interaction::None => Color::NONE,
            _ => Color::WHITE,
        }
    }
}

fn toggle_tooltips(input: Res<ButtonInput<KeyCode>>, mut preferences: ResMut<Preferences>) {
    if input.just_pressed(KeyCode::KeyT) {
        let enabled = preferences.tooltips_enabled();
        preferences.set_tooltips_enabled(!enabled);
    }
}
