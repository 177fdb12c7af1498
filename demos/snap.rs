//! A demonstration of snapping to the nearest node.
//!
//! Move the square with the arrow keys, and press space to snap it.

use bevy::prelude::*;
use generic_tooltip::prelude::*;

fn main() -> AppExit {
    App::new()
        .add_plugins((DefaultPlugins, SnapPlugin))
        .add_systems(Startup, spawn_scene)
        .add_systems(Update, (move_snapper, color_placement))
        .run()
}

#[derive(Component)]
struct Player;

fn spawn_scene(mut commands: Commands) {
    commands.spawn((Camera2d, Transform::from_scale(Vec3::splat(1.0 / 32.0))));
    for x in -3..=3 {
        for y in -2..=2 {
            commands.spawn((
                SnapNode,
                Sprite::from_color(Color::srgb(0.4, 0.4, 0.4), Vec2::splat(0.2)),
                Transform::from_xyz(x as f32 * 3.0, y as f32 * 3.0, 0.0),
            ));
        }
    }
    commands.spawn((
        Player,
        NodeSnapper::default(),
        Placement::default(),
        Sprite::from_color(Color::WHITE, Vec2::splat(0.8)),
        Transform::from_xyz(0.0, 0.0, 1.0),
    ));
}

fn move_snapper(
    time: Res<Time>,
    input: Res<ButtonInput<KeyCode>>,
    mut snap: MessageWriter<Snap>,
    mut player_query: Query<(Entity, &mut Transform), With<Player>>,
) {
    let Ok((entity, mut transform)) = player_query.single_mut() else {
        return;
    };

    let mut direction = Vec2::ZERO;
    for (key, step) in [
        (KeyCode::ArrowLeft, Vec2::NEG_X),
        (KeyCode::ArrowRight, Vec2::X),
        (KeyCode::ArrowDown, Vec2::NEG_Y),
        (KeyCode::ArrowUp, Vec2::Y),
    ] {
        if input.pressed(key) {
            direction += step;
        }
    }
    transform.translation += (direction * 4.0 * time.delta_secs()).extend(0.0);

    if input.just_pressed(KeyCode::Space) {
        snap.write(Snap { entity });
    }
}

fn color_placement(mut player_query: Query<(&Placement, &mut Sprite), Changed<Placement>>) {
    for (placement, mut sprite) in &mut player_query {
        sprite.color = if placement.is_connected() {
            Color::srgb(0.3, 0.9, 0.4)
        } else {
            Color::WHITE
        };
    }
}
