//! Snap placeable entities to the nearest anchor node.

use bevy_app::{App, Plugin, Update};
#[cfg(feature = "bevy_reflect")]
use bevy_ecs::reflect::ReflectComponent;
use bevy_ecs::{
    component::Component,
    entity::Entity,
    message::{Message, MessageReader, MessageWriter},
    query::With,
    schedule::{IntoScheduleConfigs as _, common_conditions::on_message},
    system::Query,
};
use bevy_log::debug;
use bevy_math::Vec3;
use bevy_transform::components::{GlobalTransform, Transform};
use tiny_bail::prelude::*;

/// The distance within which an entity will snap to an anchor node.
pub const SNAP_DISTANCE: f32 = 2.0;

/// A plugin that snaps [`NodeSnapper`] entities to [`SnapNode`]s on [`Snap`].
pub struct SnapPlugin;

impl Plugin for SnapPlugin {
    fn build(&self, app: &mut App) {
        #[cfg(feature = "bevy_reflect")]
        app.register_type::<SnapNode>()
            .register_type::<NodeSnapper>()
            .register_type::<Placement>();
        app.add_message::<Snap>();
        app.add_message::<PlacementChanged>();
        app.add_systems(Update, snap_to_node.run_if(on_message::<Snap>));
    }
}

/// Marks an entity as an anchor that [`NodeSnapper`]s can snap to.
#[derive(Component, Copy, Clone, Debug, Default)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
#[require(Transform)]
pub struct SnapNode;

/// An entity that snaps to the nearest [`SnapNode`] when it receives a [`Snap`].
#[derive(Component, Copy, Clone, Debug, Default)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
#[require(Transform)]
pub struct NodeSnapper {
    /// The entity with the [`Placement`] to connect, or this entity if `None`.
    pub placement: Option<Entity>,
    current_node: Option<Entity>,
}

impl NodeSnapper {
    /// Use the [`Placement`] on another entity.
    pub fn with_placement(placement: Entity) -> Self {
        Self {
            placement: Some(placement),
            current_node: None,
        }
    }

    /// The node this entity is snapped to, if its placement is connected.
    pub fn current_node(&self) -> Option<Entity> {
        self.current_node
    }
}

/// Whether a placeable entity is connected to an anchor node.
#[derive(Component, Copy, Clone, Debug, Default)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
pub struct Placement {
    connected: bool,
}

impl Placement {
    /// Whether this placement is connected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Connect this placement, returning `false` if it was already connected.
    pub fn connect(&mut self) -> bool {
        !core::mem::replace(&mut self.connected, true)
    }

    /// Disconnect this placement, returning `false` if it was already disconnected.
    pub fn disconnect(&mut self) -> bool {
        core::mem::replace(&mut self.connected, false)
    }
}

/// A message that snaps [`Self::entity`] to the nearest [`SnapNode`].
#[derive(Message, Copy, Clone, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub struct Snap {
    /// The entity with the [`NodeSnapper`].
    pub entity: Entity,
}

/// A message written when a [`Placement`] connects, disconnects, or moves to another node.
#[derive(Message, Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub struct PlacementChanged {
    /// The entity with the [`Placement`].
    pub placement: Entity,
    /// The node it is now connected to, or `None` if it was disconnected.
    pub node: Option<Entity>,
}

/// Find the nearest node strictly within [`SNAP_DISTANCE`] of `position`.
///
/// Ties go to the node that comes first.
pub fn nearest_node(
    position: Vec3,
    nodes: impl IntoIterator<Item = (Entity, Vec3)>,
) -> Option<(Entity, Vec3)> {
    let mut nearest = None;
    let mut nearest_distance = SNAP_DISTANCE;
    for (node, node_position) in nodes {
        let distance = position.distance(node_position);
        if distance < nearest_distance {
            nearest_distance = distance;
            nearest = Some((node, node_position));
        }
    }
    nearest
}

fn snap_to_node(
    mut snap: MessageReader<Snap>,
    mut placement_changed: MessageWriter<PlacementChanged>,
    node_query: Query<(Entity, &GlobalTransform), With<SnapNode>>,
    mut snapper_query: Query<(&mut NodeSnapper, &mut Transform)>,
    mut placement_query: Query<&mut Placement>,
) {
    for &Snap { entity } in snap.read() {
        let (mut snapper, mut transform) = c!(snapper_query.get_mut(entity));
        let placement_entity = snapper.placement.unwrap_or(entity);
        let mut placement = c!(placement_query.get_mut(placement_entity));

        let nearest = nearest_node(
            transform.translation,
            node_query
                .iter()
                .map(|(node, gt)| (node, gt.translation())),
        );
        let old_node = snapper.current_node;
        let changed = if let Some((node, position)) = nearest {
            // Keep the current depth.
            transform.translation.x = position.x;
            transform.translation.y = position.y;
            snapper.current_node = Some(node);
            placement.connect() || old_node != Some(node)
        } else {
            snapper.current_node = None;
            placement.disconnect()
        };

        if changed {
            debug!("Snapped {entity} to {:?}", snapper.current_node);
            placement_changed.write(PlacementChanged {
                placement: placement_entity,
                node: snapper.current_node,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy_ecs::{message::Messages, world::World};

    use super::*;

    fn entities(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    #[test]
    fn nearest_within_threshold_wins() {
        let e = entities(3);
        let nodes = [
            (e[0], Vec3::new(1.5, 0.0, 0.0)),
            (e[1], Vec3::new(0.5, 0.5, 0.0)),
            (e[2], Vec3::new(0.1, 0.0, 5.0)),
        ];
        assert_eq!(
            nearest_node(Vec3::ZERO, nodes),
            Some((e[1], Vec3::new(0.5, 0.5, 0.0))),
        );
    }

    #[test]
    fn threshold_is_exclusive() {
        let e = entities(1);
        assert_eq!(nearest_node(Vec3::ZERO, [(e[0], Vec3::X * 2.0)]), None);
        assert_eq!(nearest_node(Vec3::ZERO, []), None);
    }

    #[test]
    fn first_node_wins_ties() {
        let e = entities(2);
        let nodes = [(e[0], Vec3::X), (e[1], Vec3::NEG_X)];
        assert_eq!(nearest_node(Vec3::ZERO, nodes), Some((e[0], Vec3::X)));
    }

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(SnapPlugin);
        app
    }

    fn spawn_node(app: &mut App, position: Vec3) -> Entity {
        app.world_mut()
            .spawn((
                SnapNode,
                Transform::from_translation(position),
                GlobalTransform::from_translation(position),
            ))
            .id()
    }

    fn snap(app: &mut App, entity: Entity) -> Vec<PlacementChanged> {
        app.world_mut().write_message(Snap { entity });
        app.update();
        app.world_mut()
            .resource_mut::<Messages<PlacementChanged>>()
            .drain()
            .collect()
    }

    #[test]
    fn snap_moves_xy_and_connects() {
        let mut app = app();
        let _far = spawn_node(&mut app, Vec3::new(10.0, 0.0, 0.0));
        let near = spawn_node(&mut app, Vec3::new(1.0, 1.0, 0.0));
        let entity = app
            .world_mut()
            .spawn((
                NodeSnapper::default(),
                Placement::default(),
                Transform::from_xyz(0.5, 0.5, 1.0),
            ))
            .id();

        let changes = snap(&mut app, entity);
        assert_eq!(
            changes,
            vec![PlacementChanged {
                placement: entity,
                node: Some(near),
            }],
        );

        let world = app.world();
        assert_eq!(
            world.get::<Transform>(entity).unwrap().translation,
            Vec3::new(1.0, 1.0, 1.0),
        );
        assert!(world.get::<Placement>(entity).unwrap().is_connected());
        assert_eq!(
            world.get::<NodeSnapper>(entity).unwrap().current_node(),
            Some(near),
        );

        // Snapping again to the same node changes nothing.
        assert!(snap(&mut app, entity).is_empty());
    }

    #[test]
    fn snap_out_of_range_disconnects() {
        let mut app = app();
        spawn_node(&mut app, Vec3::ZERO);
        let placement = app.world_mut().spawn(Placement::default()).id();
        let entity = app
            .world_mut()
            .spawn((
                NodeSnapper::with_placement(placement),
                Transform::from_xyz(0.5, 0.0, 0.0),
            ))
            .id();

        snap(&mut app, entity);
        assert!(app.world().get::<Placement>(placement).unwrap().is_connected());

        app.world_mut()
            .get_mut::<Transform>(entity)
            .unwrap()
            .translation = Vec3::new(5.0, 0.0, 0.0);
        let changes = snap(&mut app, entity);
        assert_eq!(
            changes,
            vec![PlacementChanged {
                placement,
                node: None,
            }],
        );

        let world = app.world();
        assert!(!world.get::<Placement>(placement).unwrap().is_connected());
        assert_eq!(world.get::<NodeSnapper>(entity).unwrap().current_node(), None);
        assert_eq!(
            world.get::<Transform>(entity).unwrap().translation,
            Vec3::new(5.0, 0.0, 0.0),
        );
    }
}
