use bevy_app::{App, PostUpdate};
use bevy_ecs::{
    entity::Entity,
    hierarchy::ChildOf,
    query::With,
    schedule::IntoScheduleConfigs as _,
    system::Query,
};
use bevy_math::{Rect, Vec2};
use bevy_ui::{ComputedNode, Node, UiGlobalTransform, UiSystems, Val};
use tiny_bail::prelude::*;

use crate::{GenericTooltip, TooltipSystems, lifecycle::TooltipState, pool::PooledTooltip};

pub(super) fn plugin(app: &mut App) {
    app.configure_sets(
        PostUpdate,
        TooltipSystems::Placement.after(UiSystems::Layout),
    );
    app.add_systems(PostUpdate, place_tooltip.in_set(TooltipSystems::Placement));
}

/// The side of the target entity where the tooltip should appear.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub enum TooltipDirection {
    /// Centered horizontally above the target.
    Above,
    /// Centered horizontally below the target.
    Below,
    /// Centered vertically left of the target.
    #[default]
    Left,
    /// Centered vertically right of the target.
    Right,
}

impl TooltipDirection {
    /// The top-left corner of a tooltip of size `tooltip_size` placed next to `target` in this
    /// direction, `offset` away from the target's edge.
    ///
    /// Uses UI coordinates: +Y points down.
    pub fn tooltip_top_left(self, target: Rect, tooltip_size: Vec2, offset: f32) -> Vec2 {
        let center = target.center();
        match self {
            Self::Above => Vec2::new(
                center.x - tooltip_size.x / 2.0,
                target.min.y - offset - tooltip_size.y,
            ),
            Self::Below => Vec2::new(center.x - tooltip_size.x / 2.0, target.max.y + offset),
            Self::Left => Vec2::new(
                target.min.x - offset - tooltip_size.x,
                center.y - tooltip_size.y / 2.0,
            ),
            Self::Right => Vec2::new(target.max.x + offset, center.y - tooltip_size.y / 2.0),
        }
    }
}

fn place_tooltip(
    tooltip_query: Query<(Entity, &GenericTooltip, &TooltipState)>,
    node_query: Query<(&ComputedNode, &UiGlobalTransform)>,
    mut popup_query: Query<(&mut Node, &ComputedNode, Option<&ChildOf>), With<PooledTooltip>>,
) {
    for (target, tooltip, state) in &tooltip_query {
        let popup = cq!(state.instance());
        let (target_computed, target_gt) = c!(node_query.get(target));
        let (mut node, computed, child_of) = c!(popup_query.get_mut(popup));

        // `ComputedNode` and `UiGlobalTransform` are in physical pixels, but `Node` is logical.
        let inverse_scale_factor = computed.inverse_scale_factor();
        cq!(inverse_scale_factor > 0.0);
        let target_rect = Rect::from_center_size(target_gt.translation, target_computed.size());
        let top_left = tooltip.direction.tooltip_top_left(
            target_rect,
            computed.size(),
            tooltip.offset / inverse_scale_factor,
        );

        // `Node` positions are relative to the parent's padding box, inside its border.
        let origin = child_of
            .and_then(|child_of| node_query.get(child_of.parent()).ok())
            .map_or(Vec2::ZERO, |(parent_computed, parent_gt)| {
                let border = parent_computed.border();
                Rect::from_center_size(parent_gt.translation, parent_computed.size()).min
                    + Vec2::new(border.left, border.top)
            });
        let local = (top_left - origin) * inverse_scale_factor;

        // This system has to run after `UiSystems::Layout` so that the tooltip's size is
        // calculated from the updated text, so the new position only shows up on the next
        // frame. The popup is still transparent during its wait delay, which hides the jump.
        let (left, top) = (Val::Px(local.x), Val::Px(local.y));
        if node.left != left || node.top != top {
            node.left = left;
            node.top = top;
        }
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use bevy_app::Update;
    use bevy_math::Affine2;
    use bevy_ui::prelude::BorderRect;

    use super::*;

    const TARGET: Rect = Rect {
        min: Vec2::new(100.0, 100.0),
        max: Vec2::new(140.0, 120.0),
    };
    const SIZE: Vec2 = Vec2::new(60.0, 30.0);

    #[test]
    fn above_is_centered_over_top_edge() {
        assert_eq!(
            TooltipDirection::Above.tooltip_top_left(TARGET, SIZE, 4.0),
            Vec2::new(90.0, 66.0),
        );
    }

    #[test]
    fn below_is_centered_under_bottom_edge() {
        assert_eq!(
            TooltipDirection::Below.tooltip_top_left(TARGET, SIZE, 4.0),
            Vec2::new(90.0, 124.0),
        );
    }

    #[test]
    fn left_is_centered_beside_left_edge() {
        assert_eq!(
            TooltipDirection::Left.tooltip_top_left(TARGET, SIZE, 4.0),
            Vec2::new(36.0, 95.0),
        );
    }

    #[test]
    fn right_is_centered_beside_right_edge() {
        assert_eq!(
            TooltipDirection::Right.tooltip_top_left(TARGET, SIZE, 4.0),
            Vec2::new(144.0, 95.0),
        );
    }

    fn computed_node(size: Vec2, border: f32) -> ComputedNode {
        ComputedNode {
            size,
            border: BorderRect {
                left: border,
                right: border,
                top: border,
                bottom: border,
            },
            inverse_scale_factor: 1.0,
            ..Default::default()
        }
    }

    fn at(rect: Rect) -> UiGlobalTransform {
        UiGlobalTransform::from(Affine2::from_translation(rect.center()))
    }

    #[test]
    fn popup_is_placed_inside_bordered_parent() {
        let mut app = App::new();
        app.add_systems(Update, place_tooltip);
        let world = app.world_mut();

        let parent_rect = Rect::new(0.0, 0.0, 200.0, 200.0);
        let parent = world
            .spawn((computed_node(parent_rect.size(), 4.0), at(parent_rect)))
            .id();
        let popup = world
            .spawn((
                Node::default(),
                PooledTooltip {
                    text: parent,
                    owner: None,
                },
                computed_node(SIZE, 0.0),
                UiGlobalTransform::default(),
                ChildOf(parent),
            ))
            .id();
        let mut state = TooltipState::default();
        state.open(popup, Duration::ZERO, Duration::ZERO);
        let target = world
            .spawn((
                GenericTooltip::new("Title", "Body").with_direction(TooltipDirection::Left),
                state,
                computed_node(TARGET.size(), 0.0),
                at(TARGET),
                ChildOf(parent),
            ))
            .id();
        world.get_mut::<PooledTooltip>(popup).unwrap().owner = Some(target);

        app.update();
        // 8px left of the target, centered on it, minus the parent's 4px border.
        let node = app.world().get::<Node>(popup).unwrap();
        assert_eq!(node.left, Val::Px(100.0 - 8.0 - SIZE.x - 4.0));
        assert_eq!(node.top, Val::Px(110.0 - SIZE.y / 2.0 - 4.0));
    }

    #[test]
    fn zero_offset_touches_target() {
        let top_left = TooltipDirection::Above.tooltip_top_left(TARGET, SIZE, 0.0);
        assert_eq!(top_left.y + SIZE.y, TARGET.min.y);
    }
}
