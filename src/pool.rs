use bevy_app::{App, PreUpdate, Startup};
use bevy_camera::visibility::Visibility;
use bevy_color::{Alpha as _, Color};
#[cfg(feature = "bevy_reflect")]
use bevy_ecs::reflect::{ReflectComponent, ReflectResource};
use bevy_ecs::{
    component::Component,
    entity::Entity,
    hierarchy::ChildOf,
    name::Name,
    query::With,
    resource::Resource,
    schedule::IntoScheduleConfigs as _,
    system::{Commands, Query, Res, ResMut},
};
use bevy_log::{debug, warn};
use bevy_ui::{BackgroundColor, FocusPolicy, GlobalZIndex, Node, PositionType, UiRect, Val};

use crate::{TooltipSettings, TooltipSystems, rich_text::RichText};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, fill_tooltip_pool);
    app.add_systems(
        PreUpdate,
        fill_tooltip_pool.in_set(TooltipSystems::Input),
    );
}

/// A [`Resource`] that holds a fixed number of reusable tooltip popups.
///
/// Popups are spawned up front and checked out on open, then checked back in once they have faded
/// out. If a checked-out popup is despawned (e.g. along with the target it was parented to), a
/// replacement is spawned so the pool stays at capacity.
#[derive(Resource, Clone, Debug, Default)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Resource)
)]
pub struct TooltipPool {
    capacity: usize,
    free: Vec<Entity>,
    checked_out: Vec<Entity>,
}

impl TooltipPool {
    /// Create an empty pool that will be filled up to `capacity` popups.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            free: Vec::with_capacity(capacity),
            checked_out: Vec::with_capacity(capacity),
        }
    }

    /// The maximum number of popups in this pool.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of popups ready to be checked out.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// The number of popups currently checked out.
    pub fn checked_out(&self) -> usize {
        self.checked_out.len()
    }

    /// Whether the given popup is currently checked out.
    pub fn is_checked_out(&self, entity: Entity) -> bool {
        self.checked_out.contains(&entity)
    }

    /// Check out a popup, or `None` if every popup is in use.
    pub fn acquire(&mut self) -> Option<Entity> {
        let Some(entity) = self.free.pop() else {
            warn!(
                "All {} tooltip popups are in use, consider a larger pool",
                self.capacity,
            );
            return None;
        };
        self.checked_out.push(entity);
        debug!("Checked out tooltip popup {entity}");
        Some(entity)
    }

    /// Check a popup back in.
    ///
    /// Returns `false` if the popup wasn't checked out, so returning the same popup twice only has an
    /// effect once.
    pub fn release(&mut self, entity: Entity) -> bool {
        let Some(index) = self.checked_out.iter().position(|&x| x == entity) else {
            return false;
        };
        self.checked_out.swap_remove(index);
        self.free.push(entity);
        debug!("Returned tooltip popup {entity}");
        true
    }

    fn insert(&mut self, entity: Entity) {
        self.free.push(entity);
    }

    fn retain(&mut self, mut is_live: impl FnMut(Entity) -> bool) {
        self.free.retain(|&entity| is_live(entity));
        self.checked_out.retain(|&entity| is_live(entity));
    }

    fn missing(&self) -> usize {
        self.capacity
            .saturating_sub(self.free.len() + self.checked_out.len())
    }
}

/// A pooled tooltip popup.
///
/// The entity holding this component is the popup's panel, and [`Self::text`] is its text child.
#[derive(Component, Clone, Debug)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
pub struct PooledTooltip {
    /// The [`Entity`] ID of the UI node holding the popup's [`RichText`].
    pub text: Entity,
    /// The tooltip target that currently has this popup checked out.
    pub owner: Option<Entity>,
}

/// The current opacity of a pooled popup, from 0 (transparent) to 1 (opaque).
///
/// The panel is drawn at [`PANEL_OPACITY`] times this value, and the text at this value.
#[derive(Component, Copy, Clone, Debug, Default)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
pub struct FadeAlpha(pub f32);

/// The panel's opacity when a popup is fully faded in.
pub const PANEL_OPACITY: f32 = 0.75;

fn fill_tooltip_pool(
    mut commands: Commands,
    mut pool: ResMut<TooltipPool>,
    settings: Res<TooltipSettings>,
    live_query: Query<(), With<PooledTooltip>>,
) {
    pool.retain(|entity| live_query.contains(entity));
    for _ in 0..pool.missing() {
        let entity = spawn_popup(&mut commands, settings.panel_color);
        pool.insert(entity);
    }
}

fn spawn_popup(commands: &mut Commands, panel_color: Color) -> Entity {
    let container = commands
        .spawn((
            Name::new("GenericTooltip"),
            Node {
                position_type: PositionType::Absolute,
                max_width: Val::Px(320.0),
                padding: UiRect::all(Val::Px(8.0)),
                ..Default::default()
            },
            BackgroundColor(panel_color.with_alpha(0.0)),
            FocusPolicy::Pass,
            Visibility::Hidden,
            GlobalZIndex(999),
            FadeAlpha(0.0),
        ))
        .id();
    let text = commands
        .spawn((
            Name::new("Text"),
            RichText::default(),
            FocusPolicy::Pass,
            ChildOf(container),
        ))
        .id();
    commands.entity(container).insert(PooledTooltip { text, owner: None });
    container
}

/// Hide a checked-out popup and check it back into the pool.
pub(crate) fn return_popup(
    commands: &mut Commands,
    pool: &mut TooltipPool,
    entity: Entity,
    pooled: &mut PooledTooltip,
    visibility: &mut Visibility,
    alpha: &mut FadeAlpha,
) {
    if !pool.release(entity) {
        return;
    }
    pooled.owner = None;
    *visibility = Visibility::Hidden;
    alpha.0 = 0.0;
    commands.entity(entity).remove::<ChildOf>();
}
