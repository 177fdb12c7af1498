use core::time::Duration;

use bevy_app::{App, PostUpdate, Update};
use bevy_camera::visibility::Visibility;
use bevy_color::Alpha as _;
#[cfg(feature = "bevy_reflect")]
use bevy_ecs::reflect::ReflectComponent;
use bevy_ecs::{
    change_detection::{DetectChanges as _, DetectChangesMut as _, Ref},
    component::Component,
    entity::Entity,
    hierarchy::{ChildOf, Children},
    message::{Message, MessageReader, MessageWriter},
    name::Name,
    prelude::RemovedComponents,
    query::With,
    schedule::IntoScheduleConfigs as _,
    system::{Commands, Query, Res, ResMut},
};
use bevy_text::{TextColor, TextSpan};
use bevy_time::{Real, Time};
use bevy_ui::{BackgroundColor, Interaction};
use tiny_bail::prelude::*;

use crate::{
    GenericTooltip, TooltipPrerequisite, TooltipSettings, TooltipSystems, TooltipTextProcessor,
    TooltipTrigger,
    markup::{ColorMarkup, compose},
    pool::{FadeAlpha, PANEL_OPACITY, PooledTooltip, TooltipPool, return_popup},
    preferences::Preferences,
    rich_text::RichText,
};

pub(super) fn plugin(app: &mut App) {
    app.add_message::<OpenTooltip>();
    app.add_message::<CloseTooltip>();
    app.add_message::<TooltipFadeIn>();
    app.add_systems(
        Update,
        (
            route_pointer_input.in_set(TooltipSystems::Input),
            (
                open_tooltip,
                close_tooltip,
                refresh_tooltip_text,
                tick_tooltip,
                return_removed_tooltip,
            )
                .chain()
                .in_set(TooltipSystems::Lifecycle),
        ),
    );
    app.add_systems(
        PostUpdate,
        apply_fade_alpha
            .after(TooltipSystems::Content)
            .before(TooltipSystems::Placement),
    );
}

/// A message that opens the tooltip on [`Self::target`].
///
/// Opening is suppressed while tooltips are disabled in [`Preferences`] or the tooltip is
/// [locked](GenericTooltip::locked).
#[derive(Message, Copy, Clone, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub struct OpenTooltip {
    /// The entity with the [`GenericTooltip`].
    pub target: Entity,
}

/// A message that closes the tooltip on [`Self::target`].
///
/// Closing is suppressed while the tooltip is [locked](GenericTooltip::locked).
///
/// Every [`OpenTooltip`] written in a frame is applied before any `CloseTooltip`, so if both are
/// written for the same target in one frame, the tooltip ends up closing.
#[derive(Message, Copy, Clone, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub struct CloseTooltip {
    /// The entity with the [`GenericTooltip`].
    pub target: Entity,
}

/// A message written when a tooltip begins its fade-in sequence, e.g. to play a sound.
#[derive(Message, Copy, Clone, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub struct TooltipFadeIn {
    /// The entity with the [`GenericTooltip`].
    pub target: Entity,
}

/// The runtime state of a [`GenericTooltip`].
///
/// Tracks the checked-out popup and the pending steps of the open / close sequence:
///
/// - Open: wait, then fade in.
/// - Close: wait, then fade out; return the popup once both have elapsed.
///
/// Opening cancels a pending fade-out and return, and closing cancels a pending fade-in.
#[derive(Component, Clone, Debug, Default)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
pub struct TooltipState {
    /// The checked-out popup, if the tooltip is visible or fading.
    instance: Option<Entity>,
    /// Whether the tooltip is between the start of its fade-in and the return of its popup.
    active: bool,
    /// Whether the target was hovered as of the last input check.
    hovered: bool,
    fade_in: Option<Delayed>,
    fade_out: Option<Delayed>,
    release: Option<Duration>,
    fade: CrossFade,
}

/// A fade that starts once `delay` has elapsed.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
struct Delayed {
    delay: Duration,
    duration: Duration,
}

impl TooltipState {
    /// The checked-out popup entity.
    pub fn instance(&self) -> Option<Entity> {
        self.instance
    }

    /// Whether the tooltip is fading in, shown, or fading out.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The current opacity of the tooltip, from 0 to 1.
    pub fn alpha(&self) -> f32 {
        self.fade.alpha
    }

    /// Begin showing `instance`: reset it to transparent and fade in after `wait_delay`.
    pub(crate) fn open(&mut self, instance: Entity, wait_delay: Duration, fade_in: Duration) {
        self.instance = Some(instance);
        self.active = true;
        self.fade.jump(0.0);
        self.fade_out = None;
        self.release = None;
        self.fade_in = Some(Delayed {
            delay: wait_delay,
            duration: fade_in,
        });
    }

    /// Begin hiding the popup: fade out after `wait_delay`, then release it.
    ///
    /// Returns `false` if there is no popup to hide.
    pub(crate) fn close(&mut self, wait_delay: Duration, fade_out: Duration) -> bool {
        if self.instance.is_none() {
            return false;
        }
        self.fade_in = None;
        self.fade_out = Some(Delayed {
            delay: wait_delay,
            duration: fade_out,
        });
        self.release = Some(wait_delay + fade_out);
        true
    }

    /// Advance the pending steps by `delta`, returning the popup if it should be released.
    pub(crate) fn tick(&mut self, delta: Duration) -> Option<Entity> {
        self.fade.tick(delta);
        // A fade that starts mid-frame only advances by the part of `delta` after its delay.
        if let Some((delayed, overshoot)) = tick_delayed(&mut self.fade_in, delta) {
            self.fade.start(1.0, delayed.duration);
            self.fade.tick(overshoot);
        }
        if let Some((delayed, overshoot)) = tick_delayed(&mut self.fade_out, delta) {
            self.fade.start(0.0, delayed.duration);
            self.fade.tick(overshoot);
        }

        let release = self.release.as_mut()?;
        *release = release.saturating_sub(delta);
        if release.is_zero() {
            self.release()
        } else {
            None
        }
    }

    /// Drop every pending step and give up the popup immediately.
    pub(crate) fn release(&mut self) -> Option<Entity> {
        self.fade_in = None;
        self.fade_out = None;
        self.release = None;
        self.active = false;
        self.fade.jump(0.0);
        self.instance.take()
    }
}

/// Count down a delayed fade, returning it along with the time left over in `delta` once it's due.
fn tick_delayed(delayed: &mut Option<Delayed>, delta: Duration) -> Option<(Delayed, Duration)> {
    let pending = delayed.as_mut()?;
    let overshoot = delta.saturating_sub(pending.delay);
    pending.delay = pending.delay.saturating_sub(delta);
    if pending.delay.is_zero() {
        delayed.take().map(|delayed| (delayed, overshoot))
    } else {
        None
    }
}

/// A linear interpolation of opacity over time.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
struct CrossFade {
    alpha: f32,
    from: f32,
    to: f32,
    elapsed: Duration,
    duration: Duration,
}

impl CrossFade {
    fn jump(&mut self, alpha: f32) {
        *self = Self {
            alpha,
            from: alpha,
            to: alpha,
            ..Default::default()
        };
    }

    fn start(&mut self, to: f32, duration: Duration) {
        *self = Self {
            alpha: self.alpha,
            from: self.alpha,
            to,
            elapsed: Duration::ZERO,
            duration,
        };
        if duration.is_zero() {
            self.alpha = to;
        }
    }

    fn tick(&mut self, delta: Duration) {
        if self.alpha == self.to {
            return;
        }
        self.elapsed = (self.elapsed + delta).min(self.duration);
        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.alpha = self.from + (self.to - self.from) * t;
    }
}

fn route_pointer_input(
    mut open_tooltip: MessageWriter<OpenTooltip>,
    mut close_tooltip: MessageWriter<CloseTooltip>,
    mut tooltip_query: Query<(
        Entity,
        &GenericTooltip,
        &mut TooltipState,
        &Interaction,
        Option<&TooltipPrerequisite>,
    )>,
) {
    for (target, tooltip, mut state, interaction, prerequisite) in &mut tooltip_query {
        let hovered = !matches!(interaction, Interaction::None);
        let was_hovered = state.hovered;
        if hovered != was_hovered {
            state.hovered = hovered;
        }
        let can_open = || prerequisite.is_none_or(|prerequisite| prerequisite.check());

        match (tooltip.trigger, was_hovered, hovered) {
            (TooltipTrigger::Manual, ..) => {}
            (_, false, true) => {
                if can_open() {
                    open_tooltip.write(OpenTooltip { target });
                }
            }
            (_, true, false) => {
                close_tooltip.write(CloseTooltip { target });
            }
            // Reopen if the popup was lost while still hovering.
            (TooltipTrigger::Hover, true, true) => {
                if state.instance.is_none() && can_open() {
                    open_tooltip.write(OpenTooltip { target });
                }
            }
            _ => {}
        }
    }
}

fn open_tooltip(
    mut commands: Commands,
    mut open_tooltip: MessageReader<OpenTooltip>,
    mut fade_in: MessageWriter<TooltipFadeIn>,
    preferences: Res<Preferences>,
    settings: Res<TooltipSettings>,
    markup: Res<ColorMarkup>,
    mut pool: ResMut<TooltipPool>,
    name_query: Query<(Entity, &Name)>,
    parent_query: Query<&ChildOf>,
    mut tooltip_query: Query<(
        &GenericTooltip,
        &mut TooltipState,
        Option<&TooltipTextProcessor>,
    )>,
    mut popup_query: Query<(&mut PooledTooltip, &mut Visibility)>,
    mut text_query: Query<&mut RichText>,
) {
    for &OpenTooltip { target } in open_tooltip.read() {
        cq!(preferences.tooltips_enabled());
        let (tooltip, mut state, processor) = c!(tooltip_query.get_mut(target));
        cq!(!tooltip.locked);

        // The popup may have been despawned while checked out, e.g. along with its parent.
        if state
            .instance
            .is_some_and(|popup| !popup_query.contains(popup))
        {
            state.release();
        }
        let popup = match state.instance {
            Some(popup) => popup,
            None => cq!(pool.acquire()),
        };
        let (mut pooled, mut visibility) = c!(popup_query.get_mut(popup));
        let mut text = c!(text_query.get_mut(pooled.text));

        // Parent the popup.
        let parent = if tooltip.set_parent {
            target
        } else {
            name_query
                .iter()
                .find(|(_, name)| name.as_str() == settings.overlay_root)
                .map(|(entity, _)| entity)
                .unwrap_or_else(|| parent_query.root_ancestor(target))
        };
        commands.entity(popup).insert(ChildOf(parent));
        pooled.owner = Some(target);
        *visibility = Visibility::Inherited;

        // Render content.
        *text = render_text(tooltip, processor, &markup, &settings);

        let timing = tooltip.timing.unwrap_or(settings.timing);
        state.open(popup, timing.wait_delay(), timing.fade_in());
        fade_in.write(TooltipFadeIn { target });
    }
}

fn close_tooltip(
    mut close_tooltip: MessageReader<CloseTooltip>,
    settings: Res<TooltipSettings>,
    mut tooltip_query: Query<(&GenericTooltip, &mut TooltipState)>,
) {
    for &CloseTooltip { target } in close_tooltip.read() {
        let (tooltip, mut state) = c!(tooltip_query.get_mut(target));
        cq!(!tooltip.locked);

        let timing = tooltip.timing.unwrap_or(settings.timing);
        state.close(timing.wait_delay(), timing.fade_out());
    }
}

/// Re-render the text of open tooltips that changed, and of hovered [`TooltipTrigger::Hover`]
/// tooltips every frame so a [`TooltipTextProcessor`] can show live values.
fn refresh_tooltip_text(
    settings: Res<TooltipSettings>,
    markup: Res<ColorMarkup>,
    tooltip_query: Query<(
        Ref<GenericTooltip>,
        &TooltipState,
        Option<&TooltipTextProcessor>,
    )>,
    popup_query: Query<&PooledTooltip>,
    mut text_query: Query<&mut RichText>,
) {
    for (tooltip, state, processor) in &tooltip_query {
        let live = tooltip.trigger == TooltipTrigger::Hover && state.hovered;
        cq!(tooltip.is_changed() || live);
        let popup = cq!(state.instance);
        let pooled = c!(popup_query.get(popup));
        let mut text = c!(text_query.get_mut(pooled.text));
        text.set_if_neq(render_text(&tooltip, processor, &markup, &settings));
    }
}

fn render_text(
    tooltip: &GenericTooltip,
    processor: Option<&TooltipTextProcessor>,
    markup: &ColorMarkup,
    settings: &TooltipSettings,
) -> RichText {
    let mut value = markup.apply(&compose(&tooltip.title, &tooltip.text));
    if let Some(processor) = processor {
        value = processor.process(value);
    }
    RichText::from_markup(&value, &settings.text_style)
}

fn tick_tooltip(
    mut commands: Commands,
    time: Res<Time<Real>>,
    mut pool: ResMut<TooltipPool>,
    mut tooltip_query: Query<&mut TooltipState>,
    mut popup_query: Query<(&mut PooledTooltip, &mut Visibility, &mut FadeAlpha)>,
) {
    for mut state in &mut tooltip_query {
        let popup = cq!(state.instance);
        let Ok((mut pooled, mut visibility, mut alpha)) = popup_query.get_mut(popup) else {
            // The popup was despawned while checked out.
            state.release();
            continue;
        };
        let released = state.tick(time.delta());
        alpha.0 = state.alpha();

        if released.is_some() {
            return_popup(
                &mut commands,
                &mut pool,
                popup,
                &mut pooled,
                &mut visibility,
                &mut alpha,
            );
        }
    }
}

fn return_removed_tooltip(
    mut commands: Commands,
    mut removed: RemovedComponents<GenericTooltip>,
    mut pool: ResMut<TooltipPool>,
    mut state_query: Query<&mut TooltipState>,
    mut popup_query: Query<(Entity, &mut PooledTooltip, &mut Visibility, &mut FadeAlpha)>,
) {
    let removed = removed.read().collect::<Vec<_>>();
    rq!(!removed.is_empty());

    for target in &removed {
        if let Ok(mut state) = state_query.get_mut(*target) {
            state.release();
        }
    }

    // Return immediately, bypassing the fade out.
    for (popup, mut pooled, mut visibility, mut alpha) in &mut popup_query {
        cq!(pooled.owner.is_some_and(|owner| removed.contains(&owner)));
        return_popup(
            &mut commands,
            &mut pool,
            popup,
            &mut pooled,
            &mut visibility,
            &mut alpha,
        );
    }
}

fn apply_fade_alpha(
    settings: Res<TooltipSettings>,
    mut popup_query: Query<(&PooledTooltip, &FadeAlpha, &mut BackgroundColor)>,
    children_query: Query<&Children>,
    mut span_query: Query<&mut TextColor, With<TextSpan>>,
) {
    for (pooled, alpha, mut background) in &mut popup_query {
        let panel_alpha = settings.panel_color.alpha() * PANEL_OPACITY * alpha.0;
        let panel = settings.panel_color.with_alpha(panel_alpha);
        if background.0 != panel {
            background.0 = panel;
        }

        for &span in children_query.get(pooled.text).into_iter().flatten() {
            let mut color = cq!(span_query.get_mut(span));
            if color.0.alpha() != alpha.0 {
                color.0.set_alpha(alpha.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy_ecs::world::World;

    use super::*;

    const WAIT: Duration = Duration::from_millis(200);
    const FADE_IN: Duration = Duration::from_millis(100);
    const FADE_OUT: Duration = Duration::from_millis(300);
    const STEP: Duration = Duration::from_millis(50);

    fn popup() -> Entity {
        World::new().spawn_empty().id()
    }

    fn tick_for(state: &mut TooltipState, total: Duration) -> Vec<Entity> {
        let mut released = Vec::new();
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            released.extend(state.tick(STEP));
            elapsed += STEP;
        }
        released
    }

    #[test]
    fn open_fades_in_after_wait_delay() {
        let mut state = TooltipState::default();
        state.open(popup(), WAIT, FADE_IN);
        assert!(state.is_active());
        assert_eq!(state.alpha(), 0.0);

        tick_for(&mut state, WAIT);
        assert_eq!(state.alpha(), 0.0);

        state.tick(STEP);
        assert!((state.alpha() - 0.5).abs() < 1e-4);

        tick_for(&mut state, FADE_IN);
        assert_eq!(state.alpha(), 1.0);
        assert!(state.instance().is_some());
    }

    #[test]
    fn open_then_close_releases_exactly_once() {
        let popup = popup();
        let mut state = TooltipState::default();
        state.open(popup, WAIT, FADE_IN);
        assert!(state.close(WAIT, FADE_OUT));

        let released = tick_for(&mut state, WAIT + FADE_OUT + Duration::from_secs(1));
        assert_eq!(released, vec![popup]);
        assert!(!state.is_active());
        assert_eq!(state.instance(), None);
        assert_eq!(state.alpha(), 0.0);
    }

    #[test]
    fn close_cancels_pending_fade_in() {
        let mut state = TooltipState::default();
        state.open(popup(), WAIT, FADE_IN);
        state.close(WAIT, FADE_OUT);

        tick_for(&mut state, WAIT + FADE_IN);
        assert_eq!(state.alpha(), 0.0);
        assert!(state.is_active());
    }

    #[test]
    fn fade_out_starts_from_current_alpha() {
        let mut state = TooltipState::default();
        state.open(popup(), Duration::ZERO, Duration::ZERO);
        state.tick(STEP);
        assert_eq!(state.alpha(), 1.0);

        state.close(Duration::ZERO, Duration::from_millis(100));
        state.tick(STEP);
        assert!((state.alpha() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn reopen_while_closing_keeps_popup() {
        let popup = popup();
        let mut state = TooltipState::default();
        state.open(popup, WAIT, FADE_IN);
        state.close(WAIT, FADE_OUT);
        tick_for(&mut state, WAIT);

        state.open(popup, WAIT, FADE_IN);
        let released = tick_for(&mut state, Duration::from_secs(2));
        assert!(released.is_empty());
        assert_eq!(state.instance(), Some(popup));
        assert_eq!(state.alpha(), 1.0);
    }

    #[test]
    fn close_without_popup_is_ignored() {
        let mut state = TooltipState::default();
        assert!(!state.close(WAIT, FADE_OUT));
        assert!(tick_for(&mut state, Duration::from_secs(1)).is_empty());
        assert!(!state.is_active());
    }

    #[test]
    fn release_bypasses_fade() {
        let popup = popup();
        let mut state = TooltipState::default();
        state.open(popup, WAIT, FADE_IN);
        tick_for(&mut state, WAIT + FADE_IN);

        assert_eq!(state.release(), Some(popup));
        assert_eq!(state.release(), None);
        assert!(!state.is_active());
        assert!(tick_for(&mut state, Duration::from_secs(1)).is_empty());
    }
}
