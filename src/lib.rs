//! Pooled, fading tooltips for Bevy UI, plus snapping of placeable entities to anchor nodes.
//!
//! Add [`TooltipPlugin`] to your app and a [`GenericTooltip`] to any UI node. Hovering the node
//! checks a popup out of the [`TooltipPool`], places it next to the node, and fades it in.
//! Tooltip text is colored automatically by [`ColorMarkup`](markup::ColorMarkup).
//!
//! See [`snap`] for the unrelated [`SnapPlugin`](snap::SnapPlugin).

/// Re-exports for the most commonly used types.
pub mod prelude {
    pub use super::{
        CloseTooltip, GenericTooltip, OpenTooltip, TooltipDirection, TooltipFadeIn, TooltipPlugin,
        TooltipPrerequisite, TooltipSettings, TooltipSystems, TooltipTextProcessor, TooltipTiming,
        TooltipTrigger,
        preferences::Preferences,
        rich_text::{RichText, TextSection, TextStyle},
        snap::{NodeSnapper, Placement, PlacementChanged, Snap, SnapNode, SnapPlugin},
    };
}

mod lifecycle;
pub mod markup;
pub mod palette;
mod placement;
mod pool;
pub mod preferences;
pub mod rich_text;
pub mod snap;

pub use lifecycle::{CloseTooltip, OpenTooltip, TooltipFadeIn, TooltipState};
pub use placement::TooltipDirection;
pub use pool::{FadeAlpha, PANEL_OPACITY, PooledTooltip, TooltipPool};

use core::time::Duration;

use bevy_app::{App, Plugin, PostUpdate, Update};
use bevy_color::Color;
#[cfg(feature = "bevy_reflect")]
use bevy_ecs::reflect::{ReflectComponent, ReflectResource};
use bevy_ecs::{
    component::Component,
    resource::Resource,
    schedule::{IntoScheduleConfigs as _, SystemSet},
};
use bevy_ui::{Interaction, UiSystems};

use crate::{
    markup::{ColorMarkup, MarkupColors},
    palette::Chroma,
    preferences::Preferences,
    rich_text::TextStyle,
};

/// A plugin that sets up the tooltip pool and systems.
pub struct TooltipPlugin {
    /// The number of popups to keep in the [`TooltipPool`].
    pub pool_size: usize,
    /// The default timing for tooltips that don't set their own.
    pub timing: TooltipTiming,
    /// The base style for tooltip text.
    pub text_style: TextStyle,
    /// The popup panel color at full opacity.
    pub panel_color: Color,
    /// The colors used by [`ColorMarkup`].
    pub markup_colors: MarkupColors,
    /// The name of the UI root that detached tooltips are parented to.
    pub overlay_root: String,
    /// Turn tooltips on in [`Preferences`] unless the user already chose otherwise.
    pub enable_tooltips: bool,
}

impl Default for TooltipPlugin {
    fn default() -> Self {
        Self {
            pool_size: 4,
            timing: TooltipTiming::DEFAULT,
            text_style: TextStyle::default(),
            panel_color: Chroma::Gray.shade(900).into(),
            markup_colors: MarkupColors::default(),
            overlay_root: "GUI Main".to_owned(),
            enable_tooltips: true,
        }
    }
}

impl Plugin for TooltipPlugin {
    fn build(&self, app: &mut App) {
        #[cfg(feature = "bevy_reflect")]
        app.register_type::<GenericTooltip>()
            .register_type::<TooltipState>()
            .register_type::<TooltipSettings>()
            .register_type::<TooltipPool>()
            .register_type::<PooledTooltip>()
            .register_type::<FadeAlpha>()
            .register_type::<Preferences>();

        app.configure_sets(
            Update,
            (TooltipSystems::Input, TooltipSystems::Lifecycle).chain(),
        );
        app.configure_sets(
            PostUpdate,
            TooltipSystems::Content.before(UiSystems::Layout),
        );

        app.insert_resource(TooltipSettings {
            timing: self.timing,
            text_style: self.text_style.clone(),
            panel_color: self.panel_color,
            overlay_root: self.overlay_root.clone(),
        });
        app.insert_resource(TooltipPool::new(self.pool_size));
        app.insert_resource(ColorMarkup::new(self.markup_colors));
        app.init_resource::<Preferences>();
        if self.enable_tooltips {
            let mut preferences = app.world_mut().resource_mut::<Preferences>();
            if !preferences.has_key(preferences::TOOLTIPS_KEY) {
                preferences.set_tooltips_enabled(true);
            }
        }

        app.add_plugins((
            pool::plugin,
            lifecycle::plugin,
            rich_text::plugin,
            placement::plugin,
        ));
    }
}

/// System sets for the tooltip systems.
#[derive(SystemSet, Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TooltipSystems {
    /// Refill the pool and translate [`Interaction`] into [`OpenTooltip`] / [`CloseTooltip`]
    /// (in `PreUpdate` and `Update`).
    Input,
    /// Open, close, fade, and return tooltips (in `Update`).
    Lifecycle,
    /// Sync tooltip text into UI text spans (in `PostUpdate`).
    Content,
    /// Position open tooltips after UI layout (in `PostUpdate`).
    Placement,
}

/// A [`Resource`] with the settings shared by every tooltip.
#[derive(Resource, Clone, Debug)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Resource)
)]
pub struct TooltipSettings {
    /// The default timing for tooltips that don't set their own.
    pub timing: TooltipTiming,
    /// The base style for tooltip text.
    pub text_style: TextStyle,
    /// The popup panel color at full opacity.
    pub panel_color: Color,
    /// The name of the UI root that detached tooltips are parented to.
    pub overlay_root: String,
}

/// How long a tooltip waits before fading, and how long each fade takes (in seconds).
///
/// The wait applies to both opening and closing. A closing tooltip returns its popup to the pool
/// after `wait_delay + fade_out`. Negative values count as zero.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub struct TooltipTiming {
    /// The delay before a fade begins.
    pub wait_delay: f32,
    /// The duration of the fade in.
    pub fade_in: f32,
    /// The duration of the fade out.
    pub fade_out: f32,
}

impl TooltipTiming {
    /// The default `TooltipTiming`.
    pub const DEFAULT: Self = Self {
        wait_delay: 0.3,
        fade_in: 0.15,
        fade_out: 0.15,
    };

    /// Show and hide without any delay or fade.
    pub const INSTANT: Self = Self {
        wait_delay: 0.0,
        fade_in: 0.0,
        fade_out: 0.0,
    };

    fn wait_delay(&self) -> Duration {
        seconds(self.wait_delay)
    }

    fn fade_in(&self) -> Duration {
        seconds(self.fade_in)
    }

    fn fade_out(&self) -> Duration {
        seconds(self.fade_out)
    }
}

impl Default for TooltipTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or_default()
}

/// How a tooltip reacts to its target's [`Interaction`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub enum TooltipTrigger {
    /// Open when the pointer enters the target, and close when it leaves.
    #[default]
    Pointer,
    /// Like [`Self::Pointer`], but also reopen every frame while hovered if the popup is gone, and
    /// re-render the text every frame while hovered.
    Hover,
    /// Ignore the pointer. Use [`OpenTooltip`] and [`CloseTooltip`] instead.
    Manual,
}

/// A [`Component`] that shows a pooled popup next to its UI node.
#[derive(Component, Clone, Debug)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
#[require(TooltipState, Interaction)]
pub struct GenericTooltip {
    /// The side of the target to show the popup on.
    pub direction: TooltipDirection,
    /// The gap between the target and the popup (in logical pixels).
    pub offset: f32,
    /// The title, shown larger above the text. Omitted if blank.
    pub title: String,
    /// The body text.
    pub text: String,
    /// Parent the popup to the target. Otherwise, parent it to the
    /// [overlay root](TooltipSettings::overlay_root), or to the target's root ancestor if there is
    /// no overlay root.
    ///
    /// Detaching is useful for targets inside layout containers that clip their children.
    pub set_parent: bool,
    /// How the tooltip reacts to the pointer.
    pub trigger: TooltipTrigger,
    /// Custom timing, or `None` to use [`TooltipSettings::timing`].
    pub timing: Option<TooltipTiming>,
    /// Ignore all open and close requests.
    pub locked: bool,
}

impl GenericTooltip {
    /// Show the given title and text to the left of the target.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            direction: TooltipDirection::Left,
            offset: 8.0,
            title: title.into(),
            text: text.into(),
            set_parent: true,
            trigger: TooltipTrigger::Pointer,
            timing: None,
            locked: false,
        }
    }

    /// Set a custom [`TooltipDirection`].
    pub fn with_direction(mut self, direction: TooltipDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Set a custom offset.
    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    /// Set a custom [`TooltipTrigger`].
    pub fn with_trigger(mut self, trigger: TooltipTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Set a custom [`TooltipTiming`].
    pub fn with_timing(mut self, timing: TooltipTiming) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Don't parent the popup to the target.
    pub fn detached(mut self) -> Self {
        self.set_parent = false;
        self
    }
}

/// A [`Component`] with a condition that must hold for the pointer to open a tooltip.
///
/// [`OpenTooltip`] messages written directly skip this check.
#[derive(Component)]
pub struct TooltipPrerequisite(Box<dyn Fn() -> bool + Send + Sync>);

impl TooltipPrerequisite {
    /// Use the given condition.
    pub fn new(condition: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self(Box::new(condition))
    }

    /// Evaluate the condition.
    pub fn check(&self) -> bool {
        (self.0)()
    }
}

/// A [`Component`] that post-processes tooltip markup after coloring, e.g. to substitute values.
#[derive(Component)]
pub struct TooltipTextProcessor(Box<dyn Fn(String) -> String + Send + Sync>);

impl TooltipTextProcessor {
    /// Use the given processing function.
    pub fn new(process: impl Fn(String) -> String + Send + Sync + 'static) -> Self {
        Self(Box::new(process))
    }

    /// Process the given markup.
    pub fn process(&self, markup: String) -> String {
        (self.0)(markup)
    }
}
