//! Hierarchical overlay menus driven by polled keyboard input.
//!
//! The model (`Menu`, `MenuItem`, `MenuRegistry`) and the per-tick
//! `NavigationController` are plain data and can be driven by any host that
//! implements [`ControlInput`]. `MenuNavigationPlugin` hosts them as Bevy
//! resources and feeds them `ButtonInput<KeyCode>` and `Time<Real>` every `Update`.
use bevy::prelude::*;

mod controller;
mod events;
mod ids;
mod input;
mod item;
#[allow(clippy::module_inception)]
mod menu;
mod presenter;
mod registry;
mod repeat;
mod settings;
#[cfg(test)]
mod flow_tests;

pub use controller::{NavState, NavigationController, TickReport};
pub use events::MenuEvent;
pub use ids::{ItemId, MenuId};
pub use input::{Control, ControlBindings, ControlInput, HostGates, KeyboardControls};
pub use item::{CheckboxStyle, DynamicListCallback, ItemKind, ListDirection, MenuItem};
pub use menu::Menu;
pub use presenter::{AssetLifecycle, MenuPresenter, MenuRenderer};
pub use registry::{MenuObserver, MenuRegistry, SelectMode};
pub use repeat::{NavDirection, RepeatProfile, RepeatStage, RepeatTrack};
pub use settings::{validate_settings, MenuSettings, SettingsError, SettingsValidationError};

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum MenuSystem {
    Navigate,
    Present,
}

/// Outcome of the most recent navigation tick.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct LastMenuTick(pub TickReport);

/// Host drawing and asset hooks. Without this resource menus are still
/// navigable, just never drawn.
#[derive(Resource)]
pub struct MenuOverlay {
    pub renderer: Box<dyn MenuRenderer + Send + Sync>,
    pub assets: Box<dyn AssetLifecycle + Send + Sync>,
}

impl MenuOverlay {
    pub fn new(
        renderer: impl MenuRenderer + Send + Sync + 'static,
        assets: impl AssetLifecycle + Send + Sync + 'static,
    ) -> Self {
        Self {
            renderer: Box::new(renderer),
            assets: Box::new(assets),
        }
    }
}

pub struct MenuNavigationPlugin;

impl Plugin for MenuNavigationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<MenuRegistry>()
            .init_resource::<NavigationController>()
            .init_resource::<MenuPresenter>()
            .init_resource::<MenuSettings>()
            .init_resource::<ControlBindings>()
            .init_resource::<HostGates>()
            .init_resource::<LastMenuTick>()
            .configure_sets(Update, MenuSystem::Present.after(MenuSystem::Navigate))
            .add_systems(
                Update,
                (
                    navigate_menus.in_set(MenuSystem::Navigate),
                    present_menus.in_set(MenuSystem::Present),
                ),
            );
    }
}

/// Runs on real time so held keys keep repeating while the game clock is paused.
#[allow(clippy::too_many_arguments)]
pub fn navigate_menus(
    time: Res<Time<Real>>,
    keys: Res<ButtonInput<KeyCode>>,
    bindings: Res<ControlBindings>,
    gates: Res<HostGates>,
    settings: Res<MenuSettings>,
    mut registry: ResMut<MenuRegistry>,
    mut controller: ResMut<NavigationController>,
    mut last_tick: ResMut<LastMenuTick>,
) {
    let input = KeyboardControls::new(&keys, &bindings);
    let now_ms = u64::try_from(time.elapsed().as_millis()).unwrap_or(u64::MAX);
    let report = controller.tick(&mut registry, &input, &gates, &settings, now_ms);

    if report.state != last_tick.0.state {
        debug!("menu navigation {:?} -> {:?}", last_tick.0.state, report.state);
    }
    if let Some(direction) = report.step {
        trace!("menu step {direction:?} at {now_ms}ms");
    }
    last_tick.0 = report;
}

pub fn present_menus(
    mut presenter: ResMut<MenuPresenter>,
    mut registry: ResMut<MenuRegistry>,
    gates: Res<HostGates>,
    settings: Res<MenuSettings>,
    overlay: Option<ResMut<MenuOverlay>>,
) {
    let Some(mut overlay) = overlay else {
        return;
    };
    let overlay = &mut *overlay;
    presenter.present(
        &mut registry,
        &gates,
        &settings,
        overlay.renderer.as_mut(),
        overlay.assets.as_mut(),
    );
}
