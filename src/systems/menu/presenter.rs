use bevy::prelude::Resource;
use log::debug;

use super::{
    input::HostGates,
    item::MenuItem,
    menu::Menu,
    registry::MenuRegistry,
    settings::MenuSettings,
};

/// Draws the open menu. Called once per tick per visible entry.
pub trait MenuRenderer {
    fn draw_menu(&mut self, menu: &Menu, scroll_offset: usize);
    fn draw_item(&mut self, item: &MenuItem, scroll_offset: usize);
}

/// Loads whatever textures the renderer needs while the overlay is shown.
pub trait AssetLifecycle {
    fn load_assets(&mut self);
    fn unload_assets(&mut self);
}

/// Per-tick overlay driver: asset load/unload edges and draw dispatch.
#[derive(Resource, Debug, Default)]
pub struct MenuPresenter {
    assets_loaded: bool,
}

impl MenuPresenter {
    pub fn assets_loaded(&self) -> bool {
        self.assets_loaded
    }

    /// Returns true when a menu was drawn this tick.
    pub fn present(
        &mut self,
        registry: &mut MenuRegistry,
        gates: &HostGates,
        settings: &MenuSettings,
        renderer: &mut dyn MenuRenderer,
        assets: &mut dyn AssetLifecycle,
    ) -> bool {
        let showing = registry.is_any_menu_open() && gates.overlay_allowed();
        if !showing {
            if self.assets_loaded {
                assets.unload_assets();
                self.assets_loaded = false;
            }
            return false;
        }
        if !self.assets_loaded {
            assets.load_assets();
            self.assets_loaded = true;
        }

        let Some(id) = registry.current_menu() else {
            return false;
        };
        if settings.dont_open_any_menu
            && registry
                .menu(id)
                .is_some_and(|menu| !menu.ignore_dont_open_menus)
        {
            debug!("{id}: closed, menus are currently not allowed to open");
            registry.close_menu(id);
            return false;
        }

        let Some(menu) = registry.menu(id) else {
            return false;
        };
        let offset = menu.scroll_offset();
        renderer.draw_menu(menu, offset);
        for item in &menu.items()[menu.visible_range()] {
            renderer.draw_item(item, offset);
        }
        true
    }
}
