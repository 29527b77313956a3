use bevy::prelude::*;
use menu_nav::systems::menu::{
    AssetLifecycle, ListDirection, Menu, MenuEvent, MenuItem, MenuNavigationPlugin, MenuOverlay,
    MenuRegistry, MenuRenderer,
};

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(MenuNavigationPlugin)
        .insert_resource(MenuOverlay::new(LogRenderer::default(), LogAssets))
        .add_systems(Startup, (setup, build_menus))
        .add_systems(Update, reopen_main_menu)
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn(Camera2d);
}

fn build_menus(mut registry: ResMut<MenuRegistry>) {
    let main = registry.add_menu(Menu::new("Interaction").with_subtitle("Arrow keys, Enter, Escape"));
    registry.add_item(main, MenuItem::new("Wave").with_description("Wave at the nearest person"));
    let walk_style = registry.add_item(main, MenuItem::new("Walk style"));
    registry.add_item(
        main,
        MenuItem::list(
            "Mood",
            vec!["Calm".into(), "Curious".into(), "Anxious".into()],
            0,
        ),
    );
    registry.add_item(main, MenuItem::slider("Volume", 0, 100, 50).with_step(5));
    registry.add_item(
        main,
        MenuItem::dynamic_list("Round", "1", |value: &str, direction| {
            let round = value.parse::<u32>().unwrap_or(1);
            match direction {
                ListDirection::Left => round.saturating_sub(1).max(1).to_string(),
                ListDirection::Right => round.saturating_add(1).to_string(),
            }
        }),
    );

    let styles = registry.add_menu(Menu::new("Walk style").with_max_items_on_screen(4));
    for style in ["Normal", "Brisk", "Sneaky", "Limping", "Proud", "Tired"] {
        registry.add_item(styles, MenuItem::new(style));
    }
    registry.add_item(styles, MenuItem::checkbox("Remember choice", true));
    if let Some(walk_style) = walk_style {
        registry.bind_menu_item(main, styles, walk_style);
    }

    registry.observe_all(|registry, event| match event {
        MenuEvent::ItemSelected { item, .. } => {
            if let Some(item) = registry.item(*item) {
                info!("selected {}", item.text);
            }
        }
        MenuEvent::CheckboxChanged { checked, .. } => info!("checkbox now {checked}"),
        MenuEvent::ListIndexChanged { new_list_index, .. } => {
            info!("list moved to {new_list_index}")
        }
        MenuEvent::DynamicListValueChanged { new_value, .. } => info!("round {new_value}"),
        MenuEvent::SliderPositionChanged { new_position, .. } => info!("volume {new_position}"),
        _ => {}
    });

    registry.open_menu(main);
}

/// M reopens the main menu once everything has been closed.
fn reopen_main_menu(keys: Res<ButtonInput<KeyCode>>, mut registry: ResMut<MenuRegistry>) {
    if !keys.just_pressed(KeyCode::KeyM) || registry.is_any_menu_open() {
        return;
    }
    if let Some(main) = registry.main_menu() {
        registry.open_menu(main);
    }
}

/// Logs each frame's menu only when it differs from the last one drawn.
#[derive(Default)]
struct LogRenderer {
    frame: Vec<String>,
    last_logged: Vec<String>,
}

impl LogRenderer {
    fn flush(&mut self) {
        if !self.frame.is_empty() && self.frame != self.last_logged {
            info!("\n{}", self.frame.join("\n"));
            self.last_logged = std::mem::take(&mut self.frame);
        }
        self.frame.clear();
    }
}

impl MenuRenderer for LogRenderer {
    fn draw_menu(&mut self, menu: &Menu, scroll_offset: usize) {
        self.flush();
        self.frame.push(format!(
            "== {} == ({}/{}, from {scroll_offset})",
            menu.title,
            menu.current_index() + 1,
            menu.size()
        ));
    }

    fn draw_item(&mut self, item: &MenuItem, _scroll_offset: usize) {
        let cursor = if item.selected() { '>' } else { ' ' };
        let state = if let Some(checked) = item.checked() {
            if checked { " [x]" } else { " [ ]" }.to_string()
        } else if let Some(position) = item.slider_position() {
            format!(" <{position}>")
        } else if let Some(value) = item.current_value() {
            format!(" < {value} >")
        } else {
            String::new()
        };
        self.frame.push(format!("{cursor} {}{state}", item.text));
    }
}

struct LogAssets;

impl AssetLifecycle for LogAssets {
    fn load_assets(&mut self) {
        debug!("menu overlay shown");
    }

    fn unload_assets(&mut self) {
        debug!("menu overlay hidden");
    }
}
