//! Keyboard-driven hierarchical menus for Bevy hosts.
pub mod systems;

pub use systems::menu::MenuNavigationPlugin;
