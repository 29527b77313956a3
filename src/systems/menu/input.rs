//! Host-facing input surface: logical controls, their key bindings and the
//! environment flags that gate menu interaction.
use bevy::prelude::*;
use enum_map::{enum_map, Enum, EnumMap};
use smallvec::{smallvec, SmallVec};

/// Logical controls sampled by the navigation controller.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Up,
    Down,
    Left,
    Right,
    Accept,
    Cancel,
    /// Held to bring up the weapon wheel; shares the scroll input with menus.
    SelectWeapon,
    NextWeapon,
    PrevWeapon,
}

/// Per-tick boolean samples of the logical controls.
pub trait ControlInput {
    fn is_pressed(&self, control: Control) -> bool;
    fn is_just_pressed(&self, control: Control) -> bool;
    fn is_just_released(&self, control: Control) -> bool;
}

#[derive(Resource, Debug, Clone)]
pub struct ControlBindings(pub EnumMap<Control, SmallVec<[KeyCode; 2]>>);

impl Default for ControlBindings {
    fn default() -> Self {
        Self(enum_map! {
            Control::Up => smallvec![KeyCode::ArrowUp, KeyCode::Numpad8],
            Control::Down => smallvec![KeyCode::ArrowDown, KeyCode::Numpad2],
            Control::Left => smallvec![KeyCode::ArrowLeft, KeyCode::Numpad4],
            Control::Right => smallvec![KeyCode::ArrowRight, KeyCode::Numpad6],
            Control::Accept => smallvec![KeyCode::Enter, KeyCode::NumpadEnter],
            Control::Cancel => smallvec![KeyCode::Backspace, KeyCode::Escape],
            Control::SelectWeapon => smallvec![KeyCode::Tab],
            Control::NextWeapon => smallvec![KeyCode::BracketRight],
            Control::PrevWeapon => smallvec![KeyCode::BracketLeft],
        })
    }
}

impl ControlBindings {
    pub fn keys(&self, control: Control) -> &[KeyCode] {
        &self.0[control]
    }

    pub fn bind(&mut self, control: Control, keys: impl IntoIterator<Item = KeyCode>) {
        self.0[control] = keys.into_iter().collect();
    }
}

/// [`ControlInput`] over Bevy's keyboard state.
pub struct KeyboardControls<'a> {
    keys: &'a ButtonInput<KeyCode>,
    bindings: &'a ControlBindings,
}

impl<'a> KeyboardControls<'a> {
    pub fn new(keys: &'a ButtonInput<KeyCode>, bindings: &'a ControlBindings) -> Self {
        Self { keys, bindings }
    }
}

impl ControlInput for KeyboardControls<'_> {
    fn is_pressed(&self, control: Control) -> bool {
        self.keys.any_pressed(self.bindings.keys(control).iter().copied())
    }

    fn is_just_pressed(&self, control: Control) -> bool {
        self.keys
            .any_just_pressed(self.bindings.keys(control).iter().copied())
    }

    fn is_just_released(&self, control: Control) -> bool {
        self.keys
            .any_just_released(self.bindings.keys(control).iter().copied())
    }
}

/// Host state that decides whether menus may take input this tick.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostGates {
    pub screen_faded_in: bool,
    /// A full-screen system menu (pause, settings) owns input.
    pub system_menu_active: bool,
    /// Scripted transition during which the player cannot act.
    pub in_transition: bool,
    pub agent_incapacitated: bool,
    /// Vehicles have no weapon wheel, so scroll input is never ambiguous.
    pub agent_in_vehicle: bool,
    /// An on-screen keyboard or text box is capturing input.
    pub text_input_active: bool,
}

impl Default for HostGates {
    fn default() -> Self {
        Self {
            screen_faded_in: true,
            system_menu_active: false,
            in_transition: false,
            agent_incapacitated: false,
            agent_in_vehicle: false,
            text_input_active: false,
        }
    }
}

impl HostGates {
    /// Whether the overlay may be shown and drawn at all.
    pub fn overlay_allowed(&self) -> bool {
        self.screen_faded_in
            && !self.system_menu_active
            && !self.in_transition
            && !self.agent_incapacitated
    }
}
