//! Per-tick navigation state machine.
//!
//! Each call to [`NavigationController::tick`] samples the logical controls
//! once, applies the gating rules, and issues at most one directional step
//! against the open menu. Held directions are turned into accelerating
//! repeats through a [`RepeatTrack`]; nothing here blocks or sleeps, so a
//! release is observed on the very next tick.
use bevy::prelude::Resource;
use log::debug;

use super::{
    ids::MenuId,
    input::{Control, ControlInput, HostGates},
    registry::{MenuRegistry, SelectMode},
    repeat::{NavDirection, RepeatTrack},
    settings::MenuSettings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavState {
    /// No open menu, or input is gated off.
    #[default]
    Idle,
    /// A menu is open and no direction is held.
    Armed,
    /// A direction is held and repeats are being synthesized.
    Repeating,
}

/// What a single tick did; mostly useful to hosts that play sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub state: NavState,
    pub step: Option<NavDirection>,
    pub accepted: bool,
    /// Cancel was seen this tick; `go_back` runs on the next one.
    pub cancel_deferred: bool,
    /// A cancel deferred from the previous tick was applied.
    pub went_back: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct TextInputGuard {
    was_active: bool,
    blocked_until_ms: Option<u64>,
}

impl TextInputGuard {
    /// Blocks while text input is active and for `cooldown_ms` after it ends.
    fn blocks(&mut self, active: bool, now_ms: u64, cooldown_ms: u64) -> bool {
        if active {
            self.was_active = true;
            self.blocked_until_ms = None;
            return true;
        }
        if self.was_active {
            self.was_active = false;
            self.blocked_until_ms = Some(now_ms.saturating_add(cooldown_ms));
        }
        match self.blocked_until_ms {
            Some(until) if now_ms < until => true,
            Some(_) => {
                self.blocked_until_ms = None;
                false
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct IdleBackoff {
    until_ms: u64,
    generation: u64,
}

#[derive(Resource, Debug, Default)]
pub struct NavigationController {
    state: NavState,
    track: Option<RepeatTrack>,
    pending_back: Option<MenuId>,
    text_input: TextInputGuard,
    backoff: Option<IdleBackoff>,
}

impl NavigationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn repeat_track(&self) -> Option<&RepeatTrack> {
        self.track.as_ref()
    }

    pub fn pending_back(&self) -> Option<MenuId> {
        self.pending_back
    }

    pub fn tick(
        &mut self,
        registry: &mut MenuRegistry,
        input: &impl ControlInput,
        gates: &HostGates,
        settings: &MenuSettings,
        now_ms: u64,
    ) -> TickReport {
        let mut report = TickReport::default();
        let text_blocked =
            self.text_input
                .blocks(gates.text_input_active, now_ms, settings.text_input_cooldown_ms);

        if let Some(backoff) = self.backoff {
            if backoff.generation == registry.open_generation() && now_ms < backoff.until_ms {
                return self.finish(NavState::Idle, report);
            }
            self.backoff = None;
        }

        if let Some(menu) = self.pending_back.take() {
            if registry.current_menu() == Some(menu) {
                registry.go_back(menu);
                report.went_back = true;
            }
        }

        if gates.agent_incapacitated && registry.is_any_menu_open() {
            debug!("closing all menus: agent incapacitated");
            registry.close_all_menus();
        }

        let Some(menu) = registry.current_menu() else {
            self.end_engagement();
            self.backoff = Some(IdleBackoff {
                until_ms: now_ms.saturating_add(settings.idle_backoff_ms),
                generation: registry.open_generation(),
            });
            return self.finish(NavState::Idle, report);
        };

        let interactive = registry.menu(menu).is_some_and(|open| open.visible())
            && gates.overlay_allowed()
            && !settings.disable_menu_buttons
            && !settings.dont_open_any_menu
            && !text_blocked;
        if !interactive {
            self.end_engagement();
            return self.finish(NavState::Idle, report);
        }

        self.handle_main_buttons(registry, menu, input, settings, &mut report);

        // Accept may have opened a bound submenu.
        let Some(menu) = registry.current_menu() else {
            self.end_engagement();
            return self.finish(NavState::Idle, report);
        };
        if registry.menu(menu).is_none_or(|open| open.is_empty()) {
            self.end_engagement();
            return self.finish(NavState::Armed, report);
        }

        if let Some(mut track) = self.track.take() {
            let held = direction_held(track.direction(), input, gates);
            if held && track.menu() == menu {
                if track.poll(now_ms, &settings.repeat) {
                    step(registry, menu, track.direction());
                    report.step = Some(track.direction());
                }
                self.track = Some(track);
                return self.finish(NavState::Repeating, report);
            }
            return self.finish(NavState::Armed, report);
        }

        let Some(direction) = detect_direction(input, gates) else {
            return self.finish(NavState::Armed, report);
        };
        if matches!(direction, NavDirection::Left | NavDirection::Right) {
            let focused_enabled = registry
                .menu(menu)
                .and_then(|open| open.current_item())
                .is_some_and(|item| item.enabled());
            if !focused_enabled {
                return self.finish(NavState::Armed, report);
            }
        }

        step(registry, menu, direction);
        report.step = Some(direction);
        self.track = Some(RepeatTrack::start(
            direction,
            menu,
            now_ms,
            &settings.repeat,
        ));
        self.finish(NavState::Repeating, report)
    }

    fn handle_main_buttons(
        &mut self,
        registry: &mut MenuRegistry,
        menu: MenuId,
        input: &impl ControlInput,
        settings: &MenuSettings,
        report: &mut TickReport,
    ) {
        if input.is_just_released(Control::Accept) {
            let Some(open) = registry.menu(menu) else {
                return;
            };
            if !open.is_empty() {
                let index = open.current_index();
                registry.select_item(menu, index, SelectMode::FocusAndActivate);
                report.accepted = true;
            }
        } else if !settings.disable_back_button && input.is_just_released(Control::Cancel) {
            let is_root = registry
                .menu(menu)
                .and_then(|open| open.parent_menu())
                .is_none_or(|parent| !registry.contains_menu(parent));
            if settings.prevent_exiting_menu && is_root {
                debug!("{menu}: cancel ignored, root menus cannot be exited");
                return;
            }
            // Applied next tick so the host's own cancel handling settles first.
            self.pending_back = Some(menu);
            report.cancel_deferred = true;
        }
    }

    fn end_engagement(&mut self) {
        self.track = None;
    }

    fn finish(&mut self, state: NavState, mut report: TickReport) -> TickReport {
        self.state = state;
        report.state = state;
        report
    }
}

/// Up/down share the scroll wheel with weapon selection outside vehicles.
fn scroll_contended(input: &impl ControlInput, gates: &HostGates) -> bool {
    !gates.agent_in_vehicle
        && input.is_pressed(Control::SelectWeapon)
        && (input.is_pressed(Control::NextWeapon) || input.is_pressed(Control::PrevWeapon))
}

fn vertical_held(control: Control, input: &impl ControlInput, gates: &HostGates) -> bool {
    input.is_pressed(control) && !scroll_contended(input, gates)
}

fn direction_held(direction: NavDirection, input: &impl ControlInput, gates: &HostGates) -> bool {
    match direction {
        NavDirection::Up => vertical_held(Control::Up, input, gates),
        NavDirection::Down => vertical_held(Control::Down, input, gates),
        NavDirection::Left => input.is_pressed(Control::Left),
        NavDirection::Right => input.is_pressed(Control::Right),
    }
}

/// Fresh engagement in fixed priority: up, down, left, right.
fn detect_direction(input: &impl ControlInput, gates: &HostGates) -> Option<NavDirection> {
    if vertical_held(Control::Up, input, gates) {
        Some(NavDirection::Up)
    } else if vertical_held(Control::Down, input, gates) {
        Some(NavDirection::Down)
    } else if input.is_just_pressed(Control::Left) {
        Some(NavDirection::Left)
    } else if input.is_just_pressed(Control::Right) {
        Some(NavDirection::Right)
    } else {
        None
    }
}

fn step(registry: &mut MenuRegistry, menu: MenuId, direction: NavDirection) -> bool {
    match direction {
        NavDirection::Up => registry.go_up(menu),
        NavDirection::Down => registry.go_down(menu),
        NavDirection::Left => registry.go_left(menu),
        NavDirection::Right => registry.go_right(menu),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_input_guard_holds_through_cooldown() {
        let mut guard = TextInputGuard::default();
        assert!(!guard.blocks(false, 0, 300));
        assert!(guard.blocks(true, 10, 300));
        assert!(guard.blocks(false, 20, 300));
        assert!(guard.blocks(false, 319, 300));
        assert!(!guard.blocks(false, 320, 300));
        assert!(!guard.blocks(false, 321, 300));
    }
}
