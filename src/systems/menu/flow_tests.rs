use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use bevy::{prelude::*, time::TimeUpdateStrategy};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use super::*;

#[derive(Debug, Default, Clone)]
struct ScriptedInput {
    pressed: HashSet<Control>,
    just_pressed: HashSet<Control>,
    just_released: HashSet<Control>,
}

impl ScriptedInput {
    fn press(&mut self, control: Control) {
        if self.pressed.insert(control) {
            self.just_pressed.insert(control);
        }
    }

    fn release(&mut self, control: Control) {
        if self.pressed.remove(&control) {
            self.just_released.insert(control);
        }
    }

    fn end_tick(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl ControlInput for ScriptedInput {
    fn is_pressed(&self, control: Control) -> bool {
        self.pressed.contains(&control)
    }

    fn is_just_pressed(&self, control: Control) -> bool {
        self.just_pressed.contains(&control)
    }

    fn is_just_released(&self, control: Control) -> bool {
        self.just_released.contains(&control)
    }
}

struct Sample {
    main: MenuId,
    options: MenuId,
    options_item: ItemId,
    difficulty_item: ItemId,
}

fn sample_tree(registry: &mut MenuRegistry) -> Sample {
    let main = registry.add_menu(Menu::new("Interaction"));
    registry.add_item(main, MenuItem::new("Resume"));
    let options_item = registry
        .add_item(main, MenuItem::new("Options"))
        .expect("main registered");
    registry.add_item(main, MenuItem::slider("Volume", 0, 10, 5));
    let difficulty_item = registry
        .add_item(
            main,
            MenuItem::list(
                "Difficulty",
                vec!["Easy".into(), "Normal".into(), "Hard".into(), "Brutal".into()],
                0,
            ),
        )
        .expect("main registered");

    let options = registry.add_menu(Menu::new("Options"));
    registry.add_item(options, MenuItem::checkbox("Subtitles", true));
    registry.add_item(options, MenuItem::new("Credits"));
    assert!(registry.bind_menu_item(main, options, options_item));

    Sample {
        main,
        options,
        options_item,
        difficulty_item,
    }
}

struct Harness {
    registry: MenuRegistry,
    controller: NavigationController,
    input: ScriptedInput,
    gates: HostGates,
    settings: MenuSettings,
    now_ms: u64,
    events: Arc<Mutex<Vec<MenuEvent>>>,
}

impl Harness {
    fn new() -> (Self, Sample) {
        let mut registry = MenuRegistry::new();
        let sample = sample_tree(&mut registry);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        registry.observe_all(move |_, event| {
            sink.lock().expect("event sink poisoned").push(event.clone());
        });
        registry.open_menu(sample.main);

        let harness = Self {
            registry,
            controller: NavigationController::new(),
            input: ScriptedInput::default(),
            gates: HostGates::default(),
            settings: MenuSettings::fallback(),
            now_ms: 0,
            events,
        };
        harness.drain();
        (harness, sample)
    }

    fn tick_at(&mut self, now_ms: u64) -> TickReport {
        self.now_ms = now_ms;
        let report = self.controller.tick(
            &mut self.registry,
            &self.input,
            &self.gates,
            &self.settings,
            now_ms,
        );
        self.input.end_tick();
        report
    }

    fn tick(&mut self) -> TickReport {
        let next = self.now_ms + 1;
        self.tick_at(next)
    }

    fn index(&self, menu: MenuId) -> usize {
        self.registry
            .menu(menu)
            .expect("menu registered")
            .current_index()
    }

    fn drain(&self) -> Vec<MenuEvent> {
        std::mem::take(&mut *self.events.lock().expect("event sink poisoned"))
    }
}

fn long_menu(registry: &mut MenuRegistry, rows: usize) -> MenuId {
    let menu = registry.add_menu(Menu::new("Inventory"));
    for row in 0..rows {
        registry.add_item(menu, MenuItem::new(format!("Slot {row}")));
    }
    menu
}

#[test]
fn held_direction_steps_immediately_then_accelerates() {
    let mut registry = MenuRegistry::new();
    let menu = long_menu(&mut registry, 100);
    registry.open_menu(menu);
    let mut controller = NavigationController::new();
    let mut input = ScriptedInput::default();
    let gates = HostGates::default();
    let settings = MenuSettings::fallback();

    input.press(Control::Down);
    let mut step_times = Vec::new();
    for now in 0..=2_000u64 {
        let report = controller.tick(&mut registry, &input, &gates, &settings, now);
        input.end_tick();
        if report.step.is_some() {
            assert_eq!(report.step, Some(NavDirection::Down));
            step_times.push(now);
        }
    }

    assert_eq!(&step_times[..6], &[0, 201, 402, 603, 754, 905]);
    let gaps: Vec<u64> = step_times.windows(2).map(|pair| pair[1] - pair[0]).collect();
    assert!(gaps.windows(2).all(|pair| pair[0] >= pair[1]));
    assert!(gaps.contains(&101));
    assert_eq!(controller.state(), NavState::Repeating);
    let track = controller.repeat_track().expect("held direction is tracked");
    assert_eq!(track.direction(), NavDirection::Down);
    assert_eq!(
        registry.menu(menu).expect("menu").current_index(),
        step_times.len() % 100
    );

    input.release(Control::Down);
    let before = registry.menu(menu).expect("menu").current_index();
    let report = controller.tick(&mut registry, &input, &gates, &settings, 2_001);
    assert_eq!(report.state, NavState::Armed);
    assert_eq!(report.step, None);
    assert!(controller.repeat_track().is_none());
    assert_eq!(registry.menu(menu).expect("menu").current_index(), before);
}

#[test]
fn fresh_engagement_prefers_up_then_down_then_left_then_right() {
    let (mut harness, sample) = Harness::new();
    harness.input.press(Control::Right);
    harness.input.press(Control::Down);
    harness.input.press(Control::Up);

    let report = harness.tick();
    assert_eq!(report.step, Some(NavDirection::Up));
    assert_eq!(harness.index(sample.main), 3);
}

#[test]
fn left_and_right_repeat_through_a_list() {
    let (mut harness, sample) = Harness::new();
    harness
        .registry
        .select_item(sample.main, 3, SelectMode::FocusOnly);
    harness.drain();

    harness.input.press(Control::Right);
    assert_eq!(harness.tick_at(0).step, Some(NavDirection::Right));
    assert_eq!(harness.tick_at(200).step, None);
    assert_eq!(harness.tick_at(201).step, Some(NavDirection::Right));

    let list_index = harness
        .registry
        .item(sample.difficulty_item)
        .and_then(MenuItem::list_index);
    assert_eq!(list_index, Some(2));
    assert_eq!(
        harness.drain(),
        vec![
            MenuEvent::ListIndexChanged {
                menu: sample.main,
                item: sample.difficulty_item,
                index: 3,
                old_list_index: 0,
                new_list_index: 1,
            },
            MenuEvent::ListIndexChanged {
                menu: sample.main,
                item: sample.difficulty_item,
                index: 3,
                old_list_index: 1,
                new_list_index: 2,
            },
        ]
    );
}

#[test]
fn horizontal_input_needs_an_enabled_focused_item() {
    let (mut harness, sample) = Harness::new();
    let resume = harness.registry.menu(sample.main).expect("main").items()[0].id();
    harness.registry.set_item_enabled(resume, false);

    harness.input.press(Control::Left);
    let report = harness.tick();
    assert_eq!(report.step, None);
    assert_eq!(report.state, NavState::Armed);

    harness.input.release(Control::Left);
    harness.tick();
    harness.input.press(Control::Down);
    assert_eq!(harness.tick().step, Some(NavDirection::Down));
    assert_eq!(harness.index(sample.main), 1);
}

#[test]
fn accept_opens_the_bound_submenu() {
    let (mut harness, sample) = Harness::new();
    harness.input.press(Control::Down);
    harness.tick();
    harness.input.release(Control::Down);
    harness.tick();
    harness.drain();

    harness.input.press(Control::Accept);
    let report = harness.tick();
    assert!(!report.accepted);
    harness.input.release(Control::Accept);
    let report = harness.tick();

    assert!(report.accepted);
    assert_eq!(harness.registry.current_menu(), Some(sample.options));
    assert_eq!(harness.registry.visible_menus(), &[sample.options]);
    assert_eq!(
        harness.drain(),
        vec![
            MenuEvent::ItemSelected {
                menu: sample.main,
                item: sample.options_item,
                index: 1,
            },
            MenuEvent::MenuClosed { menu: sample.main },
            MenuEvent::MenuOpened {
                menu: sample.options
            },
        ]
    );
}

#[test]
fn cancel_goes_back_on_the_following_tick() {
    let (mut harness, sample) = Harness::new();
    harness
        .registry
        .select_item(sample.main, 1, SelectMode::FocusAndActivate);
    assert_eq!(harness.registry.current_menu(), Some(sample.options));

    harness.input.press(Control::Cancel);
    harness.tick();
    harness.input.release(Control::Cancel);
    let report = harness.tick();
    assert!(report.cancel_deferred);
    assert!(!report.went_back);
    assert_eq!(harness.controller.pending_back(), Some(sample.options));
    assert_eq!(harness.registry.current_menu(), Some(sample.options));

    let report = harness.tick();
    assert!(report.went_back);
    assert_eq!(harness.registry.current_menu(), Some(sample.main));
    assert_eq!(harness.index(sample.main), 1);
}

#[test]
fn deferred_back_is_dropped_when_the_menu_changed() {
    let (mut harness, sample) = Harness::new();
    harness
        .registry
        .select_item(sample.main, 1, SelectMode::FocusAndActivate);

    harness.input.press(Control::Cancel);
    harness.tick();
    harness.input.release(Control::Cancel);
    harness.tick();
    harness.registry.open_menu(sample.main);

    let report = harness.tick();
    assert!(!report.went_back);
    assert_eq!(harness.registry.current_menu(), Some(sample.main));
}

#[test]
fn prevent_exiting_only_protects_root_menus() {
    let (mut harness, sample) = Harness::new();
    harness.settings.prevent_exiting_menu = true;

    harness.input.press(Control::Cancel);
    harness.tick();
    harness.input.release(Control::Cancel);
    assert!(!harness.tick().cancel_deferred);
    harness.tick();
    assert_eq!(harness.registry.current_menu(), Some(sample.main));

    harness.registry.open_menu(sample.options);
    harness.input.press(Control::Cancel);
    harness.tick();
    harness.input.release(Control::Cancel);
    assert!(harness.tick().cancel_deferred);
    harness.tick();
    assert_eq!(harness.registry.current_menu(), Some(sample.main));
}

#[test]
fn disabled_back_button_ignores_cancel() {
    let (mut harness, sample) = Harness::new();
    harness.settings.disable_back_button = true;
    harness.registry.open_menu(sample.options);

    harness.input.press(Control::Cancel);
    harness.tick();
    harness.input.release(Control::Cancel);
    harness.tick();
    harness.tick();
    assert_eq!(harness.registry.current_menu(), Some(sample.options));
}

#[test]
fn closed_gates_idle_and_reopening_starts_a_fresh_engagement() {
    let (mut harness, sample) = Harness::new();
    harness.input.press(Control::Down);
    assert_eq!(harness.tick_at(0).step, Some(NavDirection::Down));

    harness.gates.screen_faded_in = false;
    let report = harness.tick_at(50);
    assert_eq!(report.state, NavState::Idle);
    assert_eq!(report.step, None);
    assert!(harness.controller.repeat_track().is_none());

    harness.gates.screen_faded_in = true;
    harness.gates.system_menu_active = true;
    assert_eq!(harness.tick_at(55).state, NavState::Idle);

    harness.gates.system_menu_active = false;
    assert_eq!(harness.tick_at(60).step, Some(NavDirection::Down));
    assert_eq!(harness.index(sample.main), 2);
    assert!(harness.registry.is_any_menu_open());
}

#[test]
fn menu_button_policies_disable_interaction() {
    let (mut harness, sample) = Harness::new();
    harness.settings.disable_menu_buttons = true;
    harness.input.press(Control::Down);
    assert_eq!(harness.tick().state, NavState::Idle);
    assert_eq!(harness.index(sample.main), 0);

    harness.settings.disable_menu_buttons = false;
    harness.settings.dont_open_any_menu = true;
    assert_eq!(harness.tick().state, NavState::Idle);
    assert_eq!(harness.index(sample.main), 0);
}

#[test]
fn text_input_blocks_buttons_until_cooldown_passes() {
    let (mut harness, sample) = Harness::new();
    harness.gates.text_input_active = true;
    harness.input.press(Control::Down);
    assert_eq!(harness.tick_at(0).state, NavState::Idle);

    harness.gates.text_input_active = false;
    assert_eq!(harness.tick_at(10).state, NavState::Idle);
    assert_eq!(harness.tick_at(309).state, NavState::Idle);
    assert_eq!(harness.index(sample.main), 0);

    let report = harness.tick_at(310);
    assert_eq!(report.step, Some(NavDirection::Down));
    assert_eq!(harness.index(sample.main), 1);
}

#[test]
fn weapon_selection_claims_vertical_scroll_outside_vehicles() {
    let (mut harness, sample) = Harness::new();
    harness.input.press(Control::SelectWeapon);
    harness.input.press(Control::NextWeapon);
    harness.input.press(Control::Down);

    let report = harness.tick();
    assert_eq!(report.step, None);
    assert_eq!(report.state, NavState::Armed);

    harness.gates.agent_in_vehicle = true;
    assert_eq!(harness.tick().step, Some(NavDirection::Down));
    assert_eq!(harness.index(sample.main), 1);
}

#[test]
fn incapacitated_agent_closes_every_menu() {
    let (mut harness, sample) = Harness::new();
    harness.gates.agent_incapacitated = true;

    let report = harness.tick();
    assert_eq!(report.state, NavState::Idle);
    assert!(!harness.registry.is_any_menu_open());
    assert_eq!(
        harness.drain(),
        vec![MenuEvent::MenuClosed { menu: sample.main }]
    );
}

#[test]
fn idle_backoff_ends_early_when_a_menu_opens() {
    let (mut harness, sample) = Harness::new();
    harness.registry.close_all_menus();
    assert_eq!(harness.tick_at(0).state, NavState::Idle);
    assert_eq!(harness.tick_at(500).state, NavState::Idle);

    harness.registry.open_menu(sample.main);
    harness.input.press(Control::Down);
    let report = harness.tick_at(510);
    assert_eq!(report.step, Some(NavDirection::Down));
    assert_eq!(report.state, NavState::Repeating);
}

#[test]
fn replacing_the_menu_mid_hold_cancels_the_repeat() {
    let (mut harness, sample) = Harness::new();
    harness.input.press(Control::Down);
    harness.tick_at(0);
    harness.registry.open_menu(sample.options);

    let report = harness.tick_at(10);
    assert_eq!(report.state, NavState::Armed);
    assert_eq!(report.step, None);
    assert_eq!(harness.index(sample.options), 0);

    let report = harness.tick_at(11);
    assert_eq!(report.step, Some(NavDirection::Down));
    assert_eq!(harness.index(sample.options), 1);
}

#[test]
fn empty_menu_stays_armed() {
    let mut registry = MenuRegistry::new();
    let empty = registry.add_menu(Menu::new("Empty"));
    registry.open_menu(empty);
    let mut controller = NavigationController::new();
    let mut input = ScriptedInput::default();
    input.press(Control::Down);

    let report = controller.tick(
        &mut registry,
        &input,
        &HostGates::default(),
        &MenuSettings::fallback(),
        0,
    );
    assert_eq!(report.state, NavState::Armed);
    assert_eq!(report.step, None);
}

#[test]
fn random_operations_keep_single_menu_and_single_focus() {
    let mut rng = Pcg64Mcg::seed_from_u64(12345);
    let mut registry = MenuRegistry::new();
    let sample = sample_tree(&mut registry);
    let inventory = long_menu(&mut registry, 23);
    registry.add_submenu(sample.options, inventory);
    let menus = [sample.main, sample.options, inventory];

    for _ in 0..2_000 {
        let menu = menus[rng.random_range(0..menus.len())];
        match rng.random_range(0..8) {
            0 => {
                registry.open_menu(menu);
            }
            1 => {
                registry.go_up(menu);
            }
            2 => {
                registry.go_down(menu);
            }
            3 => {
                registry.go_left(menu);
            }
            4 => {
                registry.go_right(menu);
            }
            5 => {
                let index = rng.random_range(0..30);
                registry.select_item(menu, index, SelectMode::FocusAndActivate);
            }
            6 => {
                registry.go_back(menu);
            }
            _ => registry.close_all_menus(),
        }

        assert!(registry.visible_menus().len() <= 1);
        for id in menus {
            let open = registry.menu(id).expect("menu registered");
            assert_eq!(open.visible(), registry.visible_menus().contains(&id));
            let focused: Vec<usize> = open
                .items()
                .iter()
                .filter(|item| item.selected())
                .map(MenuItem::index)
                .collect();
            assert_eq!(focused, vec![open.current_index()]);
            assert!(open.visible_range().contains(&open.current_index()));
        }
    }
}

// -- plugin ------------------------------------------------------------------

#[derive(Clone, Default)]
struct SharedRenderer(Arc<Mutex<Vec<String>>>);

impl MenuRenderer for SharedRenderer {
    fn draw_menu(&mut self, menu: &Menu, _scroll_offset: usize) {
        self.0
            .lock()
            .expect("draw log poisoned")
            .push(format!("menu {}", menu.title));
    }

    fn draw_item(&mut self, item: &MenuItem, _scroll_offset: usize) {
        let marker = if item.selected() { ">" } else { " " };
        self.0
            .lock()
            .expect("draw log poisoned")
            .push(format!("{marker}{}", item.text));
    }
}

struct NoAssets;

impl AssetLifecycle for NoAssets {
    fn load_assets(&mut self) {}
    fn unload_assets(&mut self) {}
}

fn plugin_app() -> (App, Sample) {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(MenuNavigationPlugin);
    let sample = {
        let mut registry = app.world_mut().resource_mut::<MenuRegistry>();
        let sample = sample_tree(&mut registry);
        registry.open_menu(sample.main);
        sample
    };
    (app, sample)
}

fn with_keys(app: &mut App, edit: impl FnOnce(&mut ButtonInput<KeyCode>)) {
    let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
    keys.clear();
    edit(&mut keys);
}

fn current_index(app: &App, menu: MenuId) -> usize {
    app.world()
        .resource::<MenuRegistry>()
        .menu(menu)
        .expect("menu registered")
        .current_index()
}

#[test]
fn plugin_drives_navigation_from_keyboard() {
    let (mut app, sample) = plugin_app();

    with_keys(&mut app, |keys| keys.press(KeyCode::ArrowDown));
    app.update();
    assert_eq!(current_index(&app, sample.main), 1);
    assert_eq!(
        app.world().resource::<LastMenuTick>().0.step,
        Some(NavDirection::Down)
    );

    with_keys(&mut app, |keys| keys.release(KeyCode::ArrowDown));
    app.update();
    assert_eq!(
        app.world().resource::<NavigationController>().state(),
        NavState::Armed
    );

    with_keys(&mut app, |keys| keys.press(KeyCode::Enter));
    app.update();
    with_keys(&mut app, |keys| keys.release(KeyCode::Enter));
    app.update();
    assert_eq!(
        app.world().resource::<MenuRegistry>().current_menu(),
        Some(sample.options)
    );

    with_keys(&mut app, |keys| keys.press(KeyCode::Escape));
    app.update();
    with_keys(&mut app, |keys| keys.release(KeyCode::Escape));
    app.update();
    assert!(app.world().resource::<LastMenuTick>().0.cancel_deferred);
    with_keys(&mut app, |_| {});
    app.update();
    assert_eq!(
        app.world().resource::<MenuRegistry>().current_menu(),
        Some(sample.main)
    );
}

#[test]
fn plugin_repeats_while_game_time_is_paused() {
    let (mut app, sample) = plugin_app();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(50)));
    app.world_mut().resource_mut::<Time<Virtual>>().pause();

    with_keys(&mut app, |keys| keys.press(KeyCode::ArrowDown));
    app.update();
    assert_eq!(current_index(&app, sample.main), 1);

    // Real time reaches 550ms; repeats land at 250ms and 500ms.
    for _ in 0..11 {
        with_keys(&mut app, |_| {});
        app.update();
    }
    assert_eq!(app.world().resource::<Time<Virtual>>().elapsed(), Duration::ZERO);
    assert_eq!(current_index(&app, sample.main), 3);
    assert_eq!(
        app.world().resource::<NavigationController>().state(),
        NavState::Repeating
    );
}

#[test]
fn plugin_respects_host_gates() {
    let (mut app, sample) = plugin_app();
    app.world_mut().resource_mut::<HostGates>().in_transition = true;

    with_keys(&mut app, |keys| keys.press(KeyCode::ArrowDown));
    app.update();
    assert_eq!(current_index(&app, sample.main), 0);
    assert_eq!(
        app.world().resource::<NavigationController>().state(),
        NavState::Idle
    );
}

#[test]
fn plugin_presents_through_the_overlay() {
    let (mut app, _sample) = plugin_app();
    let renderer = SharedRenderer::default();
    let log = Arc::clone(&renderer.0);
    app.insert_resource(MenuOverlay::new(renderer, NoAssets));

    app.update();
    assert_eq!(
        *log.lock().expect("draw log poisoned"),
        vec![
            "menu Interaction".to_string(),
            ">Resume".to_string(),
            " Options".to_string(),
            " Volume".to_string(),
            " Difficulty".to_string(),
        ]
    );
    assert!(app.world().resource::<MenuPresenter>().assets_loaded());
}
