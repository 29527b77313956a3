use std::{
    collections::{HashMap, VecDeque},
    fmt,
};

use bevy::prelude::Resource;
use log::{debug, warn};
use smallvec::SmallVec;

use super::{
    events::MenuEvent,
    ids::{ItemId, MenuId},
    item::{ItemChange, MenuItem},
    menu::{FocusMove, Menu},
};

/// Callback invoked for every [`MenuEvent`] it subscribed to.
///
/// Observers receive the registry mutably so they can react the way menu
/// callbacks usually do (open another menu, toggle items, close everything).
pub type MenuObserver = Box<dyn FnMut(&mut MenuRegistry, &MenuEvent) + Send + Sync>;

/// How `select_item` treats an index other than the focused one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectMode {
    /// Only move focus.
    FocusOnly,
    /// Move focus, then activate the newly focused item.
    #[default]
    FocusAndActivate,
}

/// Owner of every menu, the visible set, item bindings and observers.
///
/// At most one menu is visible after any public call returns: opening a menu
/// closes whatever was open before.
#[derive(Resource, Default)]
pub struct MenuRegistry {
    menus: HashMap<MenuId, Menu>,
    order: Vec<MenuId>,
    visible: SmallVec<[MenuId; 2]>,
    main_menu: Option<MenuId>,
    bindings: HashMap<ItemId, MenuId>,
    item_owners: HashMap<ItemId, MenuId>,
    observers: Vec<(Option<MenuId>, MenuObserver)>,
    pending: VecDeque<MenuEvent>,
    dispatching: bool,
    next_menu: u32,
    next_item: u32,
    open_generation: u64,
}

impl fmt::Debug for MenuRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuRegistry")
            .field("order", &self.order)
            .field("visible", &self.visible)
            .field("main_menu", &self.main_menu)
            .field("bindings", &self.bindings)
            .field("observers", &self.observers.len())
            .field("open_generation", &self.open_generation)
            .finish_non_exhaustive()
    }
}

impl MenuRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // -- menus ---------------------------------------------------------------

    /// Registers `menu`. The first registered menu becomes the main menu.
    pub fn add_menu(&mut self, mut menu: Menu) -> MenuId {
        let id = MenuId::from_raw(self.next_menu);
        self.next_menu += 1;
        menu.attach(id);
        menu.set_visible(false);
        debug!("registered {id} ({})", menu.title);
        self.menus.insert(id, menu);
        self.order.push(id);
        if self.main_menu.is_none() {
            self.main_menu = Some(id);
        }
        id
    }

    /// Registers `child` and parents it under `parent`.
    pub fn add_child_menu(&mut self, parent: MenuId, child: Menu) -> MenuId {
        let child = self.add_menu(child);
        self.add_submenu(parent, child);
        child
    }

    /// Re-parents `child` under `parent`; the last call wins.
    pub fn add_submenu(&mut self, parent: MenuId, child: MenuId) -> bool {
        if parent == child || !self.menus.contains_key(&parent) {
            return false;
        }
        let Some(menu) = self.menus.get_mut(&child) else {
            return false;
        };
        menu.set_parent(Some(parent));
        true
    }

    /// Makes selecting `item` open `child`, and parents `child` under `parent`.
    pub fn bind_menu_item(&mut self, parent: MenuId, child: MenuId, item: ItemId) -> bool {
        if !self.add_submenu(parent, child) {
            return false;
        }
        if let Some(previous) = self.bindings.insert(item, child) {
            if previous != child {
                debug!("rebound {item} from {previous} to {child}");
            }
        }
        true
    }

    pub fn unbind_menu_item(&mut self, item: ItemId) -> Option<MenuId> {
        self.bindings.remove(&item)
    }

    pub fn bound_menu(&self, item: ItemId) -> Option<MenuId> {
        self.bindings.get(&item).copied()
    }

    /// Removes a menu. Bindings that point at it are kept and fail closed.
    pub fn remove_menu(&mut self, id: MenuId) -> Option<Menu> {
        if !self.menus.contains_key(&id) {
            return None;
        }
        self.close_inner(id);
        self.flush_events();
        let mut menu = self.menus.remove(&id)?;
        self.order.retain(|candidate| *candidate != id);
        for item in menu.items() {
            self.bindings.remove(&item.id());
            self.item_owners.remove(&item.id());
        }
        for other in self.menus.values_mut() {
            if other.parent_menu() == Some(id) {
                other.set_parent(None);
            }
        }
        if self.main_menu == Some(id) {
            self.main_menu = self.order.first().copied();
        }
        self.observers.retain(|(filter, _)| *filter != Some(id));
        menu.set_visible(false);
        Some(menu)
    }

    pub fn contains_menu(&self, id: MenuId) -> bool {
        self.menus.contains_key(&id)
    }

    pub fn menu(&self, id: MenuId) -> Option<&Menu> {
        self.menus.get(&id)
    }

    pub fn menu_mut(&mut self, id: MenuId) -> Option<&mut Menu> {
        self.menus.get_mut(&id)
    }

    /// Menus in registration order.
    pub fn menus(&self) -> impl Iterator<Item = &Menu> {
        self.order.iter().filter_map(|id| self.menus.get(id))
    }

    pub fn main_menu(&self) -> Option<MenuId> {
        self.main_menu
    }

    pub fn set_main_menu(&mut self, id: MenuId) -> bool {
        if !self.menus.contains_key(&id) {
            return false;
        }
        self.main_menu = Some(id);
        true
    }

    // -- items ---------------------------------------------------------------

    pub fn add_item(&mut self, menu: MenuId, item: MenuItem) -> Option<ItemId> {
        let target = self.menus.get_mut(&menu)?;
        let id = ItemId::from_raw(self.next_item);
        self.next_item += 1;
        target.push_item(id, item);
        self.item_owners.insert(id, menu);
        Some(id)
    }

    pub fn remove_item(&mut self, item: ItemId) -> Option<MenuItem> {
        let owner = self.item_owners.get(&item).copied()?;
        let menu = self.menus.get_mut(&owner)?;
        let position = menu.position_of(item)?;
        let focused_before = menu.current_item().map(MenuItem::id);
        let (removed, moved) = menu.remove_item(position)?;
        let event = moved.and_then(|moved| {
            Some(MenuEvent::IndexChanged {
                menu: owner,
                old_item: focused_before,
                new_item: menu.item(moved.new_index)?.id(),
                old_index: moved.old_index,
                new_index: moved.new_index,
            })
        });
        self.item_owners.remove(&item);
        self.bindings.remove(&item);
        if let Some(event) = event {
            self.pending.push_back(event);
            self.flush_events();
        }
        Some(removed)
    }

    pub fn clear_items(&mut self, menu: MenuId) {
        let Some(target) = self.menus.get_mut(&menu) else {
            return;
        };
        for item in target.clear_items() {
            self.item_owners.remove(&item.id());
            self.bindings.remove(&item.id());
        }
    }

    pub fn item_owner(&self, item: ItemId) -> Option<MenuId> {
        self.item_owners.get(&item).copied()
    }

    pub fn item(&self, item: ItemId) -> Option<&MenuItem> {
        let menu = self.menus.get(self.item_owners.get(&item)?)?;
        menu.item(menu.position_of(item)?)
    }

    pub fn item_mut(&mut self, item: ItemId) -> Option<&mut MenuItem> {
        let owner = *self.item_owners.get(&item)?;
        let menu = self.menus.get_mut(&owner)?;
        let position = menu.position_of(item)?;
        menu.item_mut(position)
    }

    pub fn set_item_enabled(&mut self, item: ItemId, enabled: bool) -> bool {
        match self.item_mut(item) {
            Some(target) => {
                target.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    // -- visibility ----------------------------------------------------------

    /// The open menu, if any.
    pub fn current_menu(&self) -> Option<MenuId> {
        self.visible.first().copied()
    }

    pub fn is_any_menu_open(&self) -> bool {
        !self.visible.is_empty()
    }

    pub fn visible_menus(&self) -> &[MenuId] {
        &self.visible
    }

    /// Bumped on every open/close edge.
    pub fn open_generation(&self) -> u64 {
        self.open_generation
    }

    /// Opens `id`, closing whichever menu was open. Reopening is a no-op.
    pub fn open_menu(&mut self, id: MenuId) -> bool {
        let opened = self.open_inner(id);
        self.flush_events();
        opened
    }

    pub fn close_menu(&mut self, id: MenuId) -> bool {
        let closed = self.close_inner(id);
        self.flush_events();
        closed
    }

    pub fn close_all_menus(&mut self) {
        let open: Vec<MenuId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.visible.contains(id))
            .collect();
        for id in open {
            self.close_inner(id);
        }
        self.flush_events();
    }

    /// Closes `id` and reopens its parent. Root menus simply close.
    pub fn go_back(&mut self, id: MenuId) -> bool {
        let Some(menu) = self.menus.get(&id) else {
            return false;
        };
        let parent = menu
            .parent_menu()
            .filter(|parent| self.menus.contains_key(parent));
        self.close_inner(id);
        if let Some(parent) = parent {
            self.open_inner(parent);
        }
        self.flush_events();
        true
    }

    fn open_inner(&mut self, id: MenuId) -> bool {
        if !self.menus.contains_key(&id) {
            return false;
        }
        if self.visible.len() == 1 && self.visible[0] == id {
            return true;
        }
        let previous: SmallVec<[MenuId; 2]> = self.visible.clone();
        for other in previous {
            if other != id {
                self.close_inner(other);
            }
        }
        if !self.visible.contains(&id) {
            self.visible.push(id);
            if let Some(menu) = self.menus.get_mut(&id) {
                menu.set_visible(true);
            }
            self.open_generation += 1;
            self.pending.push_back(MenuEvent::MenuOpened { menu: id });
        }
        debug_assert!(self.visible.len() <= 1);
        true
    }

    fn close_inner(&mut self, id: MenuId) -> bool {
        let Some(position) = self.visible.iter().position(|candidate| *candidate == id) else {
            return false;
        };
        self.visible.remove(position);
        if let Some(menu) = self.menus.get_mut(&id) {
            menu.set_visible(false);
        }
        self.open_generation += 1;
        self.pending.push_back(MenuEvent::MenuClosed { menu: id });
        true
    }

    // -- navigation ----------------------------------------------------------

    pub fn go_up(&mut self, id: MenuId) -> bool {
        self.move_focus(id, Menu::go_up)
    }

    pub fn go_down(&mut self, id: MenuId) -> bool {
        self.move_focus(id, Menu::go_down)
    }

    pub fn go_left(&mut self, id: MenuId) -> bool {
        self.step_focused(id, false)
    }

    pub fn go_right(&mut self, id: MenuId) -> bool {
        self.step_focused(id, true)
    }

    /// Focuses and/or activates the item at `index`.
    ///
    /// Out-of-range indices and empty menus are ignored.
    pub fn select_item(&mut self, id: MenuId, index: usize, mode: SelectMode) -> bool {
        let Some(menu) = self.menus.get_mut(&id) else {
            return false;
        };
        if index >= menu.size() {
            debug!("{id}: ignoring select of index {index} (size {})", menu.size());
            return false;
        }
        if index != menu.current_index() {
            if let Some(moved) = menu.focus(index) {
                let event = index_changed(id, menu, moved);
                self.pending.push_back(event);
            }
            if mode == SelectMode::FocusOnly {
                self.flush_events();
                return true;
            }
        }
        self.activate(id, index);
        self.flush_events();
        true
    }

    fn move_focus(&mut self, id: MenuId, step: fn(&mut Menu) -> Option<FocusMove>) -> bool {
        let Some(menu) = self.menus.get_mut(&id) else {
            return false;
        };
        let Some(moved) = step(menu) else {
            return false;
        };
        let event = index_changed(id, menu, moved);
        self.pending.push_back(event);
        self.flush_events();
        true
    }

    fn step_focused(&mut self, id: MenuId, right: bool) -> bool {
        let Some(menu) = self.menus.get_mut(&id) else {
            return false;
        };
        let index = menu.current_index();
        let Some(item) = menu.items_mut().get_mut(index) else {
            return false;
        };
        if !item.enabled() {
            return false;
        }
        if right && item.right_selects() {
            return self.select_item(id, index, SelectMode::FocusAndActivate);
        }
        let change = if right { item.go_right() } else { item.go_left() };
        let item_id = item.id();
        let Some(change) = change else {
            return false;
        };
        self.pending
            .push_back(item_event(id, item_id, index, change));
        self.flush_events();
        true
    }

    fn activate(&mut self, id: MenuId, index: usize) {
        let Some(item) = self.menus.get(&id).and_then(|menu| menu.item(index)) else {
            return;
        };
        if !item.enabled() {
            return;
        }
        let item_id = item.id();
        if let Some(child) = self.bindings.get(&item_id).copied() {
            if self.menus.contains_key(&child) {
                self.pending.push_back(MenuEvent::ItemSelected {
                    menu: id,
                    item: item_id,
                    index,
                });
                self.close_inner(id);
                self.open_inner(child);
                return;
            }
            warn!("{item_id} is bound to removed {child}; selecting it as a plain item");
        }
        let Some(item) = self
            .menus
            .get_mut(&id)
            .and_then(|menu| menu.item_mut(index))
        else {
            return;
        };
        if let Some(change) = item.select() {
            self.pending.push_back(item_event(id, item_id, index, change));
        }
    }

    // -- observers -----------------------------------------------------------

    /// Subscribes to events originating from `menu`.
    pub fn observe<F>(&mut self, menu: MenuId, observer: F)
    where
        F: FnMut(&mut MenuRegistry, &MenuEvent) + Send + Sync + 'static,
    {
        self.observers.push((Some(menu), Box::new(observer)));
    }

    /// Subscribes to events from every menu.
    pub fn observe_all<F>(&mut self, observer: F)
    where
        F: FnMut(&mut MenuRegistry, &MenuEvent) + Send + Sync + 'static,
    {
        self.observers.push((None, Box::new(observer)));
    }

    fn flush_events(&mut self) {
        // Operations run from inside an observer only queue; the outer flush
        // keeps draining until nothing is left.
        if self.dispatching {
            return;
        }
        self.dispatching = true;
        while let Some(event) = self.pending.pop_front() {
            let mut observers = std::mem::take(&mut self.observers);
            for (filter, observer) in observers.iter_mut() {
                if filter.is_none_or(|menu| menu == event.menu()) {
                    observer(self, &event);
                }
            }
            observers.append(&mut self.observers);
            // An observer may have removed a menu while the list was taken.
            observers.retain(|(filter, _)| {
                filter.is_none_or(|menu| self.menus.contains_key(&menu))
            });
            self.observers = observers;
        }
        self.dispatching = false;
    }
}

fn index_changed(id: MenuId, menu: &Menu, moved: FocusMove) -> MenuEvent {
    let new_item = menu
        .item(moved.new_index)
        .map(MenuItem::id)
        .unwrap_or(ItemId::from_raw(u32::MAX));
    MenuEvent::IndexChanged {
        menu: id,
        old_item: menu.item(moved.old_index).map(MenuItem::id),
        new_item,
        old_index: moved.old_index,
        new_index: moved.new_index,
    }
}

fn item_event(menu: MenuId, item: ItemId, index: usize, change: ItemChange) -> MenuEvent {
    match change {
        ItemChange::Selected => MenuEvent::ItemSelected { menu, item, index },
        ItemChange::CheckboxToggled(checked) => MenuEvent::CheckboxChanged {
            menu,
            item,
            index,
            checked,
        },
        ItemChange::ListIndex { old, new } => MenuEvent::ListIndexChanged {
            menu,
            item,
            index,
            old_list_index: old,
            new_list_index: new,
        },
        ItemChange::ListSelected(list_index) => MenuEvent::ListItemSelected {
            menu,
            item,
            index,
            list_index,
        },
        ItemChange::DynamicValue { old, new } => MenuEvent::DynamicListValueChanged {
            menu,
            item,
            old_value: old,
            new_value: new,
        },
        ItemChange::DynamicSelected(value) => MenuEvent::DynamicListItemSelected { menu, item, value },
        ItemChange::SliderPosition { old, new } => MenuEvent::SliderPositionChanged {
            menu,
            item,
            index,
            old_position: old,
            new_position: new,
        },
        ItemChange::SliderSelected(position) => MenuEvent::SliderItemSelected {
            menu,
            item,
            index,
            position,
        },
    }
}
