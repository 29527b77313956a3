use std::ops::Range;

use super::{
    ids::{ItemId, MenuId},
    item::MenuItem,
};

/// An ordered list of items with a single focused entry and a scroll window.
///
/// `Menu` only maintains its own focus and scroll state. Anything that touches
/// other menus (opening, going back, bound submenus) goes through the
/// [`MenuRegistry`](super::MenuRegistry), which owns every menu.
#[derive(Debug)]
pub struct Menu {
    pub title: String,
    pub subtitle: Option<String>,
    /// Keeps the menu open while the global "don't open any menu" policy is on.
    pub ignore_dont_open_menus: bool,
    id: Option<MenuId>,
    items: Vec<MenuItem>,
    current_index: usize,
    parent_menu: Option<MenuId>,
    max_items_on_screen: usize,
    scroll_offset: usize,
    visible: bool,
}

/// Focus movement inside a single menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FocusMove {
    pub old_index: usize,
    pub new_index: usize,
}

impl Menu {
    pub const DEFAULT_MAX_ITEMS_ON_SCREEN: usize = 10;

    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            ignore_dont_open_menus: false,
            id: None,
            items: Vec::new(),
            current_index: 0,
            parent_menu: None,
            max_items_on_screen: Self::DEFAULT_MAX_ITEMS_ON_SCREEN,
            scroll_offset: 0,
            visible: false,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_max_items_on_screen(mut self, max_items: usize) -> Self {
        self.set_max_items_on_screen(max_items);
        self
    }

    pub fn with_ignore_dont_open_menus(mut self, ignore: bool) -> Self {
        self.ignore_dont_open_menus = ignore;
        self
    }

    /// Registry handle, `None` until the menu has been added to a registry.
    pub fn id(&self) -> Option<MenuId> {
        self.id
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&MenuItem> {
        self.items.get(index)
    }

    pub fn item_mut(&mut self, index: usize) -> Option<&mut MenuItem> {
        self.items.get_mut(index)
    }

    pub fn position_of(&self, item: ItemId) -> Option<usize> {
        self.items.iter().position(|candidate| candidate.id() == item)
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Focused position; meaningless while the menu is empty.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_item(&self) -> Option<&MenuItem> {
        self.items.get(self.current_index)
    }

    pub fn parent_menu(&self) -> Option<MenuId> {
        self.parent_menu
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn max_items_on_screen(&self) -> usize {
        self.max_items_on_screen
    }

    pub fn set_max_items_on_screen(&mut self, max_items: usize) {
        self.max_items_on_screen = max_items.max(1);
        self.scroll_to(self.current_index);
    }

    /// Item positions currently inside the scroll window.
    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.scroll_offset + self.max_items_on_screen).min(self.items.len());
        self.scroll_offset.min(end)..end
    }

    pub(crate) fn attach(&mut self, id: MenuId) {
        self.id = Some(id);
    }

    pub(crate) fn set_parent(&mut self, parent: Option<MenuId>) {
        self.parent_menu = parent;
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub(crate) fn items_mut(&mut self) -> &mut [MenuItem] {
        &mut self.items
    }

    pub(crate) fn push_item(&mut self, id: ItemId, mut item: MenuItem) -> usize {
        let index = self.items.len();
        let menu = self.id.unwrap_or(MenuId::from_raw(u32::MAX));
        item.attach(id, menu, index);
        item.set_selected(false);
        self.items.push(item);
        if index == 0 {
            self.current_index = 0;
        }
        self.sync_selection();
        index
    }

    /// Removes the item at `index`. The `FocusMove` is set whenever the
    /// focused position or the focused item changed.
    pub(crate) fn remove_item(&mut self, index: usize) -> Option<(MenuItem, Option<FocusMove>)> {
        if index >= self.items.len() {
            return None;
        }
        let old_index = self.current_index;
        let mut removed = self.items.remove(index);
        removed.set_selected(false);
        for (position, item) in self.items.iter_mut().enumerate().skip(index) {
            item.set_index(position);
        }
        if index < self.current_index {
            self.current_index -= 1;
        }
        self.current_index = self.current_index.min(self.items.len().saturating_sub(1));
        self.sync_selection();
        self.scroll_to(self.current_index);
        let moved = (!self.items.is_empty() && index <= old_index).then_some(FocusMove {
            old_index,
            new_index: self.current_index,
        });
        Some((removed, moved))
    }

    pub(crate) fn clear_items(&mut self) -> Vec<MenuItem> {
        self.current_index = 0;
        self.scroll_offset = 0;
        std::mem::take(&mut self.items)
    }

    /// Moves focus to `index`. `None` when out of range.
    pub(crate) fn focus(&mut self, index: usize) -> Option<FocusMove> {
        if index >= self.items.len() {
            return None;
        }
        let old_index = self.current_index;
        self.current_index = index;
        self.sync_selection();
        self.scroll_to(index);
        Some(FocusMove {
            old_index,
            new_index: index,
        })
    }

    pub(crate) fn go_up(&mut self) -> Option<FocusMove> {
        let size = self.items.len();
        if size < 2 {
            return None;
        }
        let target = if self.current_index == 0 {
            size - 1
        } else {
            self.current_index.min(size) - 1
        };
        self.focus(target)
    }

    pub(crate) fn go_down(&mut self) -> Option<FocusMove> {
        let size = self.items.len();
        if size < 2 {
            return None;
        }
        let target = if self.current_index + 1 >= size {
            0
        } else {
            self.current_index + 1
        };
        self.focus(target)
    }

    fn sync_selection(&mut self) {
        let current = self.current_index;
        for (position, item) in self.items.iter_mut().enumerate() {
            item.set_selected(position == current);
        }
    }

    /// Minimal scroll that keeps `index` inside the window.
    fn scroll_to(&mut self, index: usize) {
        let window = self.max_items_on_screen;
        if index < self.scroll_offset {
            self.scroll_offset = index;
        } else if index >= self.scroll_offset + window {
            self.scroll_offset = index + 1 - window;
        }
        let max_offset = self.items.len().saturating_sub(window);
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu_with(count: usize, window: usize) -> Menu {
        let mut menu = Menu::new("Test").with_max_items_on_screen(window);
        menu.attach(MenuId::from_raw(0));
        for index in 0..count {
            menu.push_item(ItemId::from_raw(index as u32), MenuItem::new(format!("Item {index}")));
        }
        menu
    }

    fn assert_single_focus(menu: &Menu) {
        let selected: Vec<usize> = menu
            .items()
            .iter()
            .filter(|item| item.selected())
            .map(MenuItem::index)
            .collect();
        if menu.is_empty() {
            assert!(selected.is_empty());
        } else {
            assert_eq!(selected, vec![menu.current_index()]);
        }
    }

    #[test]
    fn go_down_and_up_wrap_around() {
        let mut menu = menu_with(3, 10);
        menu.focus(2);
        assert_eq!(
            menu.go_down(),
            Some(FocusMove {
                old_index: 2,
                new_index: 0
            })
        );
        assert_eq!(menu.current_index(), 0);
        menu.go_up();
        assert_eq!(menu.current_index(), 2);
        assert_single_focus(&menu);
    }

    #[test]
    fn scroll_window_follows_focus_with_minimal_scroll() {
        let mut menu = menu_with(5, 3);
        let mut indices = Vec::new();
        let mut offsets = Vec::new();
        for _ in 0..4 {
            menu.go_down();
            indices.push(menu.current_index());
            offsets.push(menu.scroll_offset());
            assert_single_focus(&menu);
        }
        assert_eq!(indices, vec![1, 2, 3, 4]);
        assert_eq!(offsets, vec![0, 0, 1, 2]);
        assert_eq!(menu.visible_range(), 2..5);

        menu.go_down();
        assert_eq!((menu.current_index(), menu.scroll_offset()), (0, 0));
        menu.go_up();
        assert_eq!((menu.current_index(), menu.scroll_offset()), (4, 2));
    }

    #[test]
    fn single_item_and_empty_menus_do_not_move() {
        let mut single = menu_with(1, 3);
        assert_eq!(single.go_down(), None);
        assert_eq!(single.go_up(), None);
        let mut empty = menu_with(0, 3);
        assert_eq!(empty.go_down(), None);
        assert_eq!(empty.focus(0), None);
        assert!(empty.current_item().is_none());
    }

    #[test]
    fn out_of_range_focus_is_rejected() {
        let mut menu = menu_with(3, 3);
        assert_eq!(menu.focus(3), None);
        assert_eq!(menu.current_index(), 0);
        assert_single_focus(&menu);
    }

    #[test]
    fn removing_items_keeps_focus_and_indices_consistent() {
        let mut menu = menu_with(5, 3);
        menu.focus(4);
        let (_, moved) = menu.remove_item(1).expect("in range");
        assert_eq!(
            moved,
            Some(FocusMove {
                old_index: 4,
                new_index: 3
            })
        );
        assert_eq!(menu.current_index(), 3);
        assert_eq!(
            menu.items().iter().map(MenuItem::index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
        let (_, moved) = menu.remove_item(3).expect("in range");
        assert_eq!(
            moved,
            Some(FocusMove {
                old_index: 3,
                new_index: 2
            })
        );
        assert_eq!(menu.current_index(), 2);
        assert_eq!(menu.scroll_offset(), 0);
        assert_single_focus(&menu);

        let (_, moved) = menu.remove_item(0).expect("in range");
        assert_eq!(moved.map(|moved| moved.new_index), Some(1));
        let (_, moved) = menu.remove_item(1).expect("in range");
        assert_eq!(moved.map(|moved| moved.new_index), Some(0));
        assert_eq!(menu.remove_item(0).map(|(_, moved)| moved), Some(None));
        assert!(menu.is_empty());
        assert_single_focus(&menu);
    }

    #[test]
    fn shrinking_window_rescrolls_to_focus() {
        let mut menu = menu_with(8, 10);
        menu.focus(6);
        assert_eq!(menu.scroll_offset(), 0);
        menu.set_max_items_on_screen(4);
        assert_eq!(menu.scroll_offset(), 3);
        menu.set_max_items_on_screen(0);
        assert_eq!(menu.max_items_on_screen(), 1);
        assert_eq!(menu.scroll_offset(), 6);
    }
}
