use super::ids::{ItemId, MenuId};

/// Change notification delivered synchronously to registry observers.
///
/// Events are queued while a registry operation runs and dispatched once the
/// operation has restored every invariant, so an observer always sees a
/// consistent registry and may itself open or close menus.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuEvent {
    MenuOpened {
        menu: MenuId,
    },
    MenuClosed {
        menu: MenuId,
    },
    IndexChanged {
        menu: MenuId,
        old_item: Option<ItemId>,
        new_item: ItemId,
        old_index: usize,
        new_index: usize,
    },
    ItemSelected {
        menu: MenuId,
        item: ItemId,
        index: usize,
    },
    CheckboxChanged {
        menu: MenuId,
        item: ItemId,
        index: usize,
        checked: bool,
    },
    ListIndexChanged {
        menu: MenuId,
        item: ItemId,
        index: usize,
        old_list_index: usize,
        new_list_index: usize,
    },
    ListItemSelected {
        menu: MenuId,
        item: ItemId,
        index: usize,
        list_index: usize,
    },
    DynamicListValueChanged {
        menu: MenuId,
        item: ItemId,
        old_value: String,
        new_value: String,
    },
    DynamicListItemSelected {
        menu: MenuId,
        item: ItemId,
        value: String,
    },
    SliderPositionChanged {
        menu: MenuId,
        item: ItemId,
        index: usize,
        old_position: i32,
        new_position: i32,
    },
    SliderItemSelected {
        menu: MenuId,
        item: ItemId,
        index: usize,
        position: i32,
    },
}

impl MenuEvent {
    /// Menu the event originated from.
    pub fn menu(&self) -> MenuId {
        match self {
            Self::MenuOpened { menu }
            | Self::MenuClosed { menu }
            | Self::IndexChanged { menu, .. }
            | Self::ItemSelected { menu, .. }
            | Self::CheckboxChanged { menu, .. }
            | Self::ListIndexChanged { menu, .. }
            | Self::ListItemSelected { menu, .. }
            | Self::DynamicListValueChanged { menu, .. }
            | Self::DynamicListItemSelected { menu, .. }
            | Self::SliderPositionChanged { menu, .. }
            | Self::SliderItemSelected { menu, .. } => *menu,
        }
    }
}
