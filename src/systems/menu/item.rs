use std::fmt;

use super::ids::{ItemId, MenuId};

/// Direction handed to list callbacks when the focused list item is stepped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckboxStyle {
    Cross,
    #[default]
    Tick,
}

/// Computes the next value of a dynamic list from its current value.
pub type DynamicListCallback = Box<dyn Fn(&str, ListDirection) -> String + Send + Sync>;

/// Behavior variant of a [`MenuItem`].
pub enum ItemKind {
    Plain,
    Checkbox {
        checked: bool,
        style: CheckboxStyle,
    },
    List {
        options: Vec<String>,
        list_index: usize,
    },
    DynamicList {
        current_value: String,
        next_value: DynamicListCallback,
    },
    Slider {
        min: i32,
        max: i32,
        step: i32,
        position: i32,
    },
}

impl fmt::Debug for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("Plain"),
            Self::Checkbox { checked, style } => f
                .debug_struct("Checkbox")
                .field("checked", checked)
                .field("style", style)
                .finish(),
            Self::List {
                options,
                list_index,
            } => f
                .debug_struct("List")
                .field("options", options)
                .field("list_index", list_index)
                .finish(),
            Self::DynamicList { current_value, .. } => f
                .debug_struct("DynamicList")
                .field("current_value", current_value)
                .finish_non_exhaustive(),
            Self::Slider {
                min,
                max,
                step,
                position,
            } => f
                .debug_struct("Slider")
                .field("min", min)
                .field("max", max)
                .field("step", step)
                .field("position", position)
                .finish(),
        }
    }
}

/// State change produced by an item reacting to select/left/right.
///
/// The registry turns these into [`MenuEvent`](super::MenuEvent)s once it
/// knows which menu and position the item lives at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ItemChange {
    Selected,
    CheckboxToggled(bool),
    ListIndex { old: usize, new: usize },
    ListSelected(usize),
    DynamicValue { old: String, new: String },
    DynamicSelected(String),
    SliderPosition { old: i32, new: i32 },
    SliderSelected(i32),
}

#[derive(Debug)]
pub struct MenuItem {
    pub text: String,
    pub description: Option<String>,
    /// Right-hand label text; display only.
    pub label: Option<String>,
    enabled: bool,
    selected: bool,
    index: usize,
    id: ItemId,
    parent_menu: Option<MenuId>,
    kind: ItemKind,
}

impl MenuItem {
    const UNREGISTERED: ItemId = ItemId::from_raw(u32::MAX);

    fn with_kind(text: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            text: text.into(),
            description: None,
            label: None,
            enabled: true,
            selected: false,
            index: 0,
            id: Self::UNREGISTERED,
            parent_menu: None,
            kind,
        }
    }

    pub fn new(text: impl Into<String>) -> Self {
        Self::with_kind(text, ItemKind::Plain)
    }

    pub fn checkbox(text: impl Into<String>, checked: bool) -> Self {
        Self::with_kind(
            text,
            ItemKind::Checkbox {
                checked,
                style: CheckboxStyle::default(),
            },
        )
    }

    /// Fixed option list; `list_index` is clamped into the option range.
    pub fn list(text: impl Into<String>, options: Vec<String>, list_index: usize) -> Self {
        let list_index = list_index.min(options.len().saturating_sub(1));
        Self::with_kind(
            text,
            ItemKind::List {
                options,
                list_index,
            },
        )
    }

    pub fn dynamic_list<F>(text: impl Into<String>, initial_value: impl Into<String>, next_value: F) -> Self
    where
        F: Fn(&str, ListDirection) -> String + Send + Sync + 'static,
    {
        Self::with_kind(
            text,
            ItemKind::DynamicList {
                current_value: initial_value.into(),
                next_value: Box::new(next_value),
            },
        )
    }

    /// Bounded slider stepping by 1; bounds are swapped if given reversed.
    pub fn slider(text: impl Into<String>, min: i32, max: i32, position: i32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self::with_kind(
            text,
            ItemKind::Slider {
                min,
                max,
                step: 1,
                position: position.clamp(min, max),
            },
        )
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_step(mut self, new_step: i32) -> Self {
        if let ItemKind::Slider { step, .. } = &mut self.kind {
            *step = new_step.max(1);
        }
        self
    }

    pub fn with_checkbox_style(mut self, new_style: CheckboxStyle) -> Self {
        if let ItemKind::Checkbox { style, .. } = &mut self.kind {
            *style = new_style;
        }
        self
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn parent_menu(&self) -> Option<MenuId> {
        self.parent_menu
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn checked(&self) -> Option<bool> {
        match self.kind {
            ItemKind::Checkbox { checked, .. } => Some(checked),
            _ => None,
        }
    }

    pub fn list_index(&self) -> Option<usize> {
        match self.kind {
            ItemKind::List { list_index, .. } => Some(list_index),
            _ => None,
        }
    }

    pub fn current_value(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::List {
                options,
                list_index,
            } => options.get(*list_index).map(String::as_str),
            ItemKind::DynamicList { current_value, .. } => Some(current_value),
            _ => None,
        }
    }

    pub fn slider_position(&self) -> Option<i32> {
        match self.kind {
            ItemKind::Slider { position, .. } => Some(position),
            _ => None,
        }
    }

    /// Overwrites the checked state without notifying anyone.
    pub fn set_checked(&mut self, value: bool) {
        if let ItemKind::Checkbox { checked, .. } = &mut self.kind {
            *checked = value;
        }
    }

    /// Overwrites the slider position (clamped) without notifying anyone.
    pub fn set_slider_position(&mut self, value: i32) {
        if let ItemKind::Slider {
            min, max, position, ..
        } = &mut self.kind
        {
            *position = value.clamp(*min, *max);
        }
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub(crate) fn attach(&mut self, id: ItemId, menu: MenuId, index: usize) {
        self.id = id;
        self.parent_menu = Some(menu);
        self.index = index;
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Checkboxes treat a right press as a select through their menu.
    pub(crate) fn right_selects(&self) -> bool {
        matches!(self.kind, ItemKind::Checkbox { .. })
    }

    pub(crate) fn select(&mut self) -> Option<ItemChange> {
        if !self.enabled {
            return None;
        }
        let change = match &mut self.kind {
            ItemKind::Plain => ItemChange::Selected,
            ItemKind::Checkbox { checked, .. } => {
                *checked = !*checked;
                ItemChange::CheckboxToggled(*checked)
            }
            ItemKind::List { list_index, .. } => ItemChange::ListSelected(*list_index),
            ItemKind::DynamicList { current_value, .. } => {
                ItemChange::DynamicSelected(current_value.clone())
            }
            ItemKind::Slider { position, .. } => ItemChange::SliderSelected(*position),
        };
        Some(change)
    }

    pub(crate) fn go_left(&mut self) -> Option<ItemChange> {
        self.step(ListDirection::Left)
    }

    pub(crate) fn go_right(&mut self) -> Option<ItemChange> {
        self.step(ListDirection::Right)
    }

    fn step(&mut self, direction: ListDirection) -> Option<ItemChange> {
        if !self.enabled {
            return None;
        }
        match &mut self.kind {
            ItemKind::Plain | ItemKind::Checkbox { .. } => None,
            ItemKind::List {
                options,
                list_index,
            } => {
                let len = options.len();
                if len < 2 {
                    return None;
                }
                let old = *list_index;
                let new = match direction {
                    ListDirection::Left => (old + len - 1) % len,
                    ListDirection::Right => (old + 1) % len,
                };
                *list_index = new;
                Some(ItemChange::ListIndex { old, new })
            }
            ItemKind::DynamicList {
                current_value,
                next_value,
            } => {
                let new = next_value(current_value, direction);
                let old = std::mem::replace(current_value, new.clone());
                Some(ItemChange::DynamicValue { old, new })
            }
            ItemKind::Slider {
                min,
                max,
                step,
                position,
            } => {
                let old = *position;
                let new = match direction {
                    ListDirection::Left => old.saturating_sub(*step),
                    ListDirection::Right => old.saturating_add(*step),
                }
                .clamp(*min, *max);
                if new == old {
                    return None;
                }
                *position = new;
                Some(ItemChange::SliderPosition { old, new })
            }
        }
    }
}
