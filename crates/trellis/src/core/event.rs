//! Input events and the handler protocol.
//!
//! Hosts feed raw [`PointerInput`] and [`Key`] values into the canvas. The
//! canvas works out which item each event targets, converts coordinates into
//! that item's space, and bubbles an [`Event`] from the target up through its
//! ancestors until a handler returns [`EventOutcome::Handle`].

use std::ops::Add;

use bitflags::bitflags;
use kurbo::Point;

use super::canvas::Canvas;
use crate::{ItemId, error::Result};

bitflags! {
    /// Keyboard modifier state.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Shift is held.
        const SHIFT = 0b0001;
        /// Control is held.
        const CTRL = 0b0010;
        /// Alt is held.
        const ALT = 0b0100;
        /// Super/meta is held.
        const SUPER = 0b1000;
    }
}

/// Pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Primary button.
    Left,
    /// Middle button.
    Middle,
    /// Secondary button.
    Right,
    /// Any other button, by host number.
    Other(u8),
}

/// Logical key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Backspace key.
    Backspace,
    /// Enter/return key.
    Enter,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Page up key.
    PageUp,
    /// Page down key.
    PageDown,
    /// Tab key.
    Tab,
    /// Delete key.
    Delete,
    /// Escape key.
    Esc,
    /// Function key, `F(1)` is F1.
    F(u8),
    /// A character.
    Char(char),
}

impl From<char> for KeyCode {
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}

/// A keystroke along with modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    /// Modifier state.
    pub mods: Modifiers,
    /// Key code.
    pub code: KeyCode,
}

impl From<KeyCode> for Key {
    fn from(code: KeyCode) -> Self {
        Self {
            mods: Modifiers::empty(),
            code,
        }
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        KeyCode::Char(c).into()
    }
}

impl Add<KeyCode> for Modifiers {
    type Output = Key;

    fn add(self, code: KeyCode) -> Self::Output {
        Key { mods: self, code }
    }
}

/// Raw pointer input from the host.
///
/// `position` is in canvas pixels, the coordinate space produced by
/// [`Canvas::to_pixels`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    /// Pointer position in canvas pixels.
    pub position: Point,
    /// Button involved, for press and release.
    pub button: Option<Button>,
    /// Host timestamp.
    pub time: u32,
    /// Modifier state.
    pub mods: Modifiers,
}

impl PointerInput {
    /// Pointer input at a pixel position.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            button: None,
            time: 0,
            mods: Modifiers::empty(),
        }
    }

    /// Attach a button.
    pub fn with_button(mut self, button: Button) -> Self {
        self.button = Some(button);
        self
    }

    /// Attach a timestamp.
    pub fn with_time(mut self, time: u32) -> Self {
        self.time = time;
        self
    }

    /// Attach modifiers.
    pub fn with_mods(mut self, mods: Modifiers) -> Self {
        self.mods = mods;
        self
    }
}

/// A pointer event as delivered to item handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Position in the target item's local space.
    pub position: Point,
    /// Position in canvas space.
    pub canvas_position: Point,
    /// Button involved, for press and release.
    pub button: Option<Button>,
    /// Host timestamp.
    pub time: u32,
    /// Modifier state.
    pub mods: Modifiers,
}

/// A key event as delivered to item handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The keystroke.
    pub key: Key,
    /// Host timestamp.
    pub time: u32,
}

/// Events delivered to item handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// The pointer entered the item.
    Enter(PointerEvent),
    /// The pointer left the item.
    Leave(PointerEvent),
    /// The pointer moved over, or while grabbed by, the item.
    Motion(PointerEvent),
    /// A button was pressed.
    ButtonPress(PointerEvent),
    /// A button was released.
    ButtonRelease(PointerEvent),
    /// A key was pressed.
    KeyPress(KeyEvent),
    /// A key was released.
    KeyRelease(KeyEvent),
    /// The item gained keyboard focus.
    FocusIn,
    /// The item lost keyboard focus.
    FocusOut,
    /// A grab held by the item was taken away.
    GrabBroken {
        /// True for a keyboard grab, false for a pointer grab.
        keyboard: bool,
    },
}

impl Event {
    /// The pointer payload, if this is a pointer event.
    pub fn pointer(&self) -> Option<&PointerEvent> {
        match self {
            Self::Enter(p)
            | Self::Leave(p)
            | Self::Motion(p)
            | Self::ButtonPress(p)
            | Self::ButtonRelease(p) => Some(p),
            _ => None,
        }
    }

    /// A short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Enter(_) => "enter",
            Self::Leave(_) => "leave",
            Self::Motion(_) => "motion",
            Self::ButtonPress(_) => "button-press",
            Self::ButtonRelease(_) => "button-release",
            Self::KeyPress(_) => "key-press",
            Self::KeyRelease(_) => "key-release",
            Self::FocusIn => "focus-in",
            Self::FocusOut => "focus-out",
            Self::GrabBroken { .. } => "grab-broken",
        }
    }
}

/// Result of handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event was handled and propagation stops.
    Handle,
    /// The event was not handled and will bubble up the tree.
    Ignore,
}

/// Where an event is in its propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventContext {
    /// The item the event was aimed at. Pointer events with nothing under
    /// the pointer are delivered to the root with no target.
    pub target: Option<ItemId>,
    /// The item whose handlers are running.
    pub current: ItemId,
}

/// An item event handler.
///
/// Handlers get full mutable access to the canvas and may restructure the
/// tree, including removing the item they are attached to.
pub type Handler = Box<dyn FnMut(&mut Canvas, &EventContext, &Event) -> Result<EventOutcome>>;

/// Scroll wheel directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Towards the top.
    Up,
    /// Towards the bottom.
    Down,
    /// Towards the left.
    Left,
    /// Towards the right.
    Right,
}
