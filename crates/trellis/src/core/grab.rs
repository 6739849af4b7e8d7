use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Outcome of a grab request against the host input system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabStatus {
    /// The grab was installed.
    Success,
    /// The requester already holds the grab.
    AlreadyGrabbed,
    /// The timestamp is older than the current grab.
    InvalidTime,
    /// The canvas is not on screen.
    NotViewable,
    /// Input is frozen by another client.
    Frozen,
}

impl GrabStatus {
    /// Did the grab succeed?
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// The host input system's grab facility.
///
/// The canvas tracks which item holds a grab; the backend only installs and
/// releases the system-level grab, and reports whether one is active so that
/// implicit button grabs do not fight an explicit one.
pub trait GrabBackend: fmt::Debug {
    /// Install a pointer grab.
    fn pointer_grab(&mut self, time: u32) -> GrabStatus;
    /// Release the pointer grab.
    fn pointer_ungrab(&mut self, time: u32);
    /// Is a system pointer grab active?
    fn pointer_is_grabbed(&self) -> bool;
    /// Install a keyboard grab.
    fn keyboard_grab(&mut self, owner_events: bool, time: u32) -> GrabStatus;
    /// Release the keyboard grab.
    fn keyboard_ungrab(&mut self, time: u32);
}

/// Shared state behind [`HeadlessGrabs`].
#[derive(Debug, Default)]
struct GrabState {
    /// Pointer grab active.
    pointer: bool,
    /// Keyboard grab active.
    keyboard: bool,
    /// Status returned instead of granting a grab.
    deny: Option<GrabStatus>,
}

/// An in-process grab backend for headless hosts and tests.
///
/// Grabs always succeed unless a denial has been configured with
/// [`HeadlessGrabs::deny_with`]. Clones share state.
#[derive(Clone, Default)]
pub struct HeadlessGrabs {
    /// Grab state, shared between clones.
    state: Arc<Mutex<GrabState>>,
}

impl HeadlessGrabs {
    /// A backend with no active grabs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the shared state.
    fn state(&self) -> MutexGuard<'_, GrabState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make subsequent grab requests fail with `status`, or succeed again
    /// with `None`.
    pub fn deny_with(&self, status: Option<GrabStatus>) {
        self.state().deny = status;
    }

    /// Simulate a grab installed or released by something outside the canvas.
    pub fn set_pointer_grabbed(&self, grabbed: bool) {
        self.state().pointer = grabbed;
    }

    /// Is a keyboard grab active?
    pub fn keyboard_is_grabbed(&self) -> bool {
        self.state().keyboard
    }
}

impl fmt::Debug for HeadlessGrabs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.state();
        f.debug_struct("HeadlessGrabs")
            .field("pointer", &s.pointer)
            .field("keyboard", &s.keyboard)
            .finish()
    }
}

impl GrabBackend for HeadlessGrabs {
    fn pointer_grab(&mut self, _time: u32) -> GrabStatus {
        let mut s = self.state();
        if let Some(status) = s.deny {
            return status;
        }
        s.pointer = true;
        GrabStatus::Success
    }

    fn pointer_ungrab(&mut self, _time: u32) {
        self.state().pointer = false;
    }

    fn pointer_is_grabbed(&self) -> bool {
        self.state().pointer
    }

    fn keyboard_grab(&mut self, _owner_events: bool, _time: u32) -> GrabStatus {
        let mut s = self.state();
        if let Some(status) = s.deny {
            return status;
        }
        s.keyboard = true;
        GrabStatus::Success
    }

    fn keyboard_ungrab(&mut self, _time: u32) {
        self.state().keyboard = false;
    }
}
