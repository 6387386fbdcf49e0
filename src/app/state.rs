//! Connection-mode state management
//!
//! The shell is either in normal interaction or in connection mode with
//! exactly one sending instance. Transitions are pure; restyling the
//! shortcuts to match the new state is left to the controller.

use crate::domain::instance::InstanceId;

/// Shell-wide interaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShellState {
    /// Taps open windows
    #[default]
    Normal,
    /// Taps on shortcuts toggle connections from the sender
    Connecting(ConnectingState),
}

impl ShellState {
    /// Sender while in connection mode
    pub fn sender(&self) -> Option<InstanceId> {
        match self {
            ShellState::Connecting(connecting) => Some(connecting.sender),
            ShellState::Normal => None,
        }
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, ShellState::Connecting(_))
    }
}

/// State while the user wires connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectingState {
    /// Instance whose outgoing connections are being edited
    pub sender: InstanceId,
}

/// Events that may change the interaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    /// A shortcut was held down
    ShortcutLongPressed(InstanceId),
    /// Empty desktop background was tapped
    BackgroundTapped,
    /// An instance finished closing
    InstanceClosed(InstanceId),
}

/// State machine for connection-mode transitions
pub struct StateMachine;

impl StateMachine {
    /// Processes a state event and returns the new state
    ///
    /// # Arguments
    /// * `current_state` - Current interaction state
    /// * `event` - Event to process
    ///
    /// # Returns
    /// New interaction state after processing the event
    pub fn process_event(current_state: ShellState, event: StateEvent) -> ShellState {
        match (current_state, event) {
            (ShellState::Normal, StateEvent::ShortcutLongPressed(app)) => {
                ShellState::Connecting(ConnectingState { sender: app })
            }

            // Holding the sender again leaves connection mode
            (ShellState::Connecting(connecting), StateEvent::ShortcutLongPressed(app))
                if connecting.sender == app =>
            {
                ShellState::Normal
            }

            (ShellState::Connecting(_), StateEvent::ShortcutLongPressed(app)) => {
                ShellState::Connecting(ConnectingState { sender: app })
            }

            (ShellState::Connecting(_), StateEvent::BackgroundTapped) => ShellState::Normal,

            (ShellState::Connecting(connecting), StateEvent::InstanceClosed(app))
                if connecting.sender == app =>
            {
                ShellState::Normal
            }

            // Everything else leaves the state untouched
            (state, _) => state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: InstanceId = InstanceId(1);
    const B: InstanceId = InstanceId(2);

    fn connecting(sender: InstanceId) -> ShellState {
        ShellState::Connecting(ConnectingState { sender })
    }

    #[test]
    fn default_state_is_normal() {
        assert_eq!(ShellState::default(), ShellState::Normal);
        assert_eq!(ShellState::default().sender(), None);
    }

    #[test]
    fn long_press_enters_connection_mode() {
        let state = StateMachine::process_event(ShellState::Normal, StateEvent::ShortcutLongPressed(A));
        assert_eq!(state, connecting(A));
        assert_eq!(state.sender(), Some(A));
    }

    #[test]
    fn long_press_on_sender_toggles_off() {
        let state = StateMachine::process_event(connecting(A), StateEvent::ShortcutLongPressed(A));
        assert_eq!(state, ShellState::Normal);
    }

    #[test]
    fn long_press_on_other_switches_sender() {
        let state = StateMachine::process_event(connecting(A), StateEvent::ShortcutLongPressed(B));
        assert_eq!(state, connecting(B));
    }

    #[test]
    fn background_tap_leaves_connection_mode() {
        let state = StateMachine::process_event(connecting(A), StateEvent::BackgroundTapped);
        assert_eq!(state, ShellState::Normal);

        let state = StateMachine::process_event(ShellState::Normal, StateEvent::BackgroundTapped);
        assert_eq!(state, ShellState::Normal);
    }

    #[test]
    fn closing_sender_invalidates_selection() {
        let state = StateMachine::process_event(connecting(A), StateEvent::InstanceClosed(A));
        assert_eq!(state, ShellState::Normal);

        // Another instance closing keeps the current sender
        let state = StateMachine::process_event(connecting(A), StateEvent::InstanceClosed(B));
        assert_eq!(state, connecting(A));
    }
}
