pub mod annotator_state;
pub mod session_controller;
pub mod state_observer;
