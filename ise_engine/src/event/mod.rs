/// Event module - window event queue and the pump thread draining it

pub mod event_pump;

pub use event_pump::*;
