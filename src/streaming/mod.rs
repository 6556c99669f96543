//! Streaming primitives
//!
//! Bounded, character-based storage for generated text. Memory stays flat
//! no matter how long the stream runs.

pub mod rolling_window;

pub use rolling_window::RollingWindow;
