//! Pure text stages of the reply pipeline.
//!
//! Nothing in here performs I/O; the poller feeds mention text through
//! [`normalize`], [`is_question`] and the [`shape`] helpers in that order.

mod classify;
mod normalize;
/// Reply length shaping.
pub mod shape;

pub use classify::is_question;
pub use normalize::normalize;
pub use shape::{append_call_to_action, preview, truncate};
