//! keyscope-term - a [`keyscope_core::Matcher`] for crossterm key events.
//!
//! Sequences are written as space-separated combos such as `"C-x C-s"`,
//! `"g g"` or `"M-Enter"`. Modifiers are `C`, `M` and `S` (or `ctrl`,
//! `alt`, `shift`). The optional action on a binding picks the event kind:
//! `press`/`keydown` (default), `release`/`keyup` or `repeat`.

pub mod combo;
pub mod dispatcher;
pub mod sequence;

pub use combo::{KeyCombo, parse_key_combo};
pub use dispatcher::{KeyDispatcher, RegionId, SEQUENCE_TIMEOUT, TermInstance};
pub use sequence::{KeySequence, Trigger, parse_trigger};
