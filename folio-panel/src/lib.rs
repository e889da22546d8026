//! Comment thread panel
//!
//! The editor shows a panel listing the open comment threads of the content
//! piece being edited. [`ThreadPanel`] is the panel's state and the rules that
//! change it; [`PanelHandle`] keeps that state in sync with a [`ThreadSource`]
//! for as long as the panel is mounted.

pub mod handle;
pub mod source;
pub mod state;

pub use handle::PanelHandle;
pub use source::ThreadSource;
pub use state::{LoadState, PanelView, ThreadPanel};
