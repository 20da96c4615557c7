//! A dashboard panel: one data source, one cache key, one display state.

mod panel;
mod source;
mod view;

pub use panel::Panel;
pub use source::{DataSource, FetchError};
pub use view::{Freshness, PanelView};
