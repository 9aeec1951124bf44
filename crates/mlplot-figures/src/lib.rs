//! Figure windows and plotting axes served through the bridge.
//!
//! [`FigureWindow`] and [`Axis`] live on the owner thread. The driver talks
//! to them through [`FigureProxy`] and [`AxisProxy`], usually via the
//! current-figure bookkeeping in [`PlotContext`].

pub mod axis;
pub mod kinds;
pub mod proxies;
pub mod session;
pub mod window;

pub use axis::{Axis, AxisType, LINE_COLORS, LineItem, SurfaceItem};
pub use kinds::{AXIS_KIND, FIGURE_KIND, register_kinds};
pub use proxies::{AxisProxy, FigureProxy};
pub use session::{PlotContext, PlotError};
pub use window::{Desktop, FigureWindow, LayoutType};
