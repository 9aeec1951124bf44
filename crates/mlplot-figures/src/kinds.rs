use mlplot_bridge::{BridgeError, CallArgs, Controller, ObjectIndex, ObjectResult};
use tracing::debug;

use crate::axis::Axis;
use crate::window::{Desktop, FigureWindow};

pub const FIGURE_KIND: &str = "figure";
pub const AXIS_KIND: &str = "axis";

/// Registers the figure and axis kinds. Figure windows report to `desktop`.
pub fn register_kinds(controller: &mut Controller, desktop: &Desktop) -> Result<(), BridgeError> {
    let desktop = desktop.clone();
    controller
        .register_kind(
            FIGURE_KIND,
            move |index: ObjectIndex, args: CallArgs| -> ObjectResult {
                let window = FigureWindow::new(index, &args, desktop.clone())?;
                debug!(figure = %index, title = window.title(), "figure window created");
                Ok(Box::new(window))
            },
        )?
        .register_kind(
            AXIS_KIND,
            |index: ObjectIndex, args: CallArgs| -> ObjectResult {
                let axis = Axis::new(index, &args)?;
                debug!(axis = %index, axis_type = axis.axis_type().as_str(), "axis created");
                Ok(Box::new(axis))
            },
        )?;
    Ok(())
}
