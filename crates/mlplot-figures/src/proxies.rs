use mlplot_bridge::{CallArgs, ProxyError, Value, WorkerContext, remote_proxy};
use tracing::debug;

use crate::axis::{AxisType, LineItem};

remote_proxy! {
    /// Worker-side handle to a [`crate::FigureWindow`].
    pub struct FigureProxy for "figure" {
        attribute title: String => title, set_title;
        attribute width: u32 => width, set_width;
        attribute height: u32 => height, set_height;
        attribute layout_type: String => layout_type;
        attribute axis_type: String => axis_type;
        method raise_window => raise_window;
        method change_layout => change_layout;
        method change_axis => change_axis;
        method add_axis => add_axis;
        method has_axis => has_axis;
    }
}

remote_proxy! {
    /// Worker-side handle to a [`crate::Axis`].
    pub struct AxisProxy for "axis" {
        attribute axis_type: String => axis_type;
        attribute row: u32 => row, set_row;
        attribute column: u32 => column, set_column;
        attribute grid: bool => grid, set_grid;
        attribute xlim: [f64; 2] => xlim, set_xlim;
        attribute ylim: [f64; 2] => ylim, set_ylim;
        attribute xlabel: String => xlabel, set_xlabel;
        attribute ylabel: String => ylabel, set_ylabel;
        attribute xticks: Vec<f64> => xticks;
        attribute yticks: Vec<f64> => yticks;
        attribute azimuth: f64 => azimuth, set_azimuth;
        attribute elevation: f64 => elevation, set_elevation;
        attribute lines: Vec<LineItem> => lines;
        method add => add;
        method line => line;
        method surf => surf;
        method add_legend => add_legend;
        method set_xticks => set_xticks;
        method set_yticks => set_yticks;
    }
}

impl FigureProxy {
    /// Switches the layout; `true` if the owner had to rebuild it.
    pub fn switch_layout(&self, layout_type: &str) -> Result<bool, ProxyError> {
        self.proxy()
            .call_as("change_layout", CallArgs::new().with_arg(layout_type))
    }

    pub fn holds_axis(&self) -> Result<bool, ProxyError> {
        self.proxy().call_as("has_axis", CallArgs::new())
    }

    /// Creates an axis and places it in the top-left cell of this figure.
    pub fn create_axis(
        &self,
        ctx: &WorkerContext,
        axis_type: AxisType,
    ) -> Result<AxisProxy, ProxyError> {
        self.change_axis(CallArgs::new().with_arg(axis_type.as_str()))?;
        let axis = AxisProxy::create(
            ctx,
            CallArgs::new().with_kwarg("axis_type", axis_type.as_str()),
        )?;
        let placed: bool = self
            .proxy()
            .call_as("add_axis", CallArgs::new().with_arg(axis.index().get()))?;
        debug!(figure = %self.index(), axis = %axis.index(), placed, "axis created for figure");
        Ok(axis)
    }
}

impl AxisProxy {
    /// Plots into this axis and returns the item index on the axis.
    pub fn plot(&self, args: CallArgs) -> Result<usize, ProxyError> {
        self.proxy().call_as("add", args)
    }

    /// Labels plotted items in order and returns how many were labelled.
    pub fn legend<I, S>(&self, labels: I) -> Result<usize, ProxyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = labels.into_iter().map(|label| Value::String(label.into()));
        let args = CallArgs::positional(labels);
        self.proxy().call_as("add_legend", args)
    }
}
