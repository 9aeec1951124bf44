//! Current-figure bookkeeping for driver code.
//!
//! [`PlotContext`] keeps every figure and axis proxy the driver created and
//! remembers which one is current, so plotting calls can target "the current
//! axis" without threading handles around.

use std::collections::BTreeMap;

use mlplot_bridge::{CallArgs, ObjectIndex, ProxyContainer, ProxyError, WorkerContext};
use thiserror::Error;
use tracing::debug;

use crate::axis::AxisType;
use crate::proxies::{AxisProxy, FigureProxy};

#[derive(Debug, Error)]
pub enum PlotError {
    #[error(transparent)]
    Proxy(#[from] ProxyError),
    #[error("no open figure at index {index}")]
    UnknownFigure { index: ObjectIndex },
    #[error("no live axis at index {index}")]
    UnknownAxis { index: ObjectIndex },
}

pub struct PlotContext<'a> {
    ctx: &'a WorkerContext,
    figures: ProxyContainer<FigureProxy>,
    axes: ProxyContainer<AxisProxy>,
    figure_axes: BTreeMap<ObjectIndex, ObjectIndex>,
}

impl<'a> PlotContext<'a> {
    pub fn new(ctx: &'a WorkerContext) -> Self {
        Self {
            ctx,
            figures: ProxyContainer::new(),
            axes: ProxyContainer::new(),
            figure_axes: BTreeMap::new(),
        }
    }

    pub fn figures(&self) -> &ProxyContainer<FigureProxy> {
        &self.figures
    }

    pub fn axes(&self) -> &ProxyContainer<AxisProxy> {
        &self.axes
    }

    /// Axis placed on `figure`, if any.
    pub fn axis_of(&self, figure: ObjectIndex) -> Option<&AxisProxy> {
        self.figure_axes
            .get(&figure)
            .and_then(|axis| self.axes.get(*axis))
    }

    /// Opens a new figure and makes it current.
    pub fn figure(&mut self, args: CallArgs) -> Result<&FigureProxy, PlotError> {
        let figure = FigureProxy::create(self.ctx, args)?;
        debug!(figure = %figure.index(), "figure opened");
        Ok(self.figures.push(figure))
    }

    /// Raises an open figure and makes it, and its axis, current.
    pub fn select_figure(&mut self, index: ObjectIndex) -> Result<&FigureProxy, PlotError> {
        if !self.figures.set_current(index) {
            return Err(PlotError::UnknownFigure { index });
        }
        if let Some(axis) = self.figure_axes.get(&index) {
            self.axes.set_current(*axis);
        }
        let figure = self.figures.get(index).ok_or(PlotError::UnknownFigure { index })?;
        figure.raise_window(CallArgs::new())?;
        Ok(figure)
    }

    /// Current figure; opens one if none is open.
    pub fn gcf(&mut self) -> Result<&FigureProxy, PlotError> {
        let index = self.current_figure()?;
        self.figures.get(index).ok_or(PlotError::UnknownFigure { index })
    }

    /// Axis of the current figure; creates a 2D one if the figure has none.
    pub fn gca(&mut self) -> Result<&AxisProxy, PlotError> {
        let figure = self.current_figure()?;
        let axis = self.ensure_axis(figure, AxisType::TwoD)?;
        self.axes.get(axis).ok_or(PlotError::UnknownAxis { index: axis })
    }

    /// Plots a line into the current axis and returns its item index.
    pub fn plot(&mut self, args: CallArgs) -> Result<usize, PlotError> {
        let axis = self.gca()?;
        Ok(axis.plot(args)?)
    }

    /// Plots a surface into a 3D axis of the current figure.
    ///
    /// The figure switches to the widget layout first. A 2D axis that the
    /// switch displaced is deleted.
    pub fn surf(&mut self, args: CallArgs) -> Result<usize, PlotError> {
        let figure = self.current_figure()?;
        let relaid = self
            .figures
            .get(figure)
            .ok_or(PlotError::UnknownFigure { index: figure })?
            .switch_layout("Qt")?;
        if relaid && let Some(axis) = self.figure_axes.remove(&figure) {
            self.delete_axis(axis)?;
        }
        let axis = self.ensure_axis(figure, AxisType::ThreeD)?;
        let axis = self.axes.get(axis).ok_or(PlotError::UnknownAxis { index: axis })?;
        Ok(axis.plot(args)?)
    }

    /// Labels the items of the current axis.
    pub fn legend<I, S>(&mut self, labels: I) -> Result<usize, PlotError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let axis = self.gca()?;
        Ok(axis.legend(labels)?)
    }

    /// Closes a figure together with its axis.
    pub fn close(&mut self, index: ObjectIndex) -> Result<(), PlotError> {
        let figure = self
            .figures
            .remove(index)
            .ok_or(PlotError::UnknownFigure { index })?;
        if let Some(axis) = self.figure_axes.remove(&index) {
            self.delete_axis(axis)?;
        }
        figure.delete()?;
        if let Some(current) = self.figures.current_index()
            && let Some(axis) = self.figure_axes.get(&current)
        {
            self.axes.set_current(*axis);
        }
        debug!(figure = %index, "figure closed");
        Ok(())
    }

    fn current_figure(&mut self) -> Result<ObjectIndex, PlotError> {
        match self.figures.current_index() {
            Some(index) => Ok(index),
            None => Ok(self.figure(CallArgs::new())?.index()),
        }
    }

    fn ensure_axis(
        &mut self,
        figure: ObjectIndex,
        axis_type: AxisType,
    ) -> Result<ObjectIndex, PlotError> {
        if let Some(axis) = self.figure_axes.get(&figure) {
            self.axes.set_current(*axis);
            return Ok(*axis);
        }
        let axis = self
            .figures
            .get(figure)
            .ok_or(PlotError::UnknownFigure { index: figure })?
            .create_axis(self.ctx, axis_type)?;
        let index = axis.index();
        self.axes.push(axis);
        self.figure_axes.insert(figure, index);
        Ok(index)
    }

    fn delete_axis(&mut self, index: ObjectIndex) -> Result<(), PlotError> {
        if let Some(axis) = self.axes.remove(index) {
            axis.delete()?;
        }
        Ok(())
    }
}
