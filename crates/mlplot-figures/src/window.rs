use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use mlplot_bridge::{CallArgs, ObjectError, ObjectIndex, RemoteObject, Value, decode};
use serde_json::json;
use tracing::debug;

use crate::axis::AxisType;

pub const DEFAULT_TITLE: &str = "Figure";
pub const DEFAULT_WIDTH: u32 = 600;
pub const DEFAULT_HEIGHT: u32 = 500;

/// Headless stand-in for the window manager: records which figure windows
/// are open, raised and closed.
#[derive(Debug, Clone, Default)]
pub struct Desktop {
    state: Rc<RefCell<DesktopState>>,
}

#[derive(Debug, Default)]
struct DesktopState {
    open: BTreeMap<ObjectIndex, String>,
    raised: Vec<ObjectIndex>,
    closed: Vec<ObjectIndex>,
}

impl Desktop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open windows with their titles, oldest first.
    pub fn open_windows(&self) -> Vec<(ObjectIndex, String)> {
        self.state
            .borrow()
            .open
            .iter()
            .map(|(index, title)| (*index, title.clone()))
            .collect()
    }

    pub fn closed_windows(&self) -> Vec<ObjectIndex> {
        self.state.borrow().closed.clone()
    }

    pub fn raised_windows(&self) -> Vec<ObjectIndex> {
        self.state.borrow().raised.clone()
    }

    fn show(&self, index: ObjectIndex, title: &str) {
        self.state.borrow_mut().open.insert(index, title.to_string());
    }

    fn retitle(&self, index: ObjectIndex, title: &str) {
        if let Some(open) = self.state.borrow_mut().open.get_mut(&index) {
            *open = title.to_string();
        }
    }

    fn raise(&self, index: ObjectIndex) {
        self.state.borrow_mut().raised.push(index);
    }

    fn close(&self, index: ObjectIndex) {
        let mut state = self.state.borrow_mut();
        if state.open.remove(&index).is_some() {
            state.closed.push(index);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutType {
    /// No central widget yet.
    Unset,
    /// Scene-graph layout.
    Pg,
    /// Widget grid layout.
    Qt,
}

impl LayoutType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pg" => Some(Self::Pg),
            "Qt" => Some(Self::Qt),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "None",
            Self::Pg => "pg",
            Self::Qt => "Qt",
        }
    }
}

impl fmt::Display for LayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    axis: ObjectIndex,
    row_span: u32,
    column_span: u32,
}

/// Owner-side figure window.
#[derive(Debug)]
pub struct FigureWindow {
    index: ObjectIndex,
    title: String,
    width: u32,
    height: u32,
    layout_type: LayoutType,
    axis_type: AxisType,
    cells: BTreeMap<(u32, u32), Placement>,
    desktop: Desktop,
}

impl FigureWindow {
    pub fn new(index: ObjectIndex, args: &CallArgs, desktop: Desktop) -> Result<Self, ObjectError> {
        let title: String = args
            .param(0, "title")?
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let width = args.param(1, "width")?.unwrap_or(DEFAULT_WIDTH);
        let height = args.param(2, "height")?.unwrap_or(DEFAULT_HEIGHT);
        let mut window = Self {
            index,
            title: format!("Figure {}: {title}", index.get() + 1),
            width,
            height,
            layout_type: LayoutType::Unset,
            axis_type: AxisType::TwoD,
            cells: BTreeMap::new(),
            desktop,
        };
        window.change_layout(LayoutType::Pg);
        window.desktop.show(index, &window.title);
        Ok(window)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn layout_type(&self) -> LayoutType {
        self.layout_type
    }

    /// Returns whether the layout changed. A new layout starts empty.
    pub fn change_layout(&mut self, layout_type: LayoutType) -> bool {
        if self.layout_type == layout_type {
            return false;
        }
        debug!(
            figure = %self.index,
            from = %self.layout_type,
            to = %layout_type,
            "figure layout changed"
        );
        self.layout_type = layout_type;
        self.cells.clear();
        true
    }

    /// Places an axis; refuses a cell that is already taken.
    pub fn add_axis(
        &mut self,
        axis: ObjectIndex,
        row: u32,
        column: u32,
        row_span: u32,
        column_span: u32,
    ) -> bool {
        if self.cells.contains_key(&(row, column)) {
            return false;
        }
        self.cells.insert(
            (row, column),
            Placement {
                axis,
                row_span: row_span.max(1),
                column_span: column_span.max(1),
            },
        );
        true
    }

    pub fn has_axis(&self) -> bool {
        !self.cells.is_empty()
    }

    pub fn axes(&self) -> Vec<ObjectIndex> {
        self.cells.values().map(|placement| placement.axis).collect()
    }

    fn placements(&self) -> Value {
        Value::Array(
            self.cells
                .iter()
                .map(|((row, column), placement)| {
                    json!({
                        "axis": placement.axis,
                        "row": row,
                        "column": column,
                        "row_span": placement.row_span,
                        "column_span": placement.column_span,
                    })
                })
                .collect(),
        )
    }
}

impl RemoteObject for FigureWindow {
    fn get_attr(&self, name: &str) -> Result<Value, ObjectError> {
        match name {
            "index" => Ok(json!(self.index)),
            "title" => Ok(json!(self.title)),
            "width" => Ok(json!(self.width)),
            "height" => Ok(json!(self.height)),
            "layout_type" => Ok(json!(self.layout_type.as_str())),
            "axis_type" => Ok(json!(self.axis_type.as_str())),
            "placements" => Ok(self.placements()),
            _ => Err(ObjectError::UnknownAttribute {
                name: name.to_string(),
            }),
        }
    }

    fn set_attr(&mut self, name: &str, value: Value) -> Result<(), ObjectError> {
        match name {
            "title" => {
                self.title = decode(name, value)?;
                self.desktop.retitle(self.index, &self.title);
            },
            "width" => self.width = decode(name, value)?,
            "height" => self.height = decode(name, value)?,
            "index" | "layout_type" | "axis_type" | "placements" => {
                return Err(ObjectError::ReadOnlyAttribute {
                    name: name.to_string(),
                });
            },
            _ => {
                return Err(ObjectError::UnknownAttribute {
                    name: name.to_string(),
                });
            },
        }
        Ok(())
    }

    fn call_method(&mut self, name: &str, args: CallArgs) -> Result<Value, ObjectError> {
        match name {
            "raise_window" => {
                self.desktop.raise(self.index);
                Ok(Value::Null)
            },
            "change_layout" => {
                let requested: String = args
                    .param(0, "layout_type")?
                    .unwrap_or_else(|| "pg".to_string());
                let layout_type =
                    LayoutType::parse(&requested).ok_or_else(|| ObjectError::InvalidArgument {
                        name: "layout_type".to_string(),
                        reason: format!("expected 'pg' or 'Qt', got '{requested}'"),
                    })?;
                Ok(json!(self.change_layout(layout_type)))
            },
            "change_axis" => {
                let requested: String = args
                    .param(0, "axis_type")?
                    .unwrap_or_else(|| "2D".to_string());
                self.axis_type = AxisType::parse(&requested)?;
                Ok(Value::Null)
            },
            "add_axis" => {
                let axis: ObjectIndex = args.require(0, "index")?;
                let row = args.param(1, "row")?.unwrap_or(0);
                let column = args.param(2, "column")?.unwrap_or(0);
                let row_span = args.param(3, "row_span")?.unwrap_or(1);
                let column_span = args.param(4, "column_span")?.unwrap_or(1);
                Ok(json!(self.add_axis(axis, row, column, row_span, column_span)))
            },
            "has_axis" => Ok(json!(self.has_axis())),
            "axes" => Ok(json!(self.axes())),
            _ => Err(ObjectError::UnknownMethod {
                name: name.to_string(),
            }),
        }
    }

    fn teardown(&mut self) {
        debug!(figure = %self.index, title = %self.title, "closing figure window");
        self.desktop.close(self.index);
    }
}
