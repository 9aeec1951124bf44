use mlplot_bridge::{CallArgs, ObjectError, ObjectIndex, RemoteObject, Value, decode, opt_kwarg};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// Cycled through for lines without an explicit color.
pub const LINE_COLORS: [&str; 7] = [
    "#0072bd", "#d95319", "#edb120", "#7e2f8e", "#77ac30", "#4dbeee", "#a2142f",
];

const LINE_STYLES: [&str; 4] = ["-", "--", ":", ".-"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisType {
    TwoD,
    ThreeD,
}

impl AxisType {
    pub fn parse(value: &str) -> Result<Self, ObjectError> {
        match value {
            "2D" => Ok(Self::TwoD),
            "3D" => Ok(Self::ThreeD),
            other => Err(ObjectError::InvalidArgument {
                name: "axis_type".to_string(),
                reason: format!("invalid axis type '{other}', expected 2D or 3D"),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TwoD => "2D",
            Self::ThreeD => "3D",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub points: usize,
    pub color: String,
    pub width: f64,
    pub style: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceItem {
    pub rows: usize,
    pub columns: usize,
    pub colormap: String,
}

/// Owner-side plotting axis, 2D or 3D.
#[derive(Debug)]
pub struct Axis {
    index: ObjectIndex,
    axis_type: AxisType,
    row: u32,
    column: u32,
    grid: bool,
    xlim: [f64; 2],
    ylim: [f64; 2],
    xlabel: String,
    ylabel: String,
    xticks: Vec<f64>,
    yticks: Vec<f64>,
    azimuth: f64,
    elevation: f64,
    lines: Vec<LineItem>,
    surfaces: Vec<SurfaceItem>,
}

impl Axis {
    pub fn new(index: ObjectIndex, args: &CallArgs) -> Result<Self, ObjectError> {
        let axis_type: String = opt_kwarg(&args.kwargs, "axis_type")?
            .unwrap_or_else(|| "2D".to_string());
        Ok(Self {
            index,
            axis_type: AxisType::parse(&axis_type)?,
            row: opt_kwarg(&args.kwargs, "row")?.unwrap_or(0),
            column: opt_kwarg(&args.kwargs, "column")?.unwrap_or(0),
            grid: false,
            xlim: [0.0, 1.0],
            ylim: [0.0, 1.0],
            xlabel: String::new(),
            ylabel: String::new(),
            xticks: Vec::new(),
            yticks: Vec::new(),
            azimuth: 45.0,
            elevation: 30.0,
            lines: Vec::new(),
            surfaces: Vec::new(),
        })
    }

    pub fn axis_type(&self) -> AxisType {
        self.axis_type
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    fn item_count(&self) -> usize {
        self.lines.len() + self.surfaces.len()
    }

    fn add_line(&mut self, args: &CallArgs) -> Result<Value, ObjectError> {
        let x: Vec<f64> = args.require(0, "x")?;
        let y: Vec<f64> = args.require(1, "y")?;
        if x.len() != y.len() {
            return Err(ObjectError::InvalidArgument {
                name: "y".to_string(),
                reason: format!("x has {} points, y has {}", x.len(), y.len()),
            });
        }
        if self.axis_type == AxisType::ThreeD {
            let z: Vec<f64> = args.require(2, "z")?;
            if z.len() != x.len() {
                return Err(ObjectError::InvalidArgument {
                    name: "z".to_string(),
                    reason: format!("x has {} points, z has {}", x.len(), z.len()),
                });
            }
        }
        let style: String = opt_kwarg(&args.kwargs, "style")?.unwrap_or_else(|| "-".to_string());
        if !LINE_STYLES.contains(&style.as_str()) {
            return Err(ObjectError::InvalidArgument {
                name: "style".to_string(),
                reason: format!("unknown line style '{style}'"),
            });
        }
        let color = match opt_kwarg::<String>(&args.kwargs, "color")? {
            Some(color) => color,
            None => LINE_COLORS[self.lines.len() % LINE_COLORS.len()].to_string(),
        };
        let line = LineItem {
            points: x.len(),
            color,
            width: opt_kwarg(&args.kwargs, "width")?.unwrap_or(2.0),
            style,
            label: None,
        };
        debug!(axis = %self.index, points = line.points, color = %line.color, "line added");
        self.lines.push(line);
        Ok(json!(self.lines.len() - 1))
    }

    fn add_surface(&mut self, args: &CallArgs) -> Result<Value, ObjectError> {
        if self.axis_type != AxisType::ThreeD {
            return Err(ObjectError::failed("surfaces need a 3D axis"));
        }
        let x: Vec<f64> = args.require(0, "x")?;
        let y: Vec<f64> = args.require(1, "y")?;
        let z: Vec<Vec<f64>> = args.require(2, "z")?;
        if z.len() != x.len() || z.iter().any(|row| row.len() != y.len()) {
            return Err(ObjectError::InvalidArgument {
                name: "z".to_string(),
                reason: format!("z must be {}x{}", x.len(), y.len()),
            });
        }
        let surface = SurfaceItem {
            rows: x.len(),
            columns: y.len(),
            colormap: opt_kwarg(&args.kwargs, "colormap")?
                .unwrap_or_else(|| "viridis".to_string()),
        };
        self.surfaces.push(surface);
        Ok(json!(self.surfaces.len() - 1))
    }

    /// Labels plotted lines in order; more labels than items is an error.
    fn add_legend(&mut self, args: &CallArgs) -> Result<Value, ObjectError> {
        let labels: Vec<String> = args.rest("labels")?;
        if labels.len() > self.item_count() {
            return Err(ObjectError::InvalidArgument {
                name: "labels".to_string(),
                reason: format!(
                    "{} legend labels for {} plotted items",
                    labels.len(),
                    self.item_count()
                ),
            });
        }
        for (line, label) in self.lines.iter_mut().zip(&labels) {
            line.label = Some(label.clone());
        }
        Ok(json!(labels.len()))
    }

    fn set_ticks(args: &CallArgs) -> Result<Vec<f64>, ObjectError> {
        let mut major: Vec<f64> = args.require(0, "major")?;
        let minor: Vec<f64> = args.param(1, "minor")?.unwrap_or_default();
        major.extend(minor);
        major.sort_by(f64::total_cmp);
        Ok(major)
    }

    fn limits(name: &str, value: Value) -> Result<[f64; 2], ObjectError> {
        Self::check_limits(name, decode(name, value)?)
    }

    /// Both bounds finite and strictly increasing; NaN fails the comparison.
    fn check_limits(name: &str, limits: [f64; 2]) -> Result<[f64; 2], ObjectError> {
        let [lower, upper] = limits;
        if !(lower.is_finite() && upper.is_finite() && lower < upper) {
            return Err(ObjectError::InvalidArgument {
                name: name.to_string(),
                reason: format!("expected finite limits with {lower} below {upper}"),
            });
        }
        Ok(limits)
    }
}

impl RemoteObject for Axis {
    fn get_attr(&self, name: &str) -> Result<Value, ObjectError> {
        match name {
            "index" => Ok(json!(self.index)),
            "axis_type" => Ok(json!(self.axis_type.as_str())),
            "row" => Ok(json!(self.row)),
            "column" => Ok(json!(self.column)),
            "grid" => Ok(json!(self.grid)),
            "xlim" => Ok(json!(self.xlim)),
            "ylim" => Ok(json!(self.ylim)),
            "xlabel" => Ok(json!(self.xlabel)),
            "ylabel" => Ok(json!(self.ylabel)),
            "xticks" => Ok(json!(self.xticks)),
            "yticks" => Ok(json!(self.yticks)),
            "azimuth" => Ok(json!(self.azimuth)),
            "elevation" => Ok(json!(self.elevation)),
            "lines" => Ok(json!(self.lines)),
            "surfaces" => Ok(json!(self.surfaces)),
            _ => Err(ObjectError::UnknownAttribute {
                name: name.to_string(),
            }),
        }
    }

    fn set_attr(&mut self, name: &str, value: Value) -> Result<(), ObjectError> {
        match name {
            "row" => self.row = decode(name, value)?,
            "column" => self.column = decode(name, value)?,
            "grid" => self.grid = decode(name, value)?,
            "xlim" => self.xlim = Self::limits(name, value)?,
            "ylim" => self.ylim = Self::limits(name, value)?,
            "xlabel" => self.xlabel = decode(name, value)?,
            "ylabel" => self.ylabel = decode(name, value)?,
            "xticks" => self.xticks = decode(name, value)?,
            "yticks" => self.yticks = decode(name, value)?,
            "azimuth" => {
                let azimuth: f64 = decode(name, value)?;
                self.azimuth = azimuth.rem_euclid(360.0);
            },
            "elevation" => self.elevation = decode(name, value)?,
            "index" | "axis_type" | "lines" | "surfaces" => {
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
            "add" if self.axis_type == AxisType::ThreeD => self.add_surface(&args),
            "add" | "line" => self.add_line(&args),
            "surf" => self.add_surface(&args),
            "add_legend" => self.add_legend(&args),
            "set_xticks" => {
                self.xticks = Self::set_ticks(&args)?;
                Ok(Value::Null)
            },
            "set_yticks" => {
                self.yticks = Self::set_ticks(&args)?;
                Ok(Value::Null)
            },
            _ => Err(ObjectError::UnknownMethod {
                name: name.to_string(),
            }),
        }
    }
}
