//! Visualization utilities for ltv_unicycle
//!
//! Collects line series and draws them onto a single gnuplot axes.

use gnuplot::{Figure, Caption, Color, LineWidth, AxesCommon, AutoOption};
use crate::common::{ControlResult, ControllerError, Pose2D};

/// Color palette for consistent styling
pub mod colors {
    pub const RED: &str = "#FF0000";
    pub const GRAY: &str = "#808080";

    // Semantic colors
    pub const REFERENCE: &str = GRAY;
    pub const TRACKED: &str = "#35C788";
    pub const ROBOT: &str = "#DD3355";
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            color: colors::RED.to_string(),
            line_width: 2.0,
            caption: "Path".to_string(),
        }
    }
}

struct Series {
    x: Vec<f64>,
    y: Vec<f64>,
    style: PathStyle,
}

/// Main visualizer struct
pub struct Visualizer {
    series: Vec<Series>,
    title: String,
}

impl Visualizer {
    /// Create a new visualizer
    pub fn new() -> Self {
        Self {
            series: Vec::new(),
            title: String::new(),
        }
    }

    /// Set the plot title
    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    /// Plot a path from x,y vectors
    pub fn plot_path_xy(&mut self, x: &[f64], y: &[f64], style: &PathStyle) -> &mut Self {
        self.series.push(Series {
            x: x.to_vec(),
            y: y.to_vec(),
            style: style.clone(),
        });
        self
    }

    /// Plot a sequence of poses as a path
    pub fn plot_poses(&mut self, poses: &[Pose2D], style: &PathStyle) -> &mut Self {
        let x: Vec<f64> = poses.iter().map(|p| p.x).collect();
        let y: Vec<f64> = poses.iter().map(|p| p.y).collect();
        self.plot_path_xy(&x, &y, style)
    }

    /// Plot robot pose as a short heading line
    pub fn plot_robot(&mut self, pose: &Pose2D, size: f64) -> &mut Self {
        let end_x = pose.x + size * pose.yaw.cos();
        let end_y = pose.y + size * pose.yaw.sin();
        self.plot_path_xy(&[pose.x, end_x], &[pose.y, end_y], &PathStyle::new(colors::ROBOT, "Robot"))
    }

    /// Number of series added so far
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Save plot to SVG file
    pub fn save_svg(&self, path: &str) -> ControlResult<()> {
        self.render()
            .save_to_svg(path, 800, 600)
            .map_err(|e| ControllerError::VisualizationError(e.to_string()))
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        let axes = figure.axes2d();

        for s in &self.series {
            axes.lines(&s.x, &s.y, &[
                Caption(&s.style.caption),
                Color(&s.style.color),
                LineWidth(s.style.line_width),
            ]);
        }

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        // world-frame paths, keep metres square
        axes.set_x_label("X [m]", &[]);
        axes.set_y_label("Y [m]", &[]);
        axes.set_aspect_ratio(AutoOption::Fix(1.0));
        figure
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}
