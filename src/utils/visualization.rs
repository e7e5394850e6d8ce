//! Plotting of the track, traffic and driven trajectories with gnuplot
//!
//! Series are collected first and drawn into a single set of axes when the
//! figure is saved.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{
    lane_center, FrenetFrame, Path2D, PlannerError, PlannerResult, Point2D, TrafficVehicle,
};

/// Color palette
pub mod colors {
    pub const LANE_MARKING: &str = "#808080";
    pub const TRAFFIC: &str = "#000000";
    pub const EGO: &str = "#0000FF";
    pub const TRAJECTORY: &str = "#FF0000";
    pub const DRIVEN: &str = "#35C788";
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
        Self::new(colors::TRAJECTORY, "Trajectory")
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

#[derive(Debug, Clone)]
enum Layer {
    Lines { x: Vec<f64>, y: Vec<f64>, style: PathStyle },
    Points { x: Vec<f64>, y: Vec<f64>, style: PointStyle },
}

/// Top-down plot of a highway scene
#[derive(Debug, Clone)]
pub struct Visualizer {
    layers: Vec<Layer>,
    title: String,
}

impl Visualizer {
    pub fn new() -> Self {
        Self { layers: Vec::new(), title: String::new() }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    /// Number of series added so far
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn plot_path(&mut self, path: &Path2D, style: &PathStyle) -> &mut Self {
        self.layers.push(Layer::Lines {
            x: path.x_coords(),
            y: path.y_coords(),
            style: style.clone(),
        });
        self
    }

    pub fn plot_points(&mut self, points: &[Point2D], style: &PointStyle) -> &mut Self {
        self.layers.push(Layer::Points {
            x: points.iter().map(|p| p.x).collect(),
            y: points.iter().map(|p| p.y).collect(),
            style: style.clone(),
        });
        self
    }

    /// Lane boundaries of the whole loop, sampled every `step` metres of s
    pub fn plot_track<F: FrenetFrame>(
        &mut self,
        frame: &F,
        lane_count: usize,
        lane_width: f64,
        step: f64,
    ) -> &mut Self {
        let samples = (frame.max_s() / step.max(1e-3)).ceil() as usize;
        let style = PathStyle::new(colors::LANE_MARKING, "").with_line_width(0.5);
        for boundary in 0..=lane_count {
            let d = boundary as f64 * lane_width;
            let marking: Vec<Point2D> = (0..=samples)
                .map(|i| frame.to_cartesian(frame.max_s() * i as f64 / samples as f64, d))
                .collect();
            self.plot_path(&Path2D::from_points(marking), &style);
        }
        self
    }

    /// Other vehicles, drawn at the centre of the lane they report
    pub fn plot_traffic<F: FrenetFrame>(
        &mut self,
        frame: &F,
        traffic: &[TrafficVehicle],
        lane_width: f64,
    ) -> &mut Self {
        let cars: Vec<Point2D> = traffic
            .iter()
            .map(|car| {
                let lane = (car.d / lane_width).floor().max(0.0) as usize;
                frame.to_cartesian(car.s, lane_center(lane, lane_width))
            })
            .collect();
        self.plot_points(&cars, &PointStyle::new(colors::TRAFFIC, "Traffic").with_symbol('S'))
    }

    /// Save plot to SVG file
    pub fn save_svg(&self, path: &str) -> PlannerResult<()> {
        self.render()
            .save_to_svg(path, 800, 800)
            .map_err(|e| PlannerError::VisualizationError(e.to_string()))
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        {
            let axes = figure.axes2d();
            if !self.title.is_empty() {
                axes.set_title(&self.title, &[]);
            }
            axes.set_x_label("X [m]", &[]);
            axes.set_y_label("Y [m]", &[]);
            axes.set_aspect_ratio(AutoOption::Fix(1.0));

            for layer in &self.layers {
                match layer {
                    Layer::Lines { x, y, style } => {
                        axes.lines(x, y, &[
                            Caption(&style.caption),
                            Color(&style.color),
                            LineWidth(style.line_width),
                        ]);
                    }
                    Layer::Points { x, y, style } => {
                        axes.points(x, y, &[
                            Caption(&style.caption),
                            Color(&style.color),
                            PointSymbol(style.symbol),
                            PointSize(style.size),
                        ]);
                    }
                }
            }
        }
        figure
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::RoadMap;

    #[test]
    fn test_path_style() {
        let style = PathStyle::new(colors::DRIVEN, "Driven").with_line_width(3.0);
        assert_eq!(style.line_width, 3.0);
        assert_eq!(style.color, colors::DRIVEN);
    }

    #[test]
    fn test_track_has_one_layer_per_boundary() {
        let map = RoadMap::circular(100.0, 36).unwrap();
        let mut vis = Visualizer::new();
        vis.plot_track(&map, 3, 4.0, 10.0);
        assert_eq!(vis.layer_count(), 4);

        match &vis.layers[0] {
            Layer::Lines { x, y, .. } => {
                // closed loop: first and last sample coincide
                assert!((x[0] - x[x.len() - 1]).abs() < 1e-6);
                assert!((y[0] - y[y.len() - 1]).abs() < 1e-6);
            }
            other => panic!("unexpected layer {:?}", other),
        }
    }

    #[test]
    fn test_traffic_layer() {
        let map = RoadMap::circular(100.0, 36).unwrap();
        let cars = [
            TrafficVehicle::new(0, 0.0, 0.0, 0.0, 0.0, 10.0, 5.0),
            TrafficVehicle::new(1, 0.0, 0.0, 0.0, 0.0, 50.0, 9.0),
        ];
        let mut vis = Visualizer::new();
        vis.plot_traffic(&map, &cars, 4.0);
        match &vis.layers[0] {
            Layer::Points { x, .. } => assert_eq!(x.len(), 2),
            other => panic!("unexpected layer {:?}", other),
        }
    }
}
