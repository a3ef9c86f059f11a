use plotly::common::{Line, Marker, Mode};
use plotly::histogram::HistNorm;
use plotly::layout::{Axis, GridPattern, Layout, LayoutGrid, Shape, ShapeLine, ShapeType};
use plotly::{Histogram, Plot, Scatter};

use crate::error::{ModelError, Result};
use crate::evaluation::{Diagnostics, DiagnosticsRenderer, Figure};
use crate::stats::gaussian_kde;

const RESIDUAL_BINS: usize = 50;
const KDE_POINTS: usize = 200;

/// Three-panel Plotly figure: actual vs predicted, residuals vs predicted and
/// the residual distribution with the quantile band shaded.
#[derive(Debug, Clone)]
pub struct PlotlyRenderer {
    pub div_id: String,
    pub width: usize,
    pub height: usize,
}

impl Default for PlotlyRenderer {
    fn default() -> Self {
        Self {
            div_id: "jp2rt-diagnostics".to_string(),
            width: 1200,
            height: 400,
        }
    }
}

fn span(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Build the diagnostics plot.
pub fn plot_diagnostics(diagnostics: &Diagnostics<'_>, width: usize, height: usize) -> Plot {
    let Diagnostics {
        y_true,
        y_pred,
        residuals,
        band: (q0, q1),
    } = *diagnostics;
    let marker = Marker::new().size(3).opacity(0.6);

    let actual = Scatter::new(y_pred.to_vec(), y_true.to_vec())
        .mode(Mode::Markers)
        .marker(marker.clone())
        .name("Actual vs. predicted");
    let (tlo, thi) = span(y_true);
    let (plo, phi) = span(y_pred);
    let (lo, hi) = (tlo.min(plo), thi.max(phi));
    let identity = Scatter::new(vec![lo, hi], vec![lo, hi])
        .mode(Mode::Lines)
        .line(Line::new().color("black").dash(plotly::common::DashType::Dash))
        .name("Perfect prediction");

    let residual_scatter = Scatter::new(y_pred.to_vec(), residuals.to_vec())
        .mode(Mode::Markers)
        .marker(marker)
        .name("Residuals vs. predicted")
        .x_axis("x2")
        .y_axis("y2");
    let zero = Scatter::new(vec![plo, phi], vec![0.0, 0.0])
        .mode(Mode::Lines)
        .line(Line::new().color("black").dash(plotly::common::DashType::Dash))
        .show_legend(false)
        .x_axis("x2")
        .y_axis("y2");

    let histogram = Histogram::new(residuals.to_vec())
        .n_bins_x(RESIDUAL_BINS)
        .hist_norm(HistNorm::ProbabilityDensity)
        .name("Residuals")
        .x_axis("x3")
        .y_axis("y3");
    let (kde_x, kde_y) = gaussian_kde(residuals, KDE_POINTS);

    let band = Shape::new()
        .shape_type(ShapeType::Rect)
        .x_ref("x3")
        .y_ref("paper")
        .x0(q0)
        .x1(q1)
        .y0(0.0)
        .y1(1.0)
        .fill_color("rgba(31, 119, 180, 0.2)")
        .line(ShapeLine::new().width(0.0));

    let mut layout = Layout::new()
        .grid(
            LayoutGrid::new()
                .rows(1)
                .columns(3)
                .pattern(GridPattern::Independent),
        )
        .width(width)
        .height(height)
        .x_axis(Axis::new().title("Predicted values"))
        .y_axis(Axis::new().title("Actual values"))
        .x_axis2(Axis::new().title("Predicted values"))
        .y_axis2(Axis::new().title("Residuals (actual - predicted)"))
        .x_axis3(Axis::new().title("Residuals"))
        .y_axis3(Axis::new().title("Density"));
    layout.add_shape(band);

    let mut plot = Plot::new();
    plot.add_trace(actual);
    plot.add_trace(identity);
    plot.add_trace(residual_scatter);
    plot.add_trace(zero);
    plot.add_trace(histogram);
    if !kde_x.is_empty() {
        plot.add_trace(
            Scatter::new(kde_x, kde_y)
                .mode(Mode::Lines)
                .name("KDE")
                .x_axis("x3")
                .y_axis("y3"),
        );
    }
    plot.set_layout(layout);
    plot
}

impl DiagnosticsRenderer for PlotlyRenderer {
    fn render(&self, diagnostics: &Diagnostics<'_>) -> Result<Figure> {
        if diagnostics.y_true.is_empty() {
            return Err(ModelError::Render("no predictions to plot".to_string()));
        }
        let plot = plot_diagnostics(diagnostics, self.width, self.height);
        Ok(Figure {
            title: "Actual vs. predicted, residuals and residual distribution".to_string(),
            html: plot.to_inline_html(Some(self.div_id.as_str())),
        })
    }
}
