use std::path::Path;

use chrono::Local;
use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::evaluation::{EvaluationReport, Figure};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

const STYLE: &str = "
body { font-family: sans-serif; margin: 2em auto; max-width: 1200px; color: #222; }
h1 { border-bottom: 2px solid #ddd; padding-bottom: 0.3em; }
section { margin-bottom: 2em; }
table.metrics { border-collapse: collapse; }
table.metrics td { border: 1px solid #ccc; padding: 4px 12px; }
table.metrics td.value { text-align: right; font-family: monospace; }
.code-container { background-color: #f5f5f5; padding: 10px; border-radius: 5px;
  overflow-x: auto; font-family: monospace; white-space: pre-wrap; }
";

/// A titled block of HTML content.
#[derive(Debug, Clone)]
pub struct ReportSection {
    title: String,
    content: Vec<Markup>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            content: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.content.push(content);
    }

    pub fn add_figure(&mut self, figure: &Figure) {
        self.content.push(html! {
            div class="figure" {
                h3 { (figure.title) }
                (PreEscaped(figure.html.clone()))
            }
        });
    }

    fn render(&self) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for block in &self.content {
                    (block)
                }
            }
        }
    }
}

/// Single-page HTML report.
#[derive(Debug, Clone)]
pub struct Report {
    tool: String,
    version: String,
    title: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(tool: &str, version: &str, title: &str) -> Self {
        Self {
            tool: tool.to_string(),
            version: version.to_string(),
            title: title.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> Markup {
        let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style { (PreEscaped(STYLE)) }
                }
                body {
                    h1 { (self.title) }
                    p { "Generated by " (self.tool) " " (self.version) " on " (generated) }
                    @for section in &self.sections {
                        (section.render())
                    }
                }
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.render().into_string())
    }
}

/// Build the standard report of a cross-validation run: summary metrics,
/// per-fold scores, the diagnostics figure when one was rendered and,
/// optionally, the configuration as JSON.
pub fn evaluation_report(
    evaluation: &EvaluationReport,
    tool: &str,
    version: &str,
    config_json: Option<&str>,
) -> Report {
    let mut report = Report::new(
        tool,
        version,
        &format!("{} {} Evaluation Report", tool, evaluation.regressor),
    );

    let mut summary = ReportSection::new("Cross validation");
    summary.add_content(html! {
        p {
            (evaluation.config.folds) "-fold cross validation of " (evaluation.regressor)
            " on " (evaluation.n_samples) " samples, residual band at "
            (format!("{:.0}", evaluation.config.confidence * 100.0)) "% confidence."
        }
        table class="metrics" {
            @for (key, value) in evaluation.metrics.rows() {
                tr {
                    td { (key) }
                    td class="value" { (format!("{:.4}", value)) }
                }
            }
        }
    });
    if let Some(figure) = &evaluation.figure {
        summary.add_figure(figure);
    }
    report.add_section(summary);

    let mut folds = ReportSection::new("Folds");
    folds.add_content(html! {
        table class="metrics" {
            tr { td { "fold" } td { "r2" } td { "rmse" } }
            @for (k, (r2, rmse)) in evaluation.r2.iter().zip(&evaluation.rmse).enumerate() {
                tr {
                    td { (k) }
                    td class="value" { (format!("{:.4}", r2)) }
                    td class="value" { (format!("{:.4}", rmse)) }
                }
            }
        }
    });
    report.add_section(folds);

    if let Some(json) = config_json {
        let mut config = ReportSection::new("Configuration");
        config.add_content(html! {
            div class="code-container" {
                pre { code { (json) } }
            }
        });
        report.add_section(config);
    }

    report
}
