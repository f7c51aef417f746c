use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("creating plots directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to render plot: {0}")]
    Render(String),
}

/// Renders (label, probability) rows as a bar chart PNG under `dir` and
/// returns the written path.
pub fn render_bar_chart(
    dir: &Path,
    stem: &str,
    title: &str,
    rows: &[(String, f64)],
) -> Result<PathBuf, PlotError> {
    fs::create_dir_all(dir)?;
    let output_path = dir.join(format!("{stem}.png"));

    let rows = rows.to_vec();
    let title = title.to_string();
    let path_for_plot = output_path.clone();

    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));

    let plot_attempt = std::panic::catch_unwind(move || {
        let root = BitMapBackend::new(&path_for_plot, (800, 480)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| PlotError::Render(e.to_string()))?;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .caption(title.as_str(), ("sans-serif", 22))
            .set_label_area_size(LabelAreaPosition::Left, 50)
            .set_label_area_size(LabelAreaPosition::Bottom, 60)
            .build_cartesian_2d(0..rows.len(), 0.0..1.0f64)
            .map_err(|e| PlotError::Render(e.to_string()))?;

        chart
            .configure_mesh()
            .disable_mesh()
            .y_desc("probability")
            .x_label_formatter(&|idx| {
                rows.get(*idx)
                    .map(|(label, _)| label.clone())
                    .unwrap_or_default()
            })
            .draw()
            .map_err(|e| PlotError::Render(e.to_string()))?;

        chart
            .draw_series(rows.iter().enumerate().map(|(idx, (_, prob))| {
                Rectangle::new([(idx, 0.0), (idx + 1, *prob)], BLUE.filled())
            }))
            .map_err(|e| PlotError::Render(e.to_string()))?;

        drop(chart);

        root.present()
            .map_err(|e| PlotError::Render(e.to_string()))?;

        drop(root);

        Ok(path_for_plot)
    });

    std::panic::set_hook(prev_hook);

    match plot_attempt {
        Ok(result) => result,
        Err(_) => Err(PlotError::Render(
            "plotters panicked while rendering (missing font support?)".into(),
        )),
    }
}
