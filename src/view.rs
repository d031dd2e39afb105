//! View model and the pure render step.
//!
//! The controller only ever mutates a [`ViewModel`]; [`render`] turns it into
//! a [`Screen`] describing which regions are visible and what they contain.

use serde::Serialize;

use crate::intake::{Preview, SelectedFile};
use crate::model::PredictionResult;

pub const PROBABILITIES_HEADING: &str = "All Predictions:";

/// Which regions are on screen. Each variant only admits valid combinations:
/// results never show while loading, and both imply a preview.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    #[default]
    Empty,
    PreviewOnly,
    /// Waiting on the request identified by `ticket`
    Loading { ticket: u64 },
    ResultsShown(ResultsView),
}

/// A prediction ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsView {
    pub name: String,
    pub description: String,
    pub severity: String,
    pub action: String,
    /// Bar width as a percentage of the full width
    pub confidence_width: f64,
    pub confidence_text: String,
    pub heading: String,
    pub rows: Vec<ProbabilityRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityRow {
    pub label: String,
    pub probability: String,
}

impl ResultsView {
    /// Build the results region from a prediction. The breakdown is rebuilt
    /// from scratch, rows in the order the service sent them.
    pub fn from_prediction(result: &PredictionResult) -> Self {
        let info = &result.tumor_info;
        let rows = result
            .all_probabilities
            .iter()
            .map(|p| ProbabilityRow {
                label: p.class.clone(),
                probability: format_percent(p.probability),
            })
            .collect();

        Self {
            name: info.name.clone(),
            description: info.description.clone(),
            severity: info.severity.clone(),
            action: info.action.clone(),
            confidence_width: result.confidence.clamp(0.0, 100.0),
            confidence_text: format_percent(result.confidence),
            heading: PROBABILITIES_HEADING.to_string(),
            rows,
        }
    }
}

/// One decimal with a trailing `%`. Rounds half away from zero on the
/// scaled value, so 87.345 shows as `87.3%` and 4.455 as `4.5%`.
pub fn format_percent(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    format!("{:.1}%", rounded)
}

/// Everything the controller owns.
#[derive(Debug, Clone, Default)]
pub struct ViewModel {
    pub selected: Option<SelectedFile>,
    pub preview: Option<Preview>,
    pub state: ViewState,
    /// Upload area highlight while something is dragged over it
    pub drop_highlight: bool,
    /// Name shown by the file picker input
    pub picker_value: Option<String>,
}

/// Render output: what each region shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen<'a> {
    pub drop_highlight: bool,
    pub picker_value: Option<&'a str>,
    pub preview: Option<PreviewRegion<'a>>,
    pub loading: bool,
    pub results: Option<&'a ResultsView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRegion<'a> {
    pub file_name: &'a str,
    pub media_type: &'a str,
    pub size: usize,
    pub preview: &'a Preview,
}

impl Screen<'_> {
    pub fn preview_visible(&self) -> bool {
        self.preview.is_some()
    }

    pub fn results_visible(&self) -> bool {
        self.results.is_some()
    }
}

pub fn render(model: &ViewModel) -> Screen<'_> {
    let preview_region = match (&model.selected, &model.preview) {
        (Some(file), Some(preview)) => Some(PreviewRegion {
            file_name: &file.name,
            media_type: &file.media_type,
            size: file.size(),
            preview,
        }),
        _ => None,
    };

    let (preview, loading, results) = match &model.state {
        ViewState::Empty => (None, false, None),
        ViewState::PreviewOnly => (preview_region, false, None),
        ViewState::Loading { .. } => (preview_region, true, None),
        ViewState::ResultsShown(results) => (preview_region, false, Some(results)),
    };

    Screen {
        drop_highlight: model.drop_highlight,
        picker_value: model.picker_value.as_deref(),
        preview,
        loading,
        results,
    }
}
