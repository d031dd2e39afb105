//! Upload-analyze-display controller.
//!
//! Event handlers are state transitions on a [`ViewModel`]; callers render
//! with [`Controller::screen`] after each one. Errors returned from the
//! handlers are the alerts to show the user; none of them leave the
//! controller in a loading state.
//!
//! Analysis is two-phase so a front-end can keep handling events while a
//! request is outstanding: [`Controller::begin_analysis`] hands out an
//! [`AnalysisRequest`] carrying a ticket, and [`Controller::complete_analysis`]
//! applies the response only if that ticket is still the one being waited
//! on. Clearing or selecting another file in between makes the response
//! stale, and it is dropped.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::intake::{load_preview, SelectedFile};
use crate::model::{PredictionResult, ServiceResponse};
use crate::service::PredictionService;
use crate::view::{render, ResultsView, Screen, ViewModel, ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// Results are on screen
    Rendered,
    /// The response belonged to a request the user moved on from
    Discarded,
}

/// A packaged upload, detached from the controller while in flight.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    ticket: u64,
    file: SelectedFile,
}

impl AnalysisRequest {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn file(&self) -> &SelectedFile {
        &self.file
    }

    pub async fn send<S: PredictionService>(
        &self,
        service: &S,
    ) -> Result<ServiceResponse, ClientError> {
        service.predict(&self.file).await
    }
}

pub struct Controller<S> {
    service: S,
    model: ViewModel,
    max_upload_bytes: usize,
    limit_mb: usize,
    next_ticket: u64,
}

impl<S: PredictionService> Controller<S> {
    pub fn new(service: S) -> Self {
        Self::with_config(service, &ClientConfig::default())
    }

    pub fn with_config(service: S, config: &ClientConfig) -> Self {
        Self {
            service,
            model: ViewModel::default(),
            max_upload_bytes: config.max_upload_bytes(),
            limit_mb: config.max_upload_mb,
            next_ticket: 0,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn view(&self) -> &ViewModel {
        &self.model
    }

    pub fn screen(&self) -> Screen<'_> {
        render(&self.model)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.model.state, ViewState::Loading { .. })
    }

    pub fn drag_over(&mut self) {
        self.model.drop_highlight = true;
    }

    pub fn drag_leave(&mut self) {
        self.model.drop_highlight = false;
    }

    /// File picker path. The picker shows the chosen name once accepted.
    pub async fn pick_file(&mut self, candidate: Option<SelectedFile>) -> Result<(), ClientError> {
        let name = candidate.as_ref().map(|f| f.name.clone());
        self.handle_file(candidate).await?;
        self.model.picker_value = name;
        Ok(())
    }

    /// Drop path. Only the first dropped file is considered.
    pub async fn drop_files(&mut self, files: Vec<SelectedFile>) -> Result<(), ClientError> {
        self.drag_leave();
        self.handle_file(files.into_iter().next()).await
    }

    /// Validate and select a file, then show its preview.
    ///
    /// Rejected candidates leave every piece of state untouched. Accepted
    /// ones replace the selection, hide any results, and supersede an
    /// outstanding analysis.
    pub async fn handle_file(
        &mut self,
        candidate: Option<SelectedFile>,
    ) -> Result<(), ClientError> {
        let file = match candidate {
            Some(file) if file.is_image() => file,
            Some(file) => {
                log::debug!("Rejected {} ({})", file.name, file.media_type);
                return Err(ClientError::InvalidFile);
            }
            None => return Err(ClientError::InvalidFile),
        };

        if file.size() > self.max_upload_bytes {
            return Err(ClientError::FileTooLarge {
                size: file.size(),
                limit_mb: self.limit_mb,
            });
        }

        let preview = load_preview(file.clone()).await?;
        log::info!("Selected {} ({}, {} bytes)", file.name, file.media_type, file.size());

        self.model.selected = Some(file);
        self.model.preview = Some(preview);
        self.model.state = ViewState::PreviewOnly;
        Ok(())
    }

    /// Enter the loading state and package the selected file for upload.
    pub fn begin_analysis(&mut self) -> Result<AnalysisRequest, ClientError> {
        if self.is_loading() {
            return Err(ClientError::AnalysisInFlight);
        }
        let file = self
            .model
            .selected
            .clone()
            .ok_or(ClientError::NoFileSelected)?;

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.model.state = ViewState::Loading { ticket };
        log::debug!("Request #{} for {}", ticket, file.name);

        Ok(AnalysisRequest { ticket, file })
    }

    /// Apply the response for `ticket`. Loading is cleared on every path
    /// where the ticket is current; stale responses change nothing.
    pub fn complete_analysis(
        &mut self,
        ticket: u64,
        response: Result<ServiceResponse, ClientError>,
    ) -> Result<AnalysisOutcome, ClientError> {
        match self.model.state {
            ViewState::Loading { ticket: current } if current == ticket => {}
            _ => {
                log::debug!("Discarding response to stale request #{}", ticket);
                return Ok(AnalysisOutcome::Discarded);
            }
        }

        self.model.state = ViewState::PreviewOnly;

        match response {
            Ok(ServiceResponse::Prediction(result)) => {
                self.display_results(&result);
                Ok(AnalysisOutcome::Rendered)
            }
            Ok(ServiceResponse::Error(message)) => {
                log::warn!("Service reported: {}", message);
                Err(ClientError::Service(message))
            }
            Err(err) => {
                log::warn!("Request #{} failed: {}", ticket, err);
                Err(err)
            }
        }
    }

    /// Upload the selected file and show what comes back.
    pub async fn analyze_image(&mut self) -> Result<AnalysisOutcome, ClientError> {
        let request = self.begin_analysis()?;
        let response = request.send(&self.service).await;
        self.complete_analysis(request.ticket(), response)
    }

    /// Results only ever show next to a preview; without one this is a no-op.
    fn display_results(&mut self, result: &PredictionResult) {
        if self.model.selected.is_none() || self.model.preview.is_none() {
            log::debug!("No preview on screen, not showing results");
            return;
        }
        self.model.state = ViewState::ResultsShown(ResultsView::from_prediction(result));
    }

    pub fn clear_image(&mut self) {
        self.model.selected = None;
        self.model.preview = None;
        self.model.picker_value = None;
        self.model.state = ViewState::Empty;
    }
}
