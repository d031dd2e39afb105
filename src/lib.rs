//! Client for a brain-scan classification service.
//!
//! Pick or drop an image, preview it, post it to the service's
//! `/predict` endpoint and render the prediction that comes back.
//!
//! ```no_run
//! use scan_client::{ClientConfig, Controller, HttpPredictionService, SelectedFile};
//! # async fn run() -> Result<(), scan_client::ClientError> {
//! let config = ClientConfig::from_env()?;
//! let service = HttpPredictionService::new(&config)?;
//! let mut controller = Controller::with_config(service, &config);
//!
//! let file = SelectedFile::from_path("scan.png".as_ref()).await?;
//! controller.pick_file(Some(file)).await?;
//! controller.analyze_image().await?;
//!
//! if let Some(results) = controller.screen().results {
//!     println!("{}: {}", results.name, results.confidence_text);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`controller`]: event handlers as view-model transitions
//! - [`view`]: view state and the pure render step
//! - [`model`]: service wire format and validated parsing
//! - [`service`]: HTTP transport
//! - [`intake`]: selected files and previews

pub mod config;
pub mod controller;
pub mod error;
pub mod intake;
pub mod model;
pub mod service;
pub mod view;

pub use config::ClientConfig;
pub use controller::{AnalysisOutcome, AnalysisRequest, Controller};
pub use error::ClientError;
pub use intake::{Preview, SelectedFile};
pub use model::{PredictionResult, ServiceResponse};
pub use service::{HttpPredictionService, PredictionService};
pub use view::{render, ResultsView, Screen, ViewModel, ViewState};
