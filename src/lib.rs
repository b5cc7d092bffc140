// ABOUTME: Library module for the deck-forge program.
// ABOUTME: Contains the resilient deck generation pipeline and PPTX export.

// Reexport modules
pub mod backoff;
pub mod cache;
pub mod config;
pub mod deadline;
pub mod deck;
pub mod errors;
pub mod gemini;
pub mod generator;
pub mod images;
pub mod models;
pub mod pptx;
pub mod retry;
pub mod service;
pub mod transport;
pub mod utils;

// Reexport common types and functions
pub use cache::{Clock, DeckCache, SystemClock};
pub use config::Config;
pub use deadline::{CancelToken, Deadline};
pub use deck::{normalize, Deck, DeckStyle, Slide};
pub use errors::{DeckError, ErrorBody, Result};
pub use gemini::{DeckPrompt, GeminiClient};
pub use generator::DeckGenerator;
pub use images::{ImageOptions, ImageResolver};
pub use models::{sanitize, Capability, ModelName};
pub use pptx::{write_pptx, PptxConfig};
pub use retry::{PlanState, RetryPlan};
pub use service::{DeckService, ExportRequest, ExportedFile, GenerateRequest, ImageRequest, ImageResponse};
pub use transport::{ReqwestTransport, Transport, UpstreamResponse};
