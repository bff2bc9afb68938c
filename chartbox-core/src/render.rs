use thiserror::Error;

use crate::{GraphData, GraphKind};

/// Pixel dimensions for a rendered chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Renders a validated graph to PNG bytes.
///
/// Drawing is delegated to a charting library behind this seam, so consumers
/// only depend on the graph model.
pub trait ChartRenderer: Send + Sync {
    fn render(
        &self,
        title: &str,
        kind: GraphKind,
        labels: &[String],
        data: &GraphData,
        options: RenderOptions,
    ) -> Result<Vec<u8>, RenderError>;
}
