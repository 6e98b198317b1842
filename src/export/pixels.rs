//! Surface-to-PNG conversion with an ordered fallback chain.
//!
//! Encoders are tried in order and the first non-empty result wins:
//!
//! | Strategy | How | Fails when |
//! |----------|-----|------------|
//! | `async-blob` | PNG encode on the blocking pool, bounded wait | timeout, encoder error, panic, empty output |
//! | `data-url` | PNG → `data:image/png;base64,…` → header stripped → decoded, on the blocking pool | encoder error, malformed URL, panic, empty output |
//!
//! Every failure is kept, so an export that cannot encode a slide reports
//! why each strategy gave up.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

/// Why a single strategy did not produce bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub reason: String,
}

impl StrategyFailure {
    pub fn new(strategy: &'static str, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

/// One way of turning a surface into PNG bytes.
#[async_trait]
pub trait EncodeStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn encode(&self, surface: Arc<RgbaImage>) -> Result<Vec<u8>, String>;
}

fn encode_png(surface: &RgbaImage) -> Result<Vec<u8>, String> {
    let mut out = Cursor::new(Vec::new());
    surface
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| format!("PNG encoding failed: {}", e))?;
    Ok(out.into_inner())
}

/// Asynchronous PNG encoding with a bounded wait.
#[derive(Debug, Clone)]
pub struct AsyncBlobStrategy {
    pub timeout: Duration,
}

#[async_trait]
impl EncodeStrategy for AsyncBlobStrategy {
    fn name(&self) -> &'static str {
        "async-blob"
    }

    async fn encode(&self, surface: Arc<RgbaImage>) -> Result<Vec<u8>, String> {
        let task = tokio::task::spawn_blocking(move || encode_png(&surface));
        match tokio::time::timeout(self.timeout, task).await {
            Err(_) => Err(format!("timed out after {}ms", self.timeout.as_millis())),
            Ok(Err(join_error)) => Err(format!("encoder task failed: {}", join_error)),
            Ok(Ok(result)) => result,
        }
    }
}

/// Synchronous data-URL encoding, decoded back to raw bytes.
#[derive(Debug, Clone, Default)]
pub struct DataUrlStrategy;

impl DataUrlStrategy {
    pub fn to_data_url(surface: &RgbaImage) -> Result<String, String> {
        let png = encode_png(surface)?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }
}

#[async_trait]
impl EncodeStrategy for DataUrlStrategy {
    fn name(&self) -> &'static str {
        "data-url"
    }

    async fn encode(&self, surface: Arc<RgbaImage>) -> Result<Vec<u8>, String> {
        tokio::task::spawn_blocking(move || {
            let url = Self::to_data_url(&surface)?;
            let (_, payload) = url
                .split_once(',')
                .ok_or_else(|| "data URL has no payload separator".to_string())?;
            STANDARD
                .decode(payload)
                .map_err(|e| format!("data URL payload is not base64: {}", e))
        })
        .await
        .map_err(|e| format!("encoder task failed: {}", e))?
    }
}

/// Ordered list of encode strategies.
#[derive(Clone)]
pub struct PixelExporter {
    strategies: Vec<Arc<dyn EncodeStrategy>>,
}

impl std::fmt::Debug for PixelExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.name()))
            .finish()
    }
}

impl Default for PixelExporter {
    fn default() -> Self {
        Self::standard(Duration::from_secs(15))
    }
}

impl PixelExporter {
    /// `async-blob` with the given timeout, then `data-url`.
    pub fn standard(timeout: Duration) -> Self {
        Self::with_strategies(vec![
            Arc::new(AsyncBlobStrategy { timeout }),
            Arc::new(DataUrlStrategy),
        ])
    }

    pub fn with_strategies(strategies: Vec<Arc<dyn EncodeStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Encode `surface`, returning the first non-empty result or every
    /// strategy's failure.
    pub async fn export(&self, surface: RgbaImage) -> Result<Vec<u8>, Vec<StrategyFailure>> {
        let surface = Arc::new(surface);
        let mut failures = Vec::new();
        for strategy in &self.strategies {
            match strategy.encode(surface.clone()).await {
                Ok(bytes) if !bytes.is_empty() => {
                    tracing::debug!(strategy = strategy.name(), bytes = bytes.len(), "encoded surface");
                    return Ok(bytes);
                }
                Ok(_) => failures.push(StrategyFailure::new(strategy.name(), "produced zero bytes")),
                Err(reason) => {
                    tracing::warn!(strategy = strategy.name(), %reason, "encode strategy failed");
                    failures.push(StrategyFailure::new(strategy.name(), reason));
                }
            }
        }
        Err(failures)
    }
}
