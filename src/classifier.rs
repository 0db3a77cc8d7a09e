//! Facial expression classification
//!
//! Two-phase lifecycle: the expression model's assets load once at
//! session start, then [`MoodClassifier::classify`] runs single-face
//! inference per frame. Until the load completes every classification is
//! rejected with [`NotReadyError`] so callers can ignore the pass and
//! try again later.

use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::error::{LoadError, NotReadyError};
use crate::model::{FaceScan, Frame, MoodResult};

/// Expression inference seam.
///
/// `load` pulls the model assets (the face detector and the expression
/// net); `detect` scans one frame for a single face and scores its
/// expression. A scan's outcome must depend only on the frame and the
/// loaded assets, never on earlier calls.
pub trait ExpressionModel: Send + Sync {
    fn load(&self) -> BoxFuture<'_, Result<()>>;
    fn detect<'a>(&'a self, frame: &'a Frame) -> BoxFuture<'a, Result<FaceScan>>;
}

/// Expression model lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelPhase {
    Unloaded,
    Loading,
    Ready,
    /// Terminal. A failed load stays failed for the session.
    Failed,
}

/// Classifies a frame's dominant facial expression.
pub struct MoodClassifier {
    model: Arc<dyn ExpressionModel>,
    phase: RwLock<ModelPhase>,
}

impl MoodClassifier {
    pub fn new(model: Arc<dyn ExpressionModel>) -> Self {
        Self {
            model,
            phase: RwLock::new(ModelPhase::Unloaded),
        }
    }

    pub async fn phase(&self) -> ModelPhase {
        *self.phase.read().await
    }

    pub async fn is_ready(&self) -> bool {
        self.phase().await == ModelPhase::Ready
    }

    /// Load the model assets.
    ///
    /// Meant to be invoked once at session start. A call that finds the
    /// model ready returns immediately; one that finds a load already
    /// underway returns without waiting for it; one that finds a failed
    /// load reports [`LoadError::Failed`].
    pub async fn load_models(&self) -> Result<(), LoadError> {
        {
            let mut phase = self.phase.write().await;
            match *phase {
                ModelPhase::Ready | ModelPhase::Loading => return Ok(()),
                ModelPhase::Failed => return Err(LoadError::Failed),
                ModelPhase::Unloaded => *phase = ModelPhase::Loading,
            }
        }

        tracing::info!("Loading expression model assets");
        match self.model.load().await {
            Ok(()) => {
                *self.phase.write().await = ModelPhase::Ready;
                tracing::info!("Expression model ready");
                Ok(())
            }
            Err(e) => {
                *self.phase.write().await = ModelPhase::Failed;
                tracing::error!(error = %e, "Expression model failed to load");
                Err(LoadError::Assets(e))
            }
        }
    }

    /// Classify the dominant facial expression in `frame`.
    ///
    /// Rejected with [`NotReadyError`] until the model is loaded. Zero
    /// faces, ambiguously many faces and failed scans all resolve to
    /// [`MoodResult::NotDetected`], so a ready classifier always hands
    /// back a usable outcome.
    pub async fn classify(&self, frame: &Frame) -> Result<MoodResult, NotReadyError> {
        if !self.is_ready().await {
            return Err(NotReadyError);
        }

        let scan = match self.model.detect(frame).await {
            Ok(scan) => scan,
            Err(e) => {
                tracing::warn!(error = %e, "Expression scan failed");
                return Ok(MoodResult::NotDetected);
            }
        };

        Ok(match scan {
            FaceScan::NoFace => {
                tracing::debug!("No face in frame");
                MoodResult::NotDetected
            }
            FaceScan::Ambiguous { faces } => {
                tracing::debug!(faces, "Ambiguous face scan");
                MoodResult::NotDetected
            }
            FaceScan::Single(scores) => {
                let result = MoodResult::from_scores(&scores);
                if let MoodResult::Detected { label, .. } = &result {
                    tracing::debug!(mood = %label, "Expression scored");
                }
                result
            }
        })
    }
}
