//! Utility evaluation: QA accuracy on raw vs masked text, and ε sweeps

use crate::engine::ShieldEngine;
use crate::error::{Result, ShieldError};
use crate::provider::Generator;
use serde::{Deserialize, Serialize};

/// Question-answering sample with a gold answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaSample {
    pub text: String,
    pub question: String,
    pub answer: String,
}

impl QaSample {
    pub fn new(text: impl Into<String>, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Accuracy before and after masking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalReport {
    pub samples: usize,
    pub raw_accuracy: f64,
    pub masked_accuracy: f64,
    /// `raw_accuracy - masked_accuracy`
    pub utility_loss: f64,
}

/// Output of one ε setting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepPoint {
    pub epsilon: f64,
    pub masked: String,
    pub output: String,
}

/// Small built-in evaluation set of business emails
pub fn default_samples() -> Vec<QaSample> {
    vec![
        QaSample::new(
            "Hi Team,\n\nJohn from Alpha Corp requested approval for the $12,500 invoice.\n\n\
             Please confirm with Sarah before processing.\n\nThanks",
            "Who requested approval?",
            "John",
        ),
        QaSample::new(
            "Hi,\n\nPriya from SecureStack submitted the proposal.\n\n\
             Delivery is expected March 20.\n\nRegards",
            "When is delivery expected?",
            "March",
        ),
    ]
}

/// Case-insensitive containment of the gold answer
pub fn answer_matches(prediction: &str, gold: &str) -> bool {
    prediction.to_lowercase().contains(&gold.to_lowercase())
}

fn require_generator(engine: &ShieldEngine) -> Result<&dyn Generator> {
    engine
        .generator()
        .ok_or_else(|| ShieldError::dependency("generator", "no generator configured"))
}

/// Answer every sample from the raw and from the sanitized text
pub async fn evaluate(engine: &ShieldEngine, samples: &[QaSample]) -> Result<EvalReport> {
    let generator = require_generator(engine)?;
    let mut raw_correct = 0usize;
    let mut masked_correct = 0usize;

    for sample in samples {
        let raw = generator
            .generate(&sample.text, Some(&sample.question))
            .await
            .map_err(|e| e.attribute("generator"))?;
        let sanitized = engine.sanitize(&sample.text).await?;
        let masked = generator
            .generate(&sanitized.text, Some(&sample.question))
            .await
            .map_err(|e| e.attribute("generator"))?;

        if answer_matches(&raw, &sample.answer) {
            raw_correct += 1;
        }
        if answer_matches(&masked, &sample.answer) {
            masked_correct += 1;
        }
    }

    let total = samples.len().max(1) as f64;
    let report = EvalReport {
        samples: samples.len(),
        raw_accuracy: raw_correct as f64 / total,
        masked_accuracy: masked_correct as f64 / total,
        utility_loss: (raw_correct as f64 - masked_correct as f64) / total,
    };
    tracing::info!(
        samples = report.samples,
        raw_accuracy = report.raw_accuracy,
        masked_accuracy = report.masked_accuracy,
        "Evaluation complete"
    );
    Ok(report)
}

/// Answer `question` over `text` once per ε, each with a fresh engine
pub async fn epsilon_sweep(
    engine: &ShieldEngine,
    epsilons: &[f64],
    text: &str,
    question: &str,
) -> Result<Vec<SweepPoint>> {
    let generator = require_generator(engine)?;
    let mut points = Vec::with_capacity(epsilons.len());

    for &epsilon in epsilons {
        let variant = engine.with_config(engine.config().clone().with_epsilon(epsilon))?;
        let sanitized = variant.sanitize(text).await?;
        let output = generator
            .generate(&sanitized.text, Some(question))
            .await
            .map_err(|e| e.attribute("generator"))?;
        tracing::debug!(epsilon, "Sweep point complete");
        points.push(SweepPoint {
            epsilon,
            masked: sanitized.text,
            output,
        });
    }

    Ok(points)
}
