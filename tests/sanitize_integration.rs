//! Sanitization pipeline integration tests
//!
//! End-to-end tests exercising ShieldEngine with the built-in detectors and
//! the hashing embedder. Covers the business-email walkthrough, coverage and
//! preservation guarantees, clustering, role noise, collaborator failures,
//! the generation pipeline and the masked index.

use a3s_shield::{
    Embedder, EntityLabel, GazetteerDetector, Generator, HashEmbedder, MaskedIndex,
    RegexDetector, ReplacementKind, Result, Role, ShieldConfig, ShieldEngine, ShieldError,
    SpanCollector,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

const EMAIL: &str = "Priya from SecureStack requested approval for $68,200. \
                     Please confirm with Ramesh before processing.";

fn collector() -> SpanCollector {
    SpanCollector::default()
        .with_detector(
            GazetteerDetector::from_terms([
                ("Priya", EntityLabel::Person),
                ("Ramesh", EntityLabel::Person),
                ("John", EntityLabel::Person),
                ("SecureStack", EntityLabel::Organization),
                ("Alpha Corp", EntityLabel::Organization),
            ])
            .unwrap(),
        )
        .with_detector(RegexDetector::with_default_rules().unwrap())
}

fn test_engine(config: ShieldConfig) -> ShieldEngine {
    ShieldEngine::new(collector(), HashEmbedder::default(), config).unwrap()
}

/// Records every call and answers with the context
#[derive(Default)]
struct RecordingGenerator {
    calls: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, context: &str, question: Option<&str>) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((context.to_string(), question.map(str::to_string)));
        Ok(format!("answer over: {context}"))
    }
}

struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(&self, _context: &str, _question: Option<&str>) -> Result<String> {
        Err(ShieldError::Config("quota exceeded".to_string()))
    }
}

struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(ShieldError::dependency("embedder", "connection refused"))
    }

    fn dimension(&self) -> usize {
        8
    }
}

// ─── Walkthrough ─────────────────────────────────────────────────

#[tokio::test]
async fn test_business_email_walkthrough() {
    let engine = test_engine(ShieldConfig::default().with_epsilon(1.0).with_seed(11));
    let out = engine.sanitize(EMAIL).await.unwrap();

    let map = &out.placeholders;
    assert_eq!(map.len(), 4);
    assert_eq!(map.get("Priya").unwrap().value, "Requester_1");
    assert_eq!(map.get("SecureStack").unwrap().value, "Org_1");
    let money = map.get("$68,200").unwrap();
    assert_eq!(money.kind, ReplacementKind::Bucket);
    assert_eq!(money.value, "tens of thousands of dollars");

    // No trigger falls inside Ramesh's context window, so the role is drawn uniformly.
    let ramesh = &map.get("Ramesh").unwrap().value;
    assert!(
        ["Vendor_1", "Requester_2", "Approver_1", "Compliance_1", "Person_1"]
            .contains(&ramesh.as_str()),
        "unexpected placeholder {ramesh}"
    );
    assert_eq!(out.roles.len(), 2);
    assert_eq!(out.roles[0].inferred, Some(Role::Requester));
    assert_eq!(out.roles[1].inferred, None);

    assert!(out.text.starts_with(
        "[Requester_1] from [Org_1] requested approval for tens of thousands of dollars. \
         Please confirm with ["
    ));
    assert!(out.text.ends_with("] before processing."));
    assert!(!out.text.contains("Priya"));
    assert!(!out.text.contains("68,200"));
}

#[tokio::test]
async fn test_placeholder_map_serializes_as_surface_object() {
    let engine = test_engine(ShieldConfig::default().with_epsilon(1.0).with_seed(11));
    let out = engine.sanitize("SecureStack billed $500").await.unwrap();
    let json = serde_json::to_value(&out.placeholders).unwrap();
    assert_eq!(json["SecureStack"], "[Org_1]");
    assert_eq!(json["$500"], "a few hundred dollars");
}

// ─── Guarantees ──────────────────────────────────────────────────

#[tokio::test]
async fn test_coverage_offsets_match_source() {
    let engine = test_engine(ShieldConfig::default().with_seed(3));
    let raw = "John from Alpha Corp (john@alpha.io, 555-123-4567) sent $12,500 on June 2. \
               Alpha Corp confirmed with Priya.";
    let out = engine.sanitize(raw).await.unwrap();

    assert!(!out.placeholders.is_empty());
    for entry in out.placeholders.iter() {
        assert_eq!(&out.source[entry.start..entry.end], entry.surface);
    }
    for span in out.spans.iter() {
        assert!(out.placeholders.contains(&span.text));
    }
}

#[tokio::test]
async fn test_text_outside_spans_is_preserved() {
    let engine = test_engine(ShieldConfig::default().with_seed(3));
    let raw = "— Priya → paid €1,200 to Alpha Corp ✓ on March 3 —";
    let out = engine.sanitize(raw).await.unwrap();

    let mut rebuilt = String::new();
    let mut cursor = 0;
    for span in out.spans.iter() {
        rebuilt.push_str(&raw[cursor..span.start]);
        rebuilt.push_str(&out.placeholders.get(&span.text).unwrap().rendered());
        cursor = span.end;
    }
    rebuilt.push_str(&raw[cursor..]);
    assert_eq!(out.text, rebuilt);
    assert!(out.text.starts_with("— "));
    assert!(out.text.ends_with("early March —"));
}

#[tokio::test]
async fn test_repeated_organization_shares_placeholder() {
    let engine = test_engine(ShieldConfig::default());
    let out = engine
        .sanitize("Alpha Corp sent the quote. We trust Alpha Corp.")
        .await
        .unwrap();
    assert_eq!(out.text, "[Org_1] sent the quote. We trust [Org_1].");
}

#[tokio::test]
async fn test_no_spans_returns_input() {
    let engine = test_engine(ShieldConfig::default());
    let raw = "nothing sensitive here";
    let out = engine.sanitize(raw).await.unwrap();
    assert_eq!(out.text, raw);
    assert!(out.placeholders.is_empty());
    let metrics = engine.metrics(raw, &out.text, &out.spans).await.unwrap();
    assert_eq!(metrics.survival_rate, 0.0);
    assert!((metrics.similarity - 1.0).abs() < 1e-4);
}

// ─── Role noise ──────────────────────────────────────────────────

#[tokio::test]
async fn test_reseed_reproduces_role_draws() {
    let engine = test_engine(ShieldConfig::default().with_epsilon(0.3));
    let texts = ["Priya requested it", "John from Alpha Corp", "Ramesh was there"];

    engine.reseed(2024);
    let mut first = Vec::new();
    for t in texts {
        first.push(engine.sanitize(t).await.unwrap().text);
    }

    engine.reseed(2024);
    let mut second = Vec::new();
    for t in texts {
        second.push(engine.sanitize(t).await.unwrap().text);
    }
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_epsilon_one_labels_accurately() {
    let engine = test_engine(ShieldConfig::default().with_epsilon(1.0));
    for _ in 0..20 {
        let out = engine.sanitize("John from Alpha Corp called").await.unwrap();
        assert_eq!(out.text, "[Vendor_1] from [Org_1] called");
    }
}

// ─── Collaborator failures ───────────────────────────────────────

#[tokio::test]
async fn test_embedder_failure_is_dependency_error() {
    let engine = ShieldEngine::new(collector(), FailingEmbedder, ShieldConfig::default()).unwrap();
    let err = engine.sanitize(EMAIL).await.unwrap_err();
    match err {
        ShieldError::Dependency { collaborator, .. } => assert_eq!(collaborator, "embedder"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_identifiers_only_need_no_embedder() {
    let engine = ShieldEngine::new(collector(), FailingEmbedder, ShieldConfig::default()).unwrap();
    let out = engine.sanitize("Reach me at ops@example.com").await.unwrap();
    assert_eq!(out.text, "Reach me at [Email_1]");
}

#[tokio::test]
async fn test_generator_failure_is_dependency_error() {
    let engine = test_engine(ShieldConfig::default()).with_generator(FailingGenerator);
    let err = engine.run(EMAIL, Some("Who requested approval?")).await.unwrap_err();
    match err {
        ShieldError::Dependency { collaborator, reason } => {
            assert_eq!(collaborator, "generator");
            assert!(reason.contains("quota exceeded"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ─── Pipeline ────────────────────────────────────────────────────

#[tokio::test]
async fn test_run_answers_over_masked_text() {
    let generator = RecordingGenerator::default();
    let calls = Arc::clone(&generator.calls);
    let engine = test_engine(ShieldConfig::default().with_epsilon(1.0).with_seed(1))
        .with_generator(generator);

    let report = engine.run(EMAIL, Some("Who requested approval?")).await.unwrap();
    assert_eq!(report.raw, EMAIL);
    assert!(report.output.starts_with("answer over: [Requester_1]"));
    assert_eq!(report.metrics.survival_rate, 0.0);
    assert!(report.metrics.similarity > 0.0);
    assert!(report.probe.is_none());

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, report.masked);
    assert_eq!(calls[0].1.as_deref(), Some("Who requested approval?"));
}

#[tokio::test]
async fn test_summary_requests_drop_the_question() {
    let generator = RecordingGenerator::default();
    let calls = Arc::clone(&generator.calls);
    let engine = test_engine(ShieldConfig::default()).with_generator(generator);

    engine.run(EMAIL, Some("Please SUMMARIZE this")).await.unwrap();
    engine.run(EMAIL, None).await.unwrap();

    let calls = calls.lock().unwrap();
    assert!(calls.iter().all(|(_, q)| q.is_none()));
}

#[tokio::test]
async fn test_reidentification_probe() {
    let generator = RecordingGenerator::default();
    let calls = Arc::clone(&generator.calls);
    let config = ShieldConfig {
        reidentification_probe: true,
        ..ShieldConfig::default()
    };
    let engine = test_engine(config).with_generator(generator);

    let report = engine.run(EMAIL, None).await.unwrap();
    assert!(report.probe.is_some());
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1].1.as_deref(),
        Some(a3s_shield::engine::REIDENTIFICATION_PROMPT)
    );
}

#[tokio::test]
async fn test_restore_reverses_placeholders_in_output() {
    let engine = test_engine(ShieldConfig::default().with_epsilon(1.0).with_seed(1));
    let out = engine.sanitize("John from Alpha Corp called").await.unwrap();
    let restored = out.placeholders.restore("[Vendor_1] works at [Org_1].");
    assert_eq!(restored, "John works at Alpha Corp.");
}

// ─── Concurrency & index ─────────────────────────────────────────

#[tokio::test]
async fn test_engine_shared_across_tasks() {
    let engine = Arc::new(test_engine(ShieldConfig::default().with_epsilon(1.0)));
    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let raw = format!("Alpha Corp invoice {i} sent to ops{i}@example.com");
            engine.sanitize(&raw).await.unwrap().text
        }));
    }
    for (i, handle) in handles.into_iter().enumerate() {
        let text = handle.await.unwrap();
        assert_eq!(text, format!("[Org_1] invoice {i} sent to [Email_1]"));
    }
}

#[tokio::test]
async fn test_masked_index_never_sees_raw_text() {
    let engine = test_engine(ShieldConfig::default().with_epsilon(1.0));
    let index = MaskedIndex::new(HashEmbedder::default());
    index.add(&engine, EMAIL).await.unwrap();
    index
        .add(&engine, "John from Alpha Corp shipped laptops")
        .await
        .unwrap();

    let hits = index.search("laptops shipped", 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| !h.text.contains("Priya") && !h.text.contains("John")));
    assert!(hits[0].text.contains("shipped laptops"));

    let answer = index
        .answer("Who shipped laptops?", 1, &RecordingGenerator::default())
        .await
        .unwrap();
    assert_eq!(answer, "answer over: [Vendor_1] from [Org_1] shipped laptops");
}
