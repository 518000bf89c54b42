//! Property tests for span resolution and sanitization

use a3s_shield::bucket::bucket_money;
use a3s_shield::resolver::resolve_spans;
use a3s_shield::role::{sample_role, infer_role};
use a3s_shield::{
    EntityLabel, GazetteerDetector, HashEmbedder, MoneyBuckets, RegexDetector, Role, ShieldConfig,
    ShieldEngine, Span, SpanCollector,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn candidates(text: &str, ranges: &[(usize, usize)]) -> Vec<Span> {
    ranges
        .iter()
        .filter_map(|&(start, len)| {
            let end = start + len;
            (end <= text.len()).then(|| Span::new(&text[start..end], start, end, EntityLabel::Person))
        })
        .collect()
}

fn engine() -> ShieldEngine {
    let collector = SpanCollector::default()
        .with_detector(
            GazetteerDetector::from_terms([
                ("Priya", EntityLabel::Person),
                ("SecureStack", EntityLabel::Organization),
            ])
            .unwrap(),
        )
        .with_detector(RegexDetector::with_default_rules().unwrap());
    ShieldEngine::new(collector, HashEmbedder::default(), ShieldConfig::default().with_seed(0))
        .unwrap()
}

// ── Resolver output is sorted, non-overlapping and maximal ───────────────

proptest! {
    #[test]
    fn resolved_spans_never_overlap(
        text in "[a-z ]{1,80}",
        ranges in prop::collection::vec((0usize..80, 1usize..12), 0..20)
    ) {
        let input = candidates(&text, &ranges);
        let resolution = resolve_spans(&text, input.clone());
        let spans = resolution.spans.as_slice();

        for pair in spans.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start, "overlap: {:?}", pair);
        }
        for span in spans {
            prop_assert!(input.contains(span));
        }
        for candidate in &input {
            prop_assert!(
                spans.iter().any(|s| s.overlaps(candidate)),
                "candidate {:?} neither kept nor blocked",
                candidate
            );
        }
        prop_assert!(resolution.diagnostics.is_empty());
    }

    #[test]
    fn out_of_range_spans_are_dropped(
        text in "[a-z]{1,20}",
        start in 0usize..40,
        len in 1usize..40
    ) {
        let end = start + len;
        let span = Span::new("x", start, end, EntityLabel::Email);
        let resolution = resolve_spans(&text, vec![span]);
        let valid = end <= text.len() && &text[start..end] == "x";
        prop_assert_eq!(resolution.spans.len(), usize::from(valid));
        prop_assert_eq!(resolution.diagnostics.len(), usize::from(!valid));
    }
}

// ── Sanitization only touches detected spans ─────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn text_outside_spans_is_preserved(
        prefix in "[a-z ,.]{0,30}",
        user in "[a-z]{3,8}",
        middle in "[a-z ,.]{0,30}",
        suffix in "[a-z ,.]{0,30}"
    ) {
        let raw = format!("{prefix} Priya mailed {user}@example.com {middle} for SecureStack {suffix}");
        let out = tokio_test::block_on(engine().sanitize(&raw)).unwrap();

        let mut rebuilt = String::new();
        let mut cursor = 0;
        for span in out.spans.iter() {
            rebuilt.push_str(&raw[cursor..span.start]);
            rebuilt.push_str(&out.placeholders.get(&span.text).unwrap().rendered());
            cursor = span.end;
        }
        rebuilt.push_str(&raw[cursor..]);

        prop_assert_eq!(&out.text, &rebuilt);
        prop_assert!(!out.text.contains("Priya"));
        let email = format!("{}@example.com", user);
        prop_assert!(!out.text.contains(&email));
    }
}

// ── Bucketing and role noise ─────────────────────────────────────────────

proptest! {
    #[test]
    fn money_buckets_are_monotonic(a in 0u32..100_000, b in 0u32..100_000) {
        let buckets = MoneyBuckets::default();
        let rank = |amount: u32| {
            let phrase = bucket_money(&format!("${amount}"), &buckets).unwrap();
            buckets.labels.iter().position(|l| *l == phrase).unwrap()
        };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(rank(lo) <= rank(hi));
    }

    #[test]
    fn epsilon_one_always_reports_inferred_role(seed in any::<u64>(), idx in 0usize..4) {
        let role = Role::ALL[idx];
        let mut rng = StdRng::seed_from_u64(seed);
        prop_assert_eq!(sample_role(&mut rng, Some(role), 1.0).unwrap(), role);
    }

    #[test]
    fn inference_ignores_case(upper in any::<bool>()) {
        let context = if upper { "PLEASE SUBMITTED" } else { "please submitted" };
        prop_assert_eq!(infer_role(context), Some(Role::Requester));
    }
}
