use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use quire_common::frontmatter::{extract_label, inject_label, normalize_label, strip_label};
use quire_common::id::{generate_id, parse_id, VersionIdGenerator};

fn header_lines() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-z][a-z0-9_]{0,8}", "[A-Za-z0-9 ]{0,16}"), 0..4)
}

fn document() -> impl Strategy<Value = String> {
    let headed = (prop::option::of(header_lines()), "[\\PC\n]{0,200}").prop_map(|(header, body)| {
        match header {
            Some(lines) => {
                let yaml: String =
                    lines.iter().map(|(key, value)| format!("{key}: \"{value}\"\n")).collect();
                format!("---\n{yaml}---\n{body}")
            }
            None => body,
        }
    });
    let empty_header = "[\\PC\n]{0,80}".prop_map(|body| format!("---\n---\n{body}"));
    prop_oneof![3 => headed, 1 => empty_header]
}

proptest! {
    #[test]
    fn injected_label_is_recoverable(content in document(), label in "[a-zA-Z0-9 _\"':#éü漢\\\\-]{1,40}") {
        let labeled = inject_label(&content, &label);
        prop_assert_eq!(extract_label(&labeled), normalize_label(&label));
    }

    #[test]
    fn strip_restores_unlabeled_content(content in document(), label in "[a-zA-Z0-9 ]{1,20}") {
        let labeled = inject_label(&content, &label);
        prop_assert_eq!(strip_label(&labeled), content);
    }

    #[test]
    fn ids_round_trip_to_their_instant(secs in 0i64..4_102_444_800, micros in 0u32..1_000_000) {
        let now = Utc.timestamp_opt(secs, micros * 1_000).single().unwrap();
        let generator = VersionIdGenerator::new();
        let stamp = generator.next_at(now);
        prop_assert_eq!(parse_id(&stamp.id), Some(now));
        prop_assert_eq!(stamp.timestamp, now);
    }

    #[test]
    fn ids_sort_in_generation_order(offsets in prop::collection::vec(0i64..5_000_000, 2..32)) {
        let generator = VersionIdGenerator::new();
        let base = 1_700_000_000_000_000i64;
        let mut previous: Option<String> = None;
        let mut at = base;
        for offset in offsets {
            at += offset;
            let now = DateTime::from_timestamp_micros(at).unwrap();
            let stamp = generator.next_at(now);
            if let Some(prev) = &previous {
                prop_assert!(prev < &stamp.id, "{} !< {}", prev, stamp.id);
            }
            previous = Some(stamp.id);
        }
    }
}

#[test]
fn sequential_default_ids_are_strictly_increasing() {
    let mut previous = generate_id();
    for _ in 0..1_000 {
        let next = generate_id();
        assert!(previous.id < next.id, "{} !< {}", previous.id, next.id);
        previous = next;
    }
}

#[test]
fn default_id_parses_close_to_now() {
    let before = Utc::now();
    let stamp = generate_id();
    let parsed = parse_id(&stamp.id).expect("generated id should parse");
    let drift = (parsed - before).num_milliseconds().abs();
    assert!(drift < 50, "parsed timestamp drifted {drift}ms");
}
