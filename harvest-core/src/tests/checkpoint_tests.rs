use super::*;

#[test]
fn wire_format_uses_original_keys() {
    let mut cp = Checkpoint::with_delivered([ImageId(3), ImageId(1)]);
    cp.offset = 1000;
    cp.entries.push(CatalogEntry::new(5, "Five").with_screenshot(9, "//x/9.jpg"));

    let json = serde_json::to_value(&cp).unwrap();
    assert_eq!(json["delivered"], serde_json::json!([1, 3]));
    assert_eq!(json["offset"], 1000);
    assert_eq!(json["games"][0]["name"], "Five");
    assert!(json.get("attempts").is_none());
}

#[test]
fn legacy_screenshot_checkpoint_loads() {
    let cp: Checkpoint = serde_json::from_str(r#"{"downloaded": [42, 17]}"#).unwrap();
    assert!(cp.is_delivered(ImageId(42)));
    assert!(cp.is_delivered(ImageId(17)));
    assert_eq!(cp.offset, 0);
    assert!(cp.entries.is_empty());
}

#[test]
fn attempts_round_trip_through_json() {
    let mut cp = Checkpoint::new();
    cp.record_failures([ImageId(8), ImageId(8), ImageId(9)]);
    let text = serde_json::to_string(&cp).unwrap();
    let back: Checkpoint = serde_json::from_str(&text).unwrap();
    assert_eq!(back.attempts(ImageId(8)), 2);
    assert_eq!(back.attempts(ImageId(9)), 1);
}

#[test]
fn delivery_clears_attempts() {
    let mut cp = Checkpoint::new();
    cp.record_failures([ImageId(1)]);
    assert_eq!(cp.mark_delivered([ImageId(1), ImageId(2)]), 2);
    assert_eq!(cp.attempts(ImageId(1)), 0);
    // Already delivered ids are not counted again.
    assert_eq!(cp.mark_delivered([ImageId(2)]), 0);
    cp.record_failures([ImageId(2)]);
    assert_eq!(cp.attempts(ImageId(2)), 0);
}

#[test]
fn abandonment_threshold() {
    let mut cp = Checkpoint::new();
    cp.record_failures([ImageId(4), ImageId(4)]);
    assert!(!cp.is_abandoned(ImageId(4), 3));
    assert!(cp.is_abandoned(ImageId(4), 2));
    assert!(!cp.is_abandoned(ImageId(4), 0));
}

#[test]
fn advance_moves_by_page() {
    let mut cp = Checkpoint::new();
    cp.advance(500);
    cp.advance(500);
    assert_eq!(cp.offset, 1000);
}
