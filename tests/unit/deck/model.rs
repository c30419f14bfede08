use super::*;

#[test]
fn line_range_rejects_zero_and_inverted() {
    assert!(LineRange::new(0, 3).is_err());
    assert!(LineRange::new(5, 4).is_err());
    let r = LineRange::new(2, 4).unwrap();
    assert_eq!(r.line_count(), 3);
    assert!(r.contains(4));
    assert!(!r.contains(5));
}

#[test]
fn line_range_deserializes_all_shapes() {
    let v: Vec<LineRange> =
        serde_json::from_str(r#"[7, [1, 3], { "start": 10, "end": 12 }]"#).unwrap();
    assert_eq!(
        v,
        vec![
            LineRange { start: 7, end: 7 },
            LineRange { start: 1, end: 3 },
            LineRange { start: 10, end: 12 },
        ]
    );
}

#[test]
fn slide_deserializes_with_defaults() {
    let s: Slide = serde_json::from_str(
        r#"{ "id": "intro", "lines": [[1, 5]], "duration_ms": 1500 }"#,
    )
    .unwrap();
    assert_eq!(s.animation_style, AnimationStyle::Fade);
    assert_eq!(s.order, 0);
    assert!(s.validate().is_ok());

    let s: Slide = serde_json::from_str(
        r#"{ "id": "b", "lines": [2], "duration_ms": 10, "animation": "typewriter", "order": 3 }"#,
    )
    .unwrap();
    assert_eq!(s.animation_style, AnimationStyle::Typewriter);
    assert_eq!(s.order, 3);
}

#[test]
fn validate_slides_catches_empty_zero_duration_and_duplicates() {
    assert!(validate_slides(&[]).is_err());

    let zero = Slide::new("a", vec![LineRange::line(1).unwrap()], 0, AnimationStyle::Fade);
    assert!(validate_slides(&[zero]).is_err());

    let a = Slide::new("a", vec![LineRange::line(1).unwrap()], 10, AnimationStyle::Fade);
    let dup = a.clone();
    let err = validate_slides(&[a, dup]).unwrap_err();
    assert!(err.to_string().contains("duplicate slide id"));
}

#[test]
fn ordered_slides_sorts_by_order_and_keeps_ties_stable() {
    let r = vec![LineRange::line(1).unwrap()];
    let slides = vec![
        Slide::new("c", r.clone(), 10, AnimationStyle::Fade).with_order(2),
        Slide::new("a", r.clone(), 10, AnimationStyle::Fade).with_order(0),
        Slide::new("b1", r.clone(), 10, AnimationStyle::Fade).with_order(1),
        Slide::new("b2", r, 10, AnimationStyle::Fade).with_order(1),
    ];
    let ids: Vec<&str> = ordered_slides(&slides).iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b1", "b2", "c"]);
}
