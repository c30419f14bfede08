use super::*;
use crate::code::source::CodeListing;
use crate::deck::model::AnimationStyle;

fn r(start: u32, end: u32) -> LineRange {
    LineRange::new(start, end).unwrap()
}

fn union_sorted(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut v: Vec<u32> = a.iter().chain(b.iter()).copied().collect();
    v.sort_unstable();
    v.dedup();
    v
}

#[test]
fn expand_single_range() {
    assert_eq!(expand(&[r(1, 5)]), vec![1, 2, 3, 4, 5]);
}

#[test]
fn expand_multiple_ranges_with_gaps() {
    assert_eq!(
        expand(&[r(1, 3), r(5, 5), r(8, 10)]),
        vec![1, 2, 3, 5, 8, 9, 10]
    );
}

#[test]
fn expand_dedups_and_sorts_overlapping_input() {
    assert_eq!(expand(&[r(4, 6), r(1, 4), r(5, 5)]), vec![1, 2, 3, 4, 5, 6]);
    assert!(expand(&[]).is_empty());
}

#[test]
fn visible_lines_clip_to_code_length() {
    let slide = Slide::new("s", vec![r(2, 4), r(9, 12)], 100, AnimationStyle::Fade);
    assert_eq!(visible_lines(&slide, 10), vec![2, 3, 4, 9, 10]);
    assert!(visible_lines(&slide, 1).is_empty());
}

#[test]
fn expand_within_cuts_ranges_before_expanding() {
    assert_eq!(expand_within(&[r(2, u32::MAX)], 4), vec![2, 3, 4]);
    assert_eq!(expand_within(&[r(7, 9), r(1, 2)], 5), vec![1, 2]);
    assert!(expand_within(&[r(1, 3)], 0).is_empty());

    let slide = Slide::new("s", vec![r(1, u32::MAX), r(3, u32::MAX)], 100, AnimationStyle::Fade);
    assert_eq!(visible_lines(&slide, 3), vec![1, 2, 3]);
}

#[test]
fn diff_partitions_prev_and_next() {
    let code = CodeListing::from_text(&(1..=20).map(|n| format!("line {n}\n")).collect::<String>());
    let cases: &[(&[u32], &[u32])] = &[
        (&[], &[1, 2, 3]),
        (&[1, 2, 3], &[]),
        (&[1, 2, 3], &[2, 3, 4]),
        (&[1, 5, 9], &[2, 5, 10, 11]),
        (&[4, 5, 6], &[4, 5, 6]),
    ];

    for (prev, next) in cases {
        let d = diff(prev, next, &code);
        let added = d.added_numbers();
        let removed = d.removed_numbers();
        let kept = d.kept_numbers();

        assert_eq!(union_sorted(&added, &kept), next.to_vec());
        assert_eq!(union_sorted(&removed, &kept), prev.to_vec());
        assert!(added.iter().all(|n| !kept.contains(n)));
        assert!(removed.iter().all(|n| !kept.contains(n)));
        assert!(added.windows(2).all(|w| w[0] < w[1]));
        assert!(removed.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn diff_attaches_contents() {
    let code = CodeListing::from_text("a\nb\nc\n");
    let d = diff(&[1], &[1, 3], &code);
    assert_eq!(
        d.added,
        vec![NumberedLine {
            number: 3,
            content: "c".to_owned()
        }]
    );
    assert_eq!(d.kept[0].content, "a");
    assert!(d.removed.is_empty());
}

#[test]
fn density_matches_reference_values() {
    assert_eq!(density(&[1, 2, 3, 4, 5]), 1.0);
    assert!((density(&[1, 50]) - 0.04).abs() < 1e-12);
    assert_eq!(density(&[7]), 1.0);
    assert_eq!(density(&[]), 1.0);
}
