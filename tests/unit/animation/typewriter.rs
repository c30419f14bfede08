use super::*;

#[test]
fn single_line_reveals_linearly() {
    let r = reveal_lines(&[10], 0.0, Sequencing::Strict);
    assert_eq!(r[0], Reveal::HIDDEN);
    let r = reveal_lines(&[10], 0.55, Sequencing::Strict);
    assert_eq!(r[0].visible_chars, 5);
    let r = reveal_lines(&[10], 1.0, Sequencing::Strict);
    assert_eq!(r[0].visible_chars, 10);
    assert!(r[0].is_complete());
}

#[test]
fn slices_split_the_axis_evenly() {
    // Three lines: slices [0, 1/3), [1/3, 2/3), [2/3, 1].
    let lens = [6, 6, 6];
    let r = reveal_lines(&lens, 0.5, Sequencing::Strict);
    assert!(r[0].is_complete());
    assert_eq!(r[0].visible_chars, 6);
    assert_eq!(r[1].visible_chars, 3);
    assert_eq!(r[2], Reveal::HIDDEN);

    let r = reveal_lines(&lens, 2.0 / 3.0, Sequencing::Strict);
    assert!(r[1].is_complete(), "slice end must be fully revealed");
    assert_eq!(r[2].visible_chars, 0);
}

#[test]
fn reveal_is_monotonic_and_completes_by_slice_end() {
    let lens = [17, 3, 40, 0, 9];
    let n = lens.len();
    let mut last = vec![0usize; n];
    for step in 0..=1000 {
        let cp = f64::from(step) / 1000.0;
        let r = reveal_lines(&lens, cp, Sequencing::Strict);
        for i in 0..n {
            assert!(r[i].visible_chars >= last[i], "line {i} regressed at cp={cp}");
            last[i] = r[i].visible_chars;
            if cp >= (i + 1) as f64 / n as f64 {
                assert_eq!(r[i].visible_chars, lens[i], "line {i} incomplete at cp={cp}");
            }
        }
    }
}

#[test]
fn strict_mode_never_starts_a_line_before_the_previous_completes() {
    let lens = [20, 20, 20, 20];
    for step in 0..=997 {
        let cp = f64::from(step) / 997.0;
        let r = reveal_lines(&lens, cp, Sequencing::Strict);
        for i in 1..lens.len() {
            if r[i].visible_chars > 0 {
                assert_eq!(r[i - 1].visible_chars, lens[i - 1]);
            }
        }
    }
}

#[test]
fn parallel_mode_reveals_all_lines_together() {
    let r = reveal_lines(&[10, 20], 0.5, Sequencing::Parallel);
    assert_eq!(r[0].visible_chars, 5);
    assert_eq!(r[1].visible_chars, 10);
}

#[test]
fn visible_prefix_respects_char_boundaries() {
    assert_eq!(visible_prefix("héllo", 2), "hé");
    assert_eq!(visible_prefix("abc", 0), "");
    assert_eq!(visible_prefix("abc", 10), "abc");
}
