use super::*;

const EPS: f64 = 1e-12;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

#[test]
fn fade_endpoints() {
    let s = AnimationStyle::Fade;
    assert_eq!(content_opacity(s, 0.0, Transition::Entering), 0.0);
    assert_eq!(content_opacity(s, 1.0, Transition::Entering), 1.0);
    assert_eq!(content_opacity(s, 0.0, Transition::Leaving), 1.0);
    assert_eq!(content_opacity(s, 1.0, Transition::Leaving), 0.0);
}

#[test]
fn code_progress_reserves_line_number_phase() {
    assert_eq!(code_progress(0.0), 0.0);
    assert_eq!(code_progress(0.15), 0.0);
    assert!(close(code_progress(0.575), 0.5));
    assert_eq!(code_progress(1.0), 1.0);
    assert_eq!(code_progress(2.0), 1.0);
}

#[test]
fn line_number_opacity_fades_at_the_edges() {
    assert_eq!(line_number_opacity(0.0, Transition::Entering), 0.0);
    assert!(close(line_number_opacity(0.075, Transition::Entering), 0.5));
    assert_eq!(line_number_opacity(0.15, Transition::Entering), 1.0);
    assert_eq!(line_number_opacity(0.9, Transition::Entering), 1.0);

    assert_eq!(line_number_opacity(0.5, Transition::Leaving), 1.0);
    assert_eq!(line_number_opacity(0.85, Transition::Leaving), 1.0);
    assert!(line_number_opacity(0.925, Transition::Leaving) < 0.51);
    assert!(close(line_number_opacity(1.0, Transition::Leaving), 0.0));
}

#[test]
fn slide_ramps_faster_than_linear_and_offsets() {
    let s = AnimationStyle::Slide;
    // cp = 0.5 at p = 0.575
    assert!(close(content_opacity(s, 0.575, Transition::Entering), 0.75));
    assert!(close(content_opacity(s, 0.575, Transition::Leaving), 0.25));
    assert_eq!(content_opacity(s, 0.9, Transition::Entering), 1.0);
    assert_eq!(content_opacity(s, 0.9, Transition::Leaving), 0.0);

    let entering = sample(s, 0.575, Transition::Entering);
    assert!(close(entering.offset_x, 0.25));
    let leaving = sample(s, 0.575, Transition::Leaving);
    assert!(close(leaving.offset_x, -0.75));
    assert_eq!(sample(s, 1.0, Transition::Entering).offset_x, 0.0);
}

#[test]
fn highlight_pops_in_and_holds_before_leaving() {
    let s = AnimationStyle::Highlight;
    // cp = 0.1 at p = 0.235
    assert!(close(content_opacity(s, 0.235, Transition::Entering), 0.5));
    assert_eq!(content_opacity(s, 0.5, Transition::Entering), 1.0);
    assert_eq!(content_opacity(s, 0.5, Transition::Leaving), 1.0);
    // cp = 0.9 at p = 0.915
    assert!(close(content_opacity(s, 0.915, Transition::Leaving), 0.5));

    let entering = sample(s, 0.235, Transition::Entering);
    assert!(entering.highlight > 0.0);
    assert_eq!(sample(s, 1.0, Transition::Entering).highlight, 0.0);
    assert_eq!(sample(s, 0.3, Transition::Leaving).highlight, 0.0);
}

#[test]
fn typewriter_opacity_matches_fade() {
    for i in 0..=20 {
        let p = f64::from(i) / 20.0;
        for t in [Transition::Entering, Transition::Leaving] {
            assert_eq!(
                content_opacity(AnimationStyle::Typewriter, p, t),
                content_opacity(AnimationStyle::Fade, p, t)
            );
        }
    }
}

#[test]
fn all_curves_stay_in_unit_range_and_are_monotonic() {
    for style in AnimationStyle::ALL {
        let mut last_in = -1.0;
        let mut last_out = 2.0;
        for i in 0..=200 {
            let p = f64::from(i) / 200.0;
            let e = content_opacity(style, p, Transition::Entering);
            let l = content_opacity(style, p, Transition::Leaving);
            assert!((0.0..=1.0).contains(&e) && (0.0..=1.0).contains(&l));
            assert!(e >= last_in, "{style:?} entering not monotonic at {p}");
            assert!(l <= last_out, "{style:?} leaving not monotonic at {p}");
            last_in = e;
            last_out = l;
        }
    }
}

#[test]
fn stable_sample_is_fully_opaque() {
    assert_eq!(CurveSample::STABLE.opacity, 1.0);
    assert_eq!(CurveSample::STABLE.line_number_opacity, 1.0);
}
