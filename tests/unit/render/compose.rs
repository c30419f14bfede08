use super::*;
use crate::code::tokenize::PlainTokenizer;
use crate::deck::model::LineRange;

fn code(n: u32) -> CodeListing {
    let text: Vec<String> = (1..=n).map(|i| format!("line {i}")).collect();
    CodeListing::from_text(&text.join("\n"))
}

fn slide(id: &str, ranges: &[(u32, u32)], style: AnimationStyle) -> Slide {
    Slide::new(
        id,
        ranges
            .iter()
            .map(|&(s, e)| LineRange::new(s, e).unwrap())
            .collect(),
        1000,
        style,
    )
}

fn compose_at(c: &mut FrameComposer, tl: &Timeline, code: &CodeListing, t: f64) -> FrameInstructions {
    c.compose(tl, code, &PlainTokenizer, "text", t)
}

fn states(f: &FrameInstructions) -> Vec<(u32, LineState)> {
    f.lines
        .iter()
        .map(|l| (l.actual_line_number, l.animation_state))
        .collect()
}

#[test]
fn first_step_fades_every_line_in() {
    let tl = Timeline::new(&[slide("a", &[(1, 3)], AnimationStyle::Fade)], 1.0).unwrap();
    let code = code(10);
    let mut c = FrameComposer::default();
    let f = compose_at(&mut c, &tl, &code, 500.0);

    assert_eq!(f.step_index, Some(0));
    assert_eq!(f.numbering, Numbering::Actual);
    assert_eq!(
        states(&f),
        vec![
            (1, LineState::Entering),
            (2, LineState::Entering),
            (3, LineState::Entering)
        ]
    );
    let expected = code_progress(0.5);
    for l in &f.lines {
        assert!((l.opacity - expected).abs() < 1e-12);
        assert_eq!(l.line_number_opacity, 1.0);
        assert_eq!(l.display_line_number, l.actual_line_number);
        assert_eq!(l.content, format!("line {}", l.actual_line_number));
    }
}

#[test]
fn second_step_mixes_entering_leaving_and_stable_rows() {
    let slides = [
        slide("a", &[(1, 3)], AnimationStyle::Fade),
        slide("b", &[(2, 5)], AnimationStyle::Fade),
    ];
    let tl = Timeline::new(&slides, 1.0).unwrap();
    let code = code(10);
    let mut c = FrameComposer::default();
    compose_at(&mut c, &tl, &code, 0.0);
    let f = compose_at(&mut c, &tl, &code, 1500.0);

    assert_eq!(f.step_index, Some(1));
    assert_eq!(
        states(&f),
        vec![
            (1, LineState::Leaving),
            (2, LineState::Stable),
            (3, LineState::Stable),
            (4, LineState::Entering),
            (5, LineState::Entering)
        ]
    );
    let cp = code_progress(0.5);
    assert!((f.lines[0].opacity - (1.0 - cp)).abs() < 1e-12);
    assert_eq!(f.lines[1].opacity, 1.0);
    assert!((f.lines[4].opacity - cp).abs() < 1e-12);
}

#[test]
fn tail_policy_holds_last_state_or_blanks() {
    let slides = [
        slide("a", &[(1, 3)], AnimationStyle::Fade),
        slide("b", &[(2, 5)], AnimationStyle::Fade),
    ];
    let tl = Timeline::new(&slides, 1.0).unwrap();
    let code = code(10);

    let mut hold = FrameComposer::default();
    let f = compose_at(&mut hold, &tl, &code, 2200.0);
    assert_eq!(f.step_index, Some(1));
    assert_eq!(
        states(&f),
        (2..=5).map(|n| (n, LineState::Stable)).collect::<Vec<_>>()
    );
    assert!(f.lines.iter().all(|l| l.opacity == 1.0));

    let mut blank = FrameComposer::new(ComposerConfig {
        tail_policy: TailPolicy::Blank,
        ..ComposerConfig::default()
    })
    .unwrap();
    let f = compose_at(&mut blank, &tl, &code, 2200.0);
    assert!(f.is_blank());
    assert_eq!(f.step_index, None);
}

#[test]
fn negative_and_nan_times_are_blank() {
    let tl = Timeline::new(&[slide("a", &[(1, 3)], AnimationStyle::Fade)], 1.0).unwrap();
    let code = code(10);
    let mut c = FrameComposer::default();
    assert!(compose_at(&mut c, &tl, &code, -1.0).is_blank());
    assert!(compose_at(&mut c, &tl, &code, f64::NAN).is_blank());
}

#[test]
fn rows_never_exceed_window_capacity() {
    let slides = [
        slide("a", &[(1, 14)], AnimationStyle::Fade),
        slide("b", &[(1, 1), (20, 33)], AnimationStyle::Fade),
    ];
    let tl = Timeline::new(&slides, 1.0).unwrap();
    let code = code(100);
    let mut c = FrameComposer::default();
    let mut t = 0.0;
    while t < 2500.0 {
        let f = compose_at(&mut c, &tl, &code, t);
        assert!(f.lines.len() <= 15, "t={t}: {} rows", f.lines.len());
        t += 50.0;
    }

    let f = compose_at(&mut FrameComposer::default(), &tl, &code, 1500.0);
    assert_eq!(f.lines.len(), 15);
    assert!(f.lines.iter().all(|l| l.animation_state != LineState::Leaving));
}

#[test]
fn sparse_rows_are_renumbered_sequentially() {
    let slides = [slide("a", &[(3, 3), (60, 60)], AnimationStyle::Fade)];
    let tl = Timeline::new(&slides, 1.0).unwrap();
    let code = code(100);
    let mut c = FrameComposer::default();
    let f = compose_at(&mut c, &tl, &code, 500.0);
    assert_eq!(f.window.start_line, 3);
    assert_eq!(f.window.end_line, 60);
    assert_eq!(f.numbering, Numbering::Sequential);
    let shown: Vec<(u32, u32)> = f
        .lines
        .iter()
        .map(|l| (l.actual_line_number, l.display_line_number))
        .collect();
    assert_eq!(shown, vec![(3, 1), (60, 2)]);
}

#[test]
fn window_move_is_reported_as_scroll_animation() {
    let slides = [
        slide("a", &[(1, 5)], AnimationStyle::Fade),
        slide("b", &[(30, 35)], AnimationStyle::Fade),
    ];
    let tl = Timeline::new(&slides, 1.0).unwrap();
    let code = code(40);
    let mut c = FrameComposer::default();
    assert_eq!(compose_at(&mut c, &tl, &code, 100.0).scroll, None);

    let f = compose_at(&mut c, &tl, &code, 1150.0);
    let scroll = f.scroll.unwrap();
    assert_eq!(scroll.scroll_type, ScrollType::ScrollUp);
    assert_eq!((scroll.from_start, scroll.to_start), (1, 30));
    assert!((scroll.progress - 0.5).abs() < 1e-12);

    let later = compose_at(&mut c, &tl, &code, 1900.0).scroll.unwrap();
    assert_eq!(later.progress, 1.0);
}

#[test]
fn typewriter_rows_reveal_in_strict_order() {
    let slides = [slide("a", &[(1, 2)], AnimationStyle::Typewriter)];
    let tl = Timeline::new(&slides, 1.0).unwrap();
    let code = CodeListing::from_text("abcd\nefgh\n");
    let mut c = FrameComposer::default();

    let f = compose_at(&mut c, &tl, &code, 100.0);
    assert_eq!(f.lines[0].visible_chars, Some(0));
    assert_eq!(f.lines[1].visible_chars, Some(0));

    let f = compose_at(&mut c, &tl, &code, 700.0);
    assert_eq!(f.lines[0].visible_chars, Some(4));
    assert_eq!(f.lines[1].visible_chars, Some(1));
    assert_eq!(f.lines[1].visible_text(), "e");
    assert!(f.lines[1].typewriter_progress.unwrap() < 1.0);
}

#[test]
fn seeking_in_any_order_matches_sequential_sampling() {
    let slides = [
        slide("a", &[(1, 5)], AnimationStyle::Slide),
        slide("b", &[(30, 35)], AnimationStyle::Highlight),
        slide("c", &[(2, 4), (31, 31)], AnimationStyle::Typewriter),
    ];
    let tl = Timeline::new(&slides, 1.0).unwrap();
    let code = code(40);
    let times: Vec<f64> = (0..35).map(|i| f64::from(i) * 100.0).collect();

    let mut forward = FrameComposer::default();
    let sequential: Vec<FrameInstructions> = times
        .iter()
        .map(|&t| compose_at(&mut forward, &tl, &code, t))
        .collect();

    let mut scrub = FrameComposer::default();
    for (i, &t) in times.iter().enumerate().rev() {
        assert_eq!(compose_at(&mut scrub, &tl, &code, t), sequential[i], "t={t}");
    }
}

#[test]
fn preview_frame_matches_transition_semantics() {
    let a = slide("a", &[(1, 3)], AnimationStyle::Fade);
    let b = slide("b", &[(2, 5)], AnimationStyle::Slide);
    let src = "l1\nl2\nl3\nl4\nl5\nl6\n";

    let lines = render_preview_frame(src, "text", Some(&a), &b, 0.5, 1.0).unwrap();
    let got: Vec<(u32, LineState)> = lines
        .iter()
        .map(|l| (l.actual_line_number, l.animation_state))
        .collect();
    assert_eq!(
        got,
        vec![
            (1, LineState::Leaving),
            (2, LineState::Stable),
            (3, LineState::Stable),
            (4, LineState::Entering),
            (5, LineState::Entering)
        ]
    );
    assert!(lines[3].offset_x > 0.0);
    assert!(lines[0].offset_x < 0.0);

    let first = render_preview_frame(src, "text", None, &a, 0.0, 1.0).unwrap();
    assert!(first.iter().all(|l| l.animation_state == LineState::Entering));
    assert!(first.iter().all(|l| l.opacity == 0.0));

    assert!(render_preview_frame(src, "text", None, &a, 0.5, 0.0).is_err());
    assert!(render_preview_frame(src, "text", None, &a, f64::NAN, 1.0).is_err());
}
