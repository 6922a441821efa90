use super::*;

fn metrics() -> MonospaceMetrics {
    MonospaceMetrics::new(10.0, 20.0).unwrap()
}

#[test]
fn metrics_reject_degenerate_values() {
    assert!(MonospaceMetrics::new(0.0, 20.0).is_err());
    assert!(MonospaceMetrics::new(10.0, -1.0).is_err());
    assert!(MonospaceMetrics::new(f64::NAN, 20.0).is_err());
}

#[test]
fn spaces_become_layout_not_cells() {
    let cells = layout_cells("AB CD", &metrics(), Point::ZERO);
    assert_eq!(cells.len(), 4);
    let chars: String = cells.iter().map(|c| c.ch).collect();
    assert_eq!(chars, "ABCD");
}

#[test]
fn word_indices_follow_whitespace_splits() {
    let cells = layout_cells("one  two\tthree", &metrics(), Point::ZERO);
    let words: Vec<usize> = cells.iter().map(|c| c.word).collect();
    assert_eq!(words, vec![0, 0, 0, 1, 1, 1, 2, 2, 2, 2, 2]);
}

#[test]
fn cells_advance_left_to_right_with_a_word_gap() {
    let m = metrics();
    let cells = layout_cells("ab cd", &m, Point::new(100.0, 0.0));
    // Width is advance + 1 padding pixel.
    assert_eq!(cells[0].width, 11.0);
    assert_eq!(cells[0].center.x, 100.0 + 5.5);
    assert_eq!(cells[1].center.x, 111.0 + 5.5);
    // Word gap of 0.5 em (10 px at font size 20).
    assert_eq!(cells[2].center.x, 122.0 + 10.0 + 5.5);
    // Single line: all centers share a y at half the font size.
    assert!(cells.iter().all(|c| c.center.y == 10.0));
}

#[test]
fn empty_and_whitespace_only_text_yield_no_cells() {
    assert!(layout_cells("", &metrics(), Point::ZERO).is_empty());
    assert!(layout_cells("   \t ", &metrics(), Point::ZERO).is_empty());
}
