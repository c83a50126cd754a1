#![no_main]

//! Pattern fuzzer: arbitrary grids through construction and rotation.

use arbitrary::Arbitrary;
use armada::pattern::{Pattern, Rotation};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct PatternInput {
    width: u8,
    height: u8,
    center_x: u8,
    center_y: u8,
    /// Cell weights, cycled over the grid.
    weights: Vec<i8>,
    /// Lengthen one row to exercise the ragged-grid rejection.
    ragged: bool,
}

fuzz_target!(|input: PatternInput| {
    let width = input.width as usize % 17;
    let height = input.height as usize % 17;

    let mut weights = input.weights.iter().copied().cycle();
    let mut rows: Vec<Vec<i64>> = (0..height)
        .map(|_| {
            (0..width)
                .map(|_| i64::from(weights.next().unwrap_or(0)))
                .collect()
        })
        .collect();
    if input.ragged {
        if let Some(row) = rows.first_mut() {
            row.push(1);
        }
    }

    let center = (input.center_x as usize, input.center_y as usize);
    let Some(pattern) = Pattern::from_rows(center, &rows) else {
        return;
    };

    // Construction succeeded: the grid was rectangular with the center inside.
    assert!(!rows.is_empty());
    assert!(center.0 < rows[0].len() && center.1 < rows.len());
    assert!(pattern.len() <= rows.len() * rows[0].len());
    assert_eq!(pattern.weight(0, 0), rows[center.1][center.0]);

    // Rotations permute cells without gaining or losing any.
    for rotation in [Rotation::R90, Rotation::R180, Rotation::R270] {
        let rotated = pattern.rotated(rotation);
        assert_eq!(rotated.len(), pattern.len());
        let total: i64 = pattern.iter().map(|(_, weight)| weight).sum();
        let rotated_total: i64 = rotated.iter().map(|(_, weight)| weight).sum();
        assert_eq!(total, rotated_total);
    }

    let back = pattern
        .rotated(Rotation::R180)
        .rotated(Rotation::R90)
        .rotated(Rotation::R90);
    assert_eq!(back, pattern);
});
