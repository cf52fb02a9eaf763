//! Subplot grid geometry. Depends only on how many tangent points are shown.

use crate::session::PointCount;

pub const COLUMNS: usize = 3;
pub const WIDTH: u32 = 1200;
pub const ROW_HEIGHT: u32 = 450;
/// Gap kept on each side of a subplot inside its grid cell, in paper units.
pub const PADDING: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margin {
    pub left: u32,
    pub right: u32,
    pub bottom: u32,
    pub top: u32,
    pub pad: u32,
}

impl Default for Margin {
    fn default() -> Self {
        Margin {
            left: 50,
            right: 50,
            bottom: 50,
            top: 80,
            pad: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Subplot {
    pub index: usize,
    pub row: usize,
    pub column: usize,
    pub x_domain: [f64; 2],
    pub y_domain: [f64; 2],
    /// Where the `x = …` title goes, relative to the subplot.
    pub title_anchor: (f64, f64),
    /// Where the tangent equation goes, relative to the subplot.
    pub label_anchor: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub rows: usize,
    pub columns: usize,
    pub width: u32,
    pub height: u32,
    pub margin: Margin,
    pub subplots: Vec<Subplot>,
}

impl GridLayout {
    pub fn new(count: PointCount) -> Self {
        let n = count.get();
        let rows = n.div_ceil(COLUMNS);
        let subplots = (0..n)
            .map(|index| {
                let (row, column) = (index / COLUMNS, index % COLUMNS);
                let cols = COLUMNS as f64;
                let x_domain = [
                    column as f64 / cols + PADDING,
                    (column + 1) as f64 / cols - PADDING,
                ];
                let y_domain = [
                    1.0 - (row + 1) as f64 / rows as f64 + PADDING,
                    1.0 - row as f64 / rows as f64 - PADDING,
                ];
                Subplot {
                    index,
                    row,
                    column,
                    x_domain,
                    y_domain,
                    title_anchor: (0.5, 1.12),
                    label_anchor: (0.5, 1.05),
                }
            })
            .collect();

        GridLayout {
            rows,
            columns: COLUMNS,
            width: WIDTH,
            height: ROW_HEIGHT * rows as u32,
            margin: Margin::default(),
            subplots,
        }
    }
}
