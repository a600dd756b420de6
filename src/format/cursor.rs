//! Real-valued layout cursor.

use crate::error::{Error, Result};

/// Position in cell units. Fractional positions are floored to cells.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cursor {
    x: f64,
    y: f64,
}

fn check(x: f64, y: f64) -> Result<()> {
    if x < 0.0 || y < 0.0 || !x.is_finite() || !y.is_finite() {
        return Err(Error::invariant(
            "cursor moved to an invalid position",
            format!("({}, {})", x, y),
        ));
    }
    Ok(())
}

impl Cursor {
    pub fn new(x: f64, y: f64) -> Result<Self> {
        check(x, y)?;
        Ok(Self { x, y })
    }

    /// Column.
    pub fn x(&self) -> usize {
        self.x.floor() as usize
    }

    /// Line.
    pub fn y(&self) -> usize {
        self.y.floor() as usize
    }

    pub fn raw(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Relative move. A move to a negative position fails and leaves the
    /// cursor unchanged.
    pub fn move_by(&mut self, dx: f64, dy: f64) -> Result<()> {
        check(self.x + dx, self.y + dy)?;
        self.x += dx;
        self.y += dy;
        Ok(())
    }

    /// Absolute move.
    pub fn set(&mut self, x: f64, y: f64) -> Result<()> {
        check(x, y)?;
        self.x = x;
        self.y = y;
        Ok(())
    }

    /// Move to the cell right after `anchor` on its line.
    pub fn move_after(&mut self, anchor: (usize, usize)) {
        self.x = (anchor.0 + 1) as f64;
        self.y = anchor.1 as f64;
    }
}
