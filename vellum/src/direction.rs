use parse_display::{Display, FromStr};
use std::cmp::Ordering;

#[derive(Display, FromStr, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[display(style = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// `None` when the ledger is already at `target`.
    pub fn resolve(current: i32, target: i32) -> Option<Self> {
        match target.cmp(&current) {
            Ordering::Greater => Some(Direction::Up),
            Ordering::Less => Some(Direction::Down),
            Ordering::Equal => None,
        }
    }
}
