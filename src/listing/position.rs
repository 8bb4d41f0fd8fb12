use std::fmt::{self, Display, Formatter};

/// A stable handle to a line in a [`super::Listing`]. Positions are handed out in allocation
/// order and are never reused, so they say nothing about the current order of the lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(pub usize);

impl Display for Position {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
