//! Generic logic for code listings (TAC, assembly, etc).
//!
//! A [`Listing`] is an arena of lines linked in both directions. Lines are addressed by a
//! [`Position`], which stays valid for as long as the line it refers to is part of the listing,
//! regardless of how many lines are inserted or removed around it. Removed lines leave a hole
//! behind in the arena; the memory is released when the listing is dropped.

mod position;

use std::fmt::{self, Display, Formatter};

pub use position::*;

#[derive(Debug, Clone)]
struct Node<T> {
    line: Option<T>,
    prev: Option<Position>,
    next: Option<Position>,
}

#[derive(Debug, Clone)]
pub struct Listing<T> {
    nodes: Vec<Node<T>>,
    head: Option<Position>,
    tail: Option<Position>,
    len: usize,
}

impl<T> Listing<T> {
    pub fn new() -> Self {
        Self {
            nodes: vec![],
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Append a line to the end of the listing.
    pub fn push(&mut self, line: T) -> Position {
        let position = self.allocate(line, self.tail, None);
        match self.tail {
            Some(tail) => self.nodes[tail.0].next = Some(position),
            None => self.head = Some(position),
        }
        self.tail = Some(position);
        position
    }

    /// Insert a line directly after the line at `position`.
    pub fn insert_after(&mut self, position: Position, line: T) -> Position {
        self.assert_live(position);
        let next = self.nodes[position.0].next;
        let inserted = self.allocate(line, Some(position), next);
        self.nodes[position.0].next = Some(inserted);
        match next {
            Some(next) => self.nodes[next.0].prev = Some(inserted),
            None => self.tail = Some(inserted),
        }
        inserted
    }

    /// Insert a line directly before the line at `position`.
    pub fn insert_before(&mut self, position: Position, line: T) -> Position {
        self.assert_live(position);
        let prev = self.nodes[position.0].prev;
        let inserted = self.allocate(line, prev, Some(position));
        self.nodes[position.0].prev = Some(inserted);
        match prev {
            Some(prev) => self.nodes[prev.0].next = Some(inserted),
            None => self.head = Some(inserted),
        }
        inserted
    }

    /// Unlink the line at `position` and return it. Other positions remain valid.
    pub fn remove(&mut self, position: Position) -> T {
        self.assert_live(position);
        let node = &mut self.nodes[position.0];
        let (prev, next) = (node.prev.take(), node.next.take());
        let line = node.line.take().expect("line is live");

        match prev {
            Some(prev) => self.nodes[prev.0].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next.0].prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
        line
    }

    pub fn get(&self, position: Position) -> Option<&T> {
        self.nodes.get(position.0).and_then(|n| n.line.as_ref())
    }

    pub fn get_mut(&mut self, position: Position) -> Option<&mut T> {
        self.nodes.get_mut(position.0).and_then(|n| n.line.as_mut())
    }

    pub fn first(&self) -> Option<Position> {
        self.head
    }

    pub fn last(&self) -> Option<Position> {
        self.tail
    }

    /// The position of the line following `position`, if any.
    pub fn next(&self, position: Position) -> Option<Position> {
        self.nodes.get(position.0).and_then(|n| n.next)
    }

    /// The position of the line preceding `position`, if any.
    pub fn prev(&self, position: Position) -> Option<Position> {
        self.nodes.get(position.0).and_then(|n| n.prev)
    }

    pub fn iter_lines(&self) -> LinesIter<T> {
        LinesIter {
            listing: self,
            position: self.head,
        }
    }

    pub fn iter_instructions(&self) -> impl Iterator<Item = &T> {
        self.iter_lines().map(|(_, line)| line)
    }

    /// Collects the positions of all lines, in order. Useful for passes that
    /// mutate the listing while walking over it.
    pub fn positions(&self) -> Vec<Position> {
        self.iter_lines().map(|(position, _)| position).collect()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.into_iter().map(|(_, line)| line).collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn allocate(&mut self, line: T, prev: Option<Position>, next: Option<Position>) -> Position {
        let position = Position(self.nodes.len());
        self.nodes.push(Node {
            line: Some(line),
            prev,
            next,
        });
        self.len += 1;
        position
    }

    fn assert_live(&self, position: Position) {
        assert!(
            self.get(position).is_some(),
            "Position {} does not refer to a line in this listing",
            position
        );
    }
}
impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T: Display> Display for Listing<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for line in self.iter_instructions() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
impl<T> FromIterator<T> for Listing<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut listing = Listing::new();
        for line in iter {
            listing.push(line);
        }
        listing
    }
}

pub struct LinesIter<'item, T> {
    listing: &'item Listing<T>,
    position: Option<Position>,
}

impl<'item, T> Iterator for LinesIter<'item, T> {
    type Item = (Position, &'item T);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.position?;
        let node = &self.listing.nodes[current.0];
        self.position = node.next;
        node.line.as_ref().map(|line| (current, line))
    }
}

pub struct IntoLines<T> {
    nodes: Vec<Node<T>>,
    position: Option<Position>,
}

impl<T> Iterator for IntoLines<T> {
    type Item = (Position, T);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.position?;
        let node = &mut self.nodes[current.0];
        self.position = node.next;
        node.line.take().map(|line| (current, line))
    }
}

impl<T> IntoIterator for Listing<T> {
    type Item = (Position, T);
    type IntoIter = IntoLines<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoLines {
            position: self.head,
            nodes: self.nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(listing: &Listing<&'static str>) -> Vec<&'static str> {
        listing.iter_instructions().copied().collect()
    }

    #[test]
    fn push_appends_in_order() {
        let listing: Listing<_> = ["a", "b", "c"].into_iter().collect();

        assert_eq!(vec!["a", "b", "c"], contents(&listing));
        assert_eq!(3, listing.len());
    }

    #[test]
    fn remove_keeps_other_positions_valid() {
        let mut listing = Listing::new();
        let a = listing.push("a");
        let b = listing.push("b");
        let c = listing.push("c");

        assert_eq!("b", listing.remove(b));

        assert_eq!(Some(&"a"), listing.get(a));
        assert_eq!(Some(&"c"), listing.get(c));
        assert_eq!(Some(c), listing.next(a));
        assert_eq!(Some(a), listing.prev(c));
        assert_eq!(None, listing.get(b));
        assert_eq!(vec!["a", "c"], contents(&listing));
    }

    #[test]
    fn removing_head_and_tail_updates_ends() {
        let mut listing = Listing::new();
        let a = listing.push("a");
        let b = listing.push("b");
        let c = listing.push("c");

        listing.remove(a);
        listing.remove(c);

        assert_eq!(Some(b), listing.first());
        assert_eq!(Some(b), listing.last());
        assert_eq!(1, listing.len());
    }

    #[test]
    fn insertion_splices_into_the_middle() {
        let mut listing = Listing::new();
        let a = listing.push("a");
        let c = listing.push("c");

        listing.insert_after(a, "b");
        listing.insert_before(a, "start");
        listing.insert_after(c, "end");

        assert_eq!(vec!["start", "a", "b", "c", "end"], contents(&listing));
        assert_eq!(
            vec!["start", "a", "b", "c", "end"],
            listing.clone().into_vec()
        );
    }

    #[test]
    fn removing_everything_leaves_an_empty_listing() {
        let mut listing = Listing::new();
        let a = listing.push("a");

        listing.remove(a);

        assert!(listing.is_empty());
        assert_eq!(None, listing.first());
        assert_eq!(0, listing.iter_lines().count());
    }
}
