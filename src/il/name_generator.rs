use super::Name;

/// Hands out temporaries for a whole program. Temporaries are numbered from zero and never
/// reused, so every temporary has a single definition when it leaves the generator.
#[derive(Debug, Default)]
pub struct NameGenerator {
    index: usize,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a new unique temporary name.
    pub fn next_temp(&mut self) -> Name {
        let temp = Name::Temp(self.index);
        self.index += 1;
        temp
    }

    /// The number of temporaries handed out so far.
    pub fn issued(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_temp_generates_ascending_temp_values() {
        let mut name_gen = NameGenerator::new();

        assert_eq!("t0", name_gen.next_temp().to_string());
        assert_eq!("t1", name_gen.next_temp().to_string());
        assert_eq!(2, name_gen.issued());
    }
}
