/// One of the four mutually exclusive infection/nucleation classes. Every
/// record with valid flags belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    MononucleatedInfected,
    MultinucleatedInfected,
    MononucleatedUninfected,
    MultinucleatedUninfected,
}

impl Category {
    /// Fixed order used for sheet creation.
    pub const ALL: [Category; 4] = [
        Category::MononucleatedInfected,
        Category::MultinucleatedInfected,
        Category::MononucleatedUninfected,
        Category::MultinucleatedUninfected,
    ];

    pub fn of(mononucleated: bool, infected: bool) -> Category {
        match (infected, mononucleated) {
            (true, true) => Category::MononucleatedInfected,
            (true, false) => Category::MultinucleatedInfected,
            (false, true) => Category::MononucleatedUninfected,
            (false, false) => Category::MultinucleatedUninfected,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::MononucleatedInfected => "Mononucleated_Infected",
            Category::MultinucleatedInfected => "Multinucleated_Infected",
            Category::MononucleatedUninfected => "Mononucleated_Uninfected",
            Category::MultinucleatedUninfected => "Multinucleated_Uninfected",
        }
    }

    pub fn is_infected(self) -> bool {
        matches!(
            self,
            Category::MononucleatedInfected | Category::MultinucleatedInfected
        )
    }

    pub fn index(self) -> usize {
        match self {
            Category::MononucleatedInfected => 0,
            Category::MultinucleatedInfected => 1,
            Category::MononucleatedUninfected => 2,
            Category::MultinucleatedUninfected => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_covers_both_flags() {
        assert_eq!(Category::of(true, true), Category::MononucleatedInfected);
        assert_eq!(Category::of(false, true), Category::MultinucleatedInfected);
        assert_eq!(Category::of(true, false), Category::MononucleatedUninfected);
        assert_eq!(
            Category::of(false, false),
            Category::MultinucleatedUninfected
        );
    }

    #[test]
    fn test_all_order_matches_index() {
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn test_infected_split() {
        let infected: Vec<_> = Category::ALL.iter().filter(|c| c.is_infected()).collect();
        assert_eq!(infected.len(), 2);
    }
}
