use std::fmt;
use std::str::FromStr;

use crate::poi::{Category, Poi};

/// Category selector of the sidebar: everything, or one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(c) => *c == category,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::All => "All Locations",
            Self::Only(c) => c.display_name(),
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::All => "📍",
            Self::Only(c) => c.icon(),
        }
    }

    /// `All` followed by every category, in sidebar order.
    pub fn choices() -> Vec<CategoryFilter> {
        std::iter::once(Self::All)
            .chain(Category::all().iter().copied().map(Self::Only))
            .collect()
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Only(c) => write!(f, "{c}"),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// Every input of the sidebar filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoiFilter {
    pub query: String,
    pub category: CategoryFilter,
    pub essential_only: bool,
    pub accessible_only: bool,
}

impl PoiFilter {
    pub fn matches(&self, poi: &Poi) -> bool {
        let matches_search =
            self.query.is_empty() || poi.name.to_lowercase().contains(&self.query.to_lowercase());
        matches_search
            && self.category.matches(poi.category)
            && (!self.essential_only || poi.is_essential)
            && (!self.accessible_only || poi.is_accessible)
    }

    /// Keep the matching POIs in their original order.
    pub fn apply<'a>(&self, pois: &'a [Poi]) -> Vec<&'a Poi> {
        pois.iter().filter(|p| self.matches(p)).collect()
    }
}

/// Convenience wrapper over [`PoiFilter::apply`] taking the inputs positionally.
pub fn filter_pois<'a>(
    pois: &'a [Poi],
    query: &str,
    category: CategoryFilter,
    essential_only: bool,
    accessible_only: bool,
) -> Vec<&'a Poi> {
    PoiFilter {
        query: query.to_string(),
        category,
        essential_only,
        accessible_only,
    }
    .apply(pois)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::seed_pois;

    fn names(pois: &[&Poi]) -> Vec<String> {
        pois.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn test_search_library() {
        let pois = seed_pois();
        let out = filter_pois(&pois, "library", CategoryFilter::All, false, false);
        assert_eq!(names(&out), vec!["Main Library"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let pois = seed_pois();
        let out = filter_pois(&pois, "LIBR", CategoryFilter::All, false, false);
        assert_eq!(names(&out), vec!["Main Library"]);
    }

    #[test]
    fn test_dining_category() {
        let pois = seed_pois();
        let out = filter_pois(&pois, "", CategoryFilter::Only(Category::Dining), false, false);
        assert_eq!(names(&out), vec!["University Cafeteria"]);
    }

    #[test]
    fn test_essential_and_accessible() {
        let pois = seed_pois();
        let out = filter_pois(&pois, "", CategoryFilter::All, true, true);
        assert_eq!(
            names(&out),
            vec![
                "Main Library",
                "Student Center",
                "University Cafeteria",
                "Medical Center",
                "Shuttle Stop - Main Gate",
            ]
        );
    }

    #[test]
    fn test_empty_filter_keeps_everything_in_order() {
        let pois = seed_pois();
        let out = PoiFilter::default().apply(&pois);
        let ids: Vec<&str> = out.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6", "7"]);
    }

    #[test]
    fn test_no_match() {
        let pois = seed_pois();
        let out = filter_pois(&pois, "observatory", CategoryFilter::All, false, false);
        assert!(out.is_empty());
    }

    #[test]
    fn test_output_is_ordered_subsequence_satisfying_every_predicate() {
        let pois = seed_pois();
        let queries = ["", "s", "center", "main", "zzz"];
        for query in queries {
            for category in CategoryFilter::choices() {
                for essential in [false, true] {
                    for accessible in [false, true] {
                        let f = PoiFilter {
                            query: query.to_string(),
                            category,
                            essential_only: essential,
                            accessible_only: accessible,
                        };
                        let out = f.apply(&pois);

                        // subsequence: positions strictly increase
                        let positions: Vec<usize> = out
                            .iter()
                            .map(|p| pois.iter().position(|q| q.id == p.id).unwrap())
                            .collect();
                        assert!(positions.windows(2).all(|w| w[0] < w[1]));

                        for p in &out {
                            assert!(f.matches(p));
                            assert!(!essential || p.is_essential);
                            assert!(!accessible || p.is_accessible);
                            assert!(category.matches(p.category));
                        }
                        // nothing that matches was dropped
                        assert_eq!(out.len(), pois.iter().filter(|p| f.matches(p)).count());

                        assert_eq!(out, f.apply(&pois));
                    }
                }
            }
        }
    }

    #[test]
    fn test_category_filter_parse() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "Emergency".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::Emergency)
        );
        assert!("parking".parse::<CategoryFilter>().is_err());
        assert_eq!(CategoryFilter::choices().len(), 7);
    }
}
