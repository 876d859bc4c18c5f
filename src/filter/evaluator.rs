use crate::filter::parser::{parse_search, ParseError, SearchExpr};
use crate::models::Fact;

/// Fact attribute a search expression is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Activity,
    Category,
    Tag,
    Description,
}

impl SearchField {
    fn matches(&self, fact: &Fact, needle: &str) -> bool {
        let contains = |haystack: &str| haystack.to_lowercase().contains(needle);
        match self {
            SearchField::Activity => contains(&fact.activity.name),
            SearchField::Category => fact.category_name().map_or(false, contains),
            SearchField::Tag => fact.tags.iter().any(|tag| contains(tag.as_str())),
            SearchField::Description => fact.description.as_deref().map_or(false, contains),
        }
    }
}

/// Evaluate `expr` over `facts` for one attribute.
///
/// A leaf keeps the facts whose attribute contains the term, ignoring case.
/// `And` keeps the facts of the left side that are also in the right side,
/// in left order. `Or` concatenates both sides, so a fact matching both
/// appears twice.
pub fn evaluate(expr: &SearchExpr, facts: &[Fact], field: SearchField) -> Vec<Fact> {
    match expr {
        SearchExpr::Leaf(term) => {
            let needle = term.to_lowercase();
            facts
                .iter()
                .filter(|fact| field.matches(fact, &needle))
                .cloned()
                .collect()
        }
        SearchExpr::And(left, right) => {
            let right = evaluate(right, facts, field);
            evaluate(left, facts, field)
                .into_iter()
                .filter(|fact| right.contains(fact))
                .collect()
        }
        SearchExpr::Or(left, right) => {
            let mut result = evaluate(left, facts, field);
            result.extend(evaluate(right, facts, field));
            result
        }
    }
}

/// Per-attribute search expressions; absent ones do not filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub activity: Option<SearchExpr>,
    pub category: Option<SearchExpr>,
    pub tag: Option<SearchExpr>,
    pub description: Option<SearchExpr>,
}

impl SearchFilters {
    /// Parse the raw option values given on the command line. Blank values
    /// count as absent.
    pub fn parse(
        activity: Option<&str>,
        category: Option<&str>,
        tag: Option<&str>,
        description: Option<&str>,
    ) -> Result<Self, ParseError> {
        let parse = |raw: Option<&str>| {
            raw.filter(|r| !r.trim().is_empty())
                .map(parse_search)
                .transpose()
        };
        Ok(Self {
            activity: parse(activity)?,
            category: parse(category)?,
            tag: parse(tag)?,
            description: parse(description)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.activity.is_none()
            && self.category.is_none()
            && self.tag.is_none()
            && self.description.is_none()
    }

    /// Run the filters one after another: activity, category, tag, description
    pub fn apply(&self, facts: Vec<Fact>) -> Vec<Fact> {
        let passes = [
            (&self.activity, SearchField::Activity),
            (&self.category, SearchField::Category),
            (&self.tag, SearchField::Tag),
            (&self.description, SearchField::Description),
        ];

        passes
            .into_iter()
            .fold(facts, |facts, (expr, field)| match expr {
                Some(expr) => evaluate(expr, &facts, field),
                None => facts,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, Category};

    fn fact(id: i64, activity: &str, category: Option<&str>, tags: &[&str], description: Option<&str>) -> Fact {
        let mut fact = Fact::new(Activity::new(activity, category.map(Category::new)));
        fact.id = Some(id);
        fact.tags = tags.iter().map(|t| t.to_string()).collect();
        fact.description = description.map(str::to_string);
        fact
    }

    fn sample() -> Vec<Fact> {
        vec![
            fact(1, "coding review", Some("work"), &["rust"], Some("pull request")),
            fact(2, "coding", Some("hobby"), &["python", "rusty"], None),
            fact(3, "Code Review", None, &[], Some("Design doc")),
            fact(4, "reading", Some("home"), &["book"], Some("novel")),
        ]
    }

    fn ids(facts: &[Fact]) -> Vec<i64> {
        facts.iter().filter_map(|f| f.id).collect()
    }

    fn run(expr: &str, field: SearchField) -> Vec<i64> {
        ids(&evaluate(&parse_search(expr).unwrap(), &sample(), field))
    }

    #[test]
    fn test_leaf_is_case_insensitive_substring() {
        assert_eq!(run("review", SearchField::Activity), vec![1, 3]);
        assert_eq!(run("CODING", SearchField::Activity), vec![1, 2]);
    }

    #[test]
    fn test_missing_attribute_never_matches() {
        assert_eq!(run("o", SearchField::Category), vec![1, 2, 4]);
        assert_eq!(run("e", SearchField::Description), vec![1, 3, 4]);
    }

    #[test]
    fn test_tag_matches_any_tag() {
        assert_eq!(run("rust", SearchField::Tag), vec![1, 2]);
    }

    #[test]
    fn test_and_requires_both() {
        assert_eq!(run("coding AND review", SearchField::Activity), vec![1]);
        assert_eq!(run("a and b", SearchField::Activity), Vec::<i64>::new());
    }

    #[test]
    fn test_p_and_p_equals_p() {
        assert_eq!(run("coding and coding", SearchField::Activity), run("coding", SearchField::Activity));
    }

    #[test]
    fn test_p_or_p_duplicates() {
        assert_eq!(run("coding or coding", SearchField::Activity), vec![1, 2, 1, 2]);
    }

    #[test]
    fn test_grouping() {
        assert_eq!(run("(reading or code) and view", SearchField::Activity), vec![3]);
    }

    #[test]
    fn test_filters_are_sequential() {
        let filters = SearchFilters::parse(Some("coding"), Some("work or hobby"), Some("rust"), None).unwrap();
        assert_eq!(ids(&filters.apply(sample())), vec![1, 2]);

        let filters = SearchFilters::parse(Some("coding"), None, None, Some("request")).unwrap();
        assert_eq!(ids(&filters.apply(sample())), vec![1]);
    }

    #[test]
    fn test_filters_are_idempotent() {
        let filters = SearchFilters::parse(Some("cod"), Some("o"), None, None).unwrap();
        let once = filters.apply(sample());
        let twice = filters.apply(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_filters_keep_everything() {
        let filters = SearchFilters::default();
        assert!(filters.is_empty());
        assert_eq!(filters.apply(sample()), sample());
    }

    #[test]
    fn test_blank_expression_skips_attribute() {
        let filters = SearchFilters::parse(Some(""), Some("   "), None, None).unwrap();
        assert!(filters.is_empty());
        assert_eq!(filters.apply(sample()), sample());
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(SearchFilters::parse(Some("a and"), None, None, None).is_err());
    }
}
