use crate::normalizer::clean_text;

/// Known brands, normalized and ordered longest-first.
#[derive(Debug, Clone, Default)]
pub struct BrandGazetteer {
    brands: Vec<String>,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl BrandGazetteer {
    pub fn new<I, S>(brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut brands: Vec<String> = brands
            .into_iter()
            .map(|b| clean_text(b.as_ref()).split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|b| !b.is_empty())
            .collect();
        brands.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });
        brands.dedup();
        Self { brands }
    }

    pub fn len(&self) -> usize {
        self.brands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.brands.iter().map(String::as_str)
    }

    /// Returns the longest gazetteer entry found in `text` on word boundaries.
    pub fn extract(&self, text: &str) -> Option<&str> {
        let cleaned = clean_text(text);
        let haystack = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        self.iter().find(|brand| occurs_delimited(&haystack, brand))
    }
}

/// Occurrence of `needle` whose neighbours are not word characters. An edge
/// of the needle that is itself a non-word character (the final `.` of
/// `p.a.n.`) needs no delimiter on that side.
fn occurs_delimited(haystack: &str, needle: &str) -> bool {
    let (Some(first), Some(last)) = (needle.chars().next(), needle.chars().last()) else {
        return false;
    };
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().last();
        let after = haystack[start + needle.len()..].chars().next();
        let left_ok = !is_word_char(first) || before.is_none_or(|c| !is_word_char(c));
        let right_ok = !is_word_char(last) || after.is_none_or(|c| !is_word_char(c));
        left_ok && right_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_brand_wins() {
        let gazetteer = BrandGazetteer::new(["la", "La Giralda"]);
        assert_eq!(gazetteer.extract("Harina La Giralda 1kg"), Some("la giralda"));
        assert_eq!(gazetteer.extract("harina la giralda 1kg"), Some("la giralda"));
        assert_eq!(gazetteer.extract("Salsa de la casa"), Some("la"));
    }

    #[test]
    fn test_brand_requires_word_boundaries() {
        let gazetteer = BrandGazetteer::new(["ace", "hit"]);
        assert_eq!(gazetteer.extract("Aceite de oliva"), None);
        assert_eq!(gazetteer.extract("Refresco Hit naranja"), Some("hit"));
        assert_eq!(gazetteer.extract("Detergente ACE 1kg"), Some("ace"));
    }

    #[test]
    fn test_dotted_brand_matches() {
        let gazetteer = BrandGazetteer::new(["P.A.N.", "Juana"]);
        assert_eq!(gazetteer.extract("Harina P.A.N. Blanca 1Kg"), Some("p.a.n."));
        assert_eq!(gazetteer.extract("P.A.N. harina blanca de maiz 1 kg"), Some("p.a.n."));
        assert_eq!(gazetteer.extract("Harina Juana"), Some("juana"));
    }

    #[test]
    fn test_diacritics_are_folded_on_both_sides() {
        let gazetteer = BrandGazetteer::new(["Nestlé", "La Campiña"]);
        assert_eq!(gazetteer.extract("Leche NESTLE entera"), Some("nestle"));
        assert_eq!(gazetteer.extract("Mantequilla la campiña"), Some("la campina"));
    }

    #[test]
    fn test_no_brand_is_none() {
        let gazetteer = BrandGazetteer::new(["mavesa"]);
        assert_eq!(gazetteer.extract("Pan dulce artesanal"), None);
        assert_eq!(gazetteer.extract(""), None);
    }

    #[test]
    fn test_entries_are_deduplicated_and_ordered() {
        let gazetteer = BrandGazetteer::new(["Oreo", "oreo", "Club Social", ""]);
        let brands: Vec<_> = gazetteer.iter().collect();
        assert_eq!(brands, vec!["club social", "oreo"]);
    }
}
