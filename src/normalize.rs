// 🧹 Normalizer - Canonical text form for specialty names
//
// "Family Medicine (General)", "family-medicine general" and
// "FAMILY MEDICINE, GENERAL" all normalize to "family medicine general".
//
// Every comparison in the engine (synonym uniqueness, similarity tiers,
// source identity) happens on this form, never on the raw vendor text.

/// Words that carry no meaning for specialty matching
pub const STOPWORDS: [&str; 7] = ["and", "or", "the", "of", "in", "with", "without"];

/// Normalize a specialty name
///
/// Steps:
/// 1. lowercase
/// 2. drop parentheses (their content is kept)
/// 3. `/`, `-`, `&`, `,` become spaces
/// 4. strip everything outside `[a-z0-9\s]`
/// 5. remove stopwords
/// 6. collapse and trim whitespace
///
/// The function is idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| *c != '(' && *c != ')')
        .map(|c| match c {
            '/' | '-' | '&' | ',' => ' ',
            other => other,
        })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| !STOPWORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized words of a name, in order
pub fn tokens(name: &str) -> Vec<String> {
    normalize(name)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Vendor labels are compared case- and whitespace-insensitively
pub fn normalize_vendor(vendor: &str) -> String {
    vendor
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parentheses_and_separators() {
        assert_eq!(
            normalize("Family Medicine (General)"),
            normalize("family-medicine general")
        );
        assert_eq!(normalize("Family Medicine (General)"), "family medicine general");
    }

    #[test]
    fn test_ampersand_and_stopwords() {
        assert_eq!(normalize("Obstetrics & Gynecology"), "obstetrics gynecology");
        assert_eq!(normalize("Obstetrics and Gynecology"), "obstetrics gynecology");
        assert_eq!(
            normalize("Family Medicine without Obstetrics"),
            "family medicine obstetrics"
        );
    }

    #[test]
    fn test_slash_and_comma() {
        assert_eq!(normalize("OB/GYN"), "ob gyn");
        assert_eq!(normalize("Surgery, General"), "surgery general");
    }

    #[test]
    fn test_strips_other_characters() {
        assert_eq!(normalize("Cardiology: Invasive*"), "cardiology invasive");
        assert_eq!(normalize("Orthopédic Surgery"), "orthopdic surgery");
        assert_eq!(normalize("  Pediatrics   \t General  "), "pediatrics general");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "Family Medicine (General)",
            "Hem/Onc - Pediatric",
            "The Art of Surgery",
            "",
            "   ",
            "Emergency Medicine & Urgent Care, Adult",
        ];

        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_only_stopwords_is_empty() {
        assert_eq!(normalize("the and or"), "");
        assert!(tokens("of the").is_empty());
    }

    #[test]
    fn test_tokens_preserve_order() {
        assert_eq!(
            tokens("Surgery - Vascular & Endovascular"),
            vec!["surgery", "vascular", "endovascular"]
        );
    }

    #[test]
    fn test_normalize_vendor() {
        assert_eq!(normalize_vendor("  Sullivan   Cotter "), "sullivan cotter");
        assert_eq!(normalize_vendor("MGMA"), normalize_vendor("mgma"));
    }
}
