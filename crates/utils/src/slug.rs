//! Slug generation for URL path segments.

/// Turns free text into a lowercase, hyphen-delimited, URL-safe token.
///
/// `&` reads as "and", apostrophes are dropped, and every other run of
/// characters that are not ASCII alphanumerics collapses into one hyphen.
/// Common Latin accents are folded to their base letter.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for ch in input.chars() {
        let word = match ch {
            '\'' | '\u{2019}' => continue,
            '&' => {
                pending_separator = true;
                "and"
            }
            _ => match fold_accent(ch) {
                Some(folded) => folded,
                None if ch.is_ascii_alphanumeric() => {
                    if pending_separator && !slug.is_empty() {
                        slug.push('-');
                    }
                    pending_separator = false;
                    slug.push(ch.to_ascii_lowercase());
                    continue;
                }
                None => {
                    pending_separator = true;
                    continue;
                }
            },
        };

        if pending_separator && !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(word);
        pending_separator = ch == '&';
    }

    slug
}

/// Whether `candidate` is already in the shape `slugify` produces.
pub fn is_valid_slug(candidate: &str) -> bool {
    !candidate.is_empty()
        && !candidate.starts_with('-')
        && !candidate.ends_with('-')
        && !candidate.contains("--")
        && candidate
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn fold_accent(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'æ' | 'Æ' => "ae",
        'ç' | 'Ç' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ñ' | 'Ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Open Source"), "open-source");
        assert_eq!(slugify("  Developer   Tools  "), "developer-tools");
    }

    #[test]
    fn test_slugify_symbols() {
        assert_eq!(slugify("Design & Prototyping"), "design-and-prototyping");
        assert_eq!(slugify("Founder's Toolkit"), "founders-toolkit");
        assert_eq!(slugify("CI/CD"), "ci-cd");
        assert_eq!(slugify("--Hello, World!--"), "hello-world");
    }

    #[test]
    fn test_slugify_accents() {
        assert_eq!(slugify("Café Crème"), "cafe-creme");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_is_idempotent() {
        let once = slugify("AI & Machine Learning 2.0");
        assert_eq!(once, "ai-and-machine-learning-2-0");
        assert_eq!(slugify(&once), once);
        assert!(is_valid_slug(&once));
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("open-source"));
        assert!(!is_valid_slug("Open-Source"));
        assert!(!is_valid_slug("open--source"));
        assert!(!is_valid_slug("-open"));
        assert!(!is_valid_slug(""));
    }
}
