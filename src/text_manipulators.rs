use std::borrow::{Borrow, Cow};
use std::collections::HashMap;
use std::hash::Hash;

use log::debug;
use unicode_normalization::UnicodeNormalization;

/// Turns text into a URL token with the default settings: lowercase, no
/// diacritics, `_` instead of spaces.
pub fn normalize(text: &str) -> String {
    normalize_text(text, true, "_")
}

/// Normalizes text for use in a gratka URL.
///
/// The text is optionally lowercased, decomposed (NFKD) and stripped of every
/// non-ASCII code point, which drops the combining marks left over from the
/// decomposition. When `replace_spaces` is non-empty each space is replaced
/// with it.
pub fn normalize_text(text: &str, lower: bool, replace_spaces: &str) -> String {
    let cased = if lower {
        text.to_lowercase()
    } else {
        text.to_owned()
    };
    // ł has no decomposition, so NFKD alone would drop it entirely.
    let ascii: String = cased
        .chars()
        .map(|c| match c {
            'ł' => 'l',
            'Ł' => 'L',
            other => other,
        })
        .nfkd()
        .filter(char::is_ascii)
        .collect();
    if replace_spaces.is_empty() {
        ascii
    } else {
        ascii.replace(' ', replace_spaces)
    }
}

/// Same as [`normalize_text`] for raw bytes. Input that is not UTF-8 is handed
/// back untouched.
pub fn normalize_raw<'a>(raw: &'a [u8], lower: bool, replace_spaces: &str) -> Cow<'a, [u8]> {
    match std::str::from_utf8(raw) {
        Ok(text) => Cow::Owned(normalize_text(text, lower, replace_spaces).into_bytes()),
        Err(e) => {
            debug!("Leaving undecodable input as is: {e}");
            Cow::Borrowed(raw)
        }
    }
}

// `&amp;` has to go last, otherwise `&amp;lt;` would end up as `<`.
const HTML_CODES: [(&str, &str); 5] = [
    ("&#39;", "'"),
    ("&quot;", "\""),
    ("&gt;", ">"),
    ("&lt;", "<"),
    ("&amp;", "&"),
];

/// Reverses the handful of HTML escapes gratka puts in listing text. Tags are
/// left alone.
pub fn decode_entities(s: &str) -> String {
    replace_all(s, HTML_CODES)
}

/// Applies every `(from, to)` pair as a literal substring replacement, in the
/// order the pairs are yielded. Later pairs see the output of earlier ones.
pub fn replace_all<I, K, V>(text: &str, mapping: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    mapping
        .into_iter()
        .fold(text.to_owned(), |acc, (from, to)| {
            acc.replace(from.as_ref(), to.as_ref())
        })
}

/// Swaps every element that exactly matches a mapping key for its value.
pub fn replace_in_sequence<'a, K, V>(
    seq: &'a mut Vec<String>,
    mapping: &HashMap<K, V>,
) -> &'a mut Vec<String>
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
{
    for element in seq.iter_mut() {
        if let Some(replacement) = mapping.get(element.as_str()) {
            *element = replacement.as_ref().to_owned();
        }
    }
    seq
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_polish_diacritics() {
        assert_eq!(normalize("Łódź"), "lodz");
        assert_eq!(normalize("Zażółć gęślą jaźń"), "zazolc_gesla_jazn");
    }

    #[test]
    fn normalize_replaces_spaces() {
        assert_eq!(normalize("Nowa Huta"), "nowa_huta");
        assert_eq!(normalize_text("Nowa Huta", true, "-"), "nowa-huta");
        assert_eq!(normalize_text("Nowa Huta", true, ""), "nowa huta");
    }

    #[test]
    fn normalize_can_keep_case() {
        assert_eq!(normalize_text("Kraków Podgórze", false, "_"), "Krakow_Podgorze");
        assert_eq!(normalize_text("Łeba", false, ""), "Leba");
    }

    #[test]
    fn normalize_empty() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn normalize_raw_passes_invalid_utf8_through() {
        let raw = [0xffu8, 0xfe, b'a'];
        assert_eq!(normalize_raw(&raw, true, "_").as_ref(), &raw[..]);
        assert_eq!(
            normalize_raw("Biała Podlaska".as_bytes(), true, "_").as_ref(),
            b"biala_podlaska"
        );
    }

    #[test]
    fn decode_entities_in_order() {
        assert_eq!(
            decode_entities("&lt;b&gt; &quot;Dom&quot; &amp; ogr&#39;d"),
            "<b> \"Dom\" & ogr'd"
        );
        // Only one level of escaping is removed.
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn decode_entities_is_idempotent_on_plain_text() {
        for s in ["", "plain text", "a < b > c & d", "it's \"quoted\""] {
            let once = decode_entities(s);
            assert_eq!(decode_entities(&once), once);
        }
    }

    #[test]
    fn replace_all_cascades_in_mapping_order() {
        assert_eq!(replace_all("a&b", [("a", "b"), ("b", "c")]), "c&c");
        assert_eq!(replace_all("a&b", [("b", "c"), ("a", "b")]), "b&c");
        let price_cleanup = [("\u{a0}", ""), ("Negocjuj cenę", ""), ("\n", ", ")];
        assert_eq!(
            replace_all("12\u{a0}000 zł\nNegocjuj cenę", price_cleanup),
            "12000 zł, "
        );
    }

    #[test]
    fn replace_in_sequence_matches_whole_elements() {
        let mapping = HashMap::from([("tak", "yes"), ("nie", "no")]);
        let mut seq = vec!["tak".to_string(), "nie".to_string(), "takze".to_string()];
        let out = replace_in_sequence(&mut seq, &mapping);
        assert_eq!(out, &vec!["yes".to_string(), "no".to_string(), "takze".to_string()]);
        assert_eq!(seq[0], "yes");
    }
}
