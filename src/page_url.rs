use crate::error::ScrapeError;

/// Index of the comma-delimited segment that receives the sort marker.
///
/// Gratka keeps the page number and the sort flag in slots whose position
/// depends on how many filter segments the mapper put in the URL. Zero (or
/// less) means the URL has no comma segments and the dot fallback applies.
pub fn page_position(url: &str) -> i64 {
    let commas = url.matches(',').count() as i64;
    (commas - 1).div_euclid(2) + 1
}

/// Rewrites a canonical listing URL so it points at `page`.
///
/// The splice points are tied to the live site's URL shape, so they must not
/// be "tidied up":
/// * with commas, `,<page>` goes after segment 1 and `,s` after segment
///   [`page_position`];
/// * without, `,,<page>,s` goes after the second-to-last dot segment.
pub fn set_page(url: &str, page: u32) -> Result<String, ScrapeError> {
    let position = page_position(url);
    let out_of_range = || ScrapeError::PageSlotOutOfRange {
        url: url.to_string(),
    };

    if position > 0 {
        let mut segments: Vec<String> = url.split(',').map(str::to_string).collect();
        segments
            .get_mut(1)
            .ok_or_else(out_of_range)?
            .push_str(&format!(",{page}"));
        segments
            .get_mut(position as usize)
            .ok_or_else(out_of_range)?
            .push_str(",s");
        Ok(segments.join(","))
    } else {
        let mut segments: Vec<String> = url.split('.').map(str::to_string).collect();
        let second_to_last = segments.len().checked_sub(2).ok_or_else(out_of_range)?;
        segments[second_to_last].push_str(&format!(",,{page},s"));
        Ok(segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_from_comma_count() {
        assert_eq!(page_position("no-commas.html"), 0);
        assert_eq!(page_position("a,b"), 1);
        assert_eq!(page_position("a,b,c"), 1);
        assert_eq!(page_position("a,b,c,d"), 2);
        assert_eq!(page_position("a,b,c,d,e"), 2);
        assert_eq!(page_position("a,b,c,d,e,f"), 3);
    }

    #[test]
    fn three_commas() {
        assert_eq!(set_page("a,b,c,d", 2).unwrap(), "a,b,2,c,s,d");
    }

    #[test]
    fn page_and_sort_share_a_segment() {
        assert_eq!(set_page("a,b", 5).unwrap(), "a,b,5,s");
        assert_eq!(set_page("a,b,c", 7).unwrap(), "a,b,7,s,c");
    }

    #[test]
    fn five_commas() {
        assert_eq!(set_page("a,b,c,d,e,f", 2).unwrap(), "a,b,2,c,d,s,e,f");
    }

    #[test]
    fn realistic_mapper_url() {
        assert_eq!(
            set_page(
                "http://gratka.pl/nieruchomosci/mieszkania/krakow,nowa-huta,pokoje-2.html",
                4
            )
            .unwrap(),
            "http://gratka.pl/nieruchomosci/mieszkania/krakow,nowa-huta,4,s,pokoje-2.html"
        );
    }

    #[test]
    fn dot_fallback() {
        assert_eq!(
            set_page("http://example.com/x.y.z", 3).unwrap(),
            "http://example.com/x.y,,3,s.z"
        );
        assert_eq!(
            set_page("http://gratka.pl/nieruchomosci/mieszkania.html", 1).unwrap(),
            "http://gratka.pl/nieruchomosci/mieszkania,,1,s.html"
        );
    }

    #[test]
    fn no_slot_is_an_error() {
        assert!(matches!(
            set_page("no-delimiters", 2),
            Err(ScrapeError::PageSlotOutOfRange { .. })
        ));
    }
}
