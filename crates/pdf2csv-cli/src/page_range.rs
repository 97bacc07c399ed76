use pdf2csv::{ConfigError, PageRange};

/// Parse a page range argument into a [`PageRange`].
///
/// Accepts `""` (all pages), `"N"`, `"N-M"`, `"N-"` and `"-M"`, 1-based and
/// inclusive. Surrounding whitespace is ignored.
pub fn parse_page_range(input: &str) -> Result<PageRange, ConfigError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(PageRange::all());
    }

    let syntax = || ConfigError::PageRangeSyntax(input.to_string());
    let number = |s: &str| -> Result<Option<usize>, ConfigError> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(None);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(syntax());
        }
        s.parse().map(Some).map_err(|_| syntax())
    };

    match input.split_once('-') {
        Some((first, last)) => {
            let (first, last) = (number(first)?, number(last)?);
            if first.is_none() && last.is_none() {
                return Err(syntax());
            }
            PageRange::new(first, last)
        }
        None => match number(input)? {
            Some(page) => PageRange::single(page),
            None => Err(syntax()),
        },
    }
}
