use crate::model::HeaderPosition;

/// Nearest header to `x`, preferring headers printed on `page`.
///
/// Falls back to every header when none share the page. Ties keep the
/// first header in list order.
#[must_use]
pub fn assign_column(x: f64, page: u32, headers: &[HeaderPosition]) -> Option<&HeaderPosition> {
    let on_page = headers.iter().any(|header| header.page == page);

    headers
        .iter()
        .filter(|header| !on_page || header.page == page)
        .fold(None, |best: Option<&HeaderPosition>, header| match best {
            Some(current) if (current.x - x).abs() <= (header.x - x).abs() => Some(current),
            _ => Some(header),
        })
}

#[cfg(test)]
mod tests {
    use super::assign_column;
    use crate::model::HeaderPosition;

    fn headers() -> Vec<HeaderPosition> {
        vec![
            HeaderPosition::new("Staff Member", 50.0, 1),
            HeaderPosition::new("Captured", 200.0, 1),
            HeaderPosition::new("Pct O", 380.0, 1),
            HeaderPosition::new("Pct Of Total", 60.0, 2),
        ]
    }

    fn name(x: f64, page: u32, headers: &[HeaderPosition]) -> Option<String> {
        assign_column(x, page, headers).map(|header| header.name.clone())
    }

    #[test]
    fn prefers_headers_on_the_same_page() {
        let headers = headers();
        assert_eq!(name(62.0, 1, &headers).as_deref(), Some("Staff Member"));
        assert_eq!(name(45.0, 2, &headers).as_deref(), Some("Pct Of Total"));
        assert_eq!(name(900.0, 2, &headers).as_deref(), Some("Pct Of Total"));
    }

    #[test]
    fn never_crosses_pages_when_page_has_headers() {
        let headers = headers();
        for step in 0..100 {
            let x = f64::from(step) * 7.5;
            let assigned = assign_column(x, 1, &headers).expect("headers exist");
            assert_eq!(assigned.page, 1, "x={x}");
        }
    }

    #[test]
    fn falls_back_to_all_headers_on_unknown_page() {
        let headers = headers();
        assert_eq!(name(210.0, 3, &headers).as_deref(), Some("Captured"));
    }

    #[test]
    fn ties_keep_first_header() {
        let headers = vec![
            HeaderPosition::new("Left", 100.0, 1),
            HeaderPosition::new("Right", 200.0, 1),
        ];
        assert_eq!(name(150.0, 1, &headers).as_deref(), Some("Left"));
    }

    #[test]
    fn empty_headers_yield_none() {
        assert!(assign_column(10.0, 1, &[]).is_none());
    }
}
