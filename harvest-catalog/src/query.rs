/// Filter applied when none is configured: released games that have screenshots.
pub const DEFAULT_FILTER: &str = "first_release_date > 0 & category = 0 & screenshots != null";

/// One page request against the `/games` endpoint, in the catalog's query language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub fields: String,
    pub filter: String,
    pub limit: u32,
    pub offset: u64,
}

impl CatalogQuery {
    pub fn page(filter: impl Into<String>, limit: u32, offset: u64) -> Self {
        Self {
            fields: "id, name, first_release_date, screenshots.*".to_string(),
            filter: filter.into(),
            limit,
            offset,
        }
    }

    /// Render the request body, e.g.
    /// `fields id, name; where x > 0; limit 500; offset 0;`.
    pub fn body(&self) -> String {
        let mut body = format!("fields {};", self.fields);
        if !self.filter.trim().is_empty() {
            body.push_str(&format!(" where {};", self.filter.trim()));
        }
        body.push_str(&format!(" limit {}; offset {};", self.limit, self.offset));
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_contains_paging() {
        let q = CatalogQuery::page(DEFAULT_FILTER, 500, 1500);
        assert_eq!(
            q.body(),
            "fields id, name, first_release_date, screenshots.*; \
             where first_release_date > 0 & category = 0 & screenshots != null; \
             limit 500; offset 1500;"
        );
    }

    #[test]
    fn empty_filter_omits_where() {
        let q = CatalogQuery::page("  ", 10, 0);
        assert_eq!(
            q.body(),
            "fields id, name, first_release_date, screenshots.*; limit 10; offset 0;"
        );
    }
}
