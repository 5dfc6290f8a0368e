//! Search index over SQLite.
//!
//! Index documents live in the `index_documents` table; queries are built as
//! parameterized SQL over the extracted columns. The terms aggregation runs
//! over the same filtered set as the hits, before pagination.

use async_trait::async_trait;
use rusqlite::types::ToSql;
use rusqlite::{Connection, params, params_from_iter};

use crate::error::StorageResult;
use crate::store::SearchIndex;
use crate::types::{
    IndexDocument, RecordId, SearchHit, SearchPage, SearchQuery, SortField, SortOrder, TermBucket,
};

use super::backend::SqliteBackend;
use super::records::parse_record_id;

/// Escapes `%`, `_` and the escape character itself for LIKE patterns.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// The WHERE clause and bound values shared by hits, count and aggregation.
struct QueryParts {
    from_where: String,
    values: Vec<Box<dyn ToSql>>,
}

fn build_query_parts(index: &str, query: &SearchQuery) -> QueryParts {
    let mut from_where = String::from("FROM index_documents WHERE index_name = ?");
    let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(index.to_string())];

    if !query.type_filter.is_empty() {
        let placeholders = vec!["?"; query.type_filter.len()].join(", ");
        from_where.push_str(&format!(" AND doc_type IN ({placeholders})"));
        for doc_type in &query.type_filter {
            values.push(Box::new(doc_type.clone()));
        }
    }

    if let Some(q) = query.q.as_deref().filter(|q| !q.is_empty()) {
        from_where.push_str(" AND title LIKE '%' || ? || '%' ESCAPE '\\' COLLATE NOCASE");
        values.push(Box::new(escape_like(q)));
    }

    QueryParts { from_where, values }
}

fn order_clause(query: &SearchQuery) -> String {
    let Some(sort) = query.sort else {
        return "ORDER BY record_id ASC".to_string();
    };

    let direction = match sort.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    let expression = match sort.field {
        SortField::Title => "title",
        // Control numbers are numeric strings; compare them as numbers so
        // "10" sorts after "9".
        SortField::ControlNumber => "CAST(control_number AS INTEGER)",
    };

    format!("ORDER BY {expression} {direction} NULLS LAST, record_id ASC")
}

/// Hard ceiling on page size at the storage level; the REST layer applies
/// its own, lower, configured maximum first.
const MAX_PAGE_SIZE: usize = 10_000;

fn query_hits(
    conn: &Connection,
    parts: &QueryParts,
    query: &SearchQuery,
) -> StorageResult<Vec<SearchHit>> {
    let size = query.effective_size(MAX_PAGE_SIZE);
    let offset = (query.effective_page() - 1).saturating_mul(size);

    let sql = format!(
        "SELECT record_id, payload {} {} LIMIT {size} OFFSET {offset}",
        parts.from_where,
        order_clause(query),
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(
        parts.values.iter().map(|v| v.as_ref() as &dyn ToSql),
    ))?;

    let mut hits = Vec::new();
    while let Some(row) = rows.next()? {
        let record_id: String = row.get(0)?;
        let payload: String = row.get(1)?;
        hits.push(SearchHit {
            record_id: parse_record_id(&record_id)?,
            payload: serde_json::from_str(&payload)?,
        });
    }
    Ok(hits)
}

fn query_total(conn: &Connection, parts: &QueryParts) -> StorageResult<u64> {
    let sql = format!("SELECT COUNT(*) {}", parts.from_where);
    let total: i64 = conn.query_row(
        &sql,
        params_from_iter(parts.values.iter().map(|v| v.as_ref() as &dyn ToSql)),
        |row| row.get(0),
    )?;
    Ok(total as u64)
}

fn query_type_buckets(conn: &Connection, parts: &QueryParts) -> StorageResult<Vec<TermBucket>> {
    let sql = format!(
        "SELECT doc_type, COUNT(*) {} AND doc_type IS NOT NULL
         GROUP BY doc_type ORDER BY COUNT(*) DESC, doc_type ASC",
        parts.from_where
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(
        parts.values.iter().map(|v| v.as_ref() as &dyn ToSql),
    ))?;

    let mut buckets = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        let count: i64 = row.get(1)?;
        buckets.push(TermBucket {
            value,
            count: count as u64,
        });
    }
    Ok(buckets)
}

#[async_trait]
impl SearchIndex for SqliteBackend {
    async fn write_document(&self, index: &str, document: IndexDocument) -> StorageResult<()> {
        let conn = self.conn()?;

        // REPLACE keeps indexing idempotent: one document per record per index.
        conn.execute(
            "INSERT OR REPLACE INTO index_documents
             (index_name, record_id, payload, title, suggest_title, control_number, doc_type, indexed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                index,
                document.record_id.to_string(),
                serde_json::to_string(&document.payload)?,
                document.title,
                document.suggest_title,
                document.control_number,
                document.doc_type,
                document.indexed_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!(index, record_id = %document.record_id, "index document written");
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: RecordId) -> StorageResult<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM index_documents WHERE index_name = ?1 AND record_id = ?2",
            params![index, id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    async fn search(&self, index: &str, query: &SearchQuery) -> StorageResult<SearchPage> {
        let conn = self.conn()?;
        let parts = build_query_parts(index, query);

        Ok(SearchPage {
            hits: query_hits(&conn, &parts, query)?,
            total: query_total(&conn, &parts)?,
            type_buckets: query_type_buckets(&conn, &parts)?,
        })
    }

    async fn suggest(
        &self,
        index: &str,
        prefix: &str,
        size: usize,
    ) -> StorageResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT suggest_title FROM index_documents
             WHERE index_name = ?1 AND suggest_title LIKE ?2 || '%' ESCAPE '\\' COLLATE NOCASE
             ORDER BY suggest_title LIMIT {size}"
        ))?;
        let mut rows = stmt.query(params![index, escape_like(prefix)])?;

        let mut titles = Vec::new();
        while let Some(row) = rows.next()? {
            titles.push(row.get::<_, String>(0)?);
        }
        Ok(titles)
    }

    async fn document_count(&self, index: &str) -> StorageResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM index_documents WHERE index_name = ?1",
            params![index],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SortDirective, StoredRecord};
    use serde_json::json;

    const INDEX: &str = "testrecords-testrecord-v1.0.0";

    fn backend() -> SqliteBackend {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.init_schema().unwrap();
        backend
    }

    fn doc(title: &str, doc_type: &str, control_number: &str) -> IndexDocument {
        let record = StoredRecord::new(
            None,
            json!({"title": title, "type": doc_type}),
        );
        IndexDocument::from_record(&record).with_control_number(control_number)
    }

    async fn seeded_backend() -> SqliteBackend {
        let backend = backend();
        backend
            .write_document(INDEX, doc("Awesome meeting report", "report", "1"))
            .await
            .unwrap();
        backend
            .write_document(INDEX, doc("Furniture order", "order", "2"))
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_write_is_idempotent() {
        let backend = backend();
        let document = doc("Awesome meeting report", "report", "1");

        backend.write_document(INDEX, document.clone()).await.unwrap();
        backend.write_document(INDEX, document).await.unwrap();

        assert_eq!(backend.document_count(INDEX).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_type_filter() {
        let backend = seeded_backend().await;

        let page = backend
            .search(INDEX, &SearchQuery::new().with_type_filter("report"))
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.hits.len(), 1);
        assert_eq!(page.hits[0].payload["title"], "Awesome meeting report");
    }

    #[tokio::test]
    async fn test_free_text_query() {
        let backend = seeded_backend().await;

        let page = backend
            .search(INDEX, &SearchQuery::new().with_q("furniture"))
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.hits[0].payload["type"], "order");
    }

    #[tokio::test]
    async fn test_control_number_sort() {
        let backend = seeded_backend().await;
        // A third record whose control number sorts numerically, not
        // lexicographically.
        backend
            .write_document(INDEX, doc("Budget plan", "report", "10"))
            .await
            .unwrap();

        let page = backend
            .search(
                INDEX,
                &SearchQuery::new()
                    .with_sort(SortDirective::parse("control_number").unwrap()),
            )
            .await
            .unwrap();

        let titles: Vec<_> = page
            .hits
            .iter()
            .map(|h| h.payload["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            titles,
            vec!["Awesome meeting report", "Furniture order", "Budget plan"]
        );

        let page = backend
            .search(
                INDEX,
                &SearchQuery::new()
                    .with_sort(SortDirective::parse("-control_number").unwrap()),
            )
            .await
            .unwrap();
        assert_eq!(page.hits[0].payload["title"], "Budget plan");
    }

    #[tokio::test]
    async fn test_title_sort() {
        let backend = seeded_backend().await;

        let page = backend
            .search(
                INDEX,
                &SearchQuery::new().with_sort(SortDirective::parse("title").unwrap()),
            )
            .await
            .unwrap();

        assert_eq!(page.hits[0].payload["title"], "Awesome meeting report");
        assert_eq!(page.hits[1].payload["title"], "Furniture order");
    }

    #[tokio::test]
    async fn test_type_aggregation() {
        let backend = seeded_backend().await;
        backend
            .write_document(INDEX, doc("Second report", "report", "3"))
            .await
            .unwrap();

        let page = backend.search(INDEX, &SearchQuery::new()).await.unwrap();

        assert_eq!(
            page.type_buckets,
            vec![
                TermBucket {
                    value: "report".to_string(),
                    count: 2
                },
                TermBucket {
                    value: "order".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_pagination() {
        let backend = seeded_backend().await;

        let query = SearchQuery::new()
            .with_sort(SortDirective::parse("control_number").unwrap())
            .with_page(2, 1);
        let page = backend.search(INDEX, &query).await.unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.hits.len(), 1);
        assert_eq!(page.hits[0].payload["title"], "Furniture order");
    }

    #[tokio::test]
    async fn test_indexes_are_isolated_by_name() {
        let backend = seeded_backend().await;

        let other = backend
            .search("other-index-v1.0.0", &SearchQuery::new())
            .await
            .unwrap();
        assert_eq!(other.total, 0);
    }

    #[tokio::test]
    async fn test_suggest_prefix() {
        let backend = seeded_backend().await;

        let suggestions = backend.suggest(INDEX, "awe", 10).await.unwrap();
        assert_eq!(suggestions, vec!["Awesome meeting report".to_string()]);

        let none = backend.suggest(INDEX, "zzz", 10).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_delete_document() {
        let backend = seeded_backend().await;
        let page = backend.search(INDEX, &SearchQuery::new()).await.unwrap();
        let id = page.hits[0].record_id;

        assert!(backend.delete_document(INDEX, id).await.unwrap());
        assert!(!backend.delete_document(INDEX, id).await.unwrap());
        assert_eq!(backend.document_count(INDEX).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_like_wildcards_are_literal() {
        let backend = seeded_backend().await;

        // "%" must not match everything when searched for literally.
        let page = backend
            .search(INDEX, &SearchQuery::new().with_q("%"))
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }
}
