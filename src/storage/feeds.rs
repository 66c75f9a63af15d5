use super::schema::Database;
use super::types::{DatabaseError, StoredFeed};

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Registers a feed URL.
    ///
    /// The URL is stored as given; callers validate it first.
    ///
    /// # Errors
    ///
    /// `DatabaseError::Duplicate` if the URL is already registered.
    pub async fn add_feed(&self, url: &str) -> Result<StoredFeed, DatabaseError> {
        let added_at = chrono::Utc::now().timestamp();

        let result = sqlx::query("INSERT INTO feeds (url, added_at) VALUES (?, ?)")
            .bind(url)
            .bind(added_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => {
                let feed = StoredFeed {
                    id: done.last_insert_rowid(),
                    url: url.to_string(),
                    added_at,
                };
                tracing::info!(id = feed.id, url = %feed.url, "Feed added");
                Ok(feed)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(DatabaseError::Duplicate(url.to_string()))
            }
            Err(e) => Err(DatabaseError::from_sqlx(e)),
        }
    }

    /// All registered feeds in insertion (id) order.
    ///
    /// This order is the feed input order for aggregation.
    pub async fn list_feeds(&self) -> Result<Vec<StoredFeed>, DatabaseError> {
        sqlx::query_as::<_, StoredFeed>("SELECT id, url, added_at FROM feeds ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
    }

    /// Looks up a feed by id.
    pub async fn get_feed(&self, id: i64) -> Result<Option<StoredFeed>, DatabaseError> {
        sqlx::query_as::<_, StoredFeed>("SELECT id, url, added_at FROM feeds WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
    }

    /// Unregisters a feed.
    ///
    /// # Errors
    ///
    /// `DatabaseError::NotFound` if no feed has this id.
    pub async fn remove_feed(&self, id: i64) -> Result<(), DatabaseError> {
        let done = sqlx::query("DELETE FROM feeds WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        if done.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(id));
        }

        tracing::info!(id, "Feed removed");
        Ok(())
    }
}
