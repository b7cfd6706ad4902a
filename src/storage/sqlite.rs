use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use tracing::debug;

use crate::model::{
    CatalogRecord, COMPETITOR_COLUMNS, Currency, FeatureRow, FeatureTable, MatchOutput, MatchResult,
    NormalizedProductRecord, RawProductRecord, StorageError,
};

pub struct SqliteStorage {
    conn: Connection,
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS catalog_products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        catalog_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        price REAL NOT NULL,
        currency TEXT NOT NULL,
        captured_at TEXT NOT NULL,
        profit REAL NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS match_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        catalog_id INTEGER NOT NULL,
        source_id TEXT NOT NULL,
        market_name TEXT NOT NULL,
        market_price REAL NOT NULL,
        score INTEGER NOT NULL,
        matched_at TEXT
    );

    CREATE TABLE IF NOT EXISTS feature_vendors (
        position INTEGER PRIMARY KEY,
        source_id TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS feature_table (
        catalog_id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        profit_sum REAL NOT NULL,
        mean_price REAL NOT NULL,
        competitor_price_1 REAL NOT NULL DEFAULT 0,
        competitor_price_2 REAL NOT NULL DEFAULT 0,
        competitor_price_3 REAL NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS preprocessed_products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source_id TEXT NOT NULL,
        name TEXT NOT NULL,
        price REAL NOT NULL,
        currency TEXT NOT NULL,
        captured_at TEXT NOT NULL,
        url TEXT NOT NULL DEFAULT '',
        normalized_name TEXT NOT NULL,
        brand TEXT,
        quantity REAL,
        unit TEXT,
        product_type TEXT NOT NULL DEFAULT ''
    );

    CREATE INDEX IF NOT EXISTS idx_catalog_products_catalog_id ON catalog_products(catalog_id);
    CREATE INDEX IF NOT EXISTS idx_preprocessed_source ON preprocessed_products(source_id);
";

fn timestamp_column(row: &Row, index: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(index)?;
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

fn currency_column(row: &Row, index: usize) -> Result<Currency, rusqlite::Error> {
    let raw: String = row.get(index)?;
    raw.parse::<Currency>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

impl SqliteStorage {
    /// Opens the database and brings the schema up to date.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA)?;

        // Stores created before these columns were part of the schema.
        Self::migrate_add_column_if_missing(&conn, "catalog_products", "profit", "REAL NOT NULL DEFAULT 0")?;
        Self::migrate_add_column_if_missing(&conn, "match_results", "matched_at", "TEXT")?;
        Self::migrate_add_column_if_missing(&conn, "preprocessed_products", "product_type", "TEXT NOT NULL DEFAULT ''")?;
        Self::migrate_add_column_if_missing(&conn, "preprocessed_products", "url", "TEXT NOT NULL DEFAULT ''")?;

        Ok(Self { conn })
    }

    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        if !existing_columns.iter().any(|c| c == column) {
            debug!("Migrating {}: adding column {}", table, column);
            let alter_sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def);
            conn.execute(&alter_sql, [])?;
        }

        Ok(())
    }

    pub fn count_catalog_records(&self) -> Result<usize, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM catalog_products", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Appends catalog rows in one transaction.
    pub fn save_catalog_records(&self, records: &[CatalogRecord]) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO catalog_products (catalog_id, name, price, currency, captured_at, profit)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.catalog_id,
                    &record.product.name,
                    record.product.price,
                    record.product.currency.as_str(),
                    record.product.captured_at.to_rfc3339(),
                    record.profit,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Catalog rows in insertion order.
    pub fn get_catalog_records(&self) -> Result<Vec<CatalogRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT catalog_id, name, price, currency, captured_at, profit
             FROM catalog_products ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CatalogRecord {
                catalog_id: row.get(0)?,
                product: RawProductRecord {
                    name: row.get(1)?,
                    price: row.get(2)?,
                    currency: currency_column(row, 3)?,
                    source_id: crate::source::seed::CATALOG_SOURCE_ID.to_string(),
                    url: String::new(),
                    captured_at: timestamp_column(row, 4)?,
                },
                profit: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Replaces the previous run's matches atomically.
    pub fn replace_match_results(&self, matches: &[MatchResult]) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        write_match_results(&tx, matches)?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_match_results(&self) -> Result<Vec<MatchResult>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT catalog_id, source_id, market_name, market_price, score
             FROM match_results ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(MatchResult {
                catalog_id: row.get(0)?,
                source_id: row.get(1)?,
                market_name: row.get(2)?,
                market_price: row.get(3)?,
                score: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Replaces the feature table and its vendor columns atomically.
    pub fn replace_feature_table(&self, table: &FeatureTable) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        write_feature_table(&tx, table)?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_feature_table(&self) -> Result<FeatureTable, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT source_id FROM feature_vendors ORDER BY position ASC")?;
        let vendors: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT catalog_id, name, profit_sum, mean_price,
                    competitor_price_1, competitor_price_2, competitor_price_3
             FROM feature_table ORDER BY catalog_id ASC",
        )?;
        let rows: Vec<FeatureRow> = stmt
            .query_map([], |row| {
                let mut competitor_prices = [0.0; COMPETITOR_COLUMNS];
                for (i, price) in competitor_prices.iter_mut().enumerate() {
                    *price = row.get(4 + i)?;
                }
                Ok(FeatureRow {
                    catalog_id: row.get(0)?,
                    name: row.get(1)?,
                    profit_sum: row.get(2)?,
                    mean_price: row.get(3)?,
                    competitor_prices,
                })
            })?
            .collect::<Result<_, _>>()?;

        Ok(FeatureTable { vendors, rows })
    }

    /// Appends enriched market records.
    pub fn save_preprocessed_batch(&self, records: &[NormalizedProductRecord]) -> Result<usize, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        write_preprocessed(&tx, records)?;
        tx.commit()?;
        Ok(records.len())
    }

    /// Stores one successful run in a single transaction: the enriched records
    /// replace earlier rows of the same sources, and the matches and feature
    /// table replace the previous run's. Nothing is kept if any write fails.
    pub fn persist_run(
        &self,
        records: &[NormalizedProductRecord],
        output: &MatchOutput,
    ) -> Result<usize, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut delete = tx.prepare("DELETE FROM preprocessed_products WHERE source_id = ?1")?;
            let mut sources: Vec<&str> = records.iter().map(|n| n.record.source_id.as_str()).collect();
            sources.sort_unstable();
            sources.dedup();
            for source_id in sources {
                delete.execute(params![source_id])?;
            }
        }
        write_preprocessed(&tx, records)?;
        write_match_results(&tx, &output.matches)?;
        write_feature_table(&tx, &output.features)?;
        tx.commit()?;
        Ok(records.len())
    }

    pub fn count_preprocessed(&self, source_id: &str) -> Result<usize, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM preprocessed_products WHERE source_id = ?1",
            params![source_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn write_match_results(conn: &Connection, matches: &[MatchResult]) -> Result<(), StorageError> {
    let matched_at = Utc::now().to_rfc3339();
    conn.execute("DELETE FROM match_results", [])?;
    let mut stmt = conn.prepare(
        "INSERT INTO match_results (catalog_id, source_id, market_name, market_price, score, matched_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for m in matches {
        stmt.execute(params![
            m.catalog_id,
            &m.source_id,
            &m.market_name,
            m.market_price,
            m.score,
            &matched_at,
        ])?;
    }
    Ok(())
}

fn write_feature_table(conn: &Connection, table: &FeatureTable) -> Result<(), StorageError> {
    conn.execute("DELETE FROM feature_table", [])?;
    conn.execute("DELETE FROM feature_vendors", [])?;

    let mut vendors = conn.prepare("INSERT INTO feature_vendors (position, source_id) VALUES (?1, ?2)")?;
    for (position, vendor) in table.vendors.iter().enumerate() {
        vendors.execute(params![position as i64, vendor])?;
    }

    let mut rows = conn.prepare(
        "INSERT INTO feature_table (
            catalog_id, name, profit_sum, mean_price,
            competitor_price_1, competitor_price_2, competitor_price_3
         )
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for row in &table.rows {
        let [c1, c2, c3] = row.competitor_prices;
        rows.execute(params![
            row.catalog_id,
            &row.name,
            row.profit_sum,
            row.mean_price,
            c1,
            c2,
            c3,
        ])?;
    }
    Ok(())
}

fn write_preprocessed(conn: &Connection, records: &[NormalizedProductRecord]) -> Result<(), StorageError> {
    let mut stmt = conn.prepare(
        "INSERT INTO preprocessed_products (
            source_id, name, price, currency, captured_at, url,
            normalized_name, brand, quantity, unit, product_type
         )
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )?;
    for n in records {
        let r = &n.record;
        stmt.execute(params![
            &r.source_id,
            &r.name,
            r.price,
            r.currency.as_str(),
            r.captured_at.to_rfc3339(),
            &r.url,
            &n.normalized_name,
            &n.brand,
            n.quantity(),
            n.unit().map(|u| u.as_str()),
            &n.product_type,
        ])?;
    }
    Ok(())
}
