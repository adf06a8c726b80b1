// Product catalog persisted in SQLite

pub mod error;

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use resortdesk_recon::similarity::{case_key, clean_name};
use resortdesk_recon::{Catalog, CatalogError, CatalogProduct, NewProduct, PriceUpdate, ProductGroup, ProductId};

pub use error::StoreError;

/// Bump when the schema changes in a way older builds can't read.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS product_groups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    name_key TEXT NOT NULL UNIQUE,   -- case_key(name)
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    name_key TEXT NOT NULL,          -- case_key(name)
    purchase_cents INTEGER NOT NULL DEFAULT 0,
    sale_cents INTEGER NOT NULL DEFAULT 0,
    group_id INTEGER REFERENCES product_groups(id),
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_products_name_key ON products (name_key);
"#;

const PRODUCT_COLUMNS: &str = "id, name, purchase_cents, sale_cents, group_id, active";

/// Product row as listed to operators, with group name and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProduct {
    #[serde(flatten)]
    pub product: CatalogProduct,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    /// Open (creating if needed) the catalog database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        let found: Option<String> = conn
            .query_row("SELECT value FROM meta WHERE key = 'schema_version'", [], |r| r.get(0))
            .optional()?;
        match found.and_then(|v| v.parse::<u32>().ok()) {
            Some(found) if found > SCHEMA_VERSION => {
                return Err(StoreError::SchemaTooNew { found, supported: SCHEMA_VERSION });
            }
            Some(_) => {}
            None => {
                conn.execute(
                    "INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', ?1)",
                    params![SCHEMA_VERSION.to_string()],
                )?;
            }
        }

        Ok(Self { conn })
    }

    /// All products in id order, optionally including deactivated ones.
    pub fn list_products(&self, include_inactive: bool) -> Result<Vec<StoredProduct>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name, p.purchase_cents, p.sale_cents, p.group_id, p.active, \
                    g.name, p.created_at, p.updated_at \
             FROM products p LEFT JOIN product_groups g ON g.id = p.group_id \
             WHERE ?1 OR p.active = 1 \
             ORDER BY p.id",
        )?;
        let rows = stmt.query_map(params![include_inactive], |r| {
            Ok(StoredProduct {
                product: product_from_row(r)?,
                group_name: r.get(6)?,
                created_at: r.get(7)?,
                updated_at: r.get(8)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn set_active(&self, id: ProductId, active: bool) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE products SET active = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, active, now()],
        )?;
        Ok(changed > 0)
    }

    fn query_product(&self, where_clause: &str, param: &dyn rusqlite::ToSql) -> Result<Option<CatalogProduct>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE {where_clause} ORDER BY id LIMIT 1");
        Ok(self.conn.query_row(&sql, params![param], product_from_row).optional()?)
    }

    fn active_products(&self) -> Result<Vec<CatalogProduct>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE active = 1 ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], product_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn group_by_key(conn: &Connection, key: &str) -> Result<Option<ProductGroup>, StoreError> {
        Ok(conn
            .query_row(
                "SELECT id, name FROM product_groups WHERE name_key = ?1",
                params![key],
                |r| Ok(ProductGroup { id: r.get(0)?, name: r.get(1)? }),
            )
            .optional()?)
    }

    fn insert_group(conn: &Connection, name: &str) -> Result<ProductGroup, StoreError> {
        let name = clean_name(name);
        conn.execute(
            "INSERT INTO product_groups (name, name_key, created_at) VALUES (?1, ?2, ?3)",
            params![name, case_key(&name), now()],
        )?;
        Ok(ProductGroup { id: conn.last_insert_rowid(), name })
    }

    fn insert_product(&mut self, product: &NewProduct) -> Result<CatalogProduct, StoreError> {
        let tx = self.conn.transaction()?;

        let group_id = match product.group_name.as_deref() {
            Some(group) => Some(match Self::group_by_key(&tx, &case_key(group))? {
                Some(existing) => existing.id,
                None => Self::insert_group(&tx, group)?.id,
            }),
            None => None,
        };

        let name = clean_name(&product.name);
        let stamp = now();
        tx.execute(
            "INSERT INTO products (name, name_key, purchase_cents, sale_cents, group_id, active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)",
            params![name, case_key(&name), product.purchase_cents, product.sale_cents, group_id, stamp],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(id, name = %name, ?group_id, "product created");
        Ok(CatalogProduct {
            id,
            name,
            purchase_cents: product.purchase_cents,
            sale_cents: product.sale_cents,
            group_id,
            active: true,
        })
    }

    fn write_prices(&self, id: ProductId, prices: PriceUpdate) -> Result<Option<CatalogProduct>, StoreError> {
        let changed = self.conn.execute(
            "UPDATE products SET purchase_cents = COALESCE(?2, purchase_cents), \
                                 sale_cents = COALESCE(?3, sale_cents), \
                                 updated_at = ?4 \
             WHERE id = ?1",
            params![id, prices.purchase_cents, prices.sale_cents, now()],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.query_product("id = ?1", &id)
    }
}

impl Catalog for SqliteCatalog {
    fn find_by_id(&self, id: ProductId) -> Result<Option<CatalogProduct>, CatalogError> {
        Ok(self.query_product("id = ?1", &id)?)
    }

    fn find_all_active(&self) -> Result<Vec<CatalogProduct>, CatalogError> {
        Ok(self.active_products()?)
    }

    fn find_by_name(&self, name: &str) -> Result<Option<CatalogProduct>, CatalogError> {
        Ok(self.query_product("active = 1 AND name_key = ?1", &case_key(name))?)
    }

    fn find_group_by_name(&self, name: &str) -> Result<Option<ProductGroup>, CatalogError> {
        Ok(Self::group_by_key(&self.conn, &case_key(name))?)
    }

    fn create_group(&mut self, name: &str) -> Result<ProductGroup, CatalogError> {
        Ok(Self::insert_group(&self.conn, name)?)
    }

    fn create_product(&mut self, product: &NewProduct) -> Result<CatalogProduct, CatalogError> {
        Ok(self.insert_product(product)?)
    }

    fn update_prices(&mut self, id: ProductId, prices: PriceUpdate) -> Result<CatalogProduct, CatalogError> {
        self.write_prices(id, prices)?.ok_or(CatalogError::NotFound { id })
    }
}

fn product_from_row(r: &Row<'_>) -> rusqlite::Result<CatalogProduct> {
    Ok(CatalogProduct {
        id: r.get(0)?,
        name: r.get(1)?,
        purchase_cents: r.get(2)?,
        sale_cents: r.get(3)?,
        group_id: r.get(4)?,
        active: r.get(5)?,
    })
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product(name: &str, purchase: i64, sale: i64, group: Option<&str>) -> NewProduct {
        NewProduct {
            name: name.into(),
            purchase_cents: purchase,
            sale_cents: sale,
            group_name: group.map(String::from),
        }
    }

    #[test]
    fn create_and_find() {
        let mut catalog = SqliteCatalog::open_in_memory().unwrap();
        let p = catalog.create_product(&new_product("  Türk   Kahvesi ", 1000, 2000, None)).unwrap();
        assert_eq!(p.name, "Türk Kahvesi");
        assert_eq!(catalog.find_by_id(p.id).unwrap(), Some(p.clone()));
        assert_eq!(catalog.find_by_name("TÜRK KAHVESİ").unwrap().map(|f| f.id), Some(p.id));
        assert!(catalog.find_by_name("Turk Kahvesi").unwrap().is_none());
    }

    #[test]
    fn groups_shared_by_case_key() {
        let mut catalog = SqliteCatalog::open_in_memory().unwrap();
        let a = catalog.create_product(&new_product("Çay", 100, 300, Some("Sıcak İçecek"))).unwrap();
        let b = catalog.create_product(&new_product("Salep", 200, 600, Some("SICAK İÇECEK"))).unwrap();
        assert!(a.group_id.is_some());
        assert_eq!(a.group_id, b.group_id);
        let group = catalog.find_group_by_name("sıcak içecek").unwrap().unwrap();
        assert_eq!(group.name, "Sıcak İçecek");
    }

    #[test]
    fn update_touches_only_supplied_prices() {
        let mut catalog = SqliteCatalog::open_in_memory().unwrap();
        let p = catalog.create_product(&new_product("Kahve", 1000, 1500, None)).unwrap();
        let updated = catalog
            .update_prices(p.id, PriceUpdate { purchase_cents: None, sale_cents: Some(1800) })
            .unwrap();
        assert_eq!((updated.purchase_cents, updated.sale_cents), (1000, 1800));
    }

    #[test]
    fn update_missing_product() {
        let mut catalog = SqliteCatalog::open_in_memory().unwrap();
        assert_eq!(
            catalog.update_prices(77, PriceUpdate::default()),
            Err(CatalogError::NotFound { id: 77 })
        );
    }

    #[test]
    fn inactive_excluded_from_scans() {
        let mut catalog = SqliteCatalog::open_in_memory().unwrap();
        let kahve = catalog.create_product(&new_product("Kahve", 1000, 1500, None)).unwrap();
        catalog.create_product(&new_product("Çay", 100, 300, None)).unwrap();
        assert!(catalog.set_active(kahve.id, false).unwrap());

        let active = catalog.find_all_active().unwrap();
        assert_eq!(active.len(), 1);
        assert!(catalog.find_by_name("kahve").unwrap().is_none());
        assert_eq!(catalog.list_products(false).unwrap().len(), 1);
        assert_eq!(catalog.list_products(true).unwrap().len(), 2);
    }

    #[test]
    fn listing_carries_group_and_timestamps() {
        let mut catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog.create_product(&new_product("Ayran", 200, 400, Some("Soğuk"))).unwrap();
        let listed = catalog.list_products(false).unwrap();
        assert_eq!(listed[0].group_name.as_deref(), Some("Soğuk"));
        assert!(!listed[0].created_at.is_empty());

        let json = serde_json::to_value(&listed[0]).unwrap();
        assert_eq!(json["name"], "Ayran");
        assert_eq!(json["saleCents"], 400);
        assert_eq!(json["groupName"], "Soğuk");
    }

    #[test]
    fn reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("catalog.db");
        {
            let mut catalog = SqliteCatalog::open(&path).unwrap();
            catalog.create_product(&new_product("Kahve", 1000, 1500, None)).unwrap();
        }
        let catalog = SqliteCatalog::open(&path).unwrap();
        assert_eq!(catalog.find_all_active().unwrap().len(), 1);
    }

    #[test]
    fn newer_schema_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(SCHEMA).unwrap();
            conn.execute("INSERT INTO meta (key, value) VALUES ('schema_version', '99')", []).unwrap();
        }
        assert!(matches!(
            SqliteCatalog::open(&path),
            Err(StoreError::SchemaTooNew { found: 99, .. })
        ));
    }
}
