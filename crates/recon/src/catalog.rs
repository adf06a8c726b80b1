//! Catalog collaborator interface and an in-memory implementation.

use crate::error::CatalogError;
use crate::model::{CatalogProduct, NewProduct, PriceUpdate, ProductGroup, ProductId};
use crate::similarity::{case_key, clean_name};

/// Persistence operations the engine needs from the product catalog.
///
/// Each write is one atomic unit: `create_product` resolves or creates the
/// group and inserts the product together, `update_prices` is a single
/// update.
pub trait Catalog {
    fn find_by_id(&self, id: ProductId) -> Result<Option<CatalogProduct>, CatalogError>;

    /// Active products in ascending id order.
    fn find_all_active(&self) -> Result<Vec<CatalogProduct>, CatalogError>;

    /// Active product whose [`case_key`] equals that of `name`.
    fn find_by_name(&self, name: &str) -> Result<Option<CatalogProduct>, CatalogError>;

    fn find_group_by_name(&self, name: &str) -> Result<Option<ProductGroup>, CatalogError>;

    fn create_group(&mut self, name: &str) -> Result<ProductGroup, CatalogError>;

    fn create_product(&mut self, product: &NewProduct) -> Result<CatalogProduct, CatalogError>;

    fn update_prices(&mut self, id: ProductId, prices: PriceUpdate) -> Result<CatalogProduct, CatalogError>;
}

/// Vector-backed catalog for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    products: Vec<CatalogProduct>,
    groups: Vec<ProductGroup>,
    next_product_id: ProductId,
    next_group_id: i64,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a product with a fixed id (fixtures).
    pub fn insert(&mut self, product: CatalogProduct) {
        self.next_product_id = self.next_product_id.max(product.id);
        self.products.push(product);
        self.products.sort_by_key(|p| p.id);
    }

    /// Add an active product with the next free id.
    pub fn add(&mut self, name: &str, purchase_cents: i64, sale_cents: i64) -> CatalogProduct {
        self.next_product_id += 1;
        let product = CatalogProduct {
            id: self.next_product_id,
            name: name.to_string(),
            purchase_cents,
            sale_cents,
            group_id: None,
            active: true,
        };
        self.products.push(product.clone());
        product
    }

    pub fn deactivate(&mut self, id: ProductId) {
        if let Some(p) = self.products.iter_mut().find(|p| p.id == id) {
            p.active = false;
        }
    }

    pub fn products(&self) -> &[CatalogProduct] {
        &self.products
    }

    pub fn groups(&self) -> &[ProductGroup] {
        &self.groups
    }
}

impl Catalog for MemoryCatalog {
    fn find_by_id(&self, id: ProductId) -> Result<Option<CatalogProduct>, CatalogError> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    fn find_all_active(&self) -> Result<Vec<CatalogProduct>, CatalogError> {
        Ok(self.products.iter().filter(|p| p.active).cloned().collect())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<CatalogProduct>, CatalogError> {
        let key = case_key(name);
        Ok(self
            .products
            .iter()
            .find(|p| p.active && case_key(&p.name) == key)
            .cloned())
    }

    fn find_group_by_name(&self, name: &str) -> Result<Option<ProductGroup>, CatalogError> {
        let key = case_key(name);
        Ok(self.groups.iter().find(|g| case_key(&g.name) == key).cloned())
    }

    fn create_group(&mut self, name: &str) -> Result<ProductGroup, CatalogError> {
        self.next_group_id += 1;
        let group = ProductGroup { id: self.next_group_id, name: clean_name(name) };
        self.groups.push(group.clone());
        Ok(group)
    }

    fn create_product(&mut self, product: &NewProduct) -> Result<CatalogProduct, CatalogError> {
        let group_id = match product.group_name.as_deref() {
            Some(name) => Some(match self.find_group_by_name(name)? {
                Some(g) => g.id,
                None => self.create_group(name)?.id,
            }),
            None => None,
        };
        let mut created = self.add(&clean_name(&product.name), product.purchase_cents, product.sale_cents);
        created.group_id = group_id;
        if let Some(p) = self.products.iter_mut().find(|p| p.id == created.id) {
            p.group_id = group_id;
        }
        Ok(created)
    }

    fn update_prices(&mut self, id: ProductId, prices: PriceUpdate) -> Result<CatalogProduct, CatalogError> {
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(CatalogError::NotFound { id })?;
        if let Some(cents) = prices.purchase_cents {
            product.purchase_cents = cents;
        }
        if let Some(cents) = prices.sale_cents {
            product.sale_cents = cents;
        }
        Ok(product.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_reuses_group_case_insensitively() {
        let mut catalog = MemoryCatalog::new();
        let a = catalog
            .create_product(&NewProduct {
                name: "Çay".into(),
                purchase_cents: 100,
                sale_cents: 300,
                group_name: Some("Sıcak İçecek".into()),
            })
            .unwrap();
        let b = catalog
            .create_product(&NewProduct {
                name: "Salep".into(),
                purchase_cents: 200,
                sale_cents: 600,
                group_name: Some("SICAK İÇECEK".into()),
            })
            .unwrap();
        assert_eq!(a.group_id, b.group_id);
        assert_eq!(catalog.groups().len(), 1);
        assert_eq!(catalog.find_by_id(b.id).unwrap().unwrap().group_id, a.group_id);
    }

    #[test]
    fn update_overwrites_only_supplied_prices() {
        let mut catalog = MemoryCatalog::new();
        let p = catalog.add("Kahve", 1000, 1500);
        let updated = catalog
            .update_prices(p.id, PriceUpdate { purchase_cents: None, sale_cents: Some(1800) })
            .unwrap();
        assert_eq!(updated.purchase_cents, 1000);
        assert_eq!(updated.sale_cents, 1800);
    }

    #[test]
    fn update_unknown_id_fails() {
        let mut catalog = MemoryCatalog::new();
        assert_eq!(
            catalog.update_prices(42, PriceUpdate::default()),
            Err(CatalogError::NotFound { id: 42 })
        );
    }

    #[test]
    fn inactive_products_hidden_from_scans() {
        let mut catalog = MemoryCatalog::new();
        let p = catalog.add("Kahve", 1000, 1500);
        catalog.add("Çay", 100, 300);
        catalog.deactivate(p.id);
        let active = catalog.find_all_active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Çay");
        assert!(catalog.find_by_name("kahve").unwrap().is_none());
        assert!(catalog.find_by_id(p.id).unwrap().is_some());
    }
}
