//! Name alias tables used by the matchers
//!
//! The default registry knows common English and Portuguese names for ERP
//! entities. Matchers borrow a registry, so callers can extend or replace it
//! without touching global state.

use std::collections::{BTreeMap, BTreeSet, HashMap};

const TABLE_ALIASES: &[(&str, &str)] = &[
    ("customer", "Customer"),
    ("customers", "Customer"),
    ("client", "Customer"),
    ("clients", "Customer"),
    ("cliente", "Customer"),
    ("clientes", "Customer"),
    ("user", "User"),
    ("users", "User"),
    ("usuario", "User"),
    ("usuarios", "User"),
    ("product", "Product"),
    ("products", "Product"),
    ("produto", "Product"),
    ("produtos", "Product"),
    ("order", "Order"),
    ("orders", "Order"),
    ("pedido", "Order"),
    ("pedidos", "Order"),
    ("invoice", "Invoice"),
    ("invoices", "Invoice"),
    ("nota", "Invoice"),
    ("notas", "Invoice"),
    ("payment", "Payment"),
    ("payments", "Payment"),
    ("pagamento", "Payment"),
    ("pagamentos", "Payment"),
];

const COLUMN_ALIASES: &[(&str, &str)] = &[
    ("id", "id"),
    ("uuid", "id"),
    ("guid", "id"),
    ("codigo", "id"),
    ("name", "name"),
    ("full_name", "name"),
    ("nome", "name"),
    ("email", "email"),
    ("phone", "phone"),
    ("telephone", "phone"),
    ("telefone", "phone"),
    ("created_at", "createdAt"),
    ("created_date", "createdAt"),
    ("updated_at", "updatedAt"),
    ("modified_at", "updatedAt"),
    ("deleted_at", "deletedAt"),
];

const ENDPOINT_ALIASES: &[(&str, &str)] = &[
    ("customers", "/v1/customers"),
    ("customer", "/v1/customers"),
    ("client", "/v1/customers"),
    ("clients", "/v1/customers"),
    ("pessoa", "/v1/customers"),
    ("pessoas", "/v1/customers"),
    ("contato", "/v1/customers"),
    ("contatos", "/v1/customers"),
    ("products", "/v1/products"),
    ("product", "/v1/products"),
    ("item", "/v1/products"),
    ("items", "/v1/products"),
    ("produto", "/v1/products"),
    ("produtos", "/v1/products"),
    ("sku", "/v1/products"),
    ("orders", "/v1/orders"),
    ("order", "/v1/orders"),
    ("pedido", "/v1/orders"),
    ("pedidos", "/v1/orders"),
    ("venda", "/v1/orders"),
    ("vendas", "/v1/orders"),
    ("invoices", "/v1/invoices"),
    ("invoice", "/v1/invoices"),
    ("nota", "/v1/invoices"),
    ("notas", "/v1/invoices"),
    ("nfe", "/v1/invoices"),
    ("fiscal", "/v1/invoices"),
    ("payments", "/v1/payments"),
    ("payment", "/v1/payments"),
    ("pagamento", "/v1/payments"),
    ("pagamentos", "/v1/payments"),
    ("recebimento", "/v1/payments"),
    ("recebimentos", "/v1/payments"),
    ("suppliers", "/v1/suppliers"),
    ("supplier", "/v1/suppliers"),
    ("fornecedor", "/v1/suppliers"),
    ("fornecedores", "/v1/suppliers"),
    ("inventory", "/v1/inventory"),
    ("stock", "/v1/inventory"),
    ("estoque", "/v1/inventory"),
    ("estoques", "/v1/inventory"),
    ("categories", "/v1/categories"),
    ("category", "/v1/categories"),
    ("categoria", "/v1/categories"),
    ("categorias", "/v1/categories"),
];

fn lower_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(alias, target)| (alias.to_lowercase(), target.to_string()))
        .collect()
}

/// Alias lookup tables for tables, columns and REST endpoints
///
/// Keys are matched case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasRegistry {
    tables: HashMap<String, String>,
    columns: HashMap<String, String>,
    endpoints: BTreeMap<String, String>,
}

impl Default for AliasRegistry {
    fn default() -> Self {
        Self {
            tables: lower_map(TABLE_ALIASES),
            columns: lower_map(COLUMN_ALIASES),
            endpoints: lower_map(ENDPOINT_ALIASES).into_iter().collect(),
        }
    }
}

impl AliasRegistry {
    /// Registry with the built-in aliases
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with no aliases
    pub fn empty() -> Self {
        Self {
            tables: HashMap::new(),
            columns: HashMap::new(),
            endpoints: BTreeMap::new(),
        }
    }

    pub fn with_table_alias(mut self, alias: &str, target: impl Into<String>) -> Self {
        self.tables.insert(alias.to_lowercase(), target.into());
        self
    }

    pub fn with_column_alias(mut self, alias: &str, target: impl Into<String>) -> Self {
        self.columns.insert(alias.to_lowercase(), target.into());
        self
    }

    pub fn with_endpoint(mut self, alias: &str, path: impl Into<String>) -> Self {
        self.endpoints.insert(alias.to_lowercase(), path.into());
        self
    }

    /// Destination table name for a source table alias
    pub fn table_alias(&self, name: &str) -> Option<&str> {
        self.tables.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Destination column name for a source column alias
    pub fn column_alias(&self, name: &str) -> Option<&str> {
        self.columns.get(&name.to_lowercase()).map(String::as_str)
    }

    /// REST path registered for a table name
    pub fn endpoint(&self, name: &str) -> Option<&str> {
        self.endpoints.get(&name.to_lowercase()).map(String::as_str)
    }

    /// `(alias, path)` pairs in alias order
    pub fn endpoint_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.endpoints
            .iter()
            .map(|(alias, path)| (alias.as_str(), path.as_str()))
    }

    /// Distinct registered REST paths, sorted
    pub fn endpoint_paths(&self) -> Vec<&str> {
        self.endpoints
            .values()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_aliases_are_bilingual() {
        let aliases = AliasRegistry::new();
        assert_eq!(aliases.table_alias("Pedido"), Some("Order"));
        assert_eq!(aliases.table_alias("cliente"), Some("Customer"));
        assert_eq!(aliases.column_alias("Telefone"), Some("phone"));
        assert_eq!(aliases.endpoint("ESTOQUE"), Some("/v1/inventory"));
    }

    #[test]
    fn test_custom_registry() {
        let aliases = AliasRegistry::empty()
            .with_table_alias("Artigos", "Product")
            .with_endpoint("artigos", "/v2/articles");
        assert_eq!(aliases.table_alias("artigos"), Some("Product"));
        assert_eq!(aliases.table_alias("produto"), None);
        assert_eq!(aliases.endpoint_paths(), vec!["/v2/articles"]);
    }

    #[test]
    fn test_endpoint_paths_unique_sorted() {
        let aliases = AliasRegistry::new();
        let paths = aliases.endpoint_paths();
        assert_eq!(paths.len(), 8);
        assert_eq!(paths[0], "/v1/categories");
        assert!(paths.windows(2).all(|w| w[0] < w[1]));
    }
}
