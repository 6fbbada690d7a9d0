use crate::catalog::{CatalogCmd, CatalogHandle};

/// Queue the fetches the first frames depend on. Results arrive through the
/// catalog event channel once the worker gets to them.
pub fn request_initial_data(catalog: &CatalogHandle) {
    catalog.send(CatalogCmd::RefreshHome);
    catalog.send(CatalogCmd::RefreshAccount);
}
