use crate::db::CatalogDb;

#[derive(Clone)]
pub struct AppState {
    pub db: CatalogDb,
}
