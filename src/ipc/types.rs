use std::path::PathBuf;

use crate::quran::QuranIndex;
use crate::surah_names::NameResolver;
use rusqlite::Connection;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub quran: QuranIndex,
    pub names: NameResolver,
}

impl AppState {
    pub fn new(quran: QuranIndex) -> Self {
        let names = NameResolver::new(&quran);
        Self {
            workspace: None,
            db: None,
            quran,
            names,
        }
    }
}
