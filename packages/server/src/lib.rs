#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crash map application.
//!
//! Serves the JSON API the map frontend reads: filtered crashes as
//! `GeoJSON`, dataset statistics, and grid and neighbor hotspots with
//! their breakdowns. Sources are loaded in the background after the
//! server binds; until that finishes every data endpoint answers with an
//! empty result and `/api/health` reports `ready: false`.

mod handlers;

use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use crash_map_server_models::ApiReload;
use crash_map_source::{SourceDefinition, SourceError};
use crash_map_store::CrashStore;
use tokio::sync::RwLock;

/// Environment variable naming the directory local source files live in.
pub const DATA_DIR_ENV: &str = "CRASH_MAP_DATA_DIR";

/// Data directory used when [`DATA_DIR_ENV`] is unset.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Shared application state.
pub struct AppState {
    /// Loaded crash records. Replaced wholesale on reload.
    pub store: RwLock<CrashStore>,
    /// Sources loaded on start-up and on every reload.
    pub sources: Vec<SourceDefinition>,
    /// Base directory for file sources.
    pub data_dir: PathBuf,
}

impl AppState {
    /// State with an empty, unready store.
    #[must_use]
    pub fn new(sources: Vec<SourceDefinition>, data_dir: PathBuf) -> Self {
        Self {
            store: RwLock::new(CrashStore::new()),
            sources,
            data_dir,
        }
    }

    /// Loads every source and swaps the result into the store.
    ///
    /// Sources are read without holding the lock, so queries keep being
    /// served from the previous data until the swap.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if any source fails to load. The store is
    /// left as it was.
    pub async fn reload(&self) -> Result<ApiReload, SourceError> {
        let records = crash_map_source::load_all(&self.sources, &self.data_dir).await?;

        let mut store = self.store.write().await;
        store.replace(records);

        Ok(ApiReload {
            records: store.len(),
            years: store.years().to_vec(),
        })
    }
}

/// Starts the crash map API server.
///
/// Reads `BIND_ADDR`, `PORT` and [`DATA_DIR_ENV`] from the environment,
/// kicks off the initial load in the background, and starts the
/// Actix-Web HTTP server. The caller is responsible for providing the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let data_dir = std::env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
    let sources = crash_map_source::registry::all_sources();
    log::info!("Serving {} sources from {data_dir}", sources.len());

    let state = web::Data::new(AppState::new(sources, PathBuf::from(data_dir)));

    let loader = state.clone();
    actix_rt::spawn(async move {
        log::info!("Loading crash sources...");
        match loader.reload().await {
            Ok(loaded) => log::info!("Loaded {} crash records", loaded.records),
            Err(e) => log::error!("Failed to load crash sources: {e}"),
        }
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/years", web::get().to(handlers::years))
                    .route("/crashes", web::get().to(handlers::crashes))
                    .route("/stats", web::get().to(handlers::stats))
                    .route("/hotspots/grid", web::get().to(handlers::grid_hotspots))
                    .route(
                        "/hotspots/overview",
                        web::get().to(handlers::overview_hotspots),
                    )
                    .route(
                        "/hotspots/overview/geojson",
                        web::get().to(handlers::overview_outlines),
                    )
                    .route("/reload", web::post().to(handlers::reload)),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crash_map_crash_models::CrashKind;
    use crash_map_source::{FieldMapping, SourceLocation};

    use super::*;

    const HEADER: &str = "Crash ID,Latitude,Longitude,Crash Severity,Crash Date,Crash Year,Crash Month,Street Name\n";

    fn source(id: &str, file: &str) -> SourceDefinition {
        SourceDefinition {
            id: id.to_string(),
            name: id.to_string(),
            kind: CrashKind::Pedestrian,
            header_token: None,
            delimiter: None,
            location: SourceLocation::File {
                path: PathBuf::from(file),
            },
            fields: FieldMapping::default(),
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "crash_map_server_{name}_{}",
            std::process::id()
        ))
    }

    async fn write(dir: &Path, name: &str, contents: &str) {
        tokio::fs::create_dir_all(dir).await.unwrap();
        tokio::fs::write(dir.join(name), contents).await.unwrap();
    }

    #[tokio::test]
    async fn reload_swaps_in_fresh_records() {
        let dir = temp_dir("reload_ok");
        write(
            &dir,
            "ped.csv",
            &format!(
                "{HEADER}1,29.76,-95.37,K - FATAL INJURY,1/2/21,2021,1,MAIN ST 35\n\
                 2,29.77,-95.36,C - POSSIBLE INJURY,3/4/22,2022,3,ELM ST\n"
            ),
        )
        .await;

        let state = AppState::new(vec![source("ped", "ped.csv")], dir);
        assert!(!state.store.read().await.is_ready());

        let loaded = state.reload().await.unwrap();
        assert_eq!(loaded.records, 2);
        assert_eq!(loaded.years, vec![2021, 2022]);
        assert!(state.store.read().await.is_ready());
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_records() {
        let dir = temp_dir("reload_failure");
        write(
            &dir,
            "ped.csv",
            &format!("{HEADER}1,29.76,-95.37,K - FATAL INJURY,1/2/21,2021,1,MAIN ST 35\n"),
        )
        .await;

        let mut state = AppState::new(vec![source("ped", "ped.csv")], dir);
        state.reload().await.unwrap();

        state.sources.push(source("missing", "does_not_exist.csv"));
        assert!(state.reload().await.is_err());

        let store = state.store.read().await;
        assert!(store.is_ready());
        assert_eq!(store.len(), 1);
    }
}
