pub mod app;
pub mod config;
pub mod done_set;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod reconcile;
pub mod remote;
pub mod render;
pub mod state;
pub mod static_files;
pub mod storage;
pub mod summary;
pub mod tracker;
pub mod transfer;
pub mod ui;
pub mod window;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::FileStore;
