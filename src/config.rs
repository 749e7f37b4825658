use crate::undo::DEFAULT_UNDO_WINDOW_SECS;
use std::{env, net::SocketAddr, path::PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub undo_window_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: parsed_var("PORT").unwrap_or(8080),
            data_dir: env::var("APP_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            undo_window_secs: parsed_var("UNDO_WINDOW_SECS").unwrap_or(DEFAULT_UNDO_WINDOW_SECS),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse().ok())
}
