use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::app::tmdb::{DEFAULT_BASE_URL, DEFAULT_IMAGE_BASE_URL};

pub const API_KEY_VAR: &str = "TMDB_API_KEY";
pub const BASE_URL_VAR: &str = "TMDB_BASE_URL";
pub const IMAGE_BASE_URL_VAR: &str = "TMDB_IMAGE_BASE_URL";

/// One row on the browse screen. The first endpoint is used at startup;
/// the rest are alternates the row can cycle through.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RowConfig {
    pub title: String,
    pub endpoints: Vec<String>,
    #[serde(default)]
    pub large: bool,
}

impl RowConfig {
    fn new(title: &str, endpoints: &[&str], large: bool) -> Self {
        Self {
            title: title.to_string(),
            endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
            large,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub image_base_url: String,
    pub rows: Vec<RowConfig>,
}

pub fn default_rows() -> Vec<RowConfig> {
    vec![
        RowConfig::new("Originals", &["/discover/tv?with_networks=213"], true),
        RowConfig::new(
            "Trending Now",
            &["/trending/all/week?language=en-US", "/trending/all/day?language=en-US"],
            false,
        ),
        RowConfig::new("Top Rated", &["/movie/top_rated?language=en-US"], false),
        RowConfig::new("Action Movies", &["/discover/movie?with_genres=28"], false),
        RowConfig::new("Comedy Movies", &["/discover/movie?with_genres=35"], false),
        RowConfig::new("Horror Movies", &["/discover/movie?with_genres=27"], false),
        RowConfig::new("Romance Movies", &["/discover/movie?with_genres=10749"], false),
        RowConfig::new("Documentaries", &["/discover/movie?with_genres=99"], false),
    ]
}

pub fn rows_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("movie_rows").join("rows.json"))
}

/// Reads row definitions from a JSON file. Rows without an endpoint are
/// skipped since there is nothing to fetch for them.
pub fn load_rows(path: &Path) -> Result<Vec<RowConfig>, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let rows: Vec<RowConfig> = serde_json::from_str(&contents)?;
    let rows: Vec<RowConfig> = rows.into_iter().filter(|row| !row.endpoints.is_empty()).collect();
    if rows.is_empty() {
        return Err(format!("no usable rows in {}", path.display()).into());
    }
    Ok(rows)
}

/// Current value of the API key variable. Blank values count as unset.
pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_VAR).ok().filter(|key| !key.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        let api_key = api_key_from_env();
        let base_url = std::env::var(BASE_URL_VAR).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let image_base_url =
            std::env::var(IMAGE_BASE_URL_VAR).unwrap_or_else(|_| DEFAULT_IMAGE_BASE_URL.to_string());

        let rows = match rows_file_path() {
            Some(path) if path.exists() => match load_rows(&path) {
                Ok(rows) => {
                    tracing::info!(path = %path.display(), count = rows.len(), "loaded row config");
                    rows
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring row config");
                    default_rows()
                }
            },
            _ => default_rows(),
        };

        if api_key.is_none() {
            tracing::warn!("{} is not set; catalog requests are disabled", API_KEY_VAR);
        }

        Self {
            api_key,
            base_url,
            image_base_url,
            rows,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            rows: default_rows(),
        }
    }
}
