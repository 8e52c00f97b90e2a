use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/original";

#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("request to {url} failed with status: {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("no TMDB API key configured")]
    MissingApiKey,
}

/// A single title as returned in a TMDB `results` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogItem {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
}

impl CatalogItem {
    /// Image path fragment for the row variant: posters for large rows,
    /// backdrops otherwise.
    pub fn image_fragment(&self, is_large_row: bool) -> Option<&str> {
        if is_large_row {
            self.poster_path.as_deref()
        } else {
            self.backdrop_path.as_deref()
        }
    }

    /// Label shown on the card. TV entries carry `name`, movies carry `title`.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.title.as_deref())
            .or(self.original_name.as_deref())
            .unwrap_or("Untitled")
    }
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

#[derive(Debug, Deserialize)]
struct ResultsPage<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Video {
    key: String,
}

/// Blocking TMDB client. Cheap to clone, so each worker thread gets its own copy.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
}

impl TmdbClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Joins `path` onto the base URL and appends the configured `api_key` parameter.
    pub fn url_for(&self, path: &str) -> Result<String, TmdbError> {
        let api_key = self.api_key.as_deref().ok_or(TmdbError::MissingApiKey)?;
        Ok(self.url_with_key(path, api_key))
    }

    fn url_with_key(&self, path: &str, api_key: &str) -> String {
        let separator = if path.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}api_key={}",
            self.base_url,
            path,
            separator,
            urlencoding::encode(api_key)
        )
    }

    /// Fetches the `results` list behind a catalog endpoint such as `/trending/all/week`.
    pub fn fetch_catalog(&self, endpoint: &str) -> Result<Vec<CatalogItem>, TmdbError> {
        let url = self.url_for(endpoint)?;
        let page: ResultsPage<CatalogItem> = self.get_json(&url)?;
        Ok(page.results)
    }

    /// Returns the key of the first video listed for a movie, if there is one.
    /// The API key is passed in because it is looked up again on every click.
    pub fn fetch_trailer_key(
        &self,
        movie_id: &str,
        api_key: &str,
    ) -> Result<Option<String>, TmdbError> {
        let url = self.url_with_key(&videos_path(movie_id), api_key);
        let page: ResultsPage<Video> = self.get_json(&url)?;
        Ok(page.results.into_iter().next().map(|video| video.key))
    }

    /// Downloads and decodes a poster image
    pub fn download_poster(&self, poster_url: &str) -> Result<image::DynamicImage, TmdbError> {
        let response = self.http.get(poster_url).send()?;

        if !response.status().is_success() {
            return Err(TmdbError::Status {
                url: poster_url.to_string(),
                status: response.status(),
            });
        }

        let bytes = response.bytes()?;
        Ok(image::load_from_memory(&bytes)?)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, TmdbError> {
        tracing::debug!(url = %redact_api_key(url), "GET");
        let response = self.http.get(url).send()?;

        if !response.status().is_success() {
            return Err(TmdbError::Status {
                url: redact_api_key(url),
                status: response.status(),
            });
        }

        Ok(response.json()?)
    }
}

/// Where rows get their data from. The app talks to TMDB through this so the
/// worker threads can be driven by canned data in tests.
pub trait CatalogSource: Send + Sync {
    fn fetch_catalog(&self, endpoint: &str) -> Result<Vec<CatalogItem>, TmdbError>;
    fn fetch_trailer_key(&self, movie_id: &str, api_key: &str)
        -> Result<Option<String>, TmdbError>;
    fn download_poster(&self, poster_url: &str) -> Result<image::DynamicImage, TmdbError>;
}

impl CatalogSource for TmdbClient {
    fn fetch_catalog(&self, endpoint: &str) -> Result<Vec<CatalogItem>, TmdbError> {
        TmdbClient::fetch_catalog(self, endpoint)
    }

    fn fetch_trailer_key(
        &self,
        movie_id: &str,
        api_key: &str,
    ) -> Result<Option<String>, TmdbError> {
        TmdbClient::fetch_trailer_key(self, movie_id, api_key)
    }

    fn download_poster(&self, poster_url: &str) -> Result<image::DynamicImage, TmdbError> {
        TmdbClient::download_poster(self, poster_url)
    }
}

pub fn videos_path(movie_id: &str) -> String {
    format!("/movie/{}/videos", urlencoding::encode(movie_id))
}

/// Poster source for a card: the image base with the fragment appended verbatim.
/// A missing fragment leaves just the base, which will not resolve to an image.
pub fn image_url(image_base_url: &str, fragment: Option<&str>) -> String {
    format!("{}{}", image_base_url, fragment.unwrap_or_default())
}

fn redact_api_key(url: &str) -> String {
    match url.find("api_key=") {
        Some(start) => {
            let value_start = start + "api_key=".len();
            let value_end = url[value_start..]
                .find('&')
                .map_or(url.len(), |offset| value_start + offset);
            format!("{}***{}", &url[..value_start], &url[value_end..])
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_item_accepts_numeric_and_string_ids() {
        let page: ResultsPage<CatalogItem> = serde_json::from_str(
            r#"{"results":[{"id":550,"title":"Fight Club"},{"id":"1","name":"A"}]}"#,
        )
        .unwrap();

        assert_eq!(page.results[0].id, "550");
        assert_eq!(page.results[0].display_name(), "Fight Club");
        assert_eq!(page.results[1].id, "1");
        assert_eq!(page.results[1].poster_path, None);
    }

    #[test]
    fn missing_results_decodes_as_empty_list() {
        let page: ResultsPage<CatalogItem> = serde_json::from_str(r#"{"page":1}"#).unwrap();
        assert!(page.results.is_empty());
    }

    #[test]
    fn fragment_follows_row_variant() {
        let item = CatalogItem {
            id: "1".into(),
            name: Some("A".into()),
            title: None,
            original_name: None,
            poster_path: Some("/a.jpg".into()),
            backdrop_path: Some("/b.jpg".into()),
        };

        assert_eq!(item.image_fragment(true), Some("/a.jpg"));
        assert_eq!(item.image_fragment(false), Some("/b.jpg"));
        assert_eq!(
            image_url(DEFAULT_IMAGE_BASE_URL, item.image_fragment(true)),
            "https://image.tmdb.org/t/p/original/a.jpg"
        );
        assert_eq!(image_url(DEFAULT_IMAGE_BASE_URL, None), DEFAULT_IMAGE_BASE_URL);
    }

    #[test]
    fn api_key_is_appended_with_the_right_separator() {
        let client = TmdbClient::new("https://api.example.org/3/", Some("k&y".into()));

        assert_eq!(
            client.url_for("/movie/top_rated").unwrap(),
            "https://api.example.org/3/movie/top_rated?api_key=k%26y"
        );
        assert_eq!(
            client.url_for("/discover/tv?with_networks=213").unwrap(),
            "https://api.example.org/3/discover/tv?with_networks=213&api_key=k%26y"
        );
    }

    #[test]
    fn trailer_url_uses_the_key_it_is_given() {
        let client = TmdbClient::new("https://api.example.org/3", Some("startup".into()));
        assert_eq!(
            client.url_with_key(&videos_path("1"), "rotated"),
            "https://api.example.org/3/movie/1/videos?api_key=rotated"
        );
    }

    #[test]
    fn url_without_api_key_is_an_error() {
        let client = TmdbClient::new(DEFAULT_BASE_URL, None);
        assert!(matches!(
            client.url_for("/movie/top_rated"),
            Err(TmdbError::MissingApiKey)
        ));
    }

    #[test]
    fn videos_path_encodes_the_id() {
        assert_eq!(videos_path("1"), "/movie/1/videos");
        assert_eq!(videos_path("a/b"), "/movie/a%2Fb/videos");
    }

    #[test]
    fn first_video_key_wins() {
        let page: ResultsPage<Video> =
            serde_json::from_str(r#"{"id":1,"results":[{"key":"xyz","site":"YouTube"},{"key":"abc"}]}"#)
                .unwrap();
        assert_eq!(page.results.into_iter().next().map(|v| v.key), Some("xyz".to_string()));
    }

    #[test]
    fn api_key_is_redacted_in_logged_urls() {
        assert_eq!(
            redact_api_key("https://x/movie?api_key=secret&page=2"),
            "https://x/movie?api_key=***&page=2"
        );
        assert_eq!(redact_api_key("https://x/a?api_key=secret"), "https://x/a?api_key=***");
    }
}
