use chrono::{DateTime, Local};

use crate::app::tmdb::{CatalogItem, TmdbError, image_url};

/// YouTube embed configuration for the trailer panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerOptions {
    pub width: u16,
    pub height: u16,
    pub autoplay: bool,
}

pub const PLAYER_OPTIONS: PlayerOptions = PlayerOptions {
    width: 640,
    height: 390,
    autoplay: true,
};

impl PlayerOptions {
    pub fn embed_url(&self, video_id: &str) -> String {
        format!(
            "https://www.youtube.com/embed/{}?autoplay={}",
            urlencoding::encode(video_id),
            u8::from(self.autoplay)
        )
    }

    pub fn watch_url(&self, video_id: &str) -> String {
        format!(
            "https://www.youtube.com/watch?v={}&autoplay={}",
            urlencoding::encode(video_id),
            u8::from(self.autoplay)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrailerState {
    #[default]
    Hidden,
    Playing(String),
}

impl TrailerState {
    pub fn video_id(&self) -> Option<&str> {
        match self {
            TrailerState::Hidden => None,
            TrailerState::Playing(id) => Some(id),
        }
    }
}

/// Work a row asks the app to start on its behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFetch {
    Catalog { request: u64, endpoint: String },
    Trailer { request: u64, item_id: String },
}

/// What a card click did to the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Closed,
    Fetch(RowFetch),
    Ignored,
}

/// A poster card as it should be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct PosterCard<'a> {
    pub item: &'a CatalogItem,
    pub image_url: String,
    pub has_image: bool,
    pub large: bool,
}

#[derive(Debug)]
pub struct Row {
    pub title: String,
    endpoint: String,
    pub is_large_row: bool,
    pub items: Vec<CatalogItem>,
    pub trailer: TrailerState,
    pub notice: Option<String>,
    pub last_updated: Option<DateTime<Local>>,
    next_request: u64,
    catalog_request: Option<u64>,
    trailer_request: Option<u64>,
}

impl Row {
    pub fn new(title: impl Into<String>, endpoint: impl Into<String>, is_large_row: bool) -> Self {
        Self {
            title: title.into(),
            endpoint: endpoint.into(),
            is_large_row,
            items: Vec::new(),
            trailer: TrailerState::Hidden,
            notice: None,
            last_updated: None,
            next_request: 0,
            catalog_request: None,
            trailer_request: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_loading(&self) -> bool {
        self.catalog_request.is_some()
    }

    pub fn is_fetching_trailer(&self) -> bool {
        self.trailer_request.is_some()
    }

    fn issue_request(&mut self) -> u64 {
        self.next_request += 1;
        self.next_request
    }

    /// Starts a catalog fetch for the current endpoint. Any fetch still in
    /// flight is superseded and its result will be dropped.
    pub fn begin_fetch(&mut self) -> RowFetch {
        let request = self.issue_request();
        self.catalog_request = Some(request);
        RowFetch::Catalog {
            request,
            endpoint: self.endpoint.clone(),
        }
    }

    /// Changes the data-source endpoint. Returns the fetch to issue, or
    /// `None` when the endpoint is unchanged.
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) -> Option<RowFetch> {
        let endpoint = endpoint.into();
        if endpoint == self.endpoint {
            return None;
        }
        self.endpoint = endpoint;
        Some(self.begin_fetch())
    }

    pub fn apply_catalog(&mut self, request: u64, result: Result<Vec<CatalogItem>, TmdbError>) {
        if self.catalog_request != Some(request) {
            tracing::debug!(row = %self.title, request, "dropping stale catalog response");
            return;
        }
        self.catalog_request = None;

        match result {
            Ok(items) => {
                tracing::info!(row = %self.title, count = items.len(), "catalog loaded");
                self.items = items;
                self.last_updated = Some(Local::now());
            }
            Err(e) => {
                tracing::error!(row = %self.title, endpoint = %self.endpoint, error = %e, "catalog fetch failed");
            }
        }
    }

    /// Handles a click on the card at `index`. A playing trailer is closed
    /// whichever card is clicked; otherwise the clicked title's videos are
    /// requested.
    pub fn click(&mut self, index: usize) -> ClickOutcome {
        if self.trailer != TrailerState::Hidden {
            self.trailer = TrailerState::Hidden;
            return ClickOutcome::Closed;
        }

        let Some(item) = self.items.get(index) else {
            return ClickOutcome::Ignored;
        };
        let item_id = item.id.clone();

        self.notice = None;
        let request = self.issue_request();
        self.trailer_request = Some(request);
        ClickOutcome::Fetch(RowFetch::Trailer { request, item_id })
    }

    pub fn apply_trailer(&mut self, request: u64, result: Result<Option<String>, TmdbError>) {
        if self.trailer_request != Some(request) {
            tracing::debug!(row = %self.title, request, "dropping stale trailer response");
            return;
        }
        self.trailer_request = None;

        match result {
            Ok(Some(key)) => {
                self.trailer = TrailerState::Playing(key);
            }
            Ok(None) => {
                tracing::info!(row = %self.title, "no trailer available");
            }
            Err(e) => {
                tracing::warn!(row = %self.title, error = %e, "trailer fetch failed");
                self.notice = Some(format!("Trailer unavailable: {}", e));
            }
        }
    }

    pub fn poster_cards(&self, image_base_url: &str) -> Vec<PosterCard<'_>> {
        self.items
            .iter()
            .map(|item| {
                let fragment = item.image_fragment(self.is_large_row);
                PosterCard {
                    item,
                    image_url: image_url(image_base_url, fragment),
                    has_image: fragment.is_some(),
                    large: self.is_large_row,
                }
            })
            .collect()
    }
}
