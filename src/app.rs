pub mod config;
pub mod row;
pub mod tmdb;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, mpsc};

use rand::Rng;
use ratatui::layout::{Position, Rect};
use ratatui_image::{picker::Picker, protocol::StatefulProtocol};
use throbber_widgets_tui::ThrobberState;

use config::{Config, RowConfig};
use row::{ClickOutcome, Row, RowFetch, TrailerState, PLAYER_OPTIONS};
use tmdb::{CatalogItem, CatalogSource, TmdbClient, TmdbError};

pub enum FetchMessage {
    Catalog {
        row: usize,
        request: u64,
        result: Result<Vec<CatalogItem>, TmdbError>,
    },
    Trailer {
        row: usize,
        request: u64,
        result: Result<Option<String>, TmdbError>,
    },
    Poster {
        url: String,
        result: Result<image::DynamicImage, TmdbError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentScreen {
    Browse,
    Exiting,
}

/// Screen area of a poster card from the last draw, used for mouse clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hitbox {
    pub area: Rect,
    pub row: usize,
    pub index: usize,
}

pub struct App {
    pub rows: Vec<Row>,
    pub row_configs: Vec<RowConfig>,
    endpoint_indices: Vec<usize>,
    pub image_base_url: String,
    pub has_api_key: bool,
    pub current_screen: CurrentScreen,
    pub focused_row: usize,
    pub selected: Vec<usize>,
    pub banner: Option<CatalogItem>,
    banner_row: Option<usize>,
    pub status: Option<String>,
    pub hitboxes: Vec<Hitbox>,
    pub throbber_state: ThrobberState,
    pub picker: Option<Picker>,
    pub posters: HashMap<String, StatefulProtocol>,
    pending_posters: HashSet<String>,
    failed_posters: HashSet<String>,
    api_key: Option<String>,
    read_api_key: fn() -> Option<String>,
    source: Arc<dyn CatalogSource>,
    sender: mpsc::Sender<FetchMessage>,
    receiver: mpsc::Receiver<FetchMessage>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let client = TmdbClient::new(config.base_url.clone(), config.api_key.clone());
        Self::with_source(config, Arc::new(client))
    }

    pub fn with_source(config: Config, source: Arc<dyn CatalogSource>) -> Self {
        let (sender, receiver) = mpsc::channel();
        let rows: Vec<Row> = config
            .rows
            .iter()
            .map(|row| {
                let endpoint = row.endpoints.first().cloned().unwrap_or_default();
                Row::new(row.title.clone(), endpoint, row.large)
            })
            .collect();
        let row_count = rows.len();

        Self {
            rows,
            row_configs: config.rows,
            endpoint_indices: vec![0; row_count],
            image_base_url: config.image_base_url,
            has_api_key: config.api_key.is_some(),
            current_screen: CurrentScreen::Browse,
            focused_row: 0,
            selected: vec![0; row_count],
            banner: None,
            banner_row: None,
            status: None,
            hitboxes: Vec::new(),
            throbber_state: ThrobberState::default(),
            picker: None,
            posters: HashMap::new(),
            pending_posters: HashSet::new(),
            failed_posters: HashSet::new(),
            api_key: config.api_key,
            read_api_key: config::api_key_from_env,
            source,
            sender,
            receiver,
        }
    }

    /// Kicks off the initial catalog fetch for every row.
    pub fn start(&mut self) {
        if !self.has_api_key {
            return;
        }
        for index in 0..self.rows.len() {
            let fetch = self.rows[index].begin_fetch();
            self.spawn_fetch(index, fetch);
        }
    }

    fn spawn_fetch(&self, row: usize, fetch: RowFetch) {
        if !self.has_api_key {
            return;
        }
        let sender = self.sender.clone();
        let source = Arc::clone(&self.source);
        // The key is looked up per click so a rotated key takes effect without a restart
        let api_key = match &fetch {
            RowFetch::Trailer { .. } => self.trailer_api_key(),
            RowFetch::Catalog { .. } => None,
        };

        std::thread::spawn(move || {
            let message = match fetch {
                RowFetch::Catalog { request, endpoint } => FetchMessage::Catalog {
                    row,
                    request,
                    result: source.fetch_catalog(&endpoint),
                },
                RowFetch::Trailer { request, item_id } => FetchMessage::Trailer {
                    row,
                    request,
                    result: match api_key {
                        Some(api_key) => source.fetch_trailer_key(&item_id, &api_key),
                        None => Err(TmdbError::MissingApiKey),
                    },
                },
            };
            // The receiver only goes away when the app is shutting down
            let _ = sender.send(message);
        });
    }

    fn trailer_api_key(&self) -> Option<String> {
        (self.read_api_key)().or_else(|| self.api_key.clone())
    }

    /// Applies every message the worker threads have sent since the last tick.
    pub fn drain_messages(&mut self) {
        while let Ok(message) = self.receiver.try_recv() {
            self.handle_message(message);
        }
    }

    pub fn handle_message(&mut self, message: FetchMessage) {
        match message {
            FetchMessage::Catalog { row, request, result } => {
                let Some(target) = self.rows.get_mut(row) else {
                    return;
                };
                target.apply_catalog(request, result);
                let len = target.items.len();
                self.selected[row] = self.selected[row].min(len.saturating_sub(1));

                self.update_banner();
                if row == self.focused_row {
                    self.request_selected_poster();
                }
            }
            FetchMessage::Trailer { row, request, result } => {
                if let Some(target) = self.rows.get_mut(row) {
                    target.apply_trailer(request, result);
                }
            }
            FetchMessage::Poster { url, result } => {
                self.pending_posters.remove(&url);
                match result {
                    Ok(image) => {
                        if let Some(picker) = &self.picker {
                            self.posters.insert(url, picker.new_resize_protocol(image));
                        }
                    }
                    Err(e) => {
                        // Remembered until the row is refreshed so the card is not retried
                        tracing::debug!(url = %url, error = %e, "poster download failed");
                        self.failed_posters.insert(url);
                    }
                }
            }
        }
    }

    /// Keeps the banner on a title from the first row that has items. A
    /// banner taken from a later row is replaced once an earlier row loads.
    fn update_banner(&mut self) {
        let Some(first) = self.rows.iter().position(|row| !row.items.is_empty()) else {
            return;
        };
        if self.banner_row.is_some_and(|current| current <= first) {
            return;
        }

        let items = &self.rows[first].items;
        let pick = rand::thread_rng().gen_range(0..items.len());
        self.banner = Some(items[pick].clone());
        self.banner_row = Some(first);
    }

    pub fn tick(&mut self) {
        self.throbber_state.calc_next();
    }

    pub fn next_row(&mut self) {
        let row_count = self.rows.len();
        if row_count == 0 {
            return;
        }
        self.focused_row = (self.focused_row + 1) % row_count;
        self.request_selected_poster();
    }

    pub fn previous_row(&mut self) {
        let row_count = self.rows.len();
        if row_count == 0 {
            return;
        }
        if self.focused_row == 0 {
            self.focused_row = row_count - 1;
        } else {
            self.focused_row -= 1;
        }
        self.request_selected_poster();
    }

    pub fn next_item(&mut self) {
        let Some(row) = self.rows.get(self.focused_row) else {
            return;
        };
        let item_count = row.items.len();
        if item_count == 0 {
            return;
        }
        let selected = &mut self.selected[self.focused_row];
        *selected = (*selected + 1) % item_count;
        self.request_selected_poster();
    }

    pub fn previous_item(&mut self) {
        let Some(row) = self.rows.get(self.focused_row) else {
            return;
        };
        let item_count = row.items.len();
        if item_count == 0 {
            return;
        }
        let selected = &mut self.selected[self.focused_row];
        *selected = if *selected == 0 {
            item_count - 1
        } else {
            *selected - 1
        };
        self.request_selected_poster();
    }

    pub fn click_selected(&mut self) {
        let index = self.selected.get(self.focused_row).copied().unwrap_or(0);
        self.click(self.focused_row, index);
    }

    pub fn click(&mut self, row: usize, index: usize) {
        if !self.has_api_key {
            return;
        }
        let Some(target) = self.rows.get_mut(row) else {
            return;
        };
        match target.click(index) {
            ClickOutcome::Fetch(fetch) => self.spawn_fetch(row, fetch),
            ClickOutcome::Closed => tracing::debug!(row, "trailer closed"),
            ClickOutcome::Ignored => {}
        }
    }

    /// Handles a left click at a terminal cell. Returns whether a card was hit.
    pub fn click_at(&mut self, column: u16, row: u16) -> bool {
        let position = Position::new(column, row);
        let Some(hit) = self
            .hitboxes
            .iter()
            .find(|hitbox| hitbox.area.contains(position))
            .copied()
        else {
            return false;
        };

        self.focused_row = hit.row;
        self.selected[hit.row] = hit.index;
        self.click(hit.row, hit.index);
        self.request_selected_poster();
        true
    }

    /// Moves the focused row to its next configured endpoint.
    pub fn cycle_endpoint(&mut self) {
        if !self.has_api_key {
            return;
        }
        let row = self.focused_row;
        let Some(config) = self.row_configs.get(row) else {
            return;
        };
        if config.endpoints.len() < 2 {
            self.status = Some(format!("{} has no alternate listing", config.title));
            return;
        }

        let next = (self.endpoint_indices[row] + 1) % config.endpoints.len();
        self.endpoint_indices[row] = next;
        let endpoint = config.endpoints[next].clone();

        match self.rows[row].set_endpoint(endpoint) {
            Some(fetch) => {
                let target = &self.rows[row];
                self.status = Some(format!("{} now lists {}", target.title, target.endpoint()));
                self.selected[row] = 0;
                self.spawn_fetch(row, fetch);
            }
            None => {
                // Duplicate alternates land on the endpoint already shown
                let target = &self.rows[row];
                self.status = Some(format!("{} already lists {}", target.title, target.endpoint()));
            }
        }
    }

    pub fn refresh_focused(&mut self) {
        if !self.has_api_key {
            return;
        }
        let row = self.focused_row;
        if let Some(target) = self.rows.get_mut(row) {
            // An explicit refresh is the only point failed posters are tried again
            let base = &self.image_base_url;
            for card in target.poster_cards(base) {
                self.failed_posters.remove(&card.image_url);
            }
            let fetch = target.begin_fetch();
            self.spawn_fetch(row, fetch);
        }
    }

    pub fn open_trailer(&mut self) {
        let Some(video_id) = self.playing_trailer().map(|(_, id)| id.to_string()) else {
            self.status = Some("No trailer playing".to_string());
            return;
        };

        let url = PLAYER_OPTIONS.watch_url(&video_id);
        match webbrowser::open(&url) {
            Ok(()) => self.status = Some(format!("Opened {}", url)),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "failed to open browser");
                self.status = Some(format!("Could not open browser: {}", e));
            }
        }
    }

    pub fn playing_trailer(&self) -> Option<(usize, &str)> {
        self.rows
            .iter()
            .enumerate()
            .find_map(|(index, row)| match &row.trailer {
                TrailerState::Playing(id) => Some((index, id.as_str())),
                TrailerState::Hidden => None,
            })
    }

    /// Starts a background download of the focused card's poster unless it
    /// is already cached, in flight, or cannot be displayed.
    pub fn request_selected_poster(&mut self) {
        if self.picker.is_none() || !self.has_api_key {
            return;
        }
        let Some(row) = self.rows.get(self.focused_row) else {
            return;
        };
        let index = self.selected[self.focused_row];
        let Some(card) = row.poster_cards(&self.image_base_url).into_iter().nth(index) else {
            return;
        };
        if !card.has_image
            || self.posters.contains_key(&card.image_url)
            || self.pending_posters.contains(&card.image_url)
            || self.failed_posters.contains(&card.image_url)
        {
            return;
        }

        let url = card.image_url;
        self.pending_posters.insert(url.clone());
        let sender = self.sender.clone();
        let source = Arc::clone(&self.source);

        std::thread::spawn(move || {
            let result = source.download_poster(&url);
            let _ = sender.send(FetchMessage::Poster { url, result });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CannedSource;

    impl CatalogSource for CannedSource {
        fn fetch_catalog(&self, endpoint: &str) -> Result<Vec<CatalogItem>, TmdbError> {
            if endpoint.contains("broken") {
                return Err(TmdbError::MissingApiKey);
            }
            Ok(vec![
                CatalogItem {
                    id: "1".into(),
                    name: Some(format!("A {}", endpoint)),
                    title: None,
                    original_name: None,
                    poster_path: Some("/a.jpg".into()),
                    backdrop_path: Some("/b.jpg".into()),
                },
                CatalogItem {
                    id: "2".into(),
                    name: None,
                    title: Some("B".into()),
                    original_name: None,
                    poster_path: None,
                    backdrop_path: None,
                },
            ])
        }

        fn fetch_trailer_key(
            &self,
            movie_id: &str,
            _api_key: &str,
        ) -> Result<Option<String>, TmdbError> {
            Ok(match movie_id {
                "1" => Some("xyz".into()),
                _ => None,
            })
        }

        fn download_poster(&self, _poster_url: &str) -> Result<image::DynamicImage, TmdbError> {
            Ok(image::DynamicImage::new_rgb8(1, 1))
        }
    }

    fn config(rows: Vec<RowConfig>) -> Config {
        Config {
            api_key: Some("test".into()),
            rows,
            ..Config::default()
        }
    }

    fn row_config(title: &str, endpoints: &[&str], large: bool) -> RowConfig {
        RowConfig {
            title: title.into(),
            endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
            large,
        }
    }

    fn pump(app: &mut App, expected: usize) {
        for _ in 0..expected {
            let message = app
                .receiver
                .recv_timeout(Duration::from_secs(5))
                .expect("worker should report back");
            app.handle_message(message);
        }
    }

    #[test]
    fn start_loads_every_row() {
        let mut app = App::with_source(
            config(vec![
                row_config("Originals", &["/originals"], true),
                row_config("Trending", &["/trending"], false),
            ]),
            Arc::new(CannedSource),
        );
        app.start();
        pump(&mut app, 2);

        assert!(app.rows.iter().all(|row| row.items.len() == 2));
        assert!(app.banner.is_some());
        let cards = app.rows[0].poster_cards(&app.image_base_url);
        assert_eq!(cards[0].image_url, "https://image.tmdb.org/t/p/original/a.jpg");
    }

    #[test]
    fn missing_api_key_issues_no_fetches() {
        let mut app = App::with_source(
            Config {
                api_key: None,
                rows: vec![row_config("Trending", &["/trending"], false)],
                ..Config::default()
            },
            Arc::new(CannedSource),
        );
        app.start();

        assert!(app.receiver.recv_timeout(Duration::from_millis(100)).is_err());
        assert!(!app.rows[0].is_loading());
    }

    #[test]
    fn click_plays_then_closes_trailer() {
        let mut app = App::with_source(
            config(vec![row_config("Trending", &["/trending"], false)]),
            Arc::new(CannedSource),
        );
        app.start();
        pump(&mut app, 1);

        app.click_selected();
        pump(&mut app, 1);
        assert_eq!(app.playing_trailer(), Some((0, "xyz")));

        app.next_item();
        app.click_selected();
        assert_eq!(app.playing_trailer(), None);
        assert!(app.receiver.try_recv().is_err());
    }

    #[test]
    fn click_on_item_without_videos_keeps_player_hidden() {
        let mut app = App::with_source(
            config(vec![row_config("Trending", &["/trending"], false)]),
            Arc::new(CannedSource),
        );
        app.start();
        pump(&mut app, 1);

        app.click(0, 1);
        pump(&mut app, 1);
        assert_eq!(app.playing_trailer(), None);
    }

    #[test]
    fn cycling_endpoint_refetches_once() {
        let mut app = App::with_source(
            config(vec![row_config("Trending", &["/week", "/day"], false)]),
            Arc::new(CannedSource),
        );
        app.start();
        pump(&mut app, 1);

        app.cycle_endpoint();
        assert_eq!(app.rows[0].endpoint(), "/day");
        assert!(app.rows[0].is_loading());
        pump(&mut app, 1);

        assert_eq!(app.rows[0].items[0].name.as_deref(), Some("A /day"));
        assert!(app.receiver.try_recv().is_err());
    }

    #[test]
    fn cycling_single_endpoint_row_only_sets_status() {
        let mut app = App::with_source(
            config(vec![row_config("Top Rated", &["/top"], false)]),
            Arc::new(CannedSource),
        );
        app.cycle_endpoint();

        assert_eq!(app.rows[0].endpoint(), "/top");
        assert!(app.status.is_some());
    }

    #[test]
    fn failed_fetch_leaves_row_empty() {
        let mut app = App::with_source(
            config(vec![row_config("Broken", &["/broken"], false)]),
            Arc::new(CannedSource),
        );
        app.start();
        pump(&mut app, 1);

        assert!(app.rows[0].items.is_empty());
        assert!(!app.rows[0].is_loading());
        assert!(app.banner.is_none());
    }

    #[test]
    fn click_at_uses_hitboxes() {
        let mut app = App::with_source(
            config(vec![
                row_config("Originals", &["/originals"], true),
                row_config("Trending", &["/trending"], false),
            ]),
            Arc::new(CannedSource),
        );
        app.start();
        pump(&mut app, 2);

        app.hitboxes = vec![Hitbox {
            area: Rect::new(10, 5, 8, 4),
            row: 1,
            index: 0,
        }];

        assert!(!app.click_at(0, 0));
        assert!(app.click_at(12, 6));
        assert_eq!(app.focused_row, 1);
        pump(&mut app, 1);
        assert_eq!(app.playing_trailer(), Some((1, "xyz")));
    }

    #[test]
    fn navigation_wraps() {
        let mut app = App::with_source(
            config(vec![
                row_config("One", &["/one"], false),
                row_config("Two", &["/two"], false),
            ]),
            Arc::new(CannedSource),
        );
        app.start();
        pump(&mut app, 2);

        app.previous_row();
        assert_eq!(app.focused_row, 1);
        app.next_row();
        assert_eq!(app.focused_row, 0);

        app.previous_item();
        assert_eq!(app.selected[0], 1);
        app.next_item();
        assert_eq!(app.selected[0], 0);
    }

    fn titled(id: &str, name: &str) -> CatalogItem {
        CatalogItem {
            id: id.into(),
            name: Some(name.into()),
            title: None,
            original_name: None,
            poster_path: Some(format!("/{}.jpg", id)),
            backdrop_path: Some(format!("/{}-wide.jpg", id)),
        }
    }

    fn catalog_request(app: &mut App, row: usize) -> u64 {
        match app.rows[row].begin_fetch() {
            RowFetch::Catalog { request, .. } => request,
            other => panic!("expected catalog fetch, got {:?}", other),
        }
    }

    #[test]
    fn banner_comes_from_first_row_even_when_it_loads_last() {
        let mut app = App::with_source(
            config(vec![
                row_config("Originals", &["/originals"], true),
                row_config("Trending", &["/trending"], false),
            ]),
            Arc::new(CannedSource),
        );
        let first = catalog_request(&mut app, 0);
        let second = catalog_request(&mut app, 1);

        app.handle_message(FetchMessage::Catalog {
            row: 1,
            request: second,
            result: Ok(vec![titled("2", "second")]),
        });
        assert_eq!(app.banner.as_ref().map(|item| item.display_name()), Some("second"));

        app.handle_message(FetchMessage::Catalog {
            row: 0,
            request: first,
            result: Ok(vec![titled("1", "first")]),
        });
        assert_eq!(app.banner.as_ref().map(|item| item.display_name()), Some("first"));

        // A later row refreshing does not take the banner back.
        let again = catalog_request(&mut app, 1);
        app.handle_message(FetchMessage::Catalog {
            row: 1,
            request: again,
            result: Ok(vec![titled("3", "third")]),
        });
        assert_eq!(app.banner.as_ref().map(|item| item.display_name()), Some("first"));
    }

    struct BrokenPosters {
        downloads: AtomicUsize,
    }

    impl CatalogSource for BrokenPosters {
        fn fetch_catalog(&self, _endpoint: &str) -> Result<Vec<CatalogItem>, TmdbError> {
            Ok(vec![titled("1", "one"), titled("2", "two")])
        }

        fn fetch_trailer_key(
            &self,
            _movie_id: &str,
            _api_key: &str,
        ) -> Result<Option<String>, TmdbError> {
            Ok(None)
        }

        fn download_poster(&self, _poster_url: &str) -> Result<image::DynamicImage, TmdbError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            Err(TmdbError::MissingApiKey)
        }
    }

    #[test]
    fn failed_poster_is_not_downloaded_again_until_refresh() {
        let source = Arc::new(BrokenPosters {
            downloads: AtomicUsize::new(0),
        });
        let mut app = App::with_source(
            config(vec![row_config("Trending", &["/trending"], false)]),
            source.clone(),
        );
        app.picker = Some(Picker::halfblocks());
        app.start();
        // Catalog, then the first card's poster.
        pump(&mut app, 2);

        app.next_item();
        pump(&mut app, 1);
        for _ in 0..3 {
            app.previous_item();
            app.next_item();
        }

        assert!(app.receiver.recv_timeout(Duration::from_millis(200)).is_err());
        assert_eq!(source.downloads.load(Ordering::SeqCst), 2);
        assert!(app.posters.is_empty());

        // Refresh reloads the row and retries the selected card once.
        app.refresh_focused();
        pump(&mut app, 2);
        assert_eq!(source.downloads.load(Ordering::SeqCst), 3);
    }

    struct KeyRecorder {
        keys: Mutex<Vec<String>>,
    }

    impl CatalogSource for KeyRecorder {
        fn fetch_catalog(&self, _endpoint: &str) -> Result<Vec<CatalogItem>, TmdbError> {
            Ok(vec![titled("1", "one")])
        }

        fn fetch_trailer_key(
            &self,
            _movie_id: &str,
            api_key: &str,
        ) -> Result<Option<String>, TmdbError> {
            self.keys.lock().unwrap().push(api_key.to_string());
            Ok(None)
        }

        fn download_poster(&self, _poster_url: &str) -> Result<image::DynamicImage, TmdbError> {
            Ok(image::DynamicImage::new_rgb8(1, 1))
        }
    }

    #[test]
    fn trailer_request_reads_api_key_at_click_time() {
        let source = Arc::new(KeyRecorder {
            keys: Mutex::new(Vec::new()),
        });
        let mut app = App::with_source(
            config(vec![row_config("Trending", &["/trending"], false)]),
            source.clone(),
        );
        app.read_api_key = || None;
        app.start();
        pump(&mut app, 1);

        app.click_selected();
        pump(&mut app, 1);

        app.read_api_key = || Some("rotated".to_string());
        app.click_selected();
        pump(&mut app, 1);

        assert_eq!(*source.keys.lock().unwrap(), vec!["test".to_string(), "rotated".to_string()]);
    }

    #[test]
    fn duplicate_alternate_endpoint_sets_status_without_fetching() {
        let mut app = App::with_source(
            config(vec![row_config("Trending", &["/week", "/week"], false)]),
            Arc::new(CannedSource),
        );
        app.start();
        pump(&mut app, 1);

        app.cycle_endpoint();

        assert!(!app.rows[0].is_loading());
        assert!(app.status.as_deref().unwrap().contains("already lists /week"));
        assert!(app.receiver.recv_timeout(Duration::from_millis(100)).is_err());
    }
}
