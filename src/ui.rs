mod footer;
mod header;
mod layout;
mod loading;
mod main_content;
mod screens;
mod trailer;

pub use layout::ui;
