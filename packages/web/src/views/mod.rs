//! Server-rendered pages, written as Dioxus components and turned into HTML
//! with `dioxus-ssr`.

use dioxus::prelude::*;
use store::BookmarkList;

mod auth_error;
pub use auth_error::AuthCodeError;

mod dashboard;
pub use dashboard::{BookmarkItems, Dashboard};

mod home;
pub use home::Home;

/// Disables the form's buttons once it is submitted, so a sign-in or sign-out
/// cannot be triggered twice from the same page.
pub(crate) const DISABLE_ON_SUBMIT: &str =
    "this.querySelectorAll('button').forEach((b) => b.disabled = true)";

fn render_page(title: &str, content: Element) -> String {
    let document = dioxus_ssr::render_element(rsx! {
        head {
            meta { charset: "utf-8" }
            meta { name: "viewport", content: "width=device-width, initial-scale=1" }
            title { "{title}" }
        }
        body { {content} }
    });
    format!("<!DOCTYPE html><html lang=\"en\">{document}</html>")
}

pub fn home_page() -> String {
    render_page("Bookmark Manager", rsx! { Home {} })
}

pub fn dashboard_page(email: Option<&str>, bookmarks: &BookmarkList) -> String {
    render_page(
        "My Bookmarks",
        rsx! {
            Dashboard { email: email.unwrap_or_default().to_string(), bookmarks: bookmarks.clone() }
        },
    )
}

pub fn auth_error_page(error: Option<&str>) -> String {
    render_page(
        "Authentication Error",
        rsx! {
            AuthCodeError { error: error.unwrap_or_default().to_string() }
        },
    )
}

/// The `<li>` items of the dashboard list, pushed to the page on every change.
pub fn bookmark_items(bookmarks: &BookmarkList) -> String {
    dioxus_ssr::render_element(rsx! {
        BookmarkItems { bookmarks: bookmarks.clone() }
    })
}
