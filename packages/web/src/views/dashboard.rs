use dioxus::prelude::*;
use store::{Bookmark, BookmarkList};
use url::form_urlencoded;
use url::Url;

use super::DISABLE_ON_SUBMIT;

// Swaps in the list items pushed by /dashboard/events.
const LIVE_SCRIPT: &str = r#"
const list = document.getElementById("bookmarks");
new EventSource("/dashboard/events").addEventListener("bookmarks", (event) => {
  list.innerHTML = event.data;
});
"#;

/// Only http(s) URLs become links. Rows written by other clients skip our
/// validation, so anything else is shown as plain text.
fn link_target(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    matches!(parsed.scheme(), "http" | "https").then(|| url.to_string())
}

fn delete_action(id: &str) -> String {
    let id: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
    format!("/dashboard/bookmarks/{id}/delete")
}

#[component]
fn BookmarkItem(bookmark: Bookmark) -> Element {
    let added = bookmark.created_at.format("%Y-%m-%d").to_string();
    let action = delete_action(&bookmark.id);
    let link = match link_target(&bookmark.url) {
        Some(href) => rsx! {
            a { href: "{href}", target: "_blank", rel: "noopener noreferrer", "{bookmark.url}" }
        },
        None => rsx! {
            span { class: "unsafe-url", "{bookmark.url}" }
        },
    };

    rsx! {
        li {
            class: "bookmark",
            strong { "{bookmark.title}" }
            {link}
            small { "{added}" }
            form {
                method: "post",
                action: "{action}",
                button { r#type: "submit", aria_label: "Delete bookmark", "Delete" }
            }
        }
    }
}

/// List items for `bookmarks`, or the empty-state line.
#[component]
pub fn BookmarkItems(bookmarks: BookmarkList) -> Element {
    if bookmarks.is_empty() {
        return rsx! {
            li { class: "empty", "No bookmarks yet. Add your first one!" }
        };
    }

    rsx! {
        for bookmark in bookmarks.as_slice().iter().cloned() {
            BookmarkItem { key: "{bookmark.id}", bookmark }
        }
    }
}

/// The signed-in page: header with sign-out, the add form and the live list.
#[component]
pub fn Dashboard(email: String, bookmarks: BookmarkList) -> Element {
    rsx! {
        header {
            class: "dashboard-header",
            h1 { "My Bookmarks" }
            span { "{email}" }
            form {
                method: "post",
                action: "/auth/logout",
                "onsubmit": DISABLE_ON_SUBMIT,
                button { r#type: "submit", "Logout" }
            }
        }

        main {
            form {
                class: "bookmark-form",
                method: "post",
                action: "/dashboard/bookmarks",
                label { r#for: "title", "Title" }
                input {
                    r#type: "text",
                    id: "title",
                    name: "title",
                    required: true,
                    placeholder: "Enter bookmark title",
                }
                label { r#for: "url", "URL" }
                input {
                    r#type: "url",
                    id: "url",
                    name: "url",
                    required: true,
                    placeholder: "https://example.com",
                }
                button { r#type: "submit", "Add Bookmark" }
            }

            ul {
                id: "bookmarks",
                BookmarkItems { bookmarks }
            }
        }

        script { dangerous_inner_html: LIVE_SCRIPT }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{bookmark_items, dashboard_page};

    fn bookmark(id: &str, title: &str, url: &str) -> Bookmark {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "user_id": "user-1",
            "title": title,
            "url": url,
            "created_at": "2026-01-01T12:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_lists_bookmarks_escaped() {
        let list = BookmarkList::from(vec![bookmark("b1", "<script>", "https://example.com/docs")]);
        let page = dashboard_page(Some("ada@example.com"), &list);

        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("href=\"https://example.com/docs\""));
        assert!(page.contains("/dashboard/bookmarks/b1/delete"));
        assert!(page.contains("ada@example.com"));
        assert!(page.contains("2026-01-01"));
    }

    #[test]
    fn test_empty_list() {
        let page = dashboard_page(None, &BookmarkList::new());
        assert!(page.contains("No bookmarks yet"));
    }

    #[test]
    fn test_non_web_url_is_not_a_link() {
        let list = BookmarkList::from(vec![bookmark("b1", "Sneaky", "javascript:alert(1)")]);
        let items = bookmark_items(&list);

        assert!(items.contains("javascript:alert(1)"));
        assert!(!items.contains("href=\"javascript:"));
    }

    #[test]
    fn test_link_target() {
        assert_eq!(
            link_target("https://example.com/a?b=1").as_deref(),
            Some("https://example.com/a?b=1")
        );
        assert_eq!(link_target("http://localhost:3000").as_deref(), Some("http://localhost:3000"));
        assert_eq!(link_target("javascript:alert(1)"), None);
        assert_eq!(link_target("data:text/html,hi"), None);
        assert_eq!(link_target("not a url"), None);
    }

    #[test]
    fn test_items_newest_first() {
        let list = BookmarkList::from(vec![
            bookmark("b2", "Second", "https://two.example"),
            bookmark("b1", "First", "https://one.example"),
        ]);
        let items = bookmark_items(&list);

        let second = items.find("Second").unwrap();
        let first = items.find("First").unwrap();
        assert!(second < first);
        assert!(!items.contains("No bookmarks yet"));
    }
}
