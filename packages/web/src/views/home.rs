use dioxus::prelude::*;

use super::DISABLE_ON_SUBMIT;

/// Landing page for signed-out visitors.
#[component]
pub fn Home() -> Element {
    rsx! {
        main {
            class: "landing",
            style: "display: flex; flex-direction: column; align-items: center; justify-content: center; min-height: 100vh; padding: 2rem;",

            h1 { "Bookmark Manager" }
            p { "Save and manage your bookmarks securely with real-time synchronization" }

            form {
                method: "get",
                action: "/auth/login",
                "onsubmit": DISABLE_ON_SUBMIT,
                button { r#type: "submit", class: "login-btn", "Login with Google" }
            }
        }
    }
}
