use dioxus::prelude::*;

/// The one sign-in error page, for every callback failure. `error` is the
/// code or message from the callback; empty hides the detail line.
#[component]
pub fn AuthCodeError(error: String) -> Element {
    let detail = if error.is_empty() {
        rsx! {}
    } else {
        rsx! {
            p { class: "error", "Error: {error}" }
        }
    };

    rsx! {
        main {
            class: "auth-error",
            h1 { "Authentication Error" }
            {detail}
            p { "There was an error during authentication. Please try again." }
            a { href: "/", "Back to Login" }

            div {
                class: "hints",
                p { "Debugging tips:" }
                p { "1. Check browser console for errors" }
                p { "2. Check server logs for details" }
                p { "3. Verify redirect URLs in the auth provider settings" }
                p { "4. Ensure Google OAuth is enabled" }
            }
        }
    }
}
