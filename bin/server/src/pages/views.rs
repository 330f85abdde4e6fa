//! Page components, rendered to HTML on the server.

use leptos::prelude::*;

/// Renders the login page with its flash messages and optional CAS link.
pub fn login_html(flashes: Vec<String>, cas_link: Option<String>) -> String {
    Owner::new().with(|| view! { <LoginPage flashes=flashes cas_link=cas_link/> }.to_html())
}

/// Renders the organization index for a signed-in user.
pub fn index_html(org_name: String, user_name: String, logout_href: String) -> String {
    Owner::new().with(|| {
        view! { <IndexPage org_name=org_name user_name=user_name logout_href=logout_href/> }
            .to_html()
    })
}

#[component]
fn Page(#[prop(into)] title: String, children: Children) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <title>{title}</title>
            </head>
            <body>{children()}</body>
        </html>
    }
}

/// Login page. Flash messages are listed once; the CAS link only appears
/// when the organization has CAS enabled.
#[component]
fn LoginPage(flashes: Vec<String>, cas_link: Option<String>) -> impl IntoView {
    let flash_list = (!flashes.is_empty()).then(move || {
        view! {
            <ul class="flashes">
                {flashes.into_iter().map(|flash| view! { <li>{flash}</li> }).collect_view()}
            </ul>
        }
    });
    let cas_button = cas_link.map(|href| {
        view! { <a href=href rel="external" class="login-cas">"Log in with CAS"</a> }
    });

    view! {
        <Page title="Log in">
            <div class="login-page">
                <div class="login-box">
                    <h1>"Log in"</h1>
                    {flash_list}
                    {cas_button}
                </div>
            </div>
        </Page>
    }
}

#[component]
fn IndexPage(org_name: String, user_name: String, logout_href: String) -> impl IntoView {
    let title = org_name.clone();
    view! {
        <Page title=title>
            <div class="home-page">
                <h1>{org_name}</h1>
                <p>"Signed in as " <span class="user">{user_name}</span></p>
                <a href=logout_href rel="external">"Log out"</a>
            </div>
        </Page>
    }
}
