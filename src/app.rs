use leptos::ev::SubmitEvent;
use leptos::logging::{error, log};
use leptos::prelude::*;
use leptos::server_fn::error::NoCustomError;
use leptos::task::spawn_local;
use leptos_meta::{provide_meta_context, MetaTags, Stylesheet, Title};
use leptos_router::{
    components::{Route, Router, Routes},
    hooks::{use_navigate, use_query_map},
    path, NavigateOptions,
};
use serde::{Deserialize, Serialize};

use crate::chapter::ChapterKey;
use crate::chart::PieSeries;
use crate::content::{chapter_path, ChapterPage};
use crate::leaderboard::{LeaderboardEntry, LeaderboardView};
use crate::model::User;
use crate::progress::{AchievementBadge, DashboardSummary};
use crate::result_card::{ResultCard, ResultCardState};
use crate::ui::{section_matches, ExpandedRow, Theme, DEFAULT_USER_NAME};
#[cfg(feature = "hydrate")]
use crate::{
    chart::CanvasPie,
    chart::ChartSlot,
    ui::{daily_challenge, THEME_STORAGE_KEY},
};
#[cfg(feature = "ssr")]
use crate::{
    config::AppConfig, content::Catalog, delete_session, error::DashboardError, get_user_by_token, load_dashboard, load_leaderboard, load_result_card,
};

#[cfg(feature = "ssr")]
use diesel::r2d2::{ConnectionManager, Pool};
#[cfg(feature = "ssr")]
use diesel::SqliteConnection;
#[cfg(feature = "ssr")]
use std::sync::Arc;
#[cfg(feature = "ssr")]
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

const SESSION_COOKIE: &str = "session_token";

/// What the identity gate knows about the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthState {
    SignedIn(User),
    SignedOut { login_url: String },
}

// Runs a blocking store call on a pooled connection.
#[cfg(feature = "ssr")]
async fn with_connection<T, F>(f: F) -> Result<T, ServerFnError<NoCustomError>>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteConnection) -> Result<T, DashboardError> + Send + 'static,
{
    let pool: DbPool = expect_context();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| ServerFnError::<NoCustomError>::ServerError(e.to_string()))?;
        f(&mut conn).map_err(|e| ServerFnError::ServerError(e.to_string()))
    })
    .await
    .map_err(|e| ServerFnError::<NoCustomError>::ServerError(e.to_string()))?
}

#[cfg(feature = "ssr")]
async fn session_token() -> Result<Option<String>, ServerFnError<NoCustomError>> {
    use axum::http::HeaderMap;
    use leptos_axum::extract;

    let headers: HeaderMap = extract()
        .await
        .map_err(|e| ServerFnError::<NoCustomError>::ServerError(e.to_string()))?;

    let prefix = format!("{}=", SESSION_COOKIE);
    let token = headers
        .get(axum::http::header::COOKIE)
        .and_then(|cookie_header| cookie_header.to_str().ok())
        .and_then(|cookie_str| {
            cookie_str
                .split(';')
                .map(str::trim)
                .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
                .map(str::to_string)
        })
        .filter(|t| !t.is_empty());
    Ok(token)
}

#[cfg(feature = "ssr")]
async fn current_user() -> Result<Option<User>, ServerFnError<NoCustomError>> {
    let Some(token) = session_token().await? else {
        return Ok(None);
    };
    with_connection(move |conn| Ok(get_user_by_token(conn, &token).ok())).await
}

// The signed-in user, or an error for anonymous requests.
#[cfg(feature = "ssr")]
async fn require_user() -> Result<User, ServerFnError<NoCustomError>> {
    current_user()
        .await?
        .ok_or_else(|| ServerFnError::ServerError(DashboardError::Unauthenticated.to_string()))
}

#[cfg(feature = "ssr")]
fn resolve_chapter(chapter_name: &str) -> Result<ChapterKey, ServerFnError<NoCustomError>> {
    ChapterKey::from_display_name(chapter_name)
        .map_err(|e| ServerFnError::ServerError(e.to_string()))
}

#[cfg(feature = "ssr")]
fn set_session_cookie(value: &str, max_age: u32) -> Result<(), ServerFnError<NoCustomError>> {
    use leptos_axum::ResponseOptions;
    let resp: ResponseOptions = expect_context();
    let cookie = format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Strict",
        SESSION_COOKIE, value, max_age
    );
    resp.insert_header(
        axum::http::header::SET_COOKIE,
        axum::http::HeaderValue::from_str(&cookie)
            .map_err(|e| ServerFnError::<NoCustomError>::ServerError(e.to_string()))?,
    );
    Ok(())
}

#[server(GetAuthState)]
pub async fn get_auth_state() -> Result<AuthState, ServerFnError<NoCustomError>> {
    let config: AppConfig = expect_context();
    Ok(match current_user().await? {
        Some(user) => AuthState::SignedIn(user),
        None => AuthState::SignedOut {
            login_url: config.login_url,
        },
    })
}

#[server(Login)]
pub async fn login_handler(token: String) -> Result<(), ServerFnError<NoCustomError>> {
    let token = token.trim().to_string();
    let token_copy = token.clone();
    let user = with_connection(move |conn| Ok(get_user_by_token(conn, &token_copy)?)).await?;
    log!("User {} signed in", user.id);
    set_session_cookie(&token, 86400)
}

#[server(Logout)]
pub async fn logout() -> Result<(), ServerFnError<NoCustomError>> {
    if let Some(token) = session_token().await? {
        with_connection(move |conn| Ok(delete_session(conn, &token)?)).await?;
    }
    set_session_cookie("", 0)
}

#[server(GetChapterIndex)]
pub async fn get_chapter_index() -> Result<Vec<String>, ServerFnError<NoCustomError>> {
    let catalog: Arc<Catalog> = expect_context();
    Ok(catalog
        .chapters
        .iter()
        .map(|page| page.display_name.clone())
        .collect())
}

/// Quiz links and formula sheet of the chapter. A chapter missing from the catalog gets an
/// empty page.
#[server(GetChapterPage)]
pub async fn get_chapter_page(
    chapter_name: String,
) -> Result<ChapterPage, ServerFnError<NoCustomError>> {
    let key = resolve_chapter(&chapter_name)?;
    let catalog: Arc<Catalog> = expect_context();
    match catalog.find(&key) {
        Some(page) => Ok(page.clone()),
        None => {
            leptos::logging::warn!("Chapter {} is not in the catalog", key);
            Ok(ChapterPage {
                display_name: chapter_name,
                quiz_sets: Vec::new(),
                formulas: Vec::new(),
            })
        }
    }
}

#[server(GetChapterLeaderboard)]
pub async fn get_chapter_leaderboard(
    chapter_name: String,
) -> Result<LeaderboardView, ServerFnError<NoCustomError>> {
    let key = resolve_chapter(&chapter_name)?;
    require_user().await?;
    with_connection(move |conn| load_leaderboard(conn, &key))
        .await
        .inspect_err(|e| error!("Error loading chapter leaderboard: {}", e))
}

/// Falls back to the zero-state when the store cannot be read.
#[server(GetDashboard)]
pub async fn get_dashboard(
    chapter_name: String,
) -> Result<DashboardSummary, ServerFnError<NoCustomError>> {
    let key = resolve_chapter(&chapter_name)?;
    let user = require_user().await?;
    let catalog: Arc<Catalog> = expect_context();
    let total_quizzes = catalog.total_quizzes(&key);

    match with_connection(move |conn| load_dashboard(conn, &user.id, &key, total_quizzes)).await {
        Ok(summary) => Ok(summary),
        Err(e) => {
            error!("Error loading user dashboard data: {}", e);
            Ok(DashboardSummary::new(None, total_quizzes))
        }
    }
}

#[server(GetResultCard)]
pub async fn get_result_card(
    chapter_name: String,
) -> Result<ResultCardState, ServerFnError<NoCustomError>> {
    resolve_chapter(&chapter_name)?;
    let user = require_user().await?;
    let config: AppConfig = expect_context();
    let page_url = config.chapter_page_url(&chapter_name);

    with_connection(move |conn| load_result_card(conn, &user, &chapter_name, &page_url))
        .await
        .inspect_err(|e| error!("Error fetching user result: {}", e))
}

pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="bn">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <AutoReload options=options.clone() />
                <HydrationScripts options />
                <MetaTags />
            </head>
            <body>
                <App />
            </body>
        </html>
    }
}

#[component]
pub fn App() -> impl IntoView {
    // Provides context that manages stylesheets, titles, meta tags, etc.
    provide_meta_context();

    view! {
        <Stylesheet id="leptos" href="/pkg/chapter-dashboard.css" />
        <Stylesheet href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css" />

        <Title text="Study With Keshab" />

        <Router>
            <main>
                <Routes fallback=|| "Page not found.".into_view()>
                    <Route path=path!("/") view=Home />
                    <Route path=path!("/login") view=LoginPage />
                    <Route path=path!("/chapter") view=ChapterRoute />
                </Routes>
            </main>
        </Router>
    }
}

#[component]
fn Home() -> impl IntoView {
    let chapters = Resource::new(|| (), |_| get_chapter_index());

    view! {
        <div class="home">
            <h1>"Study With Keshab"</h1>
            <Suspense fallback=|| {
                view! { "লোড হচ্ছে..." }
            }>
                {move || {
                    chapters
                        .with(|c_res| match c_res {
                            Some(Ok(names)) => {
                                view! {
                                    <h2>"অধ্যায়সমূহ"</h2>
                                    <ul class="chapter-list">
                                        {names
                                            .iter()
                                            .map(|name| {
                                                view! {
                                                    <li>
                                                        <a href=chapter_path(name)>{name.clone()}</a>
                                                    </li>
                                                }
                                            })
                                            .collect_view()}
                                    </ul>
                                }
                                    .into_any()
                            }
                            Some(Err(_)) => view! { "অধ্যায়ের তালিকা লোড করা যায়নি।" }.into_any(),
                            None => view! {}.into_any(),
                        })
                }}
            </Suspense>
        </div>
    }
}

#[component]
fn LoginPage() -> impl IntoView {
    let token = RwSignal::new(String::new());
    let error = RwSignal::new(String::new());

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let t = token.get();
        if t.trim().is_empty() {
            error.set("Please enter your access token.".to_string());
            return;
        }
        spawn_local(async move {
            match login_handler(t).await {
                Ok(_) => {
                    error.set(String::new());
                    let navigate = use_navigate();
                    navigate("/", NavigateOptions::default());
                }
                Err(e) => error.set(e.to_string()),
            }
        });
    };

    view! {
        <div class="login">
            <h1>"Login"</h1>
            <form on:submit=submit>
                <label>
                    "Token: "
                    <input
                        type="password"
                        prop:value=move || token.get()
                        on:input=move |ev| token.set(event_target_value(&ev))
                    />
                </label>
                <button type="submit">"Login"</button>
            </form>
            <p class="error">{move || error.get()}</p>
        </div>
    }
}

/// Identity gate of the chapter page: signed-out visitors are sent to the login page, and the
/// page refuses to run without a chapter name.
#[component]
fn ChapterRoute() -> impl IntoView {
    let query = use_query_map();
    let chapter_name = Memo::new(move |_| usable_chapter_name(query.with(|q| q.get("name"))));
    let auth = Resource::new(|| (), |_| get_auth_state());

    view! {
        <Suspense fallback=|| {
            view! { <div id="preloader">"লোড হচ্ছে..."</div> }
        }>
            {move || {
                auth.with(|a_res| match a_res {
                    Some(Ok(AuthState::SignedIn(user))) => {
                        match chapter_name.get() {
                            Some(name) => {
                                view! { <ChapterDashboard user=user.clone() chapter_name=name /> }
                                    .into_any()
                            }
                            None => view! { <MissingChapter /> }.into_any(),
                        }
                    }
                    Some(Ok(AuthState::SignedOut { login_url })) => {
                        view! { <RedirectToLogin login_url=login_url.clone() /> }.into_any()
                    }
                    Some(Err(e)) => view! { <p class="error">{e.to_string()}</p> }.into_any(),
                    None => view! {}.into_any(),
                })
            }}
        </Suspense>
    }
}

/// The `name` query value, if the server would accept it as a chapter.
fn usable_chapter_name(raw: Option<String>) -> Option<String> {
    raw.filter(|name| ChapterKey::from_display_name(name).is_ok())
}

#[component]
fn RedirectToLogin(login_url: String) -> impl IntoView {
    let target = login_url.clone();
    Effect::new(move || {
        #[cfg(feature = "hydrate")]
        {
            if let Err(e) = leptos::leptos_dom::helpers::window()
                .location()
                .set_href(&target)
            {
                error!("Redirect to login failed: {:?}", e);
            }
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = &target;
    });

    view! {
        <p>
            "লগইন পেজে নিয়ে যাওয়া হচ্ছে... " <a href=login_url>"Login"</a>
        </p>
    }
}

#[component]
fn MissingChapter() -> impl IntoView {
    const MESSAGE: &str = "ত্রুটি: অধ্যায়ের নাম পাওয়া যায়নি।";

    Effect::new(move || {
        error!("Chapter name was not provided in the page URL");
        #[cfg(feature = "hydrate")]
        leptos::leptos_dom::helpers::window()
            .alert_with_message(MESSAGE)
            .unwrap_or_default();
    });

    view! { <p class="error">{MESSAGE}</p> }
}

#[component]
fn ChapterDashboard(user: User, chapter_name: String) -> impl IntoView {
    let theme = RwSignal::new(Theme::Day);
    let search = RwSignal::new(String::new());
    let formula_open = RwSignal::new(false);
    let show_back_to_top = RwSignal::new(false);
    let challenge = RwSignal::new(None::<&'static str>);

    // Restore the saved theme, pick the challenge for the browser's local date and follow the
    // scroll position.
    Effect::new(move || {
        #[cfg(feature = "hydrate")]
        {
            use leptos::leptos_dom::helpers::window;

            challenge.set(Some(daily_challenge(chrono::Local::now())));

            let saved = window()
                .local_storage()
                .ok()
                .flatten()
                .and_then(|storage| storage.get_item(THEME_STORAGE_KEY).ok().flatten());
            theme.set(Theme::from_storage(saved.as_deref()));

            let handle =
                leptos::leptos_dom::helpers::window_event_listener(leptos::ev::scroll, move |_| {
                    let y = window().scroll_y().unwrap_or(0.0);
                    show_back_to_top.set(crate::ui::show_back_to_top(y));
                });
            on_cleanup(move || handle.remove());
        }
    });

    let toggle_theme = move |_| {
        let next = theme.get().toggled();
        theme.set(next);
        #[cfg(feature = "hydrate")]
        if let Some(storage) = leptos::leptos_dom::helpers::window()
            .local_storage()
            .ok()
            .flatten()
        {
            storage
                .set_item(THEME_STORAGE_KEY, next.storage_value())
                .unwrap_or_default();
        }
    };

    let back_to_top = move |_| {
        #[cfg(feature = "hydrate")]
        {
            let options = web_sys::ScrollToOptions::new();
            options.set_top(0.0);
            options.set_behavior(web_sys::ScrollBehavior::Smooth);
            leptos::leptos_dom::helpers::window().scroll_to_with_scroll_to_options(&options);
        }
    };

    let sign_out = move |_| {
        spawn_local(async move {
            let _ = logout().await;
            let navigate = use_navigate();
            navigate("/login", NavigateOptions::default());
        });
    };

    let name = chapter_name.clone();
    let page = Resource::new(move || name.clone(), |name| get_chapter_page(name));
    let name = chapter_name.clone();
    let leaderboard = Resource::new(move || name.clone(), |name| get_chapter_leaderboard(name));
    let name = chapter_name.clone();
    let dashboard = Resource::new(move || name.clone(), |name| get_dashboard(name));
    let name = chapter_name.clone();
    let result_card = Resource::new(move || name.clone(), |name| get_result_card(name));

    let user_name = user
        .display_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());
    let current_user_id = user.id.clone();

    view! {
        <div class=move || format!("dashboard {}", theme.get().body_class())>
            <header class="top-bar">
                <div class="profile">
                    {user
                        .photo_url
                        .clone()
                        .map(|src| {
                            view! {
                                <img id="user-profile-pic" src=src alt="Profile Picture" />
                            }
                        })}
                    <div>
                        <p id="user-display-name">{user_name}</p>
                        <p id="user-email">{user.email.clone().unwrap_or_default()}</p>
                    </div>
                </div>
                <input
                    id="search-bar"
                    type="search"
                    placeholder="খুঁজুন..."
                    prop:value=move || search.get()
                    on:input=move |ev| search.set(event_target_value(&ev))
                />
                <button id="dark-mode-toggle" on:click=toggle_theme>
                    <i class=move || theme.get().toggle_icon()></i>
                </button>
                <button id="formula-sheet-btn" on:click=move |_| formula_open.set(true)>
                    "সূত্র তালিকা"
                </button>
                <button id="sign-out-btn" on:click=sign_out>
                    "Logout"
                </button>
            </header>

            <h1 class="chapter-title">{chapter_name.clone()}</h1>

            <SearchableSection title="কুইজ সেট" search=search>
                <Suspense fallback=|| view! { "লোড হচ্ছে..." }>
                    {move || {
                        page.with(|p_res| match p_res {
                            Some(Ok(page)) => view! { <QuizSetLinks page=page.clone() /> }.into_any(),
                            _ => view! {}.into_any(),
                        })
                    }}
                </Suspense>
            </SearchableSection>

            <SearchableSection title="আমার অগ্রগতি" search=search>
                <Suspense fallback=|| view! { "লোড হচ্ছে..." }>
                    {move || {
                        dashboard
                            .with(|d_res| match d_res {
                                Some(Ok(summary)) => {
                                    view! { <ProgressPanel summary=summary.clone() /> }.into_any()
                                }
                                Some(Err(e)) => {
                                    log!("Dashboard unavailable: {}", e);
                                    view! { <p>"ড্যাশবোর্ড লোড করা যায়নি।"</p> }.into_any()
                                }
                                None => view! {}.into_any(),
                            })
                    }}
                </Suspense>
                <AnswersChart dashboard=dashboard theme=theme />
                <p id="challenge-text" class="daily-challenge">
                    {move || challenge.get().unwrap_or_default()}
                </p>
            </SearchableSection>

            <SearchableSection title="লিডারবোর্ড" search=search>
                <table class="leaderboard">
                    <thead>
                        <tr>
                            <th>"র\u{200d}্যাঙ্ক"</th>
                            <th>"নাম"</th>
                            <th>"স্কোর"</th>
                            <th></th>
                        </tr>
                    </thead>
                    <tbody id="leaderboard-body">
                        <Suspense fallback=|| {
                            view! { <MessageRow text="লিডারবোর্ড লোড হচ্ছে..." /> }
                        }>
                            {
                                let current_user_id = current_user_id.clone();
                                move || {
                                    let current_user_id = current_user_id.clone();
                                    leaderboard
                                        .with(move |l_res| match l_res {
                                            Some(Ok(LeaderboardView::Ranked(entries))) => {
                                                view! {
                                                    <LeaderboardRows
                                                        entries=entries.clone()
                                                        current_user_id=current_user_id
                                                    />
                                                }
                                                    .into_any()
                                            }
                                            Some(Ok(LeaderboardView::NoEntries)) => {
                                                view! {
                                                    <MessageRow text="এই অধ্যায়ের জন্য কোনো স্কোর পাওয়া যায়নি।" />
                                                }
                                                    .into_any()
                                            }
                                            Some(Err(_)) => {
                                                view! {
                                                    <MessageRow text="ত্রুটি: লিডারবোর্ড লোড করা যায়নি।" />
                                                }
                                                    .into_any()
                                            }
                                            None => view! {}.into_any(),
                                        })
                                }
                            }
                        </Suspense>
                    </tbody>
                </table>
            </SearchableSection>

            <SearchableSection title="আমার রেজাল্ট" search=search>
                <Suspense fallback=|| view! { "লোড হচ্ছে..." }>
                    {move || {
                        result_card
                            .with(|r_res| match r_res {
                                Some(Ok(ResultCardState::Card(card))) => {
                                    view! { <ResultCardView card=card.clone() /> }.into_any()
                                }
                                Some(Ok(ResultCardState::NoResultYet)) => {
                                    view! {
                                        <p id="no-result-message">
                                            "এই অধ্যায়ে আপনার এখনো কোনো রেজাল্ট নেই। একটি কুইজ দিয়ে শুরু করো!"
                                        </p>
                                    }
                                        .into_any()
                                }
                                Some(Err(_)) => {
                                    view! {
                                        <p style="text-align: center;">
                                            "রেজাল্ট লোড করা সম্ভব হয়নি। অনুগ্রহ করে আবার চেষ্টা করুন।"
                                        </p>
                                    }
                                        .into_any()
                                }
                                None => view! {}.into_any(),
                            })
                    }}
                </Suspense>
            </SearchableSection>

            <FormulaModal page=page open=formula_open />

            <button
                id="back-to-top"
                style:display=move || if show_back_to_top.get() { "block" } else { "none" }
                on:click=back_to_top
            >
                <i class="fa-solid fa-arrow-up"></i>
            </button>
        </div>
    }
}

/// A page card hidden while the search query matches neither its title nor its text.
#[component]
fn SearchableSection(
    title: &'static str,
    search: RwSignal<String>,
    children: Children,
) -> impl IntoView {
    let node_ref = NodeRef::<leptos::html::Section>::new();
    let display = move || {
        let query = search.get();
        if query.is_empty() {
            return "";
        }
        let content = node_ref
            .get()
            .and_then(|el| el.text_content())
            .unwrap_or_default();
        if section_matches(&query, title, &content) {
            ""
        } else {
            "none"
        }
    };

    view! {
        <section class="card" node_ref=node_ref style:display=display>
            <h2>{title}</h2>
            {children()}
        </section>
    }
}

#[component]
fn QuizSetLinks(page: ChapterPage) -> impl IntoView {
    if page.quiz_sets.is_empty() {
        return view! { <p>"এই অধ্যায়ে এখনো কোনো কুইজ নেই।"</p> }.into_any();
    }
    view! {
        <div id="quiz-sets">
            <div class="link-container">
                {page
                    .quiz_sets
                    .into_iter()
                    .map(|quiz| view! { <a href=quiz.href>{quiz.title}</a> })
                    .collect_view()}
            </div>
        </div>
    }
    .into_any()
}

#[component]
fn ProgressPanel(summary: DashboardSummary) -> impl IntoView {
    let width = format!("{}%", summary.percentage);
    view! {
        <div class="progress">
            <div class="progress-track">
                <div id="chapter-progress-bar" class="progress-bar" style:width=width></div>
            </div>
            <p id="chapter-progress-text">{summary.progress_text()}</p>
        </div>
        <ChartLegend series=summary.answers.clone() />
        <div id="achievements-container" class="achievements">
            {summary
                .achievements
                .into_iter()
                .map(|badge| view! { <Badge badge=badge /> })
                .collect_view()}
        </div>
    }
}

#[component]
fn Badge(badge: AchievementBadge) -> impl IntoView {
    view! {
        <div
            class="achievement-badge"
            class:unlocked=badge.unlocked
            title=format!("{} - {}", badge.title, badge.description)
        >
            <i class=format!("fa-solid {}", badge.icon)></i>
            <span>{badge.title.clone()}</span>
        </div>
    }
}

#[component]
fn ChartLegend(series: PieSeries) -> impl IntoView {
    view! {
        <ul class="chart-legend">
            {series
                .labels
                .into_iter()
                .zip(series.colors)
                .zip(series.values)
                .map(|((label, color), value)| {
                    let shown = if series.bordered { format!("{}: {}", label, value) } else { label };
                    view! {
                        <li>
                            <span class="swatch" style:background-color=color></span>
                            {shown}
                        </li>
                    }
                })
                .collect_view()}
        </ul>
    }
}

/// Canvas pie of correct vs wrong answers. The previous chart is released before every redraw.
#[component]
fn AnswersChart(
    dashboard: Resource<Result<DashboardSummary, ServerFnError<NoCustomError>>>,
    theme: RwSignal<Theme>,
) -> impl IntoView {
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    #[cfg(feature = "hydrate")]
    {
        let slot = StoredValue::new_local(ChartSlot::<CanvasPie>::new());
        Effect::new(move || {
            let border = theme.get().chart_border();
            let Some(series) = dashboard.with(|d_res| match d_res {
                Some(Ok(summary)) => Some(summary.answers.clone()),
                _ => None,
            }) else {
                return;
            };
            let Some(canvas) = canvas_ref.get() else {
                return;
            };
            slot.update_value(|slot| {
                if let Err(e) = slot.replace(|| CanvasPie::draw(canvas, &series, border)) {
                    error!("Could not draw answers chart: {}", e);
                }
            });
        });
    }
    #[cfg(not(feature = "hydrate"))]
    let _ = (dashboard, theme);

    view! {
        <div class="chart-container">
            <canvas id="quiz-pie-chart" node_ref=canvas_ref></canvas>
        </div>
    }
}

#[component]
fn MessageRow(text: &'static str) -> impl IntoView {
    view! {
        <tr>
            <td colspan="4" style="text-align:center; padding: 20px;">
                {text}
            </td>
        </tr>
    }
}

#[component]
fn LeaderboardRows(entries: Vec<LeaderboardEntry>, current_user_id: String) -> impl IntoView {
    let expanded = RwSignal::new(ExpandedRow::default());

    entries
        .into_iter()
        .map(|entry| {
            let id = entry.user_id.clone();
            let is_open = {
                let id = id.clone();
                move || expanded.with(|row| row.is_expanded(&id))
            };
            let is_open_icon = is_open.clone();
            let toggle = move |_| expanded.update(|row| row.toggle(&id));
            let is_me = entry.user_id == current_user_id;

            view! {
                <tr class="leaderboard-row" class:current-user=is_me>
                    <td>
                        {entry
                            .medal
                            .map(|medal| {
                                view! {
                                    <i class=medal.icon_class() style:color=medal.color()></i>
                                    " "
                                }
                            })}
                        {entry.rank}
                    </td>
                    <td>{entry.display_name.clone()}</td>
                    <td>
                        <strong>{entry.score}</strong>
                    </td>
                    <td>
                        <button
                            class="toggle-details-btn"
                            aria-label="বিস্তারিত দেখুন"
                            on:click=toggle
                        >
                            <i class=move || {
                                if is_open_icon() { "fas fa-chevron-up" } else { "fas fa-chevron-down" }
                            }></i>
                        </button>
                    </td>
                </tr>
                <tr
                    class="details-row"
                    style:display=move || if is_open() { "table-row" } else { "none" }
                >
                    <td colspan="4">
                        <div class="details-content">
                            <ul>
                                {if entry.breakdown.is_empty() {
                                    view! { <li>"কোনো বিস্তারিত স্কোর নেই।"</li> }.into_any()
                                } else {
                                    entry
                                        .breakdown
                                        .iter()
                                        .map(|line| {
                                            view! {
                                                <li>
                                                    <span class="label">{format!("{}:", line.label)}</span>
                                                    {format!(" {}/{}", line.score, line.total_questions)}
                                                </li>
                                            }
                                        })
                                        .collect_view()
                                        .into_any()
                                }}
                            </ul>
                        </div>
                    </td>
                </tr>
            }
        })
        .collect_view()
}

#[component]
fn ResultCardView(card: ResultCard) -> impl IntoView {
    let copied = RwSignal::new(false);
    let share_text = card.share_text.clone();

    let copy_share_text = move |_| {
        let text = share_text.clone();
        spawn_local(async move {
            #[cfg(feature = "hydrate")]
            {
                let clipboard = leptos::leptos_dom::helpers::window()
                    .navigator()
                    .clipboard();
                match wasm_bindgen_futures::JsFuture::from(clipboard.write_text(&text)).await {
                    Ok(_) => {
                        copied.set(true);
                        gloo_timers::future::TimeoutFuture::new(2_000).await;
                        copied.set(false);
                    }
                    Err(e) => error!("Clipboard write failed: {:?}", e),
                }
            }
            #[cfg(not(feature = "hydrate"))]
            let _ = (text, copied);
        });
    };

    view! {
        <div id="result-card-container">
            <div class="result-card">
                <div class="result-header">
                    <img src=card.photo_url.clone() alt="Profile Picture" class="result-profile-pic" />
                    <h3 class="result-user-name">{card.display_name.clone()}</h3>
                </div>
                <p class="result-chapter-name">{format!("অধ্যায়: {}", card.chapter_label)}</p>
                <div class="result-details">
                    <div class="result-item">
                        <h4>"মোট স্কোর"</h4>
                        <p>{card.score}</p>
                    </div>
                    <div class="result-item">
                        <h4>"র\u{200d}্যাঙ্ক"</h4>
                        <p>{format!("#{}", card.rank)}</p>
                    </div>
                </div>
                <div class="result-share">
                    <p>"আপনার রেজাল্ট শেয়ার করুন!"</p>
                    <div class="share-buttons">
                        <a href=card.whatsapp_url.clone() target="_blank" class="share-btn whatsapp">
                            <i class="fab fa-whatsapp"></i>
                            " WhatsApp"
                        </a>
                        <a href=card.facebook_url.clone() target="_blank" class="share-btn facebook">
                            <i class="fab fa-facebook-f"></i>
                            " Facebook"
                        </a>
                        <button class="share-btn copy" on:click=copy_share_text>
                            <i class="fa-solid fa-copy"></i>
                            {move || if copied.get() { " কপি হয়েছে!" } else { " কপি করুন" }}
                        </button>
                    </div>
                    {card
                        .qr_svg
                        .clone()
                        .map(|svg| view! { <div class="result-qr" inner_html=svg></div> })}
                </div>
            </div>
        </div>
    }
}

#[component]
fn FormulaModal(
    page: Resource<Result<ChapterPage, ServerFnError<NoCustomError>>>,
    open: RwSignal<bool>,
) -> impl IntoView {
    view! {
        <div
            id="formula-modal"
            class="modal"
            class:active=move || open.get()
            on:click=move |ev| {
                if ev.target() == ev.current_target() {
                    open.set(false);
                }
            }
        >
            <div class="modal-content">
                <button class="modal-close-btn" on:click=move |_| open.set(false)>
                    "×"
                </button>
                <h2>"সূত্র তালিকা"</h2>
                <Suspense>
                    {move || {
                        page.with(|p_res| match p_res {
                            Some(Ok(page)) if !page.formulas.is_empty() => {
                                view! {
                                    <ul>
                                        {page
                                            .formulas
                                            .iter()
                                            .map(|formula| view! { <li>{formula.clone()}</li> })
                                            .collect_view()}
                                    </ul>
                                }
                                    .into_any()
                            }
                            _ => view! { <p>"এই অধ্যায়ের কোনো সূত্র তালিকা নেই।"</p> }.into_any(),
                        })
                    }}
                </Suspense>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_state_round_trips_through_server_fn_encoding() {
        let state = AuthState::SignedOut {
            login_url: "/login".to_string(),
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(serde_json::from_str::<AuthState>(&json).unwrap(), state);
    }

    #[test]
    fn test_usable_chapter_name() {
        assert_eq!(usable_chapter_name(None), None);
        assert_eq!(usable_chapter_name(Some("  ".to_string())), None);
        // Names that normalize to nothing go to the missing-chapter alert.
        assert_eq!(usable_chapter_name(Some(",".to_string())), None);
        assert_eq!(usable_chapter_name(Some(" , ,\t".to_string())), None);
        assert_eq!(
            usable_chapter_name(Some("Biology Genetics".to_string())),
            Some("Biology Genetics".to_string())
        );
    }
}
