#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() {
    use axum::Router;
    use chapter_dashboard::app::*;
    use chapter_dashboard::config::AppConfig;
    use chapter_dashboard::content::Catalog;
    use chapter_dashboard::{init_schema, SqlitePragmas};
    use diesel::r2d2::{ConnectionManager, Pool};
    use diesel::SqliteConnection;
    use leptos::logging::log;
    use leptos::prelude::*;
    use leptos_axum::{generate_route_list, LeptosRoutes};
    use std::sync::Arc;

    let config = AppConfig::from_env().expect("DATABASE_URL must be set in .env.");

    let manager = ConnectionManager::<SqliteConnection>::new(&config.database_url);
    let pool: DbPool = Pool::builder()
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
        .expect("Failed to create pool.");
    {
        let mut conn = pool.get().expect("Failed to get a connection.");
        init_schema(&mut conn).expect("Failed to create the schema.");
    }

    let catalog = Arc::new(Catalog::load(&config.catalog_path).unwrap_or_else(|e| {
        leptos::logging::warn!("Serving without a chapter catalog: {}", e);
        Catalog::default()
    }));
    log!("Loaded {} chapters", catalog.chapters.len());

    let conf = get_configuration(None).unwrap();
    let addr = conf.leptos_options.site_addr;
    let leptos_options = conf.leptos_options;
    // Generate the list of routes in your Leptos App
    let routes = generate_route_list(App);

    let leptos_options_clone = leptos_options.clone();
    let app = Router::new()
        .leptos_routes_with_context(
            &leptos_options,
            routes,
            // Provide the pool, settings and catalog for server functions.
            move || {
                provide_context(pool.clone());
                provide_context(config.clone());
                provide_context(Arc::clone(&catalog));
            },
            move || shell(leptos_options_clone.clone()),
        )
        .fallback(leptos_axum::file_and_error_handler(shell))
        .with_state(leptos_options.clone());

    log!("listening on http://{}", &addr);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}

#[cfg(not(feature = "ssr"))]
pub fn main() {
    // no client-side main function
    // see lib.rs for hydration function instead
}
