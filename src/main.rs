#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() {
    use hackbox::config::ServerConfig;
    use hackbox::server::{router, spawn_idle_sweeper, AppState};

    hackbox::logging::init();

    let conf = ServerConfig::from_env().expect("server configuration should be valid");
    let addr = conf.site_addr;
    let state = AppState::default();
    spawn_idle_sweeper(state.clone(), conf.session_idle);
    let app = router(state);

    tracing::info!("listening on http://{}", &addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("should be able to bind the site address");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("server should run until shutdown");
}

#[cfg(not(feature = "ssr"))]
pub fn main() {
    // the library is usable on its own; the HTTP server needs the `ssr` feature
}
