use anyhow::Result;
use tui_headlines::config::AppConfig;
use tui_headlines::internal::ui::app::App;
use tui_headlines::tui;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first to get logging settings
    let config = AppConfig::load();

    // While the TUI owns the terminal, logs must not reach stdout/stderr, so
    // they go to a daily rotating file. If the terminal cannot be initialized
    // we log to the console instead so the failure is visible.
    match tui::init() {
        Ok(terminal) => {
            let file_appender =
                tracing_appender::rolling::daily(config.log_directory(), "tui-headlines.log");
            let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

            // RUST_LOG takes precedence over the configured levels.
            let env_filter = match std::env::var("RUST_LOG") {
                Ok(_) => tracing_subscriber::EnvFilter::from_default_env(),
                Err(_) => tracing_subscriber::EnvFilter::new(config.logging.filter_directives()),
            };

            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(non_blocking)
                .with_ansi(false)
                .compact()
                .init();

            let mut app = App::new(config);
            let res = app.run(terminal).await;

            tui::restore()?;

            if let Err(err) = res {
                eprintln!("{err:?}");
            }

            Ok(())
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .init();

            eprintln!("Failed to initialize TUI: {e:?}");
            Err(e)
        }
    }
}
