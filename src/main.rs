use chirp::api;
use chirp::client::*;
use chirp::domain_model::TweetId;
use chirp::logger::*;
use chirp::server::*;
use chirp::settings::*;
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    debug!(?project_settings);
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&project_settings).await,
        Command::Login { user } => {
            let client = ClientContext::try_new(&project_settings)?;
            client.dev_login(user).await?;
            Ok(())
        }
        Command::Watch { tweets } => watch(&project_settings, tweets).await,
        Command::Toggle { tweet } => toggle(&project_settings, tweet).await,
        Command::Logout => {
            let client = ClientContext::try_new(&project_settings)?;
            client.api.logout().await;
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("could not listen for SIGINT: {}", e);
    }
}

async fn serve(project_settings: &Settings) -> anyhow::Result<()> {
    let address: std::net::SocketAddr = project_settings.http.address.parse()?;
    let server = Arc::new(Server::try_new(project_settings).await?);

    let routes = api::routes(server.clone()).recover(api::recover_error);

    let closing = server.clone();
    let graceful = async move {
        shutdown_signal().await;
        closing.close_streams();
    };

    match (&project_settings.http.cert_path, &project_settings.http.key_path) {
        (Some(cert_path), Some(key_path)) => {
            for path in [cert_path, key_path] {
                if !fs::metadata(path)?.is_file() {
                    return Err(anyhow::anyhow!("TLS file is not a regular file: {:?}", path));
                }
            }
            let (bound, running) = warp::serve(routes)
                .tls()
                .cert_path(cert_path)
                .key_path(key_path)
                .bind_with_graceful_shutdown(address, graceful);
            info!("listening on https://{}", bound);
            running.await;
        }
        (None, None) => {
            let (bound, running) =
                warp::serve(routes).try_bind_with_graceful_shutdown(address, graceful)?;
            info!("listening on http://{}", bound);
            running.await;
        }
        _ => {
            return Err(anyhow::anyhow!(
                "http.cert_path and http.key_path must be set together"
            ));
        }
    }

    let shutdown_timeout = Duration::from_secs(100);
    match tokio::time::timeout(shutdown_timeout, server.shutdown()).await {
        Ok(_) => info!("server shutdown successfully"),
        Err(_) => error!("server shutdown timed out"),
    }

    Ok(())
}

async fn watch(project_settings: &Settings, tweets: Vec<TweetId>) -> anyhow::Result<()> {
    let client = ClientContext::try_new(project_settings)?;
    for tweet_id in &tweets {
        client.board.render(LikeButtonState::new(*tweet_id, false, 0));
    }
    client.toggle.apply_session_state().await;
    client.realtime.connect();
    info!(topic = %client.realtime.topic(), tweets = tweets.len(), "watching like counts");

    let mut status = client.realtime.watch_status();
    let mut last_counts = BTreeMap::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    let interrupted = shutdown_signal();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            biased;
            _ = &mut interrupted => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                info!(state = ?current.state, attempt = current.attempt, "connection");
            }
            _ = ticker.tick() => {
                for tweet_id in &tweets {
                    let count = client
                        .board
                        .renderings_of(*tweet_id)
                        .first()
                        .and_then(|id| client.board.get(*id))
                        .map(|state| state.count);
                    if count.is_some() && last_counts.get(tweet_id) != Some(&count) {
                        info!(tweet_id = %tweet_id, likes = ?count, "likes");
                        last_counts.insert(*tweet_id, count);
                    }
                }
            }
        }
    }

    client.shutdown().await;
    Ok(())
}

async fn toggle(project_settings: &Settings, tweet_id: TweetId) -> anyhow::Result<()> {
    let client = ClientContext::try_new(project_settings)?;
    let button = client.board.render(LikeButtonState::new(tweet_id, false, 0));
    client.toggle.apply_session_state().await;

    match client.toggle.toggle(button).await? {
        ToggleOutcome::Ignored => warn!("not logged in, run `chirp login --user <id>` first"),
        ToggleOutcome::Applied { liked, .. } => info!(tweet_id = %tweet_id, liked, "like toggled"),
    }
    Ok(())
}
