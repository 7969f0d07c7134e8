#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use eframe::egui;
use std::sync::{Arc, Mutex};
use tr::{tr, tr_init};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use wol_hosts::app::WolHostsApp;
use wol_hosts::config::Config;
use wol_hosts::logic::{HostListController, HostStore, SharedState, SharedTracker};
use wol_hosts::model::{AppState, StatusTracker};
use wol_hosts::service::{HttpApi, MemoryApi, SharedApi, auth};

fn main() -> eframe::Result {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    // Requests, the poller and the capability lookup run here; the runtime
    // lives until the window closes.
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("wol_hosts-worker")
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Unable to start the async runtime: {}", e);
            std::process::exit(1);
        }
    };
    let handle = runtime.handle().clone();

    let api: SharedApi = if config.offline {
        info!("offline mode, hosts are kept in memory");
        Arc::new(MemoryApi::new().with_capabilities(&[
            config.capabilities.manage_hosts.as_str(),
            config.capabilities.wake.as_str(),
        ]))
    } else {
        match HttpApi::new(&config) {
            Ok(api) => Arc::new(api),
            Err(e) => {
                error!("Unable to create the HTTP client: {}", e);
                std::process::exit(1);
            }
        }
    };
    info!(
        management_url = %config.management_url,
        collection = %config.collection,
        "starting host list"
    );

    let (authorization, _resolver) = auth::spawn_resolver(api.clone(), config.auth_ttl(), &handle);
    let store = HostStore::new(api, handle.clone());
    let tracker: SharedTracker = Arc::new(Mutex::new(StatusTracker::new()));
    let state: SharedState = Arc::new(Mutex::new(AppState::default()));
    let controller = HostListController::new(store, tracker, state, authorization, config, handle);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(tr!("Wake-on-LAN hosts"))
            .with_inner_size([900.0, 560.0])
            .with_resizable(true),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };

    tr_init!("./locales");

    let result = eframe::run_native(
        "wol_hosts",
        options,
        Box::new(|cc| Ok(Box::new(WolHostsApp::new(cc, controller)))),
    );
    runtime.shutdown_background();
    result
}
