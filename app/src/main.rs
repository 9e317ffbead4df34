use settings::Settings;

use crate::adapter::pvnode::PVNode;
use crate::coordinator::ForecastCoordinator;

mod adapter;
mod api;
mod coordinator;
mod core;
mod diagnostics;
mod forecast;
mod monitoring;
mod sensor;
mod settings;

#[tokio::main(flavor = "multi_thread")]
pub async fn main() {
    let settings = Settings::new().expect("Error reading configuration");
    settings.monitoring.init().expect("Error initializing monitoring");

    let pvnode = PVNode::new(settings.pvnode.clone()).expect("Error initializing PVNode client");
    let (coordinator, estimate_rx) = ForecastCoordinator::new(pvnode, settings.poll_interval.clone());

    let http_server_exec = {
        let http_server = settings.http_server.clone();
        let pvnode_settings = settings.pvnode.clone();

        async move {
            http_server
                .run_server(move || {
                    vec![api::new_web_service(pvnode_settings.clone(), estimate_rx.clone())]
                })
                .await
                .expect("HTTP server execution failed");
        }
    };

    tracing::info!(
        "Starting forecast polling every {}",
        settings.poll_interval.to_iso_string()
    );

    tokio::select!(
        _ = coordinator.run() => {},
        _ = http_server_exec => {},
    );
}
