use super::rotation_metrics::RotationMetricsRecorder;
use crate::shared::error::AppError;
use crate::shared::metrics::SignalCounters;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tokio::task::JoinHandle;

const CONTENT_TYPE: &str = "text/plain; version=0.0.4";
const METRICS_PATH: &str = "/metrics";

/// ランキングのメトリクスを `/metrics` で公開する HTTP エクスポーター。
///
/// スクレイプのたびにエンゲージメントキューのカウンターを反映してから
/// エンコードするので、ローテーションの合間でもキューの状態は最新になる。
pub struct MetricsExporter {
    server: Arc<Server>,
    local_addr: SocketAddr,
}

impl MetricsExporter {
    /// `address` で待ち受ける。ポート 0 なら空きポートを使う。
    pub fn bind(address: &str) -> Result<Self, AppError> {
        let server = Server::http(address).map_err(|err| {
            AppError::ConfigurationError(format!("failed to bind metrics exporter {address}: {err}"))
        })?;
        let local_addr = server.server_addr().to_ip().ok_or_else(|| {
            AppError::ConfigurationError(format!("metrics exporter {address} is not a TCP socket"))
        })?;

        Ok(Self {
            server: Arc::new(server),
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// ブロッキングスレッドでリクエストを処理する。`shutdown` でループを抜ける。
    pub fn serve(
        &self,
        recorder: Arc<RotationMetricsRecorder>,
        signals: Option<Arc<SignalCounters>>,
    ) -> JoinHandle<()> {
        let server = Arc::clone(&self.server);
        let local_addr = self.local_addr;

        tokio::task::spawn_blocking(move || {
            tracing::info!(
                target: "metrics::ranking",
                address = %local_addr,
                "prometheus exporter listening"
            );
            for request in server.incoming_requests() {
                if let Some(signals) = &signals {
                    recorder.observe_signals(&signals.snapshot());
                }
                let response = render(&request, &recorder);
                if let Err(err) = request.respond(response) {
                    tracing::warn!(
                        target: "metrics::ranking",
                        error = %err,
                        "failed to respond to metrics request"
                    );
                }
            }
            tracing::info!(target: "metrics::ranking", "prometheus exporter stopped");
        })
    }

    pub fn shutdown(&self) {
        self.server.unblock();
    }
}

fn render(request: &Request, recorder: &RotationMetricsRecorder) -> Response<Cursor<Vec<u8>>> {
    let path = request.url().split('?').next().unwrap_or_default();
    if request.method() != &Method::Get || path != METRICS_PATH {
        return Response::from_string("not found").with_status_code(StatusCode(404));
    }

    match recorder.encode() {
        Ok(body) => {
            let response = Response::from_data(body).with_status_code(StatusCode(200));
            match Header::from_bytes("Content-Type", CONTENT_TYPE) {
                Ok(header) => response.with_header(header),
                Err(()) => response,
            }
        }
        Err(err) => {
            tracing::error!(
                target: "metrics::ranking",
                error = %err,
                "failed to encode metrics payload"
            );
            Response::from_string("failed to encode metrics").with_status_code(StatusCode(500))
        }
    }
}
