//! Axum web server with WebSocket streaming of renderer commands.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tower_http::cors::CorsLayer;

use topolab_decoder::{decode_from, Layer, Protocol};
use topolab_protocols::{stp, vlan, vxlan, VxlanView};
use topolab_topology::{
    DeviceKind, EdgeId, InterfaceId, Job, NodeId, Point, StpMode, TopologySnapshot, VlanMode,
};

use crate::backend::{run_emulation, EmulationBackend};
use crate::capture::{CaptureRef, CaptureViewer};
use crate::config::VisConfig;
use crate::error::{Error, Result};
use crate::events::RenderCommand;
use crate::forms::Form;
use crate::playback::{PlaybackSpeed, PlaybackStatus};
use crate::session::{EmulationTicket, Session, SessionStatus};

/// Renderer commands buffered per WebSocket subscriber.
const EVENT_CAPACITY: usize = 1024;

/// Shared application state.
pub struct AppState {
    session: RwLock<Session>,
    backend: Arc<dyn EmulationBackend>,
    events: broadcast::Sender<RenderCommand>,
    config: VisConfig,
}

impl AppState {
    /// Run `edit` under the session write lock and publish what it produced.
    async fn apply<T>(&self, edit: impl FnOnce(&mut Session) -> T) -> T {
        let mut session = self.session.write().await;
        let out = edit(&mut session);
        self.publish(&mut session);
        out
    }

    fn publish(&self, session: &mut Session) {
        for command in session.drain_commands() {
            // Sending fails only when nobody is subscribed
            let _ = self.events.send(command);
        }
    }

    /// Receive every renderer command published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RenderCommand> {
        self.events.subscribe()
    }

    /// Current session status.
    pub async fn status(&self) -> SessionStatus {
        self.session.read().await.status()
    }
}

/// Control surface server.
pub struct VisServer {
    state: Arc<AppState>,
}

impl VisServer {
    /// Create a server around an empty session.
    pub fn new(config: VisConfig, backend: Arc<dyn EmulationBackend>) -> Self {
        let session = Session::new(config.playback.clone());
        Self::with_session(config, backend, session)
    }

    /// Create a server around an existing session.
    pub fn with_session(
        config: VisConfig,
        backend: Arc<dyn EmulationBackend>,
        session: Session,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(AppState {
                session: RwLock::new(session),
                backend,
                events,
                config,
            }),
        }
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Build the router for the server.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/status", get(status_handler))
            .route("/api/notice/dismiss", post(dismiss_notice_handler))
            // Topology
            .route("/api/topology", get(topology_handler).put(replace_topology_handler))
            .route("/api/topology/save", post(save_handler))
            .route("/api/nodes", post(add_node_handler))
            .route("/api/nodes/{id}", delete(remove_node_handler))
            .route("/api/nodes/{id}/position", put(move_node_handler))
            .route("/api/nodes/{id}/form", get(form_handler).post(submit_form_handler))
            .route("/api/edges", post(add_edge_handler))
            .route("/api/edges/{id}", delete(remove_edge_handler))
            .route("/api/edges/{id}/impairment", put(impairment_handler))
            .route("/api/jobs", post(add_job_handler))
            .route("/api/jobs/{id}", delete(remove_job_handler))
            // VLAN
            .route("/api/nodes/{id}/vlan", put(vlan_switch_handler))
            .route(
                "/api/nodes/{id}/interfaces/{iface}/vlan",
                put(vlan_assign_handler).delete(vlan_clear_handler),
            )
            // VXLAN
            .route("/api/nodes/{id}/vxlan", get(vxlan_view_handler))
            .route("/api/nodes/{id}/vxlan/clients", post(vxlan_add_client_handler))
            .route(
                "/api/nodes/{id}/vxlan/clients/{iface}",
                delete(vxlan_remove_client_handler),
            )
            .route("/api/nodes/{id}/vxlan/tunnels", post(vxlan_add_tunnel_handler))
            .route(
                "/api/nodes/{id}/vxlan/tunnels/{iface}/{vni}/{remote}",
                delete(vxlan_remove_tunnel_handler),
            )
            // Spanning tree
            .route("/api/nodes/{id}/stp", put(stp_mode_handler))
            .route("/api/nodes/{id}/stp/instances", post(stp_add_instance_handler))
            .route(
                "/api/nodes/{id}/stp/instances/{instance}",
                put(stp_update_instance_handler).delete(stp_remove_instance_handler),
            )
            .route("/api/nodes/{id}/stp/region", put(stp_region_handler))
            // Emulation and captures
            .route("/api/emulate", post(emulate_handler))
            .route("/api/captures", get(captures_handler))
            .route("/api/captures/select", post(select_frame_handler))
            .route("/api/captures/{interface}", post(load_capture_handler))
            .route("/api/decode", post(decode_handler))
            // Playback
            .route("/api/playback", get(playback_status_handler))
            .route("/api/playback/play", post(play_handler))
            .route("/api/playback/pause", post(pause_handler))
            .route("/api/playback/stop", post(stop_handler))
            .route("/api/playback/seek", post(seek_handler))
            .route("/api/playback/speed", post(speed_handler))
            // WebSocket for renderer commands
            .route("/ws", get(ws_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Run the server and the playback clock until the listener fails.
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.state.config.addr).await?;
        tracing::info!("Control surface running on http://{}", self.state.config.addr);
        let ticker = spawn_ticker(self.state.clone());
        let served = axum::serve(listener, self.router()).await;
        ticker.abort();
        served.map_err(Error::from)
    }
}

/// Drive playback at the configured frame interval.
fn spawn_ticker(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(state.config.frame_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = Instant::now();
        loop {
            interval.tick().await;
            let now = Instant::now();
            let elapsed = now - last;
            last = now;

            let mut session = state.session.write().await;
            session.tick(elapsed);
            state.publish(&mut session);
        }
    })
}

/// Run an emulation for `ticket` and record its outcome in the session.
pub async fn run_and_record(state: Arc<AppState>, ticket: EmulationTicket) -> bool {
    let outcome = run_emulation(
        state.backend.as_ref(),
        &ticket.snapshot,
        state.config.poll_interval,
    )
    .await;
    let mut session = state.session.write().await;
    let loaded = session.finish_emulation(ticket, outcome);
    state.publish(&mut session);
    loaded
}

type AppResult<T> = Result<Json<T>>;

#[derive(Serialize)]
struct Created {
    id: String,
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Json<SessionStatus> {
    Json(state.status().await)
}

async fn dismiss_notice_handler(State(state): State<Arc<AppState>>) -> Json<SessionStatus> {
    let mut session = state.session.write().await;
    session.dismiss_notice();
    Json(session.status())
}

// -- topology --

async fn topology_handler(State(state): State<Arc<AppState>>) -> Json<TopologySnapshot> {
    Json(state.session.read().await.topology().snapshot())
}

async fn replace_topology_handler(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<TopologySnapshot>,
) -> AppResult<SessionStatus> {
    state
        .apply(|session| {
            session.replace_topology(snapshot)?;
            Ok(Json(session.status()))
        })
        .await
}

async fn save_handler(State(state): State<Arc<AppState>>) -> Result<StatusCode> {
    let snapshot = state.session.read().await.topology().snapshot();
    if let Err(err) = state.backend.save(&snapshot).await {
        state.session.write().await.report_failure("save", &err);
        return Err(err);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct NewNode {
    kind: DeviceKind,
    #[serde(default)]
    label: Option<String>,
    x: f64,
    y: f64,
}

async fn add_node_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewNode>,
) -> (StatusCode, Json<Created>) {
    let label = req.label.unwrap_or_else(|| req.kind.as_str().to_string());
    let id = state
        .apply(|session| session.add_node(req.kind, &label, Point::new(req.x, req.y)))
        .await;
    (StatusCode::CREATED, Json(Created { id: id.to_string() }))
}

async fn remove_node_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .apply(|session| session.remove_node(&NodeId::new(id)).map(|_| StatusCode::NO_CONTENT))
        .await
}

#[derive(Deserialize)]
struct Position {
    x: f64,
    y: f64,
}

async fn move_node_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(pos): Json<Position>,
) -> Result<StatusCode> {
    state
        .apply(|session| {
            session.move_node(&NodeId::new(id), Point::new(pos.x, pos.y))?;
            Ok(StatusCode::NO_CONTENT)
        })
        .await
}

async fn form_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Form> {
    state.session.read().await.form(&NodeId::new(id)).map(Json)
}

async fn submit_form_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(values): Json<BTreeMap<String, String>>,
) -> AppResult<Form> {
    let id = NodeId::new(id);
    state
        .apply(|session| {
            session.submit_form(&id, &values)?;
            session.form(&id).map(Json)
        })
        .await
}

#[derive(Deserialize)]
struct NewEdge {
    source: NodeId,
    target: NodeId,
}

async fn add_edge_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewEdge>,
) -> Result<(StatusCode, Json<Created>)> {
    let id = state
        .apply(|session| session.add_edge(&req.source, &req.target))
        .await?;
    Ok((StatusCode::CREATED, Json(Created { id: id.to_string() })))
}

async fn remove_edge_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .apply(|session| session.remove_edge(&EdgeId::new(id)).map(|_| StatusCode::NO_CONTENT))
        .await
}

#[derive(Deserialize)]
struct Impairment {
    loss: f64,
    duplicate: f64,
}

async fn impairment_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<Impairment>,
) -> Result<StatusCode> {
    state
        .apply(|session| {
            session.set_impairment(&EdgeId::new(id), req.loss, req.duplicate)?;
            Ok(StatusCode::NO_CONTENT)
        })
        .await
}

async fn add_job_handler(
    State(state): State<Arc<AppState>>,
    Json(job): Json<Job>,
) -> Result<StatusCode> {
    state
        .apply(|session| session.add_job(job).map(|_| StatusCode::CREATED))
        .await
}

async fn remove_job_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.apply(|session| session.remove_job(&id)).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// -- VLAN --

#[derive(Deserialize)]
struct VlanSwitch {
    enabled: bool,
}

async fn vlan_switch_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<VlanSwitch>,
) -> Result<StatusCode> {
    state
        .apply(|session| {
            session.configure(&NodeId::new(id), |node| vlan::set_vlan_enabled(node, req.enabled))?;
            Ok(StatusCode::NO_CONTENT)
        })
        .await
}

#[derive(Deserialize)]
struct VlanAssign {
    mode: VlanMode,
    value: String,
}

async fn vlan_assign_handler(
    State(state): State<Arc<AppState>>,
    Path((id, iface)): Path<(String, String)>,
    Json(req): Json<VlanAssign>,
) -> Result<StatusCode> {
    let iface = InterfaceId::new(iface);
    state
        .apply(|session| {
            session.configure(&NodeId::new(id), |node| {
                vlan::set_interface_vlan(node, &iface, req.mode, &req.value)
            })?;
            Ok(StatusCode::NO_CONTENT)
        })
        .await
}

async fn vlan_clear_handler(
    State(state): State<Arc<AppState>>,
    Path((id, iface)): Path<(String, String)>,
) -> Result<StatusCode> {
    let iface = InterfaceId::new(iface);
    state
        .apply(|session| {
            session.configure(&NodeId::new(id), |node| vlan::clear_interface_vlan(node, &iface))?;
            Ok(StatusCode::NO_CONTENT)
        })
        .await
}

// -- VXLAN --

async fn vxlan_view_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<VxlanView> {
    let session = state.session.read().await;
    let node = session
        .topology()
        .node(&NodeId::new(id.clone()))
        .ok_or(topolab_topology::Error::NodeNotFound(id))?;
    Ok(Json(VxlanView::of(node)?))
}

#[derive(Deserialize)]
struct VxlanClient {
    interface: InterfaceId,
    vni: String,
}

async fn vxlan_add_client_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<VxlanClient>,
) -> Result<StatusCode> {
    state
        .apply(|session| {
            session.configure(&NodeId::new(id), |node| {
                vxlan::add_client(node, &req.interface, &req.vni)
            })?;
            Ok(StatusCode::CREATED)
        })
        .await
}

async fn vxlan_remove_client_handler(
    State(state): State<Arc<AppState>>,
    Path((id, iface)): Path<(String, String)>,
) -> Result<StatusCode> {
    let iface = InterfaceId::new(iface);
    state
        .apply(|session| {
            session.configure(&NodeId::new(id), |node| vxlan::remove_client(node, &iface))?;
            Ok(StatusCode::NO_CONTENT)
        })
        .await
}

#[derive(Deserialize)]
struct VxlanTunnel {
    interface: InterfaceId,
    vni: String,
    remote: String,
}

async fn vxlan_add_tunnel_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<VxlanTunnel>,
) -> Result<StatusCode> {
    state
        .apply(|session| {
            session.configure(&NodeId::new(id), |node| {
                vxlan::add_tunnel(node, &req.interface, &req.vni, &req.remote)
            })?;
            Ok(StatusCode::CREATED)
        })
        .await
}

async fn vxlan_remove_tunnel_handler(
    State(state): State<Arc<AppState>>,
    Path((id, iface, vni, remote)): Path<(String, String, u32, Ipv4Addr)>,
) -> Result<StatusCode> {
    let iface = InterfaceId::new(iface);
    state
        .apply(|session| {
            session.configure(&NodeId::new(id), |node| {
                vxlan::remove_tunnel_entry(node, &iface, vni, remote)
            })?;
            Ok(StatusCode::NO_CONTENT)
        })
        .await
}

// -- spanning tree --

#[derive(Deserialize)]
struct StpModeRequest {
    mode: StpMode,
}

async fn stp_mode_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<StpModeRequest>,
) -> Result<StatusCode> {
    state
        .apply(|session| {
            session.configure(&NodeId::new(id), |node| stp::set_mode(node, req.mode))?;
            Ok(StatusCode::NO_CONTENT)
        })
        .await
}

#[derive(Serialize)]
struct InstanceCreated {
    instance_id: u8,
}

async fn stp_add_instance_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<InstanceCreated>)> {
    let instance_id = state
        .apply(|session| session.configure(&NodeId::new(id), stp::add_instance))
        .await?;
    Ok((StatusCode::CREATED, Json(InstanceCreated { instance_id })))
}

#[derive(Deserialize)]
struct InstanceUpdate {
    #[serde(default)]
    vlans: Option<String>,
    #[serde(default)]
    priority: Option<u32>,
}

async fn stp_update_instance_handler(
    State(state): State<Arc<AppState>>,
    Path((id, instance)): Path<(String, u8)>,
    Json(req): Json<InstanceUpdate>,
) -> Result<StatusCode> {
    state
        .apply(|session| {
            session.configure(&NodeId::new(id), |node| {
                // Priority is checked before the VLAN set is replaced.
                if let Some(priority) = req.priority {
                    stp::set_instance_priority(node, instance, priority)?;
                }
                if let Some(vlans) = &req.vlans {
                    stp::set_instance_vlans(node, instance, vlans)?;
                }
                Ok(())
            })?;
            Ok(StatusCode::NO_CONTENT)
        })
        .await
}

async fn stp_remove_instance_handler(
    State(state): State<Arc<AppState>>,
    Path((id, instance)): Path<(String, u8)>,
) -> Result<StatusCode> {
    state
        .apply(|session| {
            session.configure(&NodeId::new(id), |node| stp::remove_instance(node, instance))?;
            Ok(StatusCode::NO_CONTENT)
        })
        .await
}

#[derive(Deserialize)]
struct Region {
    name: String,
    #[serde(default)]
    revision: u32,
}

async fn stp_region_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<Region>,
) -> Result<StatusCode> {
    state
        .apply(|session| {
            session.configure(&NodeId::new(id), |node| {
                stp::set_region(node, &req.name, req.revision)
            })?;
            Ok(StatusCode::NO_CONTENT)
        })
        .await
}

// -- emulation and captures --

async fn emulate_handler(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SessionStatus>)> {
    let (ticket, status) = {
        let mut session = state.session.write().await;
        let ticket = session.begin_emulation()?;
        (ticket, session.status())
    };
    tokio::spawn(run_and_record(state.clone(), ticket));
    Ok((StatusCode::ACCEPTED, Json(status)))
}

#[derive(Serialize)]
struct CapturesResponse {
    captures: Vec<CaptureRef>,
    viewer: CaptureViewer,
}

async fn captures_handler(State(state): State<Arc<AppState>>) -> Json<CapturesResponse> {
    let session = state.session.read().await;
    Json(CapturesResponse {
        captures: session.capture_refs().to_vec(),
        viewer: session.captures().clone(),
    })
}

async fn load_capture_handler(
    State(state): State<Arc<AppState>>,
    Path(interface): Path<String>,
) -> AppResult<CaptureViewer> {
    let capture = state.session.read().await.capture_ref(&interface)?;
    let frames = state.backend.captures(&capture).await?;

    let mut session = state.session.write().await;
    // The run may have been discarded while the frames were in transit.
    session.capture_ref(&interface)?;
    session.load_capture(&interface, frames);
    Ok(Json(session.captures().clone()))
}

#[derive(Deserialize)]
struct SelectRequest {
    index: usize,
}

async fn select_frame_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectRequest>,
) -> AppResult<Vec<Layer>> {
    state.session.write().await.select_frame(req.index).map(Json)
}

#[derive(Deserialize)]
struct DecodeRequest {
    bytes: String,
    #[serde(default)]
    protocol: Option<Protocol>,
}

async fn decode_handler(Json(req): Json<DecodeRequest>) -> Json<Vec<Layer>> {
    let start = req.protocol.unwrap_or(Protocol::Ethernet);
    Json(decode_from(start, &req.bytes))
}

// -- playback --

async fn playback_status_handler(State(state): State<Arc<AppState>>) -> Json<PlaybackStatus> {
    let session = state.session.read().await;
    Json(PlaybackStatus::from(session.playback()))
}

async fn playback_edit(
    state: &AppState,
    edit: impl FnOnce(&mut Session),
) -> Json<PlaybackStatus> {
    let status = state
        .apply(|session| {
            edit(session);
            PlaybackStatus::from(session.playback())
        })
        .await;
    Json(status)
}

async fn play_handler(State(state): State<Arc<AppState>>) -> Json<PlaybackStatus> {
    playback_edit(&state, Session::play).await
}

async fn pause_handler(State(state): State<Arc<AppState>>) -> Json<PlaybackStatus> {
    playback_edit(&state, Session::pause).await
}

async fn stop_handler(State(state): State<Arc<AppState>>) -> Json<PlaybackStatus> {
    playback_edit(&state, Session::stop).await
}

#[derive(Deserialize)]
struct SeekRequest {
    step: usize,
}

async fn seek_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeekRequest>,
) -> Json<PlaybackStatus> {
    playback_edit(&state, |session| session.seek(req.step)).await
}

#[derive(Deserialize)]
struct SpeedRequest {
    speed: PlaybackSpeed,
}

async fn speed_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeedRequest>,
) -> Json<PlaybackStatus> {
    playback_edit(&state, |session| session.set_speed(req.speed)).await
}

// -- websocket --

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Send `value` as a JSON text frame. Returns false once the peer is gone.
async fn send_json<T: Serialize>(socket: &mut WebSocket, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "unserializable websocket message");
            true
        }
    }
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let mut commands = state.subscribe();

    // Send initial state
    let hello = WsResponse::Status(state.status().await);
    if !send_json(&mut socket, &hello).await {
        return;
    }

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Ok(command) => {
                    if !send_json(&mut socket, &command).await {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "websocket subscriber lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = socket.recv() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<WsCommand>(text.as_str()) {
                        Ok(cmd) => {
                            let response = handle_ws_command(&state, cmd).await;
                            if !send_json(&mut socket, &response).await {
                                break;
                            }
                        }
                        Err(err) => tracing::debug!(error = %err, "ignoring websocket message"),
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsCommand {
    GetStatus,
    Play,
    Pause,
    Stop,
    Seek { step: usize },
    Speed { speed: PlaybackSpeed },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsResponse {
    Status(SessionStatus),
}

async fn handle_ws_command(state: &AppState, cmd: WsCommand) -> WsResponse {
    let status = state
        .apply(|session| {
            match cmd {
                WsCommand::GetStatus => {}
                WsCommand::Play => session.play(),
                WsCommand::Pause => session.pause(),
                WsCommand::Stop => session.stop(),
                WsCommand::Seek { step } => session.seek(step),
                WsCommand::Speed { speed } => session.set_speed(speed),
            }
            session.status()
        })
        .await;
    WsResponse::Status(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::backend::EmulationResult;
    use crate::capture::CaptureFrame;
    use crate::events::{PacketEvent, TrafficStep};
    use crate::playback::PlaybackState;

    fn server(backend: MockBackend) -> VisServer {
        VisServer::new(VisConfig::default(), Arc::new(backend))
    }

    #[test]
    fn router_builds() {
        let server = server(MockBackend::default());
        let _router = server.router();
    }

    #[tokio::test]
    async fn node_lifecycle() {
        let state = server(MockBackend::default()).state();
        let (_, Json(created)) = add_node_handler(
            State(state.clone()),
            Json(NewNode {
                kind: DeviceKind::Switch,
                label: None,
                x: 1.0,
                y: 2.0,
            }),
        )
        .await;

        let Json(snapshot) = topology_handler(State(state.clone())).await;
        assert_eq!(snapshot.0.len(), 1);
        assert_eq!(snapshot.0[0].label, "l2_switch");

        let status = remove_node_handler(State(state.clone()), Path(created.id.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = remove_node_handler(State(state), Path(created.id)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejected_vxlan_edit_is_unprocessable() {
        let state = server(MockBackend::default()).state();
        let (router, iface) = {
            let mut session = state.session.write().await;
            let r = session.add_node(DeviceKind::Router, "r", Point::ORIGIN);
            let h = session.add_node(DeviceKind::Host, "h", Point::new(10.0, 0.0));
            session.add_edge(&r, &h).unwrap();
            let iface = session.topology().node(&r).unwrap().interfaces[0].id.clone();
            (r, iface)
        };

        let ok = vxlan_add_tunnel_handler(
            State(state.clone()),
            Path(router.to_string()),
            Json(VxlanTunnel {
                interface: iface.clone(),
                vni: "100".into(),
                remote: "10.0.0.2".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(ok, StatusCode::CREATED);

        let err = vxlan_add_client_handler(
            State(state.clone()),
            Path(router.to_string()),
            Json(VxlanClient {
                interface: iface,
                vni: "100".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let Json(view) = vxlan_view_handler(State(state), Path(router.to_string()))
            .await
            .unwrap();
        assert_eq!(view.tunnels.len(), 1);
    }

    #[tokio::test]
    async fn stp_instances_over_http() {
        let state = server(MockBackend::default()).state();
        let sw = state
            .session
            .write()
            .await
            .add_node(DeviceKind::Switch, "sw", Point::ORIGIN);
        let id = sw.to_string();

        stp_mode_handler(
            State(state.clone()),
            Path(id.clone()),
            Json(StpModeRequest { mode: StpMode::Mstp }),
        )
        .await
        .unwrap();
        let (_, Json(created)) = stp_add_instance_handler(State(state.clone()), Path(id.clone()))
            .await
            .unwrap();
        assert_eq!(created.instance_id, 1);

        let err = stp_update_instance_handler(
            State(state.clone()),
            Path((id.clone(), 1)),
            Json(InstanceUpdate {
                vlans: Some("10-20".into()),
                priority: Some(1000),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let session = state.session.read().await;
        let node = session.topology().node(&sw).unwrap();
        let instances = stp::instances(node).unwrap();
        assert!(instances[1].vlans.is_empty());
    }

    #[tokio::test]
    async fn emulation_loads_traffic_and_publishes() {
        let mut session = Session::new(Default::default());
        let a = session.add_node(DeviceKind::Host, "a", Point::ORIGIN);
        let b = session.add_node(DeviceKind::Host, "b", Point::new(100.0, 0.0));
        let link = session.add_edge(&a, &b).unwrap();

        let backend = MockBackend {
            processing_polls: 2,
            result: EmulationResult {
                steps: vec![TrafficStep(vec![PacketEvent {
                    id: "p".into(),
                    path: link,
                    source: a,
                    target: b,
                    label: String::new(),
                }])],
                captures: vec![CaptureRef {
                    interface: "a_eth0".into(),
                    file: "pcaps/a_eth0.json".into(),
                }],
            },
            frames: vec![CaptureFrame {
                bytes: "ff ff ff ff ff ff 00 11 22 33 44 55 08 00".into(),
                ascii: String::new(),
            }],
            ..Default::default()
        };
        let config = VisConfig {
            poll_interval: std::time::Duration::from_millis(1),
            ..VisConfig::default()
        };
        let state = VisServer::with_session(config, Arc::new(backend), session).state();
        let mut events = state.subscribe();

        let ticket = state.session.write().await.begin_emulation().unwrap();
        assert!(run_and_record(state.clone(), ticket).await);
        assert_eq!(state.status().await.playback.state, PlaybackState::Loaded);

        let Json(viewer) = load_capture_handler(State(state.clone()), Path("a_eth0".into()))
            .await
            .unwrap();
        assert_eq!(viewer.selected(), Some(0));

        let Json(status) = play_handler(State(state.clone())).await;
        assert_eq!(status.state, PlaybackState::Playing);
        assert!(matches!(events.try_recv(), Ok(RenderCommand::Spawn { marker: 0, .. })));
        assert!(matches!(
            events.try_recv(),
            Ok(RenderCommand::StepStarted { step: 0, packets: 1 })
        ));
    }

    #[tokio::test]
    async fn second_emulation_is_busy() {
        let state = server(MockBackend::default()).state();
        state.session.write().await.begin_emulation().unwrap();
        let err = emulate_handler(State(state)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn failed_submit_leaves_notice() {
        let state = server(MockBackend {
            fail_submit: true,
            ..Default::default()
        })
        .state();
        let ticket = state.session.write().await.begin_emulation().unwrap();
        assert!(!run_and_record(state.clone(), ticket).await);

        let status = state.status().await;
        assert!(!status.busy);
        assert!(status.notice.is_some());

        let Json(status) = dismiss_notice_handler(State(state)).await;
        assert!(status.notice.is_none());
    }

    #[tokio::test]
    async fn decode_endpoint() {
        let Json(layers) = decode_handler(Json(DecodeRequest {
            bytes: "00 35 c3 50 00 08 00 00".into(),
            protocol: Some(Protocol::Udp),
        }))
        .await;
        assert_eq!(layers[0].protocol, Protocol::Udp);
    }

    #[tokio::test]
    async fn ws_commands_drive_playback() {
        let state = server(MockBackend::default()).state();
        let WsResponse::Status(status) =
            handle_ws_command(&state, WsCommand::Speed { speed: PlaybackSpeed::Double }).await;
        assert_eq!(status.playback.speed, PlaybackSpeed::Double);

        let cmd: WsCommand = serde_json::from_str(r#"{"type": "seek", "step": 2}"#).unwrap();
        assert!(matches!(cmd, WsCommand::Seek { step: 2 }));
    }
}
