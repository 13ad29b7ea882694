//! Client startup sequence and frame submission
//!
//! The whole life of the client is one fixed sequence: connect, wait for the
//! registry to report the core globals, bind the three we need, create a
//! toplevel surface, attach a filled shared-memory buffer and commit it.
//! After that the process sits in a blocking dispatch loop answering shell
//! pings until the compositor goes away.

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use wayland_client::protocol::{
    wl_buffer, wl_compositor, wl_registry, wl_shell, wl_shell_surface, wl_shm, wl_shm_pool,
    wl_surface,
};
use wayland_client::{delegate_noop, Connection, Dispatch, EventQueue, QueueHandle};

use crate::config::WaypaneConfig;
use crate::shm::ShmCanvas;

/// The registry interfaces the client binds. Everything else advertised by
/// the compositor is logged and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalKind {
    Compositor,
    Shell,
    Shm,
}

/// Map a registry interface name to the global we want, if any.
pub fn classify_global(interface: &str) -> Option<GlobalKind> {
    match interface {
        "wl_compositor" => Some(GlobalKind::Compositor),
        "wl_shell" => Some(GlobalKind::Shell),
        "wl_shm" => Some(GlobalKind::Shm),
        _ => None,
    }
}

/// Globals bound during registry discovery. Each is bound at most once, the
/// first time its interface shows up.
#[derive(Default)]
pub struct ClientState {
    compositor: Option<wl_compositor::WlCompositor>,
    shell: Option<wl_shell::WlShell>,
    shm: Option<wl_shm::WlShm>,
}

/// A connected client displaying one solid-colored pane.
///
/// Construction runs the whole startup sequence; afterwards the context only
/// keeps the protocol handles and the mapped canvas alive. Dropping it
/// unmaps the canvas and releases the connection.
pub struct WaypaneClient {
    conn: Connection,
    event_queue: EventQueue<ClientState>,
    state: ClientState,
    registry: wl_registry::WlRegistry,
    surface: wl_surface::WlSurface,
    shell_surface: wl_shell_surface::WlShellSurface,
    buffer: wl_buffer::WlBuffer,
    canvas: ShmCanvas,
}

impl WaypaneClient {
    /// Connect to the compositor named by `$WAYLAND_DISPLAY` and run the
    /// startup sequence.
    pub fn connect(config: &WaypaneConfig) -> Result<Self> {
        let conn =
            Connection::connect_to_env().context("cannot connect to Wayland display")?;
        info!("🔌 Connected to Wayland display");
        Self::new(conn, config)
    }

    /// Run the fixed startup sequence over an established connection:
    /// registry discovery, surface and shell-surface creation, shared buffer
    /// allocation, and the one-shot frame commit.
    pub fn new(conn: Connection, config: &WaypaneConfig) -> Result<Self> {
        config.validate()?;
        let (width, height) = (config.surface.width, config.surface.height);

        let mut event_queue = conn.new_event_queue();
        let qh = event_queue.handle();
        let display = conn.display();
        let registry = display.get_registry(&qh, ());

        let mut state = ClientState::default();

        // One blocking dispatch, then a roundtrip: the initial burst of
        // registry globals is guaranteed to have been received and processed
        // before we try to use any of them.
        event_queue
            .blocking_dispatch(&mut state)
            .context("initial registry dispatch failed")?;
        event_queue
            .roundtrip(&mut state)
            .context("registry roundtrip failed")?;

        let compositor = state
            .compositor
            .clone()
            .ok_or_else(|| anyhow!("compositor did not advertise wl_compositor"))?;
        let shell = state
            .shell
            .clone()
            .ok_or_else(|| anyhow!("compositor did not advertise wl_shell"))?;
        let shm = state
            .shm
            .clone()
            .ok_or_else(|| anyhow!("compositor did not advertise wl_shm"))?;

        let surface = compositor.create_surface(&qh, ());
        let shell_surface = shell.get_shell_surface(&surface, &qh, ());
        shell_surface.set_toplevel();
        shell_surface.set_title(config.surface.title.clone());

        let (buffer, canvas) =
            create_shm_buffer(&shm, &qh, width, height, config.fill.value)?;

        // One-shot frame: attach at the origin, damage the whole canvas,
        // commit. No frame-callback pacing, no re-submission.
        surface.attach(Some(&buffer), 0, 0);
        surface.damage(0, 0, width as i32, height as i32);
        surface.commit();

        info!(
            "🖼️ Committed {}x{} frame (fill 0x{:02x})",
            width, height, config.fill.value
        );

        Ok(Self {
            conn,
            event_queue,
            state,
            registry,
            surface,
            shell_surface,
            buffer,
            canvas,
        })
    }

    /// Block on protocol dispatch until the connection closes or errors.
    pub fn run(mut self) -> Result<()> {
        info!("🔁 Entering dispatch loop");
        loop {
            self.event_queue
                .blocking_dispatch(&mut self.state)
                .context("Wayland connection lost")?;
        }
    }

    /// Flush outgoing requests and wait until the compositor has processed
    /// them all.
    pub fn roundtrip(&mut self) -> Result<()> {
        self.event_queue
            .roundtrip(&mut self.state)
            .context("roundtrip failed")?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn registry(&self) -> &wl_registry::WlRegistry {
        &self.registry
    }

    pub fn surface(&self) -> &wl_surface::WlSurface {
        &self.surface
    }

    pub fn shell_surface(&self) -> &wl_shell_surface::WlShellSurface {
        &self.shell_surface
    }

    pub fn buffer(&self) -> &wl_buffer::WlBuffer {
        &self.buffer
    }

    pub fn canvas(&self) -> &ShmCanvas {
        &self.canvas
    }
}

/// Carve one buffer out of a fresh shared-memory pool.
///
/// The pool handle is destroyed and the descriptor closed as soon as the
/// buffer exists; both the client-side mapping and the compositor-side pages
/// stay valid without them.
fn create_shm_buffer(
    shm: &wl_shm::WlShm,
    qh: &QueueHandle<ClientState>,
    width: u32,
    height: u32,
    fill: u8,
) -> Result<(wl_buffer::WlBuffer, ShmCanvas)> {
    let mut canvas = ShmCanvas::allocate(width, height)?;
    canvas.fill(fill);

    let fd = canvas
        .pool_fd()
        .ok_or_else(|| anyhow!("buffer file closed before pool creation"))?;
    let pool = shm.create_pool(fd, canvas.len() as i32, qh, ());
    let buffer = pool.create_buffer(
        0,
        width as i32,
        height as i32,
        canvas.stride() as i32,
        wl_shm::Format::Argb8888,
        qh,
        (),
    );
    pool.destroy();
    canvas.close_file();

    Ok((buffer, canvas))
}

impl Dispatch<wl_registry::WlRegistry, ()> for ClientState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                info!("interface={} name=0x{:x} version={}", interface, name, version);
                match classify_global(&interface) {
                    Some(GlobalKind::Compositor) if state.compositor.is_none() => {
                        state.compositor = Some(registry.bind(name, 1, qh, ()));
                    }
                    Some(GlobalKind::Shell) if state.shell.is_none() => {
                        state.shell = Some(registry.bind(name, 1, qh, ()));
                    }
                    Some(GlobalKind::Shm) if state.shm.is_none() => {
                        state.shm = Some(registry.bind(name, 1, qh, ()));
                    }
                    Some(_) => debug!("duplicate {} global ignored", interface),
                    None => debug!("unused global {} ignored", interface),
                }
            }
            wl_registry::Event::GlobalRemove { name } => {
                // Globals vanishing after the initial roundtrip are not
                // supported.
                debug!("global 0x{:x} removed (ignored)", name);
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_shell_surface::WlShellSurface, ()> for ClientState {
    fn event(
        _: &mut Self,
        shell_surface: &wl_shell_surface::WlShellSurface,
        event: wl_shell_surface::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            wl_shell_surface::Event::Ping { serial } => {
                debug!("ping {} -> pong", serial);
                shell_surface.pong(serial);
            }
            wl_shell_surface::Event::Configure { .. } => {
                // Fixed-size canvas; resize requests are ignored.
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_shm::WlShm, ()> for ClientState {
    fn event(
        _: &mut Self,
        _: &wl_shm::WlShm,
        event: wl_shm::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_shm::Event::Format { format } = event {
            debug!("shm format advertised: {:?}", format);
        }
    }
}

impl Dispatch<wl_buffer::WlBuffer, ()> for ClientState {
    fn event(
        _: &mut Self,
        _: &wl_buffer::WlBuffer,
        event: wl_buffer::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_buffer::Event::Release = event {
            debug!("buffer released by compositor");
        }
    }
}

delegate_noop!(ClientState: wl_compositor::WlCompositor);
delegate_noop!(ClientState: wl_shell::WlShell);
delegate_noop!(ClientState: wl_shm_pool::WlShmPool);
delegate_noop!(ClientState: ignore wl_surface::WlSurface);
