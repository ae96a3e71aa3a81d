mod app;
mod controls;
mod export;
mod hotreload;
mod osc;
mod validate;

use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextApi, ContextAttributesBuilder, NotCurrentContext, PossiblyCurrentContext, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use glutin_winit::DisplayBuilder;

use raw_window_handle::HasRawWindowHandle;

use std::collections::HashMap;
use std::ffi::CString;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Instant;

use anyhow::{anyhow, Context};
use crossbeam_channel::Receiver;
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowBuilder};

use silkrays_engine::assets::AssetsRoot;
use silkrays_engine::config::{load_preset, load_showcase, ShowcaseConfig, ShowcasePaths};
use silkrays_engine::gl::GlowBackend;
use silkrays_engine::{loge, logi, logw, EffectConfig, EffectKind};

use crate::app::App;
use crate::controls::{map_key, Action, HELP};
use crate::hotreload::{HotEvent, HotReload};
use crate::osc::{connect_osc, OscCommand};
use crate::validate::{emit_issues, emit_summary, validate_preset, validate_showcase};

struct GlWindow {
    window: Window,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    gl: glow::Context,
}

fn nz(v: u32) -> NonZeroU32 {
    NonZeroU32::new(v).unwrap_or(NonZeroU32::MIN)
}

/// Window + GL 3.3 core context, vsync on.
fn create_gl_window(event_loop: &EventLoop<()>, cfg: &ShowcaseConfig) -> anyhow::Result<GlWindow> {
    let (w, h) = (cfg.window.width.max(1), cfg.window.height.max(1));
    let window_builder = WindowBuilder::new()
        .with_title(&cfg.window.title)
        .with_inner_size(PhysicalSize::new(w, h));

    let template = ConfigTemplateBuilder::new().with_alpha_size(8).with_depth_size(0);
    let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));

    let (window, gl_config) = display_builder
        .build(event_loop, template, |configs| {
            // glutin reports BadConfig before calling the picker when nothing matches
            configs
                .reduce(|a, b| if a.num_samples() > b.num_samples() { a } else { b })
                .expect("display offered no GL configs")
        })
        .map_err(|e| anyhow!("failed to build display: {e}"))?;

    let window = window.context("no window created")?;

    let raw_window_handle = window.raw_window_handle();
    let gl_display = gl_config.display();

    let context_attributes = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
        .build(Some(raw_window_handle));

    let not_current: NotCurrentContext = unsafe {
        gl_display
            .create_context(&gl_config, &context_attributes)
            .context("create_context failed")?
    };

    let size = window.inner_size();
    let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
        window.raw_window_handle(),
        nz(size.width),
        nz(size.height),
    );

    let surface = unsafe {
        gl_display
            .create_window_surface(&gl_config, &attrs)
            .context("create_window_surface failed")?
    };

    let context = not_current.make_current(&surface).context("make_current failed")?;

    if let Err(e) = surface.set_swap_interval(&context, SwapInterval::Wait(NonZeroU32::MIN)) {
        logw!("GL", "vsync unavailable: {e}");
    }

    let gl = unsafe {
        glow::Context::from_loader_function(|s| match CString::new(s) {
            Ok(name) => gl_display.get_proc_address(&name) as *const _,
            Err(_) => std::ptr::null(),
        })
    };

    Ok(GlWindow { window, surface, context, gl })
}

fn load_presets(paths: &ShowcasePaths) -> HashMap<EffectKind, EffectConfig> {
    let mut presets = HashMap::new();
    for kind in EffectKind::ALL {
        let label = format!("presets/{}.json", kind.id());
        match load_preset(&paths.presets_dir, kind) {
            Ok(p) => {
                let issues = validate_preset(&label, &p);
                emit_issues("VALIDATE", &issues);
                emit_summary("VALIDATE", &label, &issues);
                presets.insert(kind, p.config);
            }
            Err(e) => loge!("PRESET", "{e} (using built-in defaults)"),
        }
    }
    presets
}

fn load_showcase_checked(paths: &ShowcasePaths) -> ShowcaseConfig {
    let cfg = match load_showcase(&paths.showcase_json) {
        Ok(c) => c,
        Err(e) => {
            loge!("ASSETS", "{e} (using defaults)");
            ShowcaseConfig::default()
        }
    };
    let issues = validate_showcase("showcase.json", &cfg);
    emit_issues("VALIDATE", &issues);
    emit_summary("VALIDATE", "showcase.json", &issues);
    cfg
}

fn drain_hot_reload<B>(app: &mut App<B>, rx: &Receiver<HotEvent>, paths: &ShowcasePaths)
where
    B: silkrays_engine::gpu::GpuBackend + Clone,
{
    for ev in rx.try_iter() {
        match ev {
            HotEvent::PresetChanged(kind, path) => {
                logi!("HOTRELOAD", "preset changed: {}", path.display());
                let preset = match load_preset(&paths.presets_dir, kind) {
                    Ok(p) => p,
                    // editors often leave a half-written file for a moment
                    Err(e) => {
                        logw!("HOTRELOAD", "{e} (keeping current values)");
                        continue;
                    }
                };
                let label = format!("presets/{}.json", kind.id());
                emit_issues("VALIDATE", &validate_preset(&label, &preset));
                match app.preset_changed(kind, preset.config) {
                    Ok(n) => logi!("HOTRELOAD", "{}: {n} fields applied", kind.name()),
                    Err(e) => loge!("HOTRELOAD", "{}: {e}", kind.name()),
                }
            }
            HotEvent::ShowcaseChanged(path) => {
                logi!("HOTRELOAD", "showcase changed: {}", path.display());
                let cfg = load_showcase_checked(paths);
                app.set_export_dir(paths.assets.resolve(&cfg.export_dir));
                logi!("HOTRELOAD", "export_dir updated; window and osc settings apply on restart");
            }
        }
    }
}

fn drain_osc<B>(app: &mut App<B>, rx: &Receiver<OscCommand>, now: f64)
where
    B: silkrays_engine::gpu::GpuBackend + Clone,
{
    for cmd in rx.try_iter() {
        match cmd {
            OscCommand::Set { field, value } => match app.set_field(&field, value) {
                Ok(true) => logi!("OSC", "{field} = {:?}", app.live_config().get(&field)),
                Ok(false) => {}
                Err(e) => logw!("OSC", "{field} rejected: {e}"),
            },
            OscCommand::NextEffect => app.handle_action(Action::NextEffect, now),
            OscCommand::PrevEffect => app.handle_action(Action::PrevEffect, now),
            OscCommand::Export => app.handle_action(Action::Export, now),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("no current directory")?;
    let assets = AssetsRoot::discover(&cwd)
        .with_context(|| format!("set SILKRAYS_ASSETS or run from a directory below assets/ ({})", cwd.display()))?;
    let paths = ShowcasePaths::new(assets);

    logi!("ASSETS", "base: {}", paths.assets.path().display());
    logi!("ASSETS", "showcase: {}", paths.showcase_json.display());
    logi!("ASSETS", "presets: {}", paths.presets_dir.display());

    let showcase = load_showcase_checked(&paths);
    let presets = load_presets(&paths);

    let event_loop = EventLoop::new().context("EventLoop::new failed")?;
    let GlWindow { window, surface, context, gl } = create_gl_window(&event_loop, &showcase)?;

    let backend = GlowBackend::new(Rc::new(gl))?;
    let size = window.inner_size();
    let start = Instant::now();
    let app = App::new(
        backend,
        presets,
        showcase.start_effect,
        (size.width as i32, size.height as i32),
        paths.assets.resolve(&showcase.export_dir),
        0.0,
    );

    match app.session() {
        Some(s) => logi!("SESSION", "{} running at {:?}", app.live_kind().name(), s.size()),
        None => logw!("SESSION", "{} failed to start; switch effects or fix the error shown in the title", app.live_kind().name()),
    }

    let hot = match HotReload::new(&paths) {
        Ok(h) => Some(h),
        Err(e) => {
            logw!("HOTRELOAD", "watcher unavailable: {e:#}");
            None
        }
    };
    let osc = connect_osc(&showcase.osc, app.snapshot());

    logi!("SESSION", "{HELP}");

    let mut shift = false;
    let mut title = String::new();

    // Dropped on close so GL objects are released while the context is still current.
    let mut live = Some(app);

    event_loop.run(move |event, target| {
        target.set_control_flow(ControlFlow::Poll);
        let now = start.elapsed().as_secs_f64();
        let Some(app) = live.as_mut() else { return };

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    app.shutdown();
                    live = None;
                    target.exit();
                }

                WindowEvent::Resized(new_size) => {
                    surface.resize(&context, nz(new_size.width), nz(new_size.height));
                    app.resize(new_size.width as i32, new_size.height as i32);
                }

                WindowEvent::ModifiersChanged(mods) => shift = mods.state().shift_key(),

                WindowEvent::CursorMoved { position, .. } => {
                    app.pointer_move(position.x as f32, position.y as f32, now);
                }

                WindowEvent::CursorLeft { .. } => app.pointer_leave(),

                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state.is_pressed() {
                        if let PhysicalKey::Code(code) = event.physical_key {
                            if let Some(action) = map_key(code, shift) {
                                app.handle_action(action, now);
                            }
                        }
                    }
                }

                WindowEvent::RedrawRequested => {
                    if let Some(h) = &hot {
                        drain_hot_reload(app, h.rx(), &paths);
                    }
                    if let Some((_, rx)) = &osc {
                        drain_osc(app, rx, now);
                    }

                    app.render(now);

                    if let Err(e) = surface.swap_buffers(&context) {
                        loge!("GL", "swap_buffers failed: {e}");
                    }

                    let t = app.title();
                    if t != title {
                        window.set_title(&t);
                        title = t;
                    }
                }

                _ => {}
            },

            Event::AboutToWait => {
                window.request_redraw();
            }

            _ => {}
        }
    })?;

    Ok(())
}
