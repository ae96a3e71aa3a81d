use silkrays_engine::config::{load_preset, load_showcase, ShowcasePaths};
use silkrays_engine::assets::AssetsRoot;
use silkrays_engine::effect::{GodRaysConfig, SilkParam};
use silkrays_engine::gpu::RecordingBackend;
use silkrays_engine::uniforms::{UniformValue, I_FRAME, I_MOUSE};
use silkrays_engine::{generate_code, EffectConfig, EffectKind, ParamChange, RenderSession, SilkConfig};

fn god_rays_scenario() -> EffectConfig {
    let json = r##"{
        "effect": "godrays",
        "rayIntensity": 1.0,
        "animationSpeed": 1.0,
        "rayCount": 12,
        "lightRadius": 1.5,
        "backgroundColor1": "#0d1a33",
        "backgroundColor2": "#334d80",
        "rayColor": "#fff9cc",
        "cloudDensity": 0.3
    }"##;
    serde_json::from_str(json).unwrap()
}

#[test]
fn god_rays_export_bakes_literals() {
    let cfg = god_rays_scenario();
    assert_eq!(cfg, EffectConfig::GodRays(GodRaysConfig::default()));

    let code = generate_code(&cfg).unwrap();
    assert!(code.contains("uRayIntensity: { value: 1 }"));
    assert!(code.contains("float lightAngle = time * 0.2;"));
    assert!(code.contains("uBackgroundColor1: { value: new THREE.Vector3(0.050980392156862744, 0.10196078431372549, 0.2) }"));
}

#[test]
fn silk_export_with_pointer_off_has_literal_false_guard() {
    let cfg: SilkConfig = serde_json::from_str(r#"{ "isMouseDistortionOn": false }"#).unwrap();
    let code = generate_code(&EffectConfig::Silk(cfg)).unwrap();
    assert!(code.contains("if (!false || !materialsRef.current.fluidMaterial) return"));
    assert!(!code.contains("!true"));
}

#[test]
fn generation_is_deterministic() {
    for kind in EffectKind::ALL {
        let cfg = EffectConfig::defaults(kind);
        assert_eq!(generate_code(&cfg).unwrap(), generate_code(&cfg.clone()).unwrap());
    }
}

#[test]
fn disabled_pointer_never_reaches_the_gpu() {
    let mut cfg = SilkConfig::default();
    cfg.mouse_distortion_enabled = false;
    let mut s = RenderSession::create(RecordingBackend::new(), EffectConfig::Silk(cfg), 300, 200).unwrap();
    for i in 0..10 {
        let t = i as f64 * 0.016;
        s.pointer_move(10.0 * i as f32, 50.0, t);
        s.render_frame(t);
    }
    assert_eq!(s.gpu().uploads_of(I_MOUSE), vec![UniformValue::Vec4([0.0; 4])]);
}

#[test]
fn live_session_survives_a_burst_of_edits_and_resizes() {
    let mut s = RenderSession::create(RecordingBackend::new(), EffectConfig::defaults(EffectKind::Silk), 64, 64)
        .unwrap();
    for i in 0..20 {
        s.apply(&ParamChange::Silk(SilkParam::BrushSize(10.0 + i as f32))).unwrap();
        s.render_frame(i as f64 * 0.016);
        if i % 7 == 0 {
            s.resize(64 + i, 64);
        }
    }
    assert_eq!(s.gpu().allocations(), 2);
    assert_eq!(s.gpu().live_programs(), 2);
    // last resize after frame 14, then frames 15..=19
    assert_eq!(s.frame_count(), 5);
    assert_eq!(s.gpu().uploads_of(I_FRAME).last(), Some(&UniformValue::Int(4)));

    let mut slot = Some(s);
    RenderSession::replace(&mut slot, RecordingBackend::new(), EffectConfig::defaults(EffectKind::GodRays), 64, 64)
        .unwrap();
    assert_eq!(slot.as_ref().map(|s| s.kind()), Some(EffectKind::GodRays));
}

#[test]
fn presets_load_from_an_assets_tree() {
    let dir = tempfile::tempdir().unwrap();
    let assets = dir.path().join("assets");
    std::fs::create_dir_all(assets.join("presets")).unwrap();
    std::fs::write(assets.join("showcase.json"), r#"{ "start_effect": "godrays" }"#).unwrap();
    std::fs::write(
        assets.join("presets").join("silk.json"),
        r##"{ "version": 1, "brushSize": 60, "color4": "#123456" }"##,
    )
    .unwrap();

    let paths = ShowcasePaths::new(AssetsRoot::search_upward(dir.path()).unwrap());
    let showcase = load_showcase(&paths.showcase_json).unwrap();
    assert_eq!(showcase.start_effect, EffectKind::GodRays);

    let silk = load_preset(&paths.presets_dir, EffectKind::Silk).unwrap();
    let EffectConfig::Silk(c) = &silk.config else {
        panic!("expected silk preset");
    };
    assert_eq!(c.brush_size, 60.0);
    assert_eq!(c.color4.as_str(), "#123456");
    assert_eq!(c.color1, SilkConfig::default().color1);

    let rays = load_preset(&paths.presets_dir, EffectKind::GodRays).unwrap();
    assert_eq!(rays.config, EffectConfig::defaults(EffectKind::GodRays));
}
