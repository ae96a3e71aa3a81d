use crate::effect::GodRaysConfig;
use crate::shaders::{ProgramId, THREE_VERTEX};

use super::literal::{indent, number, vector3};

pub const COMPONENT_NAME: &str = "GodRaysComponent";

pub fn generate(cfg: &GodRaysConfig) -> String {
    let mut code = String::new();

    code.push_str("\"use client\";\n");
    code.push_str("import { useEffect, useRef } from \"react\";\n");
    code.push_str("import * as THREE from \"three\";\n\n");

    code.push_str("const vertexShader = `\n");
    code.push_str(&indent(THREE_VERTEX, 2));
    code.push_str("`;\n\n");
    code.push_str("const godRaysShader = `\n");
    code.push_str(&indent(ProgramId::GodRays.fragment_body(), 2));
    code.push_str("`;\n\n");

    code.push_str(&format!("export default function {COMPONENT_NAME}() {{\n"));
    code.push_str(
        r#"  const containerRef = useRef(null);
  const canvasRef = useRef(null);

  useEffect(() => {
    if (!containerRef.current || !canvasRef.current) return;
    canvasRef.current.innerHTML = "";
    const scene = new THREE.Scene();
    const camera = new THREE.OrthographicCamera(-1, 1, 1, -1, 0, 1);
    const renderer = new THREE.WebGLRenderer({ antialias: true });
    const canvas = renderer.domElement;
    canvasRef.current.appendChild(canvas);
    const rect = canvasRef.current?.getBoundingClientRect();
    if (!rect) return;
    renderer.setSize(rect.width || 800, rect.height || 600);

    const godRaysMaterial = new THREE.ShaderMaterial({
      vertexShader,
      fragmentShader: godRaysShader,
      uniforms: {
        iTime: { value: 0 },
        iResolution: { value: new THREE.Vector2(rect.width || 800, rect.height || 600) },
"#,
    );
    code.push_str(&format!("        uRayIntensity: {{ value: {} }},\n", number(cfg.ray_intensity)));
    code.push_str(&format!("        uAnimationSpeed: {{ value: {} }},\n", number(cfg.animation_speed)));
    code.push_str(&format!("        uRayCount: {{ value: {} }},\n", number(cfg.ray_count)));
    code.push_str(&format!("        uLightRadius: {{ value: {} }},\n", number(cfg.light_radius)));
    code.push_str(&format!("        uBackgroundColor1: {{ value: {} }},\n", vector3(&cfg.background_color1)));
    code.push_str(&format!("        uBackgroundColor2: {{ value: {} }},\n", vector3(&cfg.background_color2)));
    code.push_str(&format!("        uRayColor: {{ value: {} }},\n", vector3(&cfg.ray_color)));
    code.push_str(&format!("        uCloudDensity: {{ value: {} }},\n", number(cfg.cloud_density)));
    code.push_str(
        r#"      },
    });

    const quad = new THREE.Mesh(new THREE.PlaneGeometry(2, 2), godRaysMaterial);
    scene.add(quad);

    let frame = 0;
    let rafId = 0;
    const animate = () => {
      frame++;
      godRaysMaterial.uniforms.iTime.value = frame * 0.01;
      renderer.render(scene, camera);
      rafId = requestAnimationFrame(animate);
    };
    animate();

    const handleResize = () => {
      if (!canvasRef.current) return;
      const rect = canvasRef.current.getBoundingClientRect();
      if (!rect) return;
      renderer.setSize(rect.width, rect.height);
      godRaysMaterial.uniforms.iResolution.value.set(rect.width, rect.height);
    };

    window.addEventListener("resize", handleResize);

    return () => {
      cancelAnimationFrame(rafId);
      window.removeEventListener("resize", handleResize);
      renderer.dispose();
      godRaysMaterial.dispose();
      if (canvasRef.current) {
        canvasRef.current.innerHTML = "";
      }
    };
  }, []);

  return (
    <div ref={containerRef} className="relative w-full h-screen overflow-hidden bg-black">
      <div ref={canvasRef} className="fixed top-0 left-0 w-full h-full" />
    </div>
  );
}
"#,
    );

    code
}
