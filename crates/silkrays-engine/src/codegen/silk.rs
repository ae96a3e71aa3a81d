use crate::effect::SilkConfig;
use crate::shaders::{ProgramId, THREE_VERTEX};
use crate::uniforms::{FLUID_DECAY, STOP_DECAY, TRAIL_LENGTH};

use super::literal::{boolean, indent, number, number_or_one, vector3};

pub const COMPONENT_NAME: &str = "BgComponent";

pub fn generate(cfg: &SilkConfig) -> String {
    let pointer_on = boolean(cfg.mouse_distortion_enabled);
    let mut code = String::new();

    code.push_str("\"use client\"\n\n");
    code.push_str("import { useEffect, useRef } from \"react\"\n");
    code.push_str("import * as THREE from \"three\"\n\n");

    code.push_str(&format!("export function {COMPONENT_NAME}() {{\n"));
    code.push_str(
        r#"  const containerRef = useRef<HTMLDivElement>(null)
  const canvasRef = useRef<HTMLDivElement>(null)
  const rendererRef = useRef<THREE.WebGLRenderer | null>(null)

  const materialsRef = useRef<{
    fluidMaterial: THREE.ShaderMaterial | null;
    displayMaterial: THREE.ShaderMaterial | null;
  }>({ fluidMaterial: null, displayMaterial: null })

  const mouseRef = useRef({ x: 0, y: 0, prevX: 0, prevY: 0, lastMoveTime: 0 })

  useEffect(() => {
    if (!containerRef.current || !canvasRef.current) return

"#,
    );

    for (name, body) in [
        ("vertexShader", THREE_VERTEX),
        ("fluidShader", ProgramId::SilkFluid.fragment_body()),
        ("displayShader", ProgramId::SilkDisplay.fragment_body()),
    ] {
        code.push_str(&format!("    const {name} = `\n"));
        code.push_str(&indent(body, 6));
        code.push_str("    `\n\n");
    }

    code.push_str(
        r#"    const camera = new THREE.OrthographicCamera(-1, 1, 1, -1, 0, 1)
    const renderer = new THREE.WebGLRenderer({ antialias: true })
    rendererRef.current = renderer

    renderer.setSize(window.innerWidth, window.innerHeight)
    canvasRef.current.appendChild(renderer.domElement)

    const targetOptions = {
      minFilter: THREE.LinearFilter,
      magFilter: THREE.LinearFilter,
      format: THREE.RGBAFormat,
      type: THREE.FloatType,
    }
    const fluidTarget1 = new THREE.WebGLRenderTarget(window.innerWidth, window.innerHeight, targetOptions)
    const fluidTarget2 = new THREE.WebGLRenderTarget(window.innerWidth, window.innerHeight, targetOptions)

    let currentFluidTarget = fluidTarget1
    let previousFluidTarget = fluidTarget2
    let frameCount = 0
    let rafId = 0

    const fluidMaterial = new THREE.ShaderMaterial({
      uniforms: {
        iTime: { value: 0 },
        iResolution: {
          value: new THREE.Vector2(window.innerWidth, window.innerHeight),
        },
        iMouse: { value: new THREE.Vector4(0, 0, 0, 0) },
        iFrame: { value: 0 },
        iPreviousFrame: { value: null },
"#,
    );
    code.push_str(&format!("        uBrushSize: {{ value: {} }},\n", number(cfg.brush_size)));
    code.push_str(&format!("        uBrushStrength: {{ value: {} }},\n", number(cfg.brush_strength)));
    code.push_str(&format!("        uFluidDecay: {{ value: {} }},\n", number(FLUID_DECAY)));
    code.push_str(&format!("        uTrailLength: {{ value: {} }},\n", number(TRAIL_LENGTH)));
    code.push_str(&format!("        uStopDecay: {{ value: {} }},\n", number(STOP_DECAY)));
    code.push_str(
        r#"      },
      vertexShader,
      fragmentShader: fluidShader,
    })

    const displayMaterial = new THREE.ShaderMaterial({
      uniforms: {
        iTime: { value: 0 },
        iResolution: {
          value: new THREE.Vector2(window.innerWidth, window.innerHeight),
        },
        iFluid: { value: null },
"#,
    );
    code.push_str(&format!(
        "        uDistortionAmount: {{ value: {} }},\n",
        number(cfg.distortion_amount)
    ));
    for (i, c) in [&cfg.color1, &cfg.color2, &cfg.color3, &cfg.color4].into_iter().enumerate() {
        code.push_str(&format!("        uColor{}: {{ value: {} }},\n", i + 1, vector3(c)));
    }
    code.push_str(&format!(
        "        uColorIntensity: {{ value: {} }},\n",
        number_or_one(cfg.color_intensity)
    ));
    code.push_str(&format!("        uSoftness: {{ value: {} }},\n", number_or_one(cfg.softness)));
    code.push_str(
        r#"      },
      vertexShader,
      fragmentShader: displayShader,
    })

    materialsRef.current = { fluidMaterial, displayMaterial }

    const geometry = new THREE.PlaneGeometry(2, 2)
    const fluidPlane = new THREE.Mesh(geometry, fluidMaterial)
    const displayPlane = new THREE.Mesh(geometry, displayMaterial)

    function animate() {
      rafId = requestAnimationFrame(animate)

      const time = performance.now() * 0.001
      fluidMaterial.uniforms.iTime.value = time
      displayMaterial.uniforms.iTime.value = time
      fluidMaterial.uniforms.iFrame.value = frameCount

      if (performance.now() - mouseRef.current.lastMoveTime > 100) {
        fluidMaterial.uniforms.iMouse.value.set(0, 0, 0, 0)
      }

      fluidMaterial.uniforms.iPreviousFrame.value = previousFluidTarget.texture

      renderer.setRenderTarget(currentFluidTarget)
      renderer.render(fluidPlane, camera)

      displayMaterial.uniforms.iFluid.value = currentFluidTarget.texture

      renderer.setRenderTarget(null)
      renderer.render(displayPlane, camera)

      const temp = currentFluidTarget
      currentFluidTarget = previousFluidTarget
      previousFluidTarget = temp

      frameCount++
    }

    const handleResize = () => {
      const width = window.innerWidth
      const height = window.innerHeight

      renderer.setSize(width, height)
      fluidMaterial.uniforms.iResolution.value.set(width, height)
      displayMaterial.uniforms.iResolution.value.set(width, height)

      fluidTarget1.setSize(width, height)
      fluidTarget2.setSize(width, height)
      frameCount = 0
    }

    const canvas = renderer.domElement

    const handleMouseMove = (e: MouseEvent) => {
"#,
    );
    code.push_str(&format!(
        "      if (!{pointer_on} || !materialsRef.current.fluidMaterial) return\n"
    ));
    code.push_str(
        r#"
      const rect = canvas.getBoundingClientRect()

      mouseRef.current.prevX = mouseRef.current.x
      mouseRef.current.prevY = mouseRef.current.y

      mouseRef.current.x = e.clientX - rect.left
      mouseRef.current.y = rect.height - (e.clientY - rect.top)
      mouseRef.current.lastMoveTime = performance.now()

      materialsRef.current.fluidMaterial.uniforms.iMouse.value.set(
        mouseRef.current.x,
        mouseRef.current.y,
        mouseRef.current.prevX,
        mouseRef.current.prevY
      )
    }

    const handleMouseLeave = () => {
      if (materialsRef.current.fluidMaterial) {
        materialsRef.current.fluidMaterial.uniforms.iMouse.value.set(0, 0, 0, 0)
      }
    }

    window.addEventListener("resize", handleResize)
    canvas.addEventListener("mousemove", handleMouseMove)
    canvas.addEventListener("mouseleave", handleMouseLeave)
    animate()

    return () => {
      cancelAnimationFrame(rafId)
      window.removeEventListener("resize", handleResize)
      canvas.removeEventListener("mousemove", handleMouseMove)
      canvas.removeEventListener("mouseleave", handleMouseLeave)
      renderer.dispose()
      fluidTarget1.dispose()
      fluidTarget2.dispose()
      geometry.dispose()
      fluidMaterial.dispose()
      displayMaterial.dispose()
      materialsRef.current = { fluidMaterial: null, displayMaterial: null }
      rendererRef.current = null
    }
  }, [])

  return (
    <div ref={containerRef} className="relative w-full h-screen overflow-hidden bg-black">
      <div ref={canvasRef} className="fixed top-0 left-0 w-full h-full" />
    </div>
  )
}
"#,
    );

    code
}
